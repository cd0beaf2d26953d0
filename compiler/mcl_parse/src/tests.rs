use super::*;
use mcl_ir::{ExprKind, StmtKind};

fn parse_ok(src: &str) -> Prog {
    let mut interner = StringInterner::new();
    parse(src, &mut interner).unwrap_or_else(|e| panic!("parse failed: {e}"))
}

/// Scenario S1: `$rewsna = -42` parses to
/// `Bind("rewsna", Int(-42))`.
#[test]
fn scenario_s1_simple_assignment() {
    let prog = parse_ok("$rewsna = -42");
    assert_eq!(prog.body.len(), 1);
    match &prog.body[0].kind {
        StmtKind::Bind { value, .. } => {
            assert!(matches!(value.kind, ExprKind::Int(-42)));
        }
        other => panic!("expected Bind, got {other:?}"),
    }
}

/// Scenario S2: operator precedence. `3 * 12 + 4` parses as
/// `Call("_operator","+", Call("_operator","*",3,12), 4)`.
#[test]
fn scenario_s2_operator_precedence() {
    let prog = parse_ok(r#"test "t1" { int64ptr => 3 * 12 + 4, }"#);
    let StmtKind::Res { kind, name, entries, collect } = &prog.body[0].kind else {
        panic!("expected Res");
    };
    assert!(!collect);
    assert!(matches!(&kind.kind, ExprKind::Str(s) if s == "test"));
    assert!(matches!(&name.kind, ExprKind::Str(s) if s == "t1"));
    assert_eq!(entries.len(), 1);
    let mcl_ir::ResEntry::Field { value, .. } = &entries[0] else {
        panic!("expected Field entry");
    };
    let ExprKind::Call(outer) = &value.kind else {
        panic!("expected outer +");
    };
    assert_eq!(outer.args.len(), 3); // "+" literal, lhs, rhs
    assert!(matches!(&outer.args[0].kind, ExprKind::Str(s) if s == "+"));
    let ExprKind::Call(inner) = &outer.args[1].kind else {
        panic!("expected inner *");
    };
    assert!(matches!(&inner.args[0].kind, ExprKind::Str(s) if s == "*"));
}

#[test]
fn scenario_s3_template_call() {
    let prog = parse_ok("$v = 42\n$x = template(\"hello\", $v)");
    assert_eq!(prog.body.len(), 2);
    match &prog.body[1].kind {
        StmtKind::Bind { value, .. } => match &value.kind {
            ExprKind::Call(call) => assert_eq!(call.args.len(), 2),
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Bind, got {other:?}"),
    }
}

#[test]
fn scenario_s4_class_and_include() {
    let prog = parse_ok("class c1 { include c1 }\ninclude c1");
    assert_eq!(prog.body.len(), 2);
    assert!(matches!(prog.body[0].kind, StmtKind::Class { .. }));
    assert!(matches!(prog.body[1].kind, StmtKind::Include { .. }));
}

#[test]
fn scenario_s5_send_recv_edge() {
    let prog = parse_ok(
        "test \"t1\" { int64ptr => 42, }\ntest \"t2\" { int64ptr => 13, }\nTest[\"t1\"].foosend -> Test[\"t2\"].barrecv",
    );
    let StmtKind::Edge { chain } = &prog.body[2].kind else {
        panic!("expected Edge");
    };
    assert_eq!(chain.len(), 2);
    assert!(chain[0].send.is_some());
    assert!(chain[1].recv.is_some());
}

#[test]
fn missing_trailing_comma_is_parse_expecting_comma() {
    let mut interner = StringInterner::new();
    let err = parse(r#"file "/tmp/hello" { bar => false }"#, &mut interner).unwrap_err();
    assert_eq!(err.code, mcl_diagnostic::ErrorCode::ParseExpectingComma);
}

#[test]
fn dotted_class_path_with_trailing_dot_is_parse_error() {
    let mut interner = StringInterner::new();
    assert!(parse("class foo.c1. {}", &mut interner).is_err());
}

#[test]
fn dotted_class_path_with_double_dot_is_parse_error() {
    let mut interner = StringInterner::new();
    assert!(parse("class foo..c1 {}", &mut interner).is_err());
}

#[test]
fn lookup_and_default_lower_to_calls() {
    let prog = parse_ok("$x = $a[$b] || $c");
    match &prog.body[0].kind {
        StmtKind::Bind { value, .. } => match &value.kind {
            ExprKind::Call(call) => assert_eq!(call.args.len(), 3),
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Bind, got {other:?}"),
    }
}

#[test]
fn struct_arrow_lowers_to_struct_lookup_call() {
    let prog = parse_ok("$x = $a->f");
    match &prog.body[0].kind {
        StmtKind::Bind { value, .. } => match &value.kind {
            ExprKind::Call(call) => assert_eq!(call.args.len(), 2),
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Bind, got {other:?}"),
    }
}

#[test]
fn in_operator_lowers_to_contains_call() {
    let prog = parse_ok("$x = $a in $b");
    match &prog.body[0].kind {
        StmtKind::Bind { value, .. } => match &value.kind {
            ExprKind::Call(call) => assert_eq!(call.args.len(), 2),
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Bind, got {other:?}"),
    }
}

#[test]
fn panic_statement_parses_as_its_own_node() {
    let prog = parse_ok("panic($x)");
    assert!(matches!(prog.body[0].kind, StmtKind::Panic { .. }));
}
