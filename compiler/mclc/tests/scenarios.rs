//! End-to-end pipeline tests keyed to the scenarios and universal
//! properties of a single front end compile: lex/parse/interpolate/scope/
//! typecheck, and separately the `Output()` lowering.

use mcl_diagnostic::ErrorCode;
use mcl_ir::{ExprKind, Name, NodeIdGen, StmtKind, StringInterner};
use mcl_types::Type;
use mclc::{compile, output, DemoRegistry, Registry};
use rustc_hash::FxHashMap;

fn type_of(types: &[(mcl_ir::NodeId, Type)], id: mcl_ir::NodeId) -> Type {
    types
        .iter()
        .find(|(node, _)| *node == id)
        .map(|(_, ty)| ty.clone())
        .unwrap_or_else(|| panic!("no recorded type for {id:?}"))
}

fn resolve<'a>(interner: &'a StringInterner, name: Name) -> &'a str {
    interner.resolve(name)
}

/// S1 — simple assignment: `$rewsna = -42` folds the unary minus directly
/// into a negative `Int` literal rather than a `Call("_operator", "-", ..)`
/// (`mcl_parse::expr::parse_unary`).
#[test]
fn s1_simple_assignment() {
    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let compiled = compile("$rewsna = -42", &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(compiled.prog.body.len(), 1);
    let StmtKind::Bind { name, value } = &compiled.prog.body[0].kind else {
        panic!("expected a Bind statement");
    };
    assert_eq!(resolve(&interner, *name), "rewsna");
    assert!(matches!(value.kind, ExprKind::Int(-42)));
}

/// S2 — operator precedence: `3 * 12 + 4` lowers to `_operator` calls
/// nested by precedence, both typed `int`.
#[test]
fn s2_operator_precedence() {
    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "test \"t1\" { int64ptr => 3 * 12 + 4, }";
    let compiled = compile(source, &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));

    let StmtKind::Res { kind, name, entries, .. } = &compiled.prog.body[0].kind else {
        panic!("expected a Res statement");
    };
    assert!(matches!(&kind.kind, ExprKind::Str(s) if s == "test"));
    assert!(matches!(&name.kind, ExprKind::Str(s) if s == "t1"));
    assert_eq!(entries.len(), 1);
    let mcl_ir::ResEntry::Field { name: field_name, value, .. } = &entries[0] else {
        panic!("expected a Field entry");
    };
    assert_eq!(resolve(&interner, *field_name), "int64ptr");

    let ExprKind::Call(plus) = &value.kind else {
        panic!("expected the top-level op to be a Call");
    };
    assert_eq!(resolve(&interner, plus.name), "_operator");
    let ExprKind::Str(op) = &plus.args[0].kind else {
        panic!("first arg of _operator is the literal op string");
    };
    assert_eq!(op, "+");
    let ExprKind::Call(times) = &plus.args[1].kind else {
        panic!("left operand of + is the nested * call");
    };
    assert_eq!(resolve(&interner, times.name), "_operator");
    let ExprKind::Str(times_op) = &times.args[0].kind else {
        panic!("first arg of nested _operator is the literal op string");
    };
    assert_eq!(times_op, "*");

    assert_eq!(type_of(&compiled.types, value.id), Type::Int);
    assert_eq!(type_of(&compiled.types, plus.args[1].id), Type::Int);
}

/// S3 — template round-trip: `template("hello", $v)` types `str`, and the
/// `$v` reference (already bound to `int` by `$v = 42`) types `int`. This
/// only holds because `Type::cmp` treats `Type::Variant` (the signature
/// `template`'s substituted-argument slots carry) as compatible with any
/// already-resolved concrete type, not just with another `Variant`.
#[test]
fn s3_template_round_trip() {
    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "$v = 42\n$x = template(\"hello\", $v)\n";
    let compiled = compile(source, &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));

    let StmtKind::Bind { value: template_call, .. } = &compiled.prog.body[1].kind else {
        panic!("expected the second statement to be a Bind");
    };
    assert_eq!(type_of(&compiled.types, template_call.id), Type::Str);

    let ExprKind::Call(call) = &template_call.kind else {
        panic!("expected a Call expression");
    };
    let ExprKind::Var(v) = &call.args[1].kind else {
        panic!("second template argument should still be a bare Var reference");
    };
    assert_eq!(resolve(&interner, *v), "v");
    assert_eq!(type_of(&compiled.types, call.args[1].id), Type::Int);
}

/// S4 — recursive class: `include`ing a class from inside its own body is
/// rejected rather than expanded forever.
#[test]
fn s4_recursive_class_is_rejected() {
    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "class c1 { include c1 }\ninclude c1\n";
    let err = compile(source, &mut interner, &id_gen, &builtins).expect_err("recursive include must fail");
    assert_eq!(err.code, ErrorCode::RecursiveClass);
}

/// S5 — send/recv edge: a two-element `.send`/`.recv` chain lowers to one
/// edge quad with `notify = true` (illustrative `.foosend`/
/// `.barrecv` suffixes aren't real grammar; `parse_send_recv_suffix` only
/// accepts the literal words `send`/`recv`).
#[test]
fn s5_send_recv_edge() {
    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "test \"t1\" { int64ptr => 42, }\n\
                  test \"t2\" { int64ptr => 13, }\n\
                  Test[\"t1\"].send -> Test[\"t2\"].recv\n";
    let compiled = compile(source, &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));

    let registry = DemoRegistry::new(FxHashMap::default());
    let fields = DemoRegistry::new(FxHashMap::default());
    let (_graph, prog_output) =
        output(&compiled.prog, &registry, &fields, &interner).unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(prog_output.edges.len(), 1);
    let edge = &prog_output.edges[0];
    assert_eq!(edge.kind1, "test");
    assert_eq!(edge.name1, "t1");
    assert_eq!(edge.kind2, "test");
    assert_eq!(edge.name2, "t2");
    assert!(edge.send);
    assert!(edge.recv);
    assert!(edge.notify);
}

/// S6 — import alias derivation: exercised directly on `parse_import_name`
/// since it's a pure classification step `mclc::pipeline` doesn't wrap.
#[test]
fn s6_import_alias_derivation() {
    use mcl_scope::import::parse_import_name;

    let remote = parse_import_name("git://example.com/purpleidea/mgmt-foo").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(remote.alias, "foo");
    assert!(!remote.is_local);
    assert_eq!(remote.path, "example.com/purpleidea/mgmt-foo");

    assert!(parse_import_name("/var/lib/mgmt").is_err());
    assert!(parse_import_name("git:////home/james/").is_err());
}

/// Format/parse round-trip: every expression the parser produces lowers
/// operators/indexing/lookups to plain `Call` nodes, so the printer's
/// `name(arg, arg, ...)` rendering always reparses to the same shape
/// (`mcl_fmt`'s module doc).
#[test]
fn format_then_parse_round_trips_statement_shape() {
    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "test \"t1\" { int64ptr => 3 * 12 + 4, }";
    let compiled = compile(source, &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));
    let printed = mcl_fmt::format_prog(&compiled.prog, &interner);

    let reparsed = mcl_parse::parse(&printed, &mut interner).unwrap_or_else(|e| panic!("reparse failed: {e}\n{printed}"));
    assert_eq!(reparsed.body.len(), compiled.prog.body.len());

    let StmtKind::Res { entries: reparsed_entries, .. } = &reparsed.body[0].kind else {
        panic!("expected a Res statement");
    };
    let StmtKind::Res { entries: original_entries, .. } = &compiled.prog.body[0].kind else {
        panic!("expected a Res statement");
    };
    assert_eq!(reparsed_entries.len(), original_entries.len());
}

/// Re-unifying an already-typed program is a no-op: every node the solver
/// settled the first time round resolves to the identical type again, and
/// produces no conflict.
#[test]
fn reunification_of_a_typed_program_is_a_no_op() {
    use mcl_scope::{set_scope, CopyLineage, Scope};
    use mcl_typeck::{collect_invariants, Solver};

    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "test \"t1\" { int64ptr => 3 * 12 + 4, }";
    let first = compile(source, &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));

    let mut lineage = CopyLineage::new();
    let scope_result =
        set_scope(&first.prog.body, &Scope::new(), &id_gen, &mut lineage).unwrap_or_else(|e| panic!("{e}"));
    let (invariants, spans) = collect_invariants(
        &mcl_ir::Prog { body: scope_result.body, ..first.prog },
        &id_gen,
        &builtins,
    );
    let mut solver = Solver::new();
    solver.solve(invariants, &spans).unwrap_or_else(|e| panic!("re-unification must not conflict: {e}"));
    let second_types = solver.resolved_types();

    for (id, ty) in &first.types {
        let rebound = second_types.iter().find(|(node, _)| node == id).map(|(_, ty)| ty.clone());
        assert_eq!(rebound.as_ref(), Some(ty), "node {id:?} changed type on re-unification");
    }
}

/// Variable relay invariant: every `Var` node the lowerer emits gets
/// exactly one incoming edge, from the expression it refers to.
#[test]
fn variable_relay_invariant_holds() {
    use mcl_graph::NodeKind;

    let mut interner = StringInterner::new();
    let id_gen = NodeIdGen::new();
    let builtins = Registry::new(&mut interner);

    let source = "$v = 42\n$x = $v\n$y = $v\n";
    let compiled = compile(source, &mut interner, &id_gen, &builtins).unwrap_or_else(|e| panic!("{e}"));

    let registry = DemoRegistry::new(FxHashMap::default());
    let fields = DemoRegistry::new(FxHashMap::default());
    let (graph, _prog_output) =
        output(&compiled.prog, &registry, &fields, &interner).unwrap_or_else(|e| panic!("{e}"));

    // `GraphNodeId` has no public constructor, so tally incoming-edge
    // counts by raw index from `edges()` rather than rebuilding ids.
    let mut incoming = FxHashMap::default();
    for edge in graph.edges() {
        *incoming.entry(edge.to.raw()).or_insert(0u32) += 1;
    }
    for (idx, node) in graph.nodes().iter().enumerate() {
        if matches!(node, NodeKind::Var(_)) {
            let raw = u32::try_from(idx).unwrap_or_else(|_| panic!("graph too large"));
            assert_eq!(incoming.get(&raw).copied().unwrap_or(0), 1);
        }
    }
}

/// Boundary: an integer literal past `i64::MAX` is a lex error.
#[test]
fn integer_literal_overflow_is_a_lex_error() {
    let mut interner = StringInterner::new();
    let err = mcl_parse::parse("$x = 9223372036854775808", &mut interner).expect_err("must overflow i64");
    assert_eq!(err.code, ErrorCode::LexIntegerOverflow);
}

/// Boundary: a dangling/trailing-dot class path is a parse error in either
/// direction.
#[test]
fn malformed_class_path_is_a_parse_error() {
    let mut interner = StringInterner::new();
    assert!(mcl_parse::parse("class foo..c1 {}", &mut interner).is_err());
    let mut interner = StringInterner::new();
    assert!(mcl_parse::parse("class foo.c1. {}", &mut interner).is_err());
}

/// Boundary: `$.pkg.foo` (a leading-dot path with no variable name before
/// it) is a parse error; `$pkg.foo.bar` is valid.
#[test]
fn leading_dot_path_is_a_parse_error_but_plain_dotted_path_is_valid() {
    let mut interner = StringInterner::new();
    assert!(mcl_parse::parse("$x = $.pkg.foo", &mut interner).is_err());
    let mut interner = StringInterner::new();
    assert!(mcl_parse::parse("$x = $pkg.foo.bar", &mut interner).is_ok());
}

/// Boundary: a missing trailing comma after a resource body's last field
/// is `ParseExpectingComma`.
#[test]
fn missing_trailing_comma_is_parse_expecting_comma() {
    let mut interner = StringInterner::new();
    let err = mcl_parse::parse("file \"/tmp/hello\" { bar => false }", &mut interner)
        .expect_err("missing trailing comma must fail");
    assert_eq!(err.code, ErrorCode::ParseExpectingComma);
}

