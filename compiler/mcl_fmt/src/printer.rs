//! The `Prog` -> source-text printer.

use mcl_ir::ast::{
    CallExpr, EdgeHalf, EdgeMetaKind, Expr, ExprKind, FuncLit, IfExpr, MapEntry, Param, Prog,
    ResEntry, Stmt, StmtKind, StructField,
};
use mcl_ir::{Name, StringInterner};

use crate::ty::format_type_ast;

/// Renders `prog` to source text using a fresh [`Printer`]. Equivalent to
/// `Printer::new(interner).print_prog(prog)`.
pub fn format_prog(prog: &Prog, interner: &StringInterner) -> String {
    let mut printer = Printer::new(interner);
    printer.print_prog(prog);
    printer.finish()
}

/// Renders AST nodes to text, indenting nested blocks two spaces per level
/// (matching the convention every hand-written fixture in this corpus
/// uses). Holds no state beyond the output buffer and current indent, so a
/// caller prints a whole program with one `Printer` but could equally
/// print a lone `Expr` for a diagnostic.
pub struct Printer<'a> {
    interner: &'a StringInterner,
    out: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        Printer {
            interner,
            out: String::new(),
            indent: 0,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn name(&self, name: Name) -> &str {
        self.interner.resolve(name)
    }

    fn push_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    pub fn print_prog(&mut self, prog: &Prog) {
        self.print_stmts(&prog.body);
    }

    fn print_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.push_indent();
            self.print_stmt(stmt);
            self.out.push('\n');
        }
    }

    fn print_block(&mut self, stmts: &[Stmt]) {
        self.out.push_str("{\n");
        self.indent += 1;
        self.print_stmts(stmts);
        self.indent -= 1;
        self.push_indent();
        self.out.push('}');
    }

    fn print_params(&mut self, params: &[Param]) {
        self.out.push('(');
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push('$');
            self.out.push_str(self.name(p.name));
            if let Some(ty) = &p.type_ann {
                self.out.push(' ');
                self.out.push_str(&format_type_ast(ty, self.interner));
            }
        }
        self.out.push(')');
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Bind { name, value } => {
                self.out.push('$');
                self.out.push_str(self.name(*name));
                self.out.push_str(" = ");
                self.print_expr(value);
            }
            StmtKind::Res {
                kind,
                name,
                entries,
                ..
            } => {
                self.print_res_kind(kind);
                self.out.push(' ');
                self.print_expr(name);
                self.out.push_str(" {\n");
                self.indent += 1;
                for entry in entries {
                    self.push_indent();
                    self.print_res_entry(entry);
                    self.out.push_str(",\n");
                }
                self.indent -= 1;
                self.push_indent();
                self.out.push('}');
            }
            StmtKind::Edge { chain } => {
                for (i, half) in chain.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(" -> ");
                    }
                    self.print_edge_half(half);
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("if ");
                self.print_expr(cond);
                self.out.push(' ');
                self.print_block(then_branch);
                if !else_branch.is_empty() {
                    self.out.push_str(" else ");
                    if let [Stmt {
                        kind: StmtKind::If { .. },
                        ..
                    }] = else_branch.as_slice()
                    {
                        self.print_stmt(&else_branch[0]);
                    } else {
                        self.print_block(else_branch);
                    }
                }
            }
            StmtKind::For {
                idx,
                val,
                container,
                body,
            } => {
                self.out.push_str("for $");
                self.out.push_str(self.name(*idx));
                self.out.push_str(", $");
                self.out.push_str(self.name(*val));
                self.out.push_str(" in ");
                self.print_expr(container);
                self.out.push(' ');
                self.print_block(body);
            }
            StmtKind::ForKv {
                key,
                val,
                container,
                body,
            } => {
                self.out.push_str("forkv $");
                self.out.push_str(self.name(*key));
                self.out.push_str(", $");
                self.out.push_str(self.name(*val));
                self.out.push_str(" in ");
                self.print_expr(container);
                self.out.push(' ');
                self.print_block(body);
            }
            StmtKind::FuncDecl {
                name,
                params,
                out,
                body,
            } => {
                self.out.push_str("func ");
                self.out.push_str(self.name(*name));
                self.print_params(params);
                if let Some(ty) = out {
                    self.out.push(' ');
                    self.out.push_str(&format_type_ast(ty, self.interner));
                }
                self.out.push_str(" {\n");
                self.indent += 1;
                self.push_indent();
                self.print_expr(body);
                self.out.push('\n');
                self.indent -= 1;
                self.push_indent();
                self.out.push('}');
            }
            StmtKind::Class { name, params, body } => {
                self.out.push_str("class ");
                self.out.push_str(self.name(*name));
                if !params.is_empty() {
                    self.print_params(params);
                }
                self.out.push(' ');
                self.print_block(body);
            }
            StmtKind::Include { name, args } => {
                self.out.push_str("include ");
                self.out.push_str(self.name(*name));
                if !args.is_empty() {
                    self.out.push('(');
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        self.print_expr(a);
                    }
                    self.out.push(')');
                }
            }
            StmtKind::Import { raw } => {
                self.out.push_str("import ");
                self.out.push('"');
                self.out.push_str(&escape_str(raw));
                self.out.push('"');
            }
            StmtKind::Comment(text) => {
                self.out.push('#');
                self.out.push_str(text);
            }
            StmtKind::Panic { cond } => {
                self.out.push_str("panic(");
                self.print_expr(cond);
                self.out.push(')');
            }
        }
    }

    /// A resource kind is always a string literal at parse time
    /// (`parse_res_or_edge`/`parse_edge_half`/`parse_collect` all wrap the
    /// kind identifier in a synthetic `Str`); printed back out as the bare
    /// identifier it started as, not a quoted string.
    fn print_res_kind(&mut self, kind: &Expr) {
        match &kind.kind {
            ExprKind::Str(s) => self.out.push_str(s),
            _ => self.print_expr(kind),
        }
    }

    fn print_res_entry(&mut self, entry: &ResEntry) {
        match entry {
            ResEntry::Field { name, cond, value, .. } => {
                self.out.push_str(self.name(*name));
                self.out.push_str(" => ");
                self.print_conditional(cond, value);
            }
            ResEntry::EdgeMeta { meta, cond, half, .. } => {
                self.out.push_str(edge_meta_kind_name(*meta));
                self.out.push_str(" => ");
                if let Some(cond) = cond {
                    self.print_expr(cond);
                    self.out.push_str(" ?: ");
                }
                self.print_edge_half(half);
            }
            ResEntry::MetaProp { key, value, .. } => {
                self.out.push_str("Meta:");
                self.out.push_str(self.name(*key));
                self.out.push_str(" => ");
                self.print_expr(value);
            }
            ResEntry::MetaStruct { cond, value, .. } => {
                self.out.push_str("Meta => ");
                self.print_conditional(cond, value);
            }
        }
    }

    fn print_conditional(&mut self, cond: &Option<Expr>, value: &Expr) {
        if let Some(cond) = cond {
            self.print_expr(cond);
            self.out.push_str(" ?: ");
        }
        self.print_expr(value);
    }

    fn print_edge_half(&mut self, half: &EdgeHalf) {
        self.print_res_kind(&half.kind);
        self.out.push('[');
        self.print_expr(&half.name);
        self.out.push(']');
        if let Some(send) = half.send {
            self.out.push('.');
            self.out.push_str(self.name(send));
        }
        if let Some(recv) = half.recv {
            self.out.push('.');
            self.out.push_str(self.name(recv));
        }
    }

    pub fn print_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            ExprKind::Int(i) => self.out.push_str(&i.to_string()),
            ExprKind::Float(f) => self.out.push_str(&format_float(*f)),
            ExprKind::Str(s) => {
                self.out.push('"');
                self.out.push_str(&escape_str(s));
                self.out.push('"');
            }
            ExprKind::List(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.print_expr(item);
                }
                self.out.push(']');
            }
            ExprKind::Map(entries) => {
                self.out.push_str("map{");
                for (i, MapEntry { key, value }) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.print_expr(key);
                    self.out.push_str(" => ");
                    self.print_expr(value);
                }
                self.out.push('}');
            }
            ExprKind::Struct(fields) => {
                self.out.push_str("struct{");
                for (i, StructField { name, value }) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(self.name(*name));
                    self.out.push_str(" => ");
                    self.print_expr(value);
                }
                self.out.push('}');
            }
            ExprKind::Var(name) => {
                self.out.push('$');
                self.out.push_str(self.name(*name));
            }
            ExprKind::Call(CallExpr { name, args }) => {
                self.out.push_str(self.name(*name));
                self.out.push('(');
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.print_expr(a);
                }
                self.out.push(')');
            }
            ExprKind::Func(FuncLit { params, out, body }) => {
                self.out.push_str("func");
                self.print_params(params);
                if let Some(ty) = out {
                    self.out.push(' ');
                    self.out.push_str(&format_type_ast(ty, self.interner));
                }
                self.out.push_str(" { ");
                self.print_expr(body);
                self.out.push_str(" }");
            }
            ExprKind::If(IfExpr {
                cond,
                then_branch,
                else_branch,
            }) => {
                self.out.push_str("if ");
                self.print_expr(cond);
                self.out.push_str(" { ");
                self.print_expr(then_branch);
                self.out.push_str(" } else { ");
                self.print_expr(else_branch);
                self.out.push_str(" }");
            }
        }
    }
}

fn edge_meta_kind_name(kind: EdgeMetaKind) -> &'static str {
    match kind {
        EdgeMetaKind::Before => "Before",
        EdgeMetaKind::After => "After",
        EdgeMetaKind::Notify => "Notify",
        EdgeMetaKind::Listen => "Listen",
    }
}

/// Reverses `mcl_lexer::cooker::cook_string`'s decoding: the only legal
/// input escapes are `\n \t \\ \"`, so those are the only four bytes this
/// needs to re-escape.
fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

/// Prints a float so it re-lexes back to the same `f64`: `{:?}` always
/// includes a decimal point (`1.0` rather than `1`), which `TokenKind::Float`
/// requires to distinguish it from `Int` on re-parse.
fn format_float(f: f64) -> String {
    format!("{f:?}")
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests {
    use super::*;
    use mcl_ir::NodeIdGen;

    fn parse(src: &str) -> (Prog, StringInterner) {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let prog = mcl_parse::parse_with_id_gen(src, None, &mut interner, &ids).expect("parses");
        (prog, interner)
    }

    /// `format(parse(S)) == format(parse(format(parse(S))))`.
    fn roundtrips_idempotently(src: &str) {
        let (prog1, interner1) = parse(src);
        let printed1 = format_prog(&prog1, &interner1);
        let (prog2, interner2) = parse(&printed1);
        let printed2 = format_prog(&prog2, &interner2);
        assert_eq!(printed1, printed2, "format(parse(S)) must be a fixed point");
    }

    #[test]
    fn simple_assignment_round_trips() {
        roundtrips_idempotently("$rewsna = -42");
    }

    #[test]
    fn operator_precedence_round_trips() {
        roundtrips_idempotently(r#"test "t1" { int64ptr => 3 * 12 + 4, }"#);
    }

    #[test]
    fn class_include_round_trips() {
        roundtrips_idempotently(
            r#"
class c1($x int) {
  $y = $x + 1
}
include c1(5)
"#,
        );
    }

    #[test]
    fn send_recv_edge_round_trips() {
        roundtrips_idempotently(
            r#"
test "t1" { int64ptr => 42, }
test "t2" { int64ptr => 13, }
Test["t1"].foosend -> Test["t2"].barrecv
"#,
        );
    }

    #[test]
    fn if_for_forkv_round_trip() {
        roundtrips_idempotently(
            r#"
if true {
  $a = 1
} else {
  $a = 2
}
for $i, $v in [1, 2, 3] {
  $b = $v
}
forkv $k, $v in map{"a" => 1} {
  $c = $v
}
"#,
        );
    }

    #[test]
    fn string_escapes_round_trip() {
        roundtrips_idempotently(r#"$s = "a\nb\tc\\d\"e""#);
    }

    #[test]
    fn collect_round_trips() {
        roundtrips_idempotently(r#"collect file $name { path => "/tmp", }"#);
    }
}
