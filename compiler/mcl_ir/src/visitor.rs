//! A walking visitor over the AST.
//!
//! Each stage that needs to traverse the whole tree (scope resolution,
//! the interpolator's rewrite pass, graph lowering) implements [`Visitor`]
//! and overrides only the node kinds it cares about; the default method
//! bodies call the matching `walk_*` free function so an override that
//! still wants to visit children can call `walk_expr(self, expr)` etc.

use crate::ast::{
    CallExpr, EdgeHalf, Expr, ExprKind, FuncLit, IfExpr, MapEntry, Prog, ResEntry, Stmt, StmtKind,
    StructField,
};

pub trait Visitor: Sized {
    fn visit_prog(&mut self, prog: &Prog) {
        walk_prog(self, prog);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_prog<V: Visitor>(v: &mut V, prog: &Prog) {
    for stmt in &prog.body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Bind { value, .. } => v.visit_expr(value),
        StmtKind::Res {
            kind, name, entries, ..
        } => {
            v.visit_expr(kind);
            v.visit_expr(name);
            for entry in entries {
                walk_res_entry(v, entry);
            }
        }
        StmtKind::Edge { chain } => {
            for half in chain {
                walk_edge_half(v, half);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            v.visit_expr(cond);
            for s in then_branch {
                v.visit_stmt(s);
            }
            for s in else_branch {
                v.visit_stmt(s);
            }
        }
        StmtKind::For {
            container, body, ..
        }
        | StmtKind::ForKv {
            container, body, ..
        } => {
            v.visit_expr(container);
            for s in body {
                v.visit_stmt(s);
            }
        }
        StmtKind::FuncDecl { body, .. } => v.visit_expr(body),
        StmtKind::Class { body, .. } => {
            for s in body {
                v.visit_stmt(s);
            }
        }
        StmtKind::Include { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        StmtKind::Panic { cond } => v.visit_expr(cond),
        StmtKind::Import { .. } | StmtKind::Comment(_) => {}
    }
}

fn walk_res_entry<V: Visitor>(v: &mut V, entry: &ResEntry) {
    match entry {
        ResEntry::Field { cond, value, .. } => {
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            v.visit_expr(value);
        }
        ResEntry::EdgeMeta { cond, half, .. } => {
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            walk_edge_half(v, half);
        }
        ResEntry::MetaProp { value, .. } => v.visit_expr(value),
        ResEntry::MetaStruct { cond, value, .. } => {
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            v.visit_expr(value);
        }
    }
}

fn walk_edge_half<V: Visitor>(v: &mut V, half: &EdgeHalf) {
    v.visit_expr(&half.kind);
    v.visit_expr(&half.name);
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Bool(_) | ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_) => {}
        ExprKind::List(items) => {
            for item in items {
                v.visit_expr(item);
            }
        }
        ExprKind::Map(entries) => {
            for MapEntry { key, value } in entries {
                v.visit_expr(key);
                v.visit_expr(value);
            }
        }
        ExprKind::Struct(fields) => {
            for StructField { value, .. } in fields {
                v.visit_expr(value);
            }
        }
        ExprKind::Var(_) => {}
        ExprKind::Call(CallExpr { args, .. }) => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Func(FuncLit { body, .. }) => v.visit_expr(body),
        ExprKind::If(IfExpr {
            cond,
            then_branch,
            else_branch,
        }) => {
            v.visit_expr(cond);
            v.visit_expr(then_branch);
            v.visit_expr(else_branch);
        }
    }
}
