//! `Prog.Output()` / `Res.Output()`: materializes resources
//! and edges through the embedder-supplied [`ResourceRegistry`]/
//! [`FieldNameMap`] collaborators, modeled on `mcl_scope::import::Downloader`'s
//! narrow-trait pattern.
//!
//! This crate has no interpreter (`mcl_typeck`'s design note applies here
//! too): only statements whose name/field/condition/container expressions
//! are literal constants can be materialized. A `Res` field, `If` branch,
//! or `For`/`ForKv` container that depends on a `Call`/`Var` at `Output()`
//! time is left to a runtime reactive engine outside this crate's scope —
//! `output_prog` silently skips rather than erroring on it, since it isn't
//! one of the three documented output failures (missing field, type
//! mismatch, overflow).

use mcl_diagnostic::{Diagnostic, ErrorCode, Result};
use mcl_ir::ast::{EdgeHalf, EdgeMetaKind, Prog, ResEntry, Stmt, StmtKind};
use mcl_ir::{Expr, StringInterner};
use mcl_types::{Type, Value};
use rustc_hash::FxHashMap;

/// `ResourceRegistry.new_named(kind, name) → Resource`,
/// plus the structural field assignment §4.7 describes as "reflection-
/// equivalent": since this crate's [`Type`] has no notion of destination
/// integer width, the embedder (which owns the real resource structs and
/// therefore their field widths) performs the assignment and reports back
/// whether it was a type mismatch or an overflow.
pub trait ResourceRegistry {
    type Resource;

    fn new_named(&self, kind: &str, name: &str) -> Result<Self::Resource>;

    fn set_field(&self, resource: &mut Self::Resource, field: &str, value: &Value) -> std::result::Result<(), FieldAssignError>;
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FieldAssignError {
    TypeMismatch,
    Overflow,
}

/// `FieldNameMap(kind) → {lang_name → (field_name, field_type)}`.
/// `field_type` is advisory only here (used for a cheap mismatch
/// pre-check before calling into the registry); the registry's `set_field`
/// is the final word.
pub trait FieldNameMap {
    fn fields(&self, kind: &str) -> FxHashMap<String, (String, Type)>;
}

/// One `Edge(kind1,name1,kind2,name2,send?,recv?,notify)` quad.
#[derive(Clone, Debug)]
pub struct EdgeQuad {
    pub kind1: String,
    pub name1: String,
    pub kind2: String,
    pub name2: String,
    pub send: bool,
    pub recv: bool,
    pub notify: bool,
}

pub struct ProgOutput<R> {
    pub resources: Vec<R>,
    pub edges: Vec<EdgeQuad>,
}

#[tracing::instrument(level = "debug", skip_all)]
pub fn output_prog<R: ResourceRegistry>(
    prog: &Prog,
    registry: &R,
    fields: &dyn FieldNameMap,
    interner: &StringInterner,
) -> Result<ProgOutput<R::Resource>> {
    let mut out = ProgOutput { resources: Vec::new(), edges: Vec::new() };
    output_stmts(&prog.body, registry, fields, interner, &mut out)?;
    Ok(out)
}

fn output_stmts<R: ResourceRegistry>(
    stmts: &[Stmt],
    registry: &R,
    fields: &dyn FieldNameMap,
    interner: &StringInterner,
    out: &mut ProgOutput<R::Resource>,
) -> Result<()> {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Res { kind, name, entries, .. } => {
                output_res(kind, name, entries, registry, fields, interner, out)?;
            }
            StmtKind::Edge { chain } => output_edge_chain(chain, out),
            StmtKind::If { cond, then_branch, else_branch } => match fold_bool(cond) {
                Some(true) => output_stmts(then_branch, registry, fields, interner, out)?,
                Some(false) => output_stmts(else_branch, registry, fields, interner, out)?,
                None => {}
            },
            StmtKind::For { container, body, .. } => {
                if let Some(Value::List(items)) = fold_const(container) {
                    for _item in items {
                        output_stmts(body, registry, fields, interner, out)?;
                    }
                }
            }
            StmtKind::ForKv { container, body, .. } => {
                if let Some(Value::Map(entries)) = fold_const(container) {
                    for _entry in entries {
                        output_stmts(body, registry, fields, interner, out)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn output_res<R: ResourceRegistry>(
    kind: &Expr,
    name: &Expr,
    entries: &[ResEntry],
    registry: &R,
    fields: &dyn FieldNameMap,
    interner: &StringInterner,
    out: &mut ProgOutput<R::Resource>,
) -> Result<()> {
    let Some(Value::Str(kind_str)) = fold_const(kind) else {
        return Ok(());
    };
    let names = match fold_const(name) {
        Some(Value::Str(s)) => vec![s],
        Some(Value::List(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::Str(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => return Ok(()),
    };
    let field_map = fields.fields(&kind_str);
    for name_str in names {
        let mut resource = registry.new_named(&kind_str, &name_str)?;
        for entry in entries {
            match entry {
                ResEntry::Field { name: field_name, cond, value, span } => {
                    if matches!(cond, Some(c) if fold_bool(c) != Some(true)) {
                        continue;
                    }
                    let Some(value) = fold_const(value) else {
                        continue;
                    };
                    let field_text = interner.resolve(*field_name);
                    let Some((struct_field, _expected_type)) = field_map.get(field_text) else {
                        return Err(Diagnostic::new(
                            ErrorCode::OutputUnknownField,
                            format!("resource {kind_str:?} has no field named {field_text:?}"),
                            Some(*span),
                        ));
                    };
                    registry.set_field(&mut resource, struct_field, &value).map_err(|e| match e {
                        FieldAssignError::TypeMismatch => Diagnostic::new(
                            ErrorCode::OutputTypeMismatch,
                            format!("field {field_text:?} of resource kind {kind_str:?} rejected the assigned value"),
                            Some(*span),
                        ),
                        FieldAssignError::Overflow => Diagnostic::new(
                            ErrorCode::OutputOverflow,
                            format!("field {field_text:?} of resource kind {kind_str:?} overflowed"),
                            Some(*span),
                        ),
                    })?;
                }
                ResEntry::EdgeMeta { meta, cond, half, .. } => {
                    if matches!(cond, Some(c) if fold_bool(c) != Some(true)) {
                        continue;
                    }
                    if let (Some(Value::Str(kind2)), Some(Value::Str(name2))) =
                        (fold_const(&half.kind), fold_const(&half.name))
                    {
                        out.edges.push(EdgeQuad {
                            kind1: kind_str.clone(),
                            name1: name_str.clone(),
                            kind2,
                            name2,
                            send: half.send.is_some(),
                            recv: half.recv.is_some(),
                            notify: edge_meta_notifies(*meta),
                        });
                    }
                }
                ResEntry::MetaProp { .. } | ResEntry::MetaStruct { .. } => {}
            }
        }
        out.resources.push(resource);
    }
    Ok(())
}

fn output_edge_chain<R>(chain: &[EdgeHalf], out: &mut ProgOutput<R>) {
    for pair in chain.windows(2) {
        let [a, b] = pair else { continue };
        let (Some(Value::Str(kind1)), Some(Value::Str(name1))) = (fold_const(&a.kind), fold_const(&a.name)) else {
            continue;
        };
        let (Some(Value::Str(kind2)), Some(Value::Str(name2))) = (fold_const(&b.kind), fold_const(&b.name)) else {
            continue;
        };
        let is_send_recv = a.send.is_some() && b.recv.is_some();
        out.edges.push(EdgeQuad {
            kind1,
            name1,
            kind2,
            name2,
            send: a.send.is_some(),
            recv: b.recv.is_some(),
            // A send/recv edge always also notifies; a plain
            // `Before`-chain arrow with no send/recv halves doesn't.
            notify: is_send_recv,
        });
    }
}

/// The `EdgeMeta` forms (`Before`/`After`/`Notify`/`Listen`) produce their
/// own quad rather than joining the plain chain walk above; `Notify`/
/// `Listen` set `notify`, `Before`/`After` (aliasing `Depend`) don't
///.
pub fn edge_meta_notifies(meta: EdgeMetaKind) -> bool {
    matches!(meta, EdgeMetaKind::Notify | EdgeMetaKind::Listen)
}

fn fold_bool(expr: &Expr) -> Option<bool> {
    match fold_const(expr)? {
        Value::Bool(b) => Some(b),
        _ => None,
    }
}

/// Folds a literal expression to its [`Value`]. Only the literal shapes
/// (`Bool`, `Int`, `Float`, `Str`, and composites built purely from them)
/// are foldable; `Var`/`Call`/`Func` and an `If` with a non-literal
/// condition are not (see the module doc for why that's deliberate, not a
/// gap to fix later).
fn fold_const(expr: &Expr) -> Option<Value> {
    mcl_stack::ensure_sufficient_stack(|| fold_const_inner(expr))
}

fn fold_const_inner(expr: &Expr) -> Option<Value> {
    use mcl_ir::ExprKind;
    match &expr.kind {
        ExprKind::Bool(b) => Some(Value::Bool(*b)),
        ExprKind::Int(i) => Some(Value::Int(*i)),
        ExprKind::Float(f) => Some(Value::Float(*f)),
        ExprKind::Str(s) => Some(Value::Str(s.clone())),
        ExprKind::List(items) => items.iter().map(fold_const).collect::<Option<Vec<_>>>().map(Value::List),
        ExprKind::Map(entries) => entries
            .iter()
            .map(|e| Some((fold_const(&e.key)?, fold_const(&e.value)?)))
            .collect::<Option<Vec<_>>>()
            .map(Value::Map),
        ExprKind::Struct(fields) => fields
            .iter()
            .map(|f| Some((f.name, fold_const(&f.value)?)))
            .collect::<Option<FxHashMap<_, _>>>()
            .map(Value::Struct),
        ExprKind::If(if_expr) => match fold_bool(&if_expr.cond)? {
            true => fold_const(&if_expr.then_branch),
            false => fold_const(&if_expr.else_branch),
        },
        ExprKind::Var(_) | ExprKind::Call(_) | ExprKind::Func(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcl_ir::ast::{EdgeMetaKind, ResEntry};
    use mcl_ir::{Name, NodeId, Span};
    use std::cell::RefCell;

    struct FakeRegistry;

    impl ResourceRegistry for FakeRegistry {
        type Resource = FxHashMap<String, Value>;

        fn new_named(&self, _kind: &str, _name: &str) -> Result<Self::Resource> {
            Ok(FxHashMap::default())
        }

        fn set_field(
            &self,
            resource: &mut Self::Resource,
            field: &str,
            value: &Value,
        ) -> std::result::Result<(), FieldAssignError> {
            resource.insert(field.to_string(), value.clone());
            Ok(())
        }
    }

    struct FakeFieldMap {
        fields: RefCell<FxHashMap<String, FxHashMap<String, (String, Type)>>>,
    }

    impl FieldNameMap for FakeFieldMap {
        fn fields(&self, kind: &str) -> FxHashMap<String, (String, Type)> {
            self.fields.borrow().get(kind).cloned().unwrap_or_default()
        }
    }

    fn str_expr(id: u32, s: &str) -> Expr {
        Expr {
            id: NodeId::from_raw(id),
            span: Span::DUMMY,
            kind: mcl_ir::ExprKind::Str(s.to_string()),
            type_ann: None,
        }
    }

    fn bool_expr(id: u32, b: bool) -> Expr {
        Expr {
            id: NodeId::from_raw(id),
            span: Span::DUMMY,
            kind: mcl_ir::ExprKind::Bool(b),
            type_ann: None,
        }
    }

    #[test]
    fn known_field_populates_resource() {
        let mut interner = mcl_ir::StringInterner::new();
        let bar = interner.intern("bar");
        let mut kind_map = FxHashMap::default();
        kind_map.insert("bar".to_string(), ("bar_field".to_string(), Type::Bool));
        let mut fields = FxHashMap::default();
        fields.insert("test".to_string(), kind_map);
        let field_map = FakeFieldMap { fields: RefCell::new(fields) };

        let entries = vec![ResEntry::Field {
            name: bar,
            cond: None,
            value: bool_expr(1, false),
            span: Span::DUMMY,
        }];
        let mut out = ProgOutput { resources: Vec::new(), edges: Vec::new() };
        output_res(
            &str_expr(2, "test"),
            &str_expr(3, "t1"),
            &entries,
            &FakeRegistry,
            &field_map,
            &interner,
            &mut out,
        )
        .unwrap_or_else(|e| panic!("output_res failed: {e}"));

        assert_eq!(out.resources.len(), 1);
        assert_eq!(out.resources[0].get("bar_field"), Some(&Value::Bool(false)));
    }

    #[test]
    fn unknown_field_is_a_fatal_output_error() {
        let mut interner = mcl_ir::StringInterner::new();
        let bogus = interner.intern("nope");
        let field_map = FakeFieldMap { fields: RefCell::new(FxHashMap::default()) };

        let entries = vec![ResEntry::Field {
            name: bogus,
            cond: None,
            value: bool_expr(1, true),
            span: Span::DUMMY,
        }];
        let mut out = ProgOutput { resources: Vec::new(), edges: Vec::new() };
        let err = output_res(
            &str_expr(2, "test"),
            &str_expr(3, "t1"),
            &entries,
            &FakeRegistry,
            &field_map,
            &interner,
            &mut out,
        )
        .expect_err("unknown field name must fail");

        assert_eq!(err.code, ErrorCode::OutputUnknownField);
    }

    #[test]
    fn edge_meta_notify_sets_the_notify_flag() {
        assert!(edge_meta_notifies(EdgeMetaKind::Notify));
        assert!(edge_meta_notifies(EdgeMetaKind::Listen));
        assert!(!edge_meta_notifies(EdgeMetaKind::Before));
        assert!(!edge_meta_notifies(EdgeMetaKind::After));
    }

    #[test]
    fn non_literal_field_value_is_silently_skipped_not_errored() {
        let interner = mcl_ir::StringInterner::new();
        let field_map = FakeFieldMap { fields: RefCell::new(FxHashMap::default()) };
        let var_value = Expr {
            id: NodeId::from_raw(9),
            span: Span::DUMMY,
            kind: mcl_ir::ExprKind::Var(Name::from_raw(1)),
            type_ann: None,
        };
        let entries = vec![ResEntry::Field {
            name: Name::from_raw(1),
            cond: None,
            value: var_value,
            span: Span::DUMMY,
        }];
        let mut out = ProgOutput { resources: Vec::new(), edges: Vec::new() };
        output_res(
            &str_expr(2, "test"),
            &str_expr(3, "t1"),
            &entries,
            &FakeRegistry,
            &field_map,
            &interner,
            &mut out,
        )
        .unwrap_or_else(|e| panic!("should not error: {e}"));

        assert_eq!(out.resources.len(), 1);
        assert!(out.resources[0].is_empty());
    }
}
