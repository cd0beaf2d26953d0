//! [`Scope`]: the (variables, classes, functions, chain) environment
//! threaded through `set_scope`.

use mcl_ir::{Expr, Name, NodeId, Param, Stmt};
use rustc_hash::FxHashMap;

/// An unresolved class body: stored as written, inheriting the scope in
/// effect at its `include` site rather than the one in effect at its
/// declaration.
#[derive(Clone)]
pub struct ClassDef {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// `(variables, classes, functions, chain)`.
///
/// Scopes are immutable snapshots: every descent clones the parent and
/// extends the clone, the same way `ArcScope` threads lexical scope through
/// IR lowering — cloning a handful of `FxHashMap`s is cheap next to the
/// work of walking the subtree they're attached to.
#[derive(Clone, Default)]
pub struct Scope {
    variables: FxHashMap<Name, Expr>,
    classes: FxHashMap<Name, ClassDef>,
    functions: FxHashMap<Name, Expr>,
    /// Ids of the `Include` statements (or their copies) processed on the
    /// path from the program root down to here, used to detect recursion.
    chain: Vec<NodeId>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn bind_variable(&mut self, name: Name, value: Expr) {
        self.variables.insert(name, value);
    }

    pub fn has_variable(&self, name: Name) -> bool {
        self.variables.contains_key(&name)
    }

    pub fn lookup_variable(&self, name: Name) -> Option<&Expr> {
        self.variables.get(&name)
    }

    pub fn bind_function(&mut self, name: Name, signature: Expr) {
        self.functions.insert(name, signature);
    }

    pub fn has_function(&self, name: Name) -> bool {
        self.functions.contains_key(&name)
    }

    pub fn lookup_function(&self, name: Name) -> Option<&Expr> {
        self.functions.get(&name)
    }

    pub fn declare_class(&mut self, name: Name, def: ClassDef) {
        self.classes.insert(name, def);
    }

    pub fn has_class(&self, name: Name) -> bool {
        self.classes.contains_key(&name)
    }

    pub fn lookup_class(&self, name: Name) -> Option<&ClassDef> {
        self.classes.get(&name)
    }

    pub fn chain(&self) -> &[NodeId] {
        &self.chain
    }

    pub fn push_chain(&mut self, id: NodeId) {
        self.chain.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcl_ir::{ExprKind, Span};

    fn dummy_expr() -> Expr {
        Expr {
            id: NodeId::DUMMY,
            span: Span::DUMMY,
            kind: ExprKind::Bool(true),
            type_ann: None,
        }
    }

    #[test]
    fn child_scope_inherits_but_does_not_leak_back() {
        let mut parent = Scope::new();
        parent.bind_variable(Name::from_raw(1), dummy_expr());

        let mut child = parent.clone();
        assert!(child.has_variable(Name::from_raw(1)));
        child.bind_variable(Name::from_raw(2), dummy_expr());

        assert!(!parent.has_variable(Name::from_raw(2)));
    }

    #[test]
    fn chain_records_include_lineage() {
        let mut scope = Scope::new();
        scope.push_chain(NodeId::from_raw(3));
        assert_eq!(scope.chain(), &[NodeId::from_raw(3)]);
    }
}
