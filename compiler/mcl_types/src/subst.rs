//! Union-find substitution over unification variables
//! (`Unification(elem: UnionFindCell)`).
//!
//! Cells are allocated with a monotonically increasing id so the solver
//! can iterate in id order for reproducible results across identical
//! programs. Mutated only during a solve; frozen (read-only) afterwards.

use crate::ty::Type;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct UnificationVar(u32);

impl UnificationVar {
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Builds a variable carrying `display_index - 1` as its raw id, for
    /// round-tripping the `?N` canonical type syntax. Never registered in
    /// any live [`Substitution`]; see `Type::parse_canonical`.
    pub const fn from_display_index(display_index: u32) -> Self {
        UnificationVar(display_index - 1)
    }
}

#[derive(Clone, Debug)]
enum Cell {
    /// Not yet bound; points at its own union-find parent or another cell.
    Root,
    Parent(u32),
    Bound(Type),
}

/// A union-find substitution: every unification variable is either its
/// own representative, points at another variable it was unified with, or
/// has been bound to a concrete [`Type`].
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    cells: Vec<Cell>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution { cells: Vec::new() }
    }

    /// Allocates a fresh, unbound unification variable.
    pub fn fresh(&mut self) -> UnificationVar {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX live unification variables is unreachable in practice"
        )]
        let id = self.cells.len() as u32;
        self.cells.push(Cell::Root);
        UnificationVar(id)
    }

    /// Finds the representative cell for `v`, compressing the path.
    pub fn find(&mut self, v: UnificationVar) -> UnificationVar {
        match self.cells[v.0 as usize] {
            Cell::Parent(parent) => {
                let root = self.find(UnificationVar(parent));
                self.cells[v.0 as usize] = Cell::Parent(root.0);
                root
            }
            Cell::Root | Cell::Bound(_) => v,
        }
    }

    /// The concrete type bound to `v`'s representative, if any.
    pub fn binding(&mut self, v: UnificationVar) -> Option<Type> {
        let root = self.find(v);
        match &self.cells[root.0 as usize] {
            Cell::Bound(ty) => Some(ty.clone()),
            _ => None,
        }
    }

    /// Binds `v`'s representative to `ty`. Overwrites any prior binding;
    /// callers (the `mcl_typeck` solver) are responsible for checking
    /// consistency with an existing binding before calling this.
    pub fn bind(&mut self, v: UnificationVar, ty: Type) {
        let root = self.find(v);
        self.cells[root.0 as usize] = Cell::Bound(ty);
    }

    /// Unifies two cells so they share one representative. If both have
    /// bindings, the caller must reconcile them; this only merges the
    /// union-find structure, preferring `a`'s representative (lower id
    /// first, for determinism).
    pub fn union(&mut self, a: UnificationVar, b: UnificationVar) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (keep, drop) = if ra.0 <= rb.0 { (ra, rb) } else { (rb, ra) };
        if let Cell::Bound(ty) = self.cells[drop.0 as usize].clone() {
            if !matches!(self.cells[keep.0 as usize], Cell::Bound(_)) {
                self.cells[keep.0 as usize] = Cell::Bound(ty);
            }
        }
        self.cells[drop.0 as usize] = Cell::Parent(keep.0);
    }

    /// Resolves `ty` one layer: if it is a bound `Unification` variable,
    /// returns its binding; otherwise returns `ty` unchanged. Does not
    /// recurse into container element types.
    pub fn resolve_shallow(&mut self, ty: &Type) -> Type {
        let mut current = ty.clone();
        while let Type::Unification(v) = current {
            match self.binding(v) {
                Some(bound) => current = bound,
                None => return Type::Unification(self.find(v)),
            }
        }
        current
    }

    /// Resolves `ty` and every nested type it contains.
    pub fn resolve_deep(&mut self, ty: &Type) -> Type {
        let shallow = self.resolve_shallow(ty);
        match shallow {
            Type::List(elem) => Type::List(Box::new(self.resolve_deep(&elem))),
            Type::Map(key, val) => {
                Type::Map(Box::new(self.resolve_deep(&key)), Box::new(self.resolve_deep(&val)))
            }
            Type::Struct { ord, fields } => {
                let fields = fields
                    .into_iter()
                    .map(|(name, ty)| (name, self.resolve_deep(&ty)))
                    .collect();
                Type::Struct { ord, fields }
            }
            Type::Func { ord, args, out } => {
                let args = args
                    .into_iter()
                    .map(|(name, ty)| (name, self.resolve_deep(&ty)))
                    .collect();
                Type::Func {
                    ord,
                    args,
                    out: Box::new(self.resolve_deep(&out)),
                }
            }
            other => other,
        }
    }

    /// How many cells currently carry a concrete binding. Used by the
    /// `Exclusive` tie-break rule to measure how many new
    /// bindings a candidate alternative would introduce: the caller diffs
    /// this count before and after a trial application.
    pub fn bound_count(&self) -> usize {
        self.cells.iter().filter(|c| matches!(c, Cell::Bound(_))).count()
    }

    /// Whether `ty` still contains an unbound unification variable after
    /// the deepest available resolution (used to detect `UnifyAmbiguous`).
    pub fn is_ground(&mut self, ty: &Type) -> bool {
        match self.resolve_deep(ty) {
            Type::Unification(_) => false,
            Type::List(elem) => self.is_ground(&elem),
            Type::Map(key, val) => self.is_ground(&key) && self.is_ground(&val),
            Type::Struct { fields, .. } => fields.values().all(|t| self.is_ground(t)),
            Type::Func { args, out, .. } => {
                args.values().all(|t| self.is_ground(t)) && self.is_ground(&out)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_merges_representatives() {
        let mut s = Substitution::new();
        let a = s.fresh();
        let b = s.fresh();
        assert_ne!(s.find(a), s.find(b));
        s.union(a, b);
        assert_eq!(s.find(a), s.find(b));
    }

    #[test]
    fn bind_is_visible_through_union() {
        let mut s = Substitution::new();
        let a = s.fresh();
        let b = s.fresh();
        s.union(a, b);
        s.bind(a, Type::Int);
        assert_eq!(s.binding(b), Some(Type::Int));
    }

    #[test]
    fn resolve_deep_substitutes_nested_cells() {
        let mut s = Substitution::new();
        let elem = s.fresh();
        let list = Type::List(Box::new(Type::Unification(elem)));
        s.bind(elem, Type::Str);
        assert_eq!(s.resolve_deep(&list), Type::List(Box::new(Type::Str)));
    }

    #[test]
    fn is_ground_detects_unbound_cells() {
        let mut s = Substitution::new();
        let v = s.fresh();
        assert!(!s.is_ground(&Type::Unification(v)));
        s.bind(v, Type::Bool);
        assert!(s.is_ground(&Type::Unification(v)));
    }
}
