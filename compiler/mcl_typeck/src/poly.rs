//! The `Polymorphisms` capability: ad-hoc polymorphic
//! built-ins (operators, `len`, `collect`, ...) hand the solver every
//! signature that's still compatible with what's known about a call site
//! so far, rather than a single fixed type.

use mcl_ir::Name;
use mcl_types::{FuncValue, Type, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Implemented by whatever owns the built-in function table (`mclc`'s
/// `FunctionLookup`, in the full pipeline). `partial_type` is the call's
/// current best guess at its own signature (built from whatever of its
/// args/out are already ground); `partial_values` carries a constant
/// alongside each argument position that is a literal, so operators can
/// prune on the operator string itself (e.g. `"+"` vs `"=="`): operators
/// exploit both argument types and the literal operator string to prune
/// alternatives.
pub trait Polymorphisms {
    fn polymorphisms(&self, name: Name, partial_type: &Type, partial_values: &[Option<Value>]) -> Vec<FuncValue>;
}

/// Wraps a [`Polymorphisms`] source with memoization: built-in signature
/// sets are pure functions of `(name, partial_type, partial_values)`, so
/// repeated lookups at
/// different call sites with the same partial knowledge can share one
/// answer instead of re-deriving it.
pub struct MemoizedPolymorphisms<P> {
    inner: P,
    cache: RefCell<FxHashMap<(Name, String, String), Vec<FuncValue>>>,
}

impl<P: Polymorphisms> MemoizedPolymorphisms<P> {
    pub fn new(inner: P) -> Self {
        MemoizedPolymorphisms {
            inner,
            cache: RefCell::new(FxHashMap::default()),
        }
    }
}

impl<P: Polymorphisms> Polymorphisms for MemoizedPolymorphisms<P> {
    fn polymorphisms(&self, name: Name, partial_type: &Type, partial_values: &[Option<Value>]) -> Vec<FuncValue> {
        let fingerprint = (name, format!("{partial_type:?}"), format!("{partial_values:?}"));
        if let Some(hit) = self.cache.borrow().get(&fingerprint) {
            return hit.clone();
        }
        let result = self.inner.polymorphisms(name, partial_type, partial_values);
        self.cache.borrow_mut().insert(fingerprint, result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<u32>,
    }

    impl Polymorphisms for CountingSource {
        fn polymorphisms(&self, name: Name, _partial_type: &Type, _partial_values: &[Option<Value>]) -> Vec<FuncValue> {
            self.calls.set(self.calls.get() + 1);
            vec![FuncValue {
                name,
                ord: vec![],
                args: FxHashMap::default(),
                out: Box::new(Type::Bool),
                kind: mcl_types::FuncKind::Simple,
            }]
        }
    }

    #[test]
    fn repeated_lookups_with_identical_inputs_hit_the_cache() {
        let source = MemoizedPolymorphisms::new(CountingSource { calls: Cell::new(0) });
        let name = Name::from_raw(1);
        let ty = Type::Variant;
        source.polymorphisms(name, &ty, &[]);
        source.polymorphisms(name, &ty, &[]);
        assert_eq!(source.inner.calls.get(), 1);
    }

    #[test]
    fn distinct_partial_types_miss_the_cache() {
        let source = MemoizedPolymorphisms::new(CountingSource { calls: Cell::new(0) });
        let name = Name::from_raw(1);
        source.polymorphisms(name, &Type::Variant, &[]);
        source.polymorphisms(name, &Type::Bool, &[]);
        assert_eq!(source.inner.calls.get(), 2);
    }
}
