//! The [`Value`] data model.

use crate::ty::Type;
use mcl_ir::Name;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::fmt;

/// A runtime value. Mirrors every non-function [`Type`] kind plus `Func`
/// (callable) and `Variant` (wraps any other value, used where the static
/// type is `Type::Variant`).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Struct(FxHashMap<Name, Value>),
    Func(FuncValue),
    Variant(Box<Value>),
}

impl Value {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Str(_) => Type::Str,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::List(items) => {
                let elem = items.first().map_or(Type::Variant, Value::type_of);
                Type::List(Box::new(elem))
            }
            Value::Map(entries) => {
                let (key, val) = entries
                    .first()
                    .map_or((Type::Variant, Type::Variant), |(k, v)| (k.type_of(), v.type_of()));
                Type::Map(Box::new(key), Box::new(val))
            }
            Value::Struct(fields) => {
                let mut ord: Vec<Name> = fields.keys().copied().collect();
                ord.sort_by_key(Name::raw);
                let fields = fields.clone();
                Type::Struct { ord, fields: fields.into_iter().map(|(n, v)| (n, v.type_of())).collect() }
            }
            Value::Func(f) => f.type_of(),
            Value::Variant(_) => Type::Variant,
        }
    }

    /// Structural equality comparison. Returns a
    /// [`ValueError`] when the two values have incomparable shapes (e.g.
    /// comparing a `Str` to an `Int`), rather than silently returning
    /// `false`.
    pub fn cmp(&self, other: &Value) -> Result<bool, ValueError> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Float(a), Value::Float(b)) => Ok(a == b),
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.cmp(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Map(a), Value::Map(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (ak, av) in a {
                    let Some((_, bv)) = b.iter().find(|(bk, _)| ak.cmp(bk).unwrap_or(false)) else {
                        return Ok(false);
                    };
                    if !av.cmp(bv)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Struct(a), Value::Struct(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (name, av) in a {
                    let Some(bv) = b.get(name) else {
                        return Ok(false);
                    };
                    if !av.cmp(bv)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Variant(a), Value::Variant(b)) => a.cmp(b),
            (Value::Variant(a), b) | (b, Value::Variant(a)) => a.cmp(b),
            _ => Err(ValueError::Incomparable {
                left: self.type_of(),
                right: other.type_of(),
            }),
        }
    }

    /// Ordering comparison. Only the scalar
    /// orderable kinds (`Int`, `Float`, `Str`, `Bool`) support ordering;
    /// containers and functions are not orderable.
    pub fn less(&self, other: &Value) -> Result<bool, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a < b),
            (Value::Float(a), Value::Float(b)) => Ok(a.partial_cmp(b) == Some(Ordering::Less)),
            (Value::Str(a), Value::Str(b)) => Ok(a < b),
            (Value::Bool(a), Value::Bool(b)) => Ok(!*a && *b),
            (Value::Variant(a), b) => a.less(b),
            (a, Value::Variant(b)) => a.less(b),
            _ => Err(ValueError::NotOrderable(self.type_of())),
        }
    }

    /// Deep copy. `Value` already owns its data,
    /// so this is a plain `Clone`; kept as a named method because the
    /// reactive graph lowering (`mcl_graph`) calls it explicitly at the
    /// points the original design calls out copy-on-use semantics for
    /// included/replayed sub-programs.
    pub fn copy(&self) -> Value {
        self.clone()
    }
}

/// A callable value.
///
/// Two capability variants, dispatched on by higher-order built-ins:
/// - [`FuncKind::Simple`] is a plain value-to-value built-in.
/// - [`FuncKind::Graph`] instead receives dataflow node ids and wires
///   them directly into the reactive graph; used by built-ins like
///   `map`/`filter` that must produce new graph nodes rather than a
///   single scalar result. Neither variant carries an executable body in
///   this crate: running one is the execution engine's job (out of
///   scope for a front end), so a `FuncValue` here is purely the typed
///   signature plus a `FuncKind` tag the external `FunctionLookup`
///   collaborator (see `mclc`) resolves to an actual implementation.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncValue {
    pub name: Name,
    pub ord: Vec<Name>,
    pub args: FxHashMap<Name, Type>,
    pub out: Box<Type>,
    pub kind: FuncKind,
}

impl FuncValue {
    pub fn type_of(&self) -> Type {
        Type::Func {
            ord: self.ord.clone(),
            args: self.args.clone(),
            out: self.out.clone(),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FuncKind {
    Simple,
    Graph,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueError {
    Incomparable { left: Type, right: Type },
    NotOrderable(Type),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::Incomparable { left, right } => {
                write!(f, "cannot compare {left:?} with {right:?}")
            }
            ValueError::NotOrderable(ty) => write!(f, "{ty:?} does not support ordering"),
        }
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_of_scalars() {
        assert_eq!(Value::Int(1).type_of(), Type::Int);
        assert_eq!(Value::Str("x".into()).type_of(), Type::Str);
        assert_eq!(Value::Bool(true).type_of(), Type::Bool);
    }

    #[test]
    fn type_of_list_uses_first_element() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.type_of(), Type::List(Box::new(Type::Int)));
    }

    #[test]
    fn empty_list_types_as_variant_element() {
        let list = Value::List(vec![]);
        assert_eq!(list.type_of(), Type::List(Box::new(Type::Variant)));
    }

    #[test]
    fn cmp_rejects_mismatched_kinds() {
        let err = Value::Int(1).cmp(&Value::Str("1".into())).unwrap_err();
        assert!(matches!(err, ValueError::Incomparable { .. }));
    }

    #[test]
    fn cmp_compares_lists_elementwise() {
        let a = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(a.cmp(&b), Ok(true));
    }

    #[test]
    fn less_orders_scalars() {
        assert_eq!(Value::Int(1).less(&Value::Int(2)), Ok(true));
        assert_eq!(Value::Str("a".into()).less(&Value::Str("b".into())), Ok(true));
    }

    #[test]
    fn less_rejects_containers() {
        let a = Value::List(vec![]);
        let b = Value::List(vec![]);
        assert!(a.less(&b).is_err());
    }

    #[test]
    fn copy_is_a_deep_clone() {
        let a = Value::List(vec![Value::Int(1)]);
        let b = a.copy();
        assert_eq!(a, b);
    }
}
