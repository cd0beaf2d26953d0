//! A default built-in function table: the `Polymorphisms` source
//! `mcl_typeck::collect_invariants` consumes, plus the `FunctionLookup`/
//! `FunctionLookupPrefix` external interfaces.
//!
//! Concrete built-in function implementations are out of scope for the
//! front end — only their signature/poly contracts are consumed — so
//! this `Registry` is a *default* a pipeline driver may construct for
//! convenience, not a requirement of the front end itself. It covers
//! the operator family the test scenarios exercise plus the handful of
//! synthetic names the parser's own desugaring emits (`_lookup`,
//! `_struct_lookup`, `_contains`, `_collect`); a real embedder would
//! register many more.

use mcl_ir::{Name, StringInterner};
use mcl_types::{FuncKind, FuncValue, Type, Value};
use mcl_typeck::Polymorphisms;
use rustc_hash::FxHashMap;

/// One entry in the string-keyed introspection table the
/// `FunctionLookup`/`FunctionLookupPrefix` collaborators describe.
#[derive(Clone)]
pub struct FuncDescriptor {
    pub sig: Type,
    pub polymorphisms: Option<Vec<FuncValue>>,
}

/// `FunctionLookup(name) -> FuncDescriptor` / `FunctionLookupPrefix(prefix)
/// -> {name -> descriptor}`. Separate from `Polymorphisms`
/// (which the solver drives with interned `Name`s and partial knowledge of
/// a specific call site) — this is the by-name introspection surface a
/// CLI `explain`/diagnostics command consumes.
pub trait FunctionLookup {
    fn lookup(&self, name: &str) -> Option<FuncDescriptor>;
    fn lookup_prefix(&self, prefix: &str) -> FxHashMap<String, FuncDescriptor>;
}

struct OpNames {
    op: Name,
    a: Name,
    b: Name,
}

/// The default built-in registry. Holds the interned `Name`s of every
/// built-in it knows about so `Polymorphisms::polymorphisms` can dispatch
/// by integer comparison rather than re-resolving strings on every call.
pub struct Registry {
    operator: Name,
    lookup: Name,
    lookup_default: Name,
    struct_lookup: Name,
    struct_lookup_default: Name,
    contains: Name,
    collect: Name,
    template: Name,
    len: Name,
    names: OpNames,
    /// Pre-interned positional-argument names (`_tplarg0`, `_tplarg1`, ...)
    /// used to build `template`'s variadic signature, since `FuncValue::ord`
    /// needs a distinct `Name` per argument slot and a call site's argument
    /// count isn't known until the call is collected. Bounds variadic
    /// `template` calls to this many substituted arguments.
    template_slots: Vec<Name>,
    by_string: FxHashMap<String, FuncValue>,
}

const MAX_TEMPLATE_ARGS: usize = 64;

fn mk(ord: Vec<Name>, args: FxHashMap<Name, Type>, out: Type, name: Name) -> FuncValue {
    FuncValue {
        name,
        ord,
        args,
        out: Box::new(out),
        kind: FuncKind::Simple,
    }
}

impl Registry {
    /// Interns every built-in name this registry recognizes through
    /// `interner`, so a later call site's `Name` (interned by the same
    /// `StringInterner` during lexing) compares equal.
    pub fn new(interner: &mut StringInterner) -> Self {
        let names = OpNames {
            op: interner.intern("op"),
            a: interner.intern("a"),
            b: interner.intern("b"),
        };
        let mut registry = Registry {
            operator: interner.intern("_operator"),
            lookup: interner.intern("_lookup"),
            lookup_default: interner.intern("_lookup_default"),
            struct_lookup: interner.intern("_struct_lookup"),
            struct_lookup_default: interner.intern("_struct_lookup_default"),
            contains: interner.intern("_contains"),
            collect: interner.intern("_collect"),
            template: interner.intern("template"),
            len: interner.intern("len"),
            names,
            template_slots: (0..MAX_TEMPLATE_ARGS)
                .map(|i| interner.intern(&format!("_tplarg{i}")))
                .collect(),
            by_string: FxHashMap::default(),
        };
        registry.seed_lookup_table();
        registry
    }

    /// Populates the string-keyed introspection table with every built-in
    /// whose signature has a fixed arity (everything but `_operator`,
    /// whose shape depends on the op string, and `template`, whose arity
    /// varies per call site — both are only reachable through
    /// [`Polymorphisms::polymorphisms`] at a real call site).
    fn seed_lookup_table(&mut self) {
        let n = &self.names;
        let one_arg = |a: Name, ty: Type| {
            let mut args = FxHashMap::default();
            args.insert(a, ty);
            args
        };
        let two_arg = |op: Name, a: Name| {
            let mut args = FxHashMap::default();
            args.insert(op, Type::Variant);
            args.insert(a, Type::Variant);
            args
        };
        let three_arg = |op: Name, a: Name, b: Name| {
            let mut args = FxHashMap::default();
            args.insert(op, Type::Variant);
            args.insert(a, Type::Variant);
            args.insert(b, Type::Variant);
            args
        };

        self.by_string.insert(
            "len".to_string(),
            mk(vec![n.a], one_arg(n.a, Type::Variant), Type::Int, self.len),
        );
        self.by_string.insert(
            "_lookup".to_string(),
            mk(vec![n.op, n.a], two_arg(n.op, n.a), Type::Variant, self.lookup),
        );
        self.by_string.insert(
            "_struct_lookup".to_string(),
            mk(vec![n.op, n.a], two_arg(n.op, n.a), Type::Variant, self.struct_lookup),
        );
        self.by_string.insert(
            "_lookup_default".to_string(),
            mk(vec![n.op, n.a, n.b], three_arg(n.op, n.a, n.b), Type::Variant, self.lookup_default),
        );
        self.by_string.insert(
            "_struct_lookup_default".to_string(),
            mk(vec![n.op, n.a, n.b], three_arg(n.op, n.a, n.b), Type::Variant, self.struct_lookup_default),
        );
        self.by_string.insert(
            "_contains".to_string(),
            mk(vec![n.op, n.a], two_arg(n.op, n.a), Type::Bool, self.contains),
        );
        let mut collect_args = one_arg(n.op, Type::Str);
        collect_args.insert(n.a, Type::Variant);
        self.by_string.insert(
            "_collect".to_string(),
            mk(vec![n.op, n.a], collect_args, Type::Variant, self.collect),
        );
    }

    /// Every `_operator` signature compatible with the call's arity
    /// (`partial_values.len()`, which includes the leading op-string slot)
    /// and, once known, the literal operator string itself — operators
    /// exploit both argument types and the literal operator string to
    /// prune alternatives.
    fn operator_signatures(&self, partial_values: &[Option<Value>]) -> Vec<FuncValue> {
        let op = match partial_values.first() {
            Some(Some(Value::Str(s))) => s.as_str(),
            _ => return Vec::new(),
        };
        match (op, partial_values.len()) {
            ("+", 3) => vec![
                self.binary(self.operator, Type::Int, Type::Int, Type::Int),
                self.binary(self.operator, Type::Float, Type::Float, Type::Float),
                self.binary(self.operator, Type::Str, Type::Str, Type::Str),
            ],
            ("-" | "*" | "/", 3) => vec![
                self.binary(self.operator, Type::Int, Type::Int, Type::Int),
                self.binary(self.operator, Type::Float, Type::Float, Type::Float),
            ],
            ("-", 2) => vec![
                self.unary(self.operator, Type::Int, Type::Int),
                self.unary(self.operator, Type::Float, Type::Float),
            ],
            ("!", 2) => vec![self.unary(self.operator, Type::Bool, Type::Bool)],
            ("<" | ">" | "<=" | ">=", 3) => vec![
                self.binary(self.operator, Type::Int, Type::Int, Type::Bool),
                self.binary(self.operator, Type::Float, Type::Float, Type::Bool),
            ],
            ("==" | "!=", 3) => vec![
                self.binary(self.operator, Type::Bool, Type::Bool, Type::Bool),
                self.binary(self.operator, Type::Int, Type::Int, Type::Bool),
                self.binary(self.operator, Type::Float, Type::Float, Type::Bool),
                self.binary(self.operator, Type::Str, Type::Str, Type::Bool),
            ],
            ("&&" | "||", 3) => vec![self.binary(self.operator, Type::Bool, Type::Bool, Type::Bool)],
            _ => Vec::new(),
        }
    }

    /// `template(fmt, arg, arg, ...)`: the format string must be `str`;
    /// every substituted argument is accepted as `Type::Variant` (it's
    /// printed, not type-constrained) and the whole call is `str`. Arity
    /// varies by call site, so the signature is built to match
    /// `partial_values.len()` rather than fixed once at registration.
    fn template_signature(&self, partial_values: &[Option<Value>]) -> Vec<FuncValue> {
        if partial_values.is_empty() || partial_values.len() - 1 > self.template_slots.len() {
            return Vec::new();
        }
        let mut ord = Vec::with_capacity(partial_values.len());
        let mut args = FxHashMap::default();
        ord.push(self.names.op);
        args.insert(self.names.op, Type::Str);
        for slot in self.template_slots.iter().take(partial_values.len() - 1) {
            ord.push(*slot);
            args.insert(*slot, Type::Variant);
        }
        vec![mk(ord, args, Type::Str, self.template)]
    }

    fn fixed(&self, name: Name, ord: Vec<Name>, args: FxHashMap<Name, Type>, out: Type) -> Vec<FuncValue> {
        vec![mk(ord, args, out, name)]
    }

    fn binary(&self, name: Name, lhs: Type, rhs: Type, out: Type) -> FuncValue {
        let mut args = FxHashMap::default();
        args.insert(self.names.op, Type::Str);
        args.insert(self.names.a, lhs);
        args.insert(self.names.b, rhs);
        mk(vec![self.names.op, self.names.a, self.names.b], args, out, name)
    }

    fn unary(&self, name: Name, arg: Type, out: Type) -> FuncValue {
        let mut args = FxHashMap::default();
        args.insert(self.names.op, Type::Str);
        args.insert(self.names.a, arg);
        mk(vec![self.names.op, self.names.a], args, out, name)
    }
}

impl Polymorphisms for Registry {
    fn polymorphisms(&self, name: Name, _partial_type: &Type, partial_values: &[Option<Value>]) -> Vec<FuncValue> {
        if name == self.operator {
            return self.operator_signatures(partial_values);
        }
        if name == self.template {
            return self.template_signature(partial_values);
        }
        if name == self.len && partial_values.len() == 1 {
            let mut args = FxHashMap::default();
            args.insert(self.names.a, Type::Variant);
            return self.fixed(self.len, vec![self.names.a], args, Type::Int);
        }
        if (name == self.lookup || name == self.struct_lookup) && partial_values.len() == 2 {
            let mut args = FxHashMap::default();
            args.insert(self.names.op, Type::Variant);
            args.insert(self.names.a, Type::Variant);
            return self.fixed(name, vec![self.names.op, self.names.a], args, Type::Variant);
        }
        if (name == self.lookup_default || name == self.struct_lookup_default) && partial_values.len() == 3 {
            let mut args = FxHashMap::default();
            args.insert(self.names.op, Type::Variant);
            args.insert(self.names.a, Type::Variant);
            args.insert(self.names.b, Type::Variant);
            return self.fixed(name, vec![self.names.op, self.names.a, self.names.b], args, Type::Variant);
        }
        if name == self.contains && partial_values.len() == 2 {
            let mut args = FxHashMap::default();
            args.insert(self.names.op, Type::Variant);
            args.insert(self.names.a, Type::Variant);
            return self.fixed(name, vec![self.names.op, self.names.a], args, Type::Bool);
        }
        if name == self.collect && partial_values.len() == 2 {
            let mut args = FxHashMap::default();
            args.insert(self.names.op, Type::Str);
            args.insert(self.names.a, Type::Variant);
            return self.fixed(name, vec![self.names.op, self.names.a], args, Type::Variant);
        }
        Vec::new()
    }
}

impl FunctionLookup for Registry {
    fn lookup(&self, name: &str) -> Option<FuncDescriptor> {
        self.by_string.get(name).map(|f| FuncDescriptor {
            sig: f.type_of(),
            polymorphisms: Some(vec![f.clone()]),
        })
    }

    fn lookup_prefix(&self, prefix: &str) -> FxHashMap<String, FuncDescriptor> {
        self.by_string
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, f)| {
                (
                    name.clone(),
                    FuncDescriptor {
                        sig: f.type_of(),
                        polymorphisms: Some(vec![f.clone()]),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_on_two_ints_offers_int_signature() {
        let mut interner = StringInterner::new();
        let registry = Registry::new(&mut interner);
        let partial = vec![Some(Value::Str("+".to_string())), Some(Value::Int(1)), Some(Value::Int(2))];
        let sigs = registry.polymorphisms(registry.operator, &Type::Variant, &partial);
        assert!(sigs.iter().any(|f| matches!(*f.out, Type::Int)));
        assert!(sigs.iter().any(|f| matches!(*f.out, Type::Float)));
    }

    #[test]
    fn unary_bang_only_offers_bool() {
        let mut interner = StringInterner::new();
        let registry = Registry::new(&mut interner);
        let partial = vec![Some(Value::Str("!".to_string())), Some(Value::Bool(true))];
        let sigs = registry.polymorphisms(registry.operator, &Type::Variant, &partial);
        assert_eq!(sigs.len(), 1);
        assert!(matches!(*sigs[0].out, Type::Bool));
    }

    #[test]
    fn template_signature_matches_call_arity() {
        let mut interner = StringInterner::new();
        let registry = Registry::new(&mut interner);
        let partial = vec![Some(Value::Str("hello {}".to_string())), None];
        let sigs = registry.polymorphisms(registry.template, &Type::Variant, &partial);
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].ord.len(), 2);
        assert!(matches!(*sigs[0].out, Type::Str));
    }

    #[test]
    fn unknown_name_yields_no_signatures() {
        let mut interner = StringInterner::new();
        let registry = Registry::new(&mut interner);
        let other = interner.intern("totally_unregistered");
        assert!(registry.polymorphisms(other, &Type::Variant, &[]).is_empty());
    }
}
