//! A demonstration [`ResourceRegistry`]/[`FieldNameMap`] pair: a stand-in
//! for the real resource-kind table an embedder owns (its concrete
//! contents are out of scope for the front end). Models
//! resources as a generic bag of named fields, with a declared width per
//! int field so `output_prog`'s overflow/mismatch paths have something
//! real to exercise.

use mcl_graph::{FieldAssignError, FieldNameMap, ResourceRegistry};
use mcl_types::{Type, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Str(String),
    Int(i64),
    Float(f64),
}

#[derive(Clone, Debug, Default)]
pub struct DemoResource {
    pub kind: String,
    pub name: String,
    pub fields: FxHashMap<String, FieldValue>,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub field_name: &'static str,
    pub ty: Type,
    /// Bit width for `Int` fields only; `None` for every other type.
    /// `set_field` reports `Overflow` when an assigned int doesn't fit.
    pub int_width: Option<u32>,
}

/// A fixed, in-memory resource kind table, keyed by kind name. A real
/// embedder's registry would derive this from its own resource structs'
/// reflection metadata instead of a literal map.
pub struct DemoRegistry {
    kinds: FxHashMap<String, FxHashMap<String, FieldSpec>>,
    created: RefCell<Vec<()>>,
}

impl DemoRegistry {
    pub fn new(kinds: FxHashMap<String, Vec<(&'static str, FieldSpec)>>) -> Self {
        let kinds = kinds
            .into_iter()
            .map(|(kind, fields)| (kind, fields.into_iter().map(|(lang, spec)| (lang.to_string(), spec)).collect()))
            .collect();
        DemoRegistry { kinds, created: RefCell::new(Vec::new()) }
    }

    pub fn created_count(&self) -> usize {
        self.created.borrow().len()
    }

    fn fits(width: u32, value: i64) -> bool {
        if width >= 64 {
            return true;
        }
        let max = (1i64 << (width - 1)) - 1;
        let min = -(1i64 << (width - 1));
        (min..=max).contains(&value)
    }
}

impl ResourceRegistry for DemoRegistry {
    type Resource = DemoResource;

    fn new_named(&self, kind: &str, name: &str) -> mcl_diagnostic::Result<Self::Resource> {
        self.created.borrow_mut().push(());
        Ok(DemoResource { kind: kind.to_string(), name: name.to_string(), fields: FxHashMap::default() })
    }

    fn set_field(&self, resource: &mut Self::Resource, field: &str, value: &Value) -> Result<(), FieldAssignError> {
        let spec = self
            .kinds
            .get(&resource.kind)
            .and_then(|fields| fields.values().find(|s| s.field_name == field));
        let field_value = match (value, spec.map(|s| s.ty.clone())) {
            (Value::Bool(b), Some(Type::Bool) | None) => FieldValue::Bool(*b),
            (Value::Str(s), Some(Type::Str) | None) => FieldValue::Str(s.clone()),
            (Value::Float(f), Some(Type::Float) | None) => FieldValue::Float(*f),
            (Value::Int(i), Some(Type::Int) | None) => {
                if let Some(width) = spec.and_then(|s| s.int_width) {
                    if !Self::fits(width, *i) {
                        return Err(FieldAssignError::Overflow);
                    }
                }
                FieldValue::Int(*i)
            }
            _ => return Err(FieldAssignError::TypeMismatch),
        };
        resource.fields.insert(field.to_string(), field_value);
        Ok(())
    }
}

impl FieldNameMap for DemoRegistry {
    fn fields(&self, kind: &str) -> FxHashMap<String, (String, Type)> {
        self.kinds
            .get(kind)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(lang_name, spec)| (lang_name.clone(), (spec.field_name.to_string(), spec.ty.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_kind() -> FxHashMap<String, Vec<(&'static str, FieldSpec)>> {
        let mut kinds = FxHashMap::default();
        kinds.insert(
            "file".to_string(),
            vec![
                ("path", FieldSpec { field_name: "path", ty: Type::Str, int_width: None }),
                ("mode", FieldSpec { field_name: "mode", ty: Type::Int, int_width: Some(8) }),
            ],
        );
        kinds
    }

    #[test]
    fn known_field_assigns_through_to_the_resource() {
        let registry = DemoRegistry::new(file_kind());
        let mut res = registry.new_named("file", "f1").unwrap_or_else(|e| panic!("{e}"));
        registry.set_field(&mut res, "path", &Value::Str("/tmp/f1".to_string())).unwrap_or_else(|e| panic!("{e:?}"));
        assert_eq!(res.fields.get("path"), Some(&FieldValue::Str("/tmp/f1".to_string())));
    }

    #[test]
    fn narrow_int_field_overflows() {
        let registry = DemoRegistry::new(file_kind());
        let mut res = registry.new_named("file", "f1").unwrap_or_else(|e| panic!("{e}"));
        let err = registry.set_field(&mut res, "mode", &Value::Int(1000)).expect_err("1000 doesn't fit in 8 bits");
        assert_eq!(err, FieldAssignError::Overflow);
    }

    #[test]
    fn wrong_value_type_is_a_mismatch() {
        let registry = DemoRegistry::new(file_kind());
        let mut res = registry.new_named("file", "f1").unwrap_or_else(|e| panic!("{e}"));
        let err = registry.set_field(&mut res, "path", &Value::Int(1)).expect_err("int isn't a str");
        assert_eq!(err, FieldAssignError::TypeMismatch);
    }
}
