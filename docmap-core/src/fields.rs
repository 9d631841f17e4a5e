//! Field metadata for model types.
//!
//! Every model declares its persisted field names once, at the type level.
//! The [`FieldRegistry`] extends those with the reserved internal fields and
//! answers the public-versus-internal question for the rest of the crate: a
//! field whose name starts with `_` is bookkeeping and is never persisted or
//! serialized by default.
//!
//! Registries are built lazily, once per model type for the whole process,
//! and handed out as `&'static` references keyed by [`TypeId`].

use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Mutex, OnceLock, PoisonError},
};

/// Reserved bookkeeping fields present on every model.
pub const INTERNAL_FIELDS: &[&str] = &["_id", "_errors", "_old_values"];

/// The sentinel prefix marking a field as internal.
pub const INTERNAL_PREFIX: char = '_';

/// Static field metadata for a model type.
///
/// Usually implemented via `#[derive(Fields)]`, which reports the struct's
/// name and its named fields in declaration order (honoring
/// `#[serde(rename)]` so registry names agree with wire names).
pub trait Fields {
    /// The type's simple name, e.g. `"UserProfile"`.
    fn model_name() -> &'static str;

    /// Declared field names in declaration order, excluding the reserved
    /// internal fields.
    fn field_names() -> &'static [&'static str];
}

/// Ordered set of a model type's field names, internal fields included.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<String>,
}

impl FieldRegistry {
    /// Builds a registry from declared field names. The reserved internal
    /// fields come first, then the declared fields in the given order.
    pub fn new(declared: &[&str]) -> Self {
        let mut registry = Self {
            fields: INTERNAL_FIELDS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        };

        for name in declared {
            registry.declare_field(name);
        }

        registry
    }

    /// Adds `name` to the field set if absent. Idempotent.
    pub fn declare_field(&mut self, name: &str) {
        if !self.fields.iter().any(|field| field == name) {
            self.fields.push(name.to_string());
        }
    }

    /// Returns the full ordered field set, reserved internal fields included.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the declared fields with every internal-prefixed name
    /// filtered out.
    pub fn public_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| !field.starts_with(INTERNAL_PREFIX))
            .map(String::as_str)
            .collect()
    }

    /// True iff `name` is a declared, non-internal field.
    pub fn is_public(&self, name: &str) -> bool {
        !name.starts_with(INTERNAL_PREFIX) && self.fields.iter().any(|field| field == name)
    }
}

/// Derives a collection name from a type's simple name.
///
/// Splits on uppercase-letter boundaries and joins with underscores,
/// lowercased: `UserProfile` becomes `user_profile`. Consecutive capitals
/// split per letter, so `HTTPServer` becomes `h_t_t_p_server`. Deterministic,
/// pure function of the name.
pub fn collection_name_from(model_name: &str) -> String {
    let mut name = String::with_capacity(model_name.len() + 4);

    for (index, ch) in model_name.chars().enumerate() {
        if ch.is_uppercase() {
            if index > 0 {
                name.push('_');
            }
            name.extend(ch.to_lowercase());
        } else {
            name.push(ch);
        }
    }

    name
}

static REGISTRIES: OnceLock<Mutex<HashMap<TypeId, &'static FieldRegistry>>> = OnceLock::new();

/// Returns the process-wide registry for `M`, building it on first use.
pub fn registry_for<M: Fields + 'static>() -> &'static FieldRegistry {
    let registries = REGISTRIES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = registries
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    *guard
        .entry(TypeId::of::<M>())
        .or_insert_with(|| Box::leak(Box::new(FieldRegistry::new(M::field_names()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UserProfile;

    impl Fields for UserProfile {
        fn model_name() -> &'static str {
            "UserProfile"
        }

        fn field_names() -> &'static [&'static str] {
            &["name", "email"]
        }
    }

    #[test]
    fn collection_names_split_on_uppercase() {
        assert_eq!(collection_name_from("Person"), "person");
        assert_eq!(collection_name_from("UserProfile"), "user_profile");
        assert_eq!(collection_name_from("HTTPServer"), "h_t_t_p_server");
    }

    #[test]
    fn registry_includes_internal_fields() {
        let registry = FieldRegistry::new(&["name", "email"]);

        assert_eq!(
            registry.fields(),
            &["_id", "_errors", "_old_values", "name", "email"]
        );
        assert_eq!(registry.public_fields(), vec!["name", "email"]);
    }

    #[test]
    fn declare_field_is_idempotent() {
        let mut registry = FieldRegistry::new(&["name"]);
        registry.declare_field("name");
        registry.declare_field("age");
        registry.declare_field("age");

        assert_eq!(registry.public_fields(), vec!["name", "age"]);
    }

    #[test]
    fn internal_fields_are_never_public() {
        let registry = FieldRegistry::new(&["name"]);

        assert!(registry.is_public("name"));
        assert!(!registry.is_public("_id"));
        assert!(!registry.is_public("_old_values"));
        assert!(!registry.is_public("undeclared"));
    }

    #[test]
    fn registries_are_shared_per_type() {
        let first = registry_for::<UserProfile>();
        let second = registry_for::<UserProfile>();

        assert!(std::ptr::eq(first, second));
        assert_eq!(first.public_fields(), vec!["name", "email"]);
    }
}
