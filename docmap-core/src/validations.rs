//! Reusable validation rules and the per-record error collection.
//!
//! Rules never raise and never return a verdict; their only effect is
//! appending error codes to the record's [`ValidationErrors`]. A record is
//! valid exactly when that collection is empty after every registered
//! validator has run. All rules are opt-in: a model wires them into its
//! hooks explicitly via [`Hooks::validate`](crate::hooks::Hooks::validate).

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use std::fmt;

use crate::{
    error::DocmapResult,
    hooks::Validator,
    model::Model,
    record::Record,
    store::{DocumentStore, QueryOptions},
};

/// Ordered mapping from field name to the error codes collected against it.
///
/// Insertion order is preserved for both fields and codes, so repeated
/// validation passes yield identical content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    /// Appends `code` to the errors recorded against `field`.
    pub fn add(&mut self, field: impl Into<String>, code: impl Into<String>) {
        let field = field.into();
        let code = code.into();

        match self
            .entries
            .iter_mut()
            .find(|(name, _)| *name == field)
        {
            Some((_, codes)) => codes.push(code),
            None => self.entries.push((field, vec![code])),
        }
    }

    /// Removes all recorded errors.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True when no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the codes recorded against `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, codes)| codes.as_slice())
    }

    /// Iterates over `(field, codes)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(field, codes)| (field.as_str(), codes.as_slice()))
    }

    /// Renders the collection as a BSON document of `field -> [codes]`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();

        for (field, codes) in &self.entries {
            document.insert(
                field.clone(),
                Bson::Array(
                    codes
                        .iter()
                        .map(|code| Bson::String(code.clone()))
                        .collect(),
                ),
            );
        }

        document
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (field, codes) in &self.entries {
            for code in codes {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{field} is {code}")?;
                first = false;
            }
        }

        Ok(())
    }
}

/// Constructors for the built-in validation rules.
///
/// Each constructor returns a [`Validator`] implementation suitable for
/// [`Hooks::validate`](crate::hooks::Hooks::validate); the default error code
/// can be overridden with the rule's `message` builder.
pub struct Rules;

impl Rules {
    /// Fails with `"blank"` when the field is null, missing, or an empty
    /// string.
    pub fn presence_of(field: impl Into<String>) -> Presence {
        Presence {
            field: field.into(),
            message: "blank".into(),
        }
    }

    /// Fails with `"inclusion"` when the field is non-empty and its value is
    /// not one of `allowed`. Empty values pass.
    pub fn inclusion_of(field: impl Into<String>, allowed: Vec<Bson>) -> Inclusion {
        Inclusion {
            field: field.into(),
            allowed,
            message: "inclusion".into(),
        }
    }

    /// Fails with `"taken"` when the field changed since the last snapshot
    /// and another stored document carries the same value.
    ///
    /// The check is one read followed by a decision, with no transactional
    /// guarantee: a concurrent insert between the read and the subsequent
    /// save can still violate uniqueness. That race window is inherent to
    /// this rule; callers needing a hard guarantee must enforce it with a
    /// unique index at the store.
    pub fn uniqueness_of(field: impl Into<String>) -> Uniqueness {
        Uniqueness {
            field: field.into(),
            message: "taken".into(),
        }
    }

    /// Fails with `"match"` when the field is empty or its string value does
    /// not contain `pattern`.
    pub fn match_of(field: impl Into<String>, pattern: impl Into<String>) -> Match {
        Match {
            field: field.into(),
            pattern: pattern.into(),
            message: "match".into(),
        }
    }
}

fn is_blank(value: &Bson) -> bool {
    match value {
        Bson::Null => true,
        Bson::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Presence rule; see [`Rules::presence_of`].
pub struct Presence {
    field: String,
    message: String,
}

impl Presence {
    /// Overrides the error code recorded on failure.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl<M: Model> Validator<M> for Presence {
    async fn validate(
        &self,
        record: &mut Record<M>,
        _store: &dyn DocumentStore,
    ) -> DocmapResult<()> {
        let value = record.get(&self.field)?.unwrap_or(Bson::Null);

        if is_blank(&value) {
            record.errors_mut().add(&self.field, &self.message);
        }

        Ok(())
    }
}

/// Inclusion rule; see [`Rules::inclusion_of`].
pub struct Inclusion {
    field: String,
    allowed: Vec<Bson>,
    message: String,
}

impl Inclusion {
    /// Overrides the error code recorded on failure.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl<M: Model> Validator<M> for Inclusion {
    async fn validate(
        &self,
        record: &mut Record<M>,
        _store: &dyn DocumentStore,
    ) -> DocmapResult<()> {
        let value = record.get(&self.field)?.unwrap_or(Bson::Null);

        if !is_blank(&value) && !self.allowed.contains(&value) {
            record.errors_mut().add(&self.field, &self.message);
        }

        Ok(())
    }
}

/// Uniqueness rule; see [`Rules::uniqueness_of`].
pub struct Uniqueness {
    field: String,
    message: String,
}

impl Uniqueness {
    /// Overrides the error code recorded on failure.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl<M: Model> Validator<M> for Uniqueness {
    async fn validate(
        &self,
        record: &mut Record<M>,
        store: &dyn DocumentStore,
    ) -> DocmapResult<()> {
        if !record.is_changed(&self.field)? {
            return Ok(());
        }

        let value = record.get(&self.field)?.unwrap_or(Bson::Null);
        let mut filter = doc! { self.field.as_str(): value };
        if let Some(id) = record.object_id() {
            filter.insert("_id", doc! { "$ne": id });
        }

        let collision = store
            .find_one(&M::collection_name(), filter, QueryOptions::default())
            .await?;

        if collision.is_some() {
            record.errors_mut().add(&self.field, &self.message);
        }

        Ok(())
    }
}

/// Pattern rule; see [`Rules::match_of`]. Matching is a substring test on
/// the field's string value.
pub struct Match {
    field: String,
    pattern: String,
    message: String,
}

impl Match {
    /// Overrides the error code recorded on failure.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[async_trait]
impl<M: Model> Validator<M> for Match {
    async fn validate(
        &self,
        record: &mut Record<M>,
        _store: &dyn DocumentStore,
    ) -> DocmapResult<()> {
        let value = record.get(&self.field)?.unwrap_or(Bson::Null);

        let matched = match &value {
            Bson::String(text) if !text.is_empty() => text.contains(&self.pattern),
            _ => false,
        };

        if !matched {
            record.errors_mut().add(&self.field, &self.message);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_groups_codes_by_field() {
        let mut errors = ValidationErrors::default();
        errors.add("email", "blank");
        errors.add("email", "taken");
        errors.add("name", "blank");

        assert_eq!(
            errors.get("email"),
            Some(&["blank".to_string(), "taken".to_string()][..])
        );
        assert_eq!(errors.get("name"), Some(&["blank".to_string()][..]));
        assert_eq!(errors.get("age"), None);
    }

    #[test]
    fn clear_empties_the_collection() {
        let mut errors = ValidationErrors::default();
        errors.add("email", "blank");
        assert!(!errors.is_empty());

        errors.clear();
        assert!(errors.is_empty());
        assert_eq!(errors.get("email"), None);
    }

    #[test]
    fn to_document_preserves_order() {
        let mut errors = ValidationErrors::default();
        errors.add("name", "blank");
        errors.add("email", "match");

        let document = errors.to_document();
        let keys: Vec<_> = document.keys().collect();
        assert_eq!(keys, vec!["name", "email"]);
        assert_eq!(
            document.get("email"),
            Some(&Bson::Array(vec![Bson::String("match".into())]))
        );
    }

    #[test]
    fn display_reads_naturally() {
        let mut errors = ValidationErrors::default();
        errors.add("name", "blank");
        errors.add("email", "taken");

        assert_eq!(errors.to_string(), "name is blank, email is taken");
    }

    #[test]
    fn blankness_covers_null_and_empty_string() {
        assert!(is_blank(&Bson::Null));
        assert!(is_blank(&Bson::String(String::new())));
        assert!(!is_blank(&Bson::String("x".into())));
        assert!(!is_blank(&Bson::Int32(0)));
    }
}
