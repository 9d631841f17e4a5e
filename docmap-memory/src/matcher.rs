//! Filter evaluation and sorting for the in-memory store.
//!
//! Implements the MongoDB-like subset the mapper relies on: top-level
//! equality with missing treated as `Null`, the operator keys `$ne`, `$in`,
//! `$gt`, `$gte`, `$lt`, `$lte`, and `$exists`, and multi-key sorting.
//! Ordering across types follows a fixed lattice
//! (null < bool < number < string < datetime < objectid < array < document).

use std::cmp::Ordering;

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

/// Type-normalized, comparable representation of BSON values.
///
/// Numeric types collapse to f64 so `Int32(1)` and `Int64(1)` compare equal,
/// matching store-level equality semantics.
#[derive(Debug)]
enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    DateTime(DateTime),
    ObjectId(ObjectId),
    Array(Vec<Comparable<'a>>),
    Document(Vec<(&'a str, Comparable<'a>)>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(items) => Comparable::Array(
                items
                    .iter()
                    .map(Comparable::from)
                    .collect(),
            ),
            Bson::Document(doc) => Comparable::Document(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Null, // Remaining types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Document(a), Comparable::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> Comparable<'a> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::DateTime(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Array(_) => 6,
            Comparable::Document(_) => 7,
        }
    }

    /// Total ordering over the type lattice; values of the same type compare
    /// by value, values of different types by lattice rank.
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// True iff every top-level key of `spec` is an operator key.
pub(crate) fn is_operator_document(spec: &Document) -> bool {
    !spec.is_empty() && spec.keys().all(|key| key.starts_with('$'))
}

/// Evaluates `filter` against `document`. Every filter entry must match;
/// an empty filter matches everything.
pub(crate) fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, expected)| {
        let actual = document.get(field).unwrap_or(&Bson::Null);
        let present = document.contains_key(field);

        match expected {
            Bson::Document(spec) if is_operator_document(spec) => spec
                .iter()
                .all(|(op, operand)| apply_operator(actual, present, op, operand)),
            other => Comparable::from(actual) == Comparable::from(other),
        }
    })
}

fn apply_operator(actual: &Bson, present: bool, op: &str, operand: &Bson) -> bool {
    match op {
        "$ne" => Comparable::from(actual) != Comparable::from(operand),
        "$in" => match operand {
            Bson::Array(candidates) => candidates
                .iter()
                .any(|candidate| Comparable::from(actual) == Comparable::from(candidate)),
            _ => false,
        },
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let left = Comparable::from(actual);
            let right = Comparable::from(operand);

            // Cross-type comparisons never match, mirroring store behavior.
            if left.rank() != right.rank() {
                return false;
            }

            let ordering = left.compare(&right);
            match op {
                "$gt" => ordering == Ordering::Greater,
                "$gte" => ordering != Ordering::Less,
                "$lt" => ordering == Ordering::Less,
                "$lte" => ordering != Ordering::Greater,
                _ => false,
            }
        }
        "$exists" => {
            let want = operand.as_bool().unwrap_or(true);
            present == want
        }
        _ => false,
    }
}

/// Sorts `documents` in place by each `(field, direction)` of `spec` in
/// order; a negative numeric direction sorts descending.
pub(crate) fn sort_documents(documents: &mut [Document], spec: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in spec {
            let left = Comparable::from(a.get(field).unwrap_or(&Bson::Null));
            let right = Comparable::from(b.get(field).unwrap_or(&Bson::Null));

            let mut ordering = left.compare(&right);
            if is_descending(direction) {
                ordering = ordering.reverse();
            }

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}

fn is_descending(direction: &Bson) -> bool {
    match direction {
        Bson::Int32(value) => *value < 0,
        Bson::Int64(value) => *value < 0,
        Bson::Double(value) => *value < 0.0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn equality_treats_missing_as_null() {
        assert!(matches(&doc! { "name": "p1" }, &doc! { "age": Bson::Null }));
        assert!(matches(&doc! { "age": Bson::Null }, &doc! { "age": Bson::Null }));
        assert!(!matches(&doc! { "age": "40" }, &doc! { "age": Bson::Null }));
    }

    #[test]
    fn equality_ignores_integer_width() {
        assert!(matches(&doc! { "count": 1_i64 }, &doc! { "count": 1_i32 }));
        assert!(matches(&doc! { "count": 1.0 }, &doc! { "count": 1_i32 }));
    }

    #[test]
    fn ne_and_in_operators() {
        let document = doc! { "role": "admin" };

        assert!(matches(&document, &doc! { "role": { "$ne": "user" } }));
        assert!(!matches(&document, &doc! { "role": { "$ne": "admin" } }));
        assert!(matches(&document, &doc! { "role": { "$in": ["admin", "user"] } }));
        assert!(!matches(&document, &doc! { "role": { "$in": ["user"] } }));
    }

    #[test]
    fn range_operators_are_same_type_only() {
        let document = doc! { "score": 10 };

        assert!(matches(&document, &doc! { "score": { "$gt": 5 } }));
        assert!(matches(&document, &doc! { "score": { "$gte": 10 } }));
        assert!(matches(&document, &doc! { "score": { "$lt": 11 } }));
        assert!(!matches(&document, &doc! { "score": { "$lte": 9 } }));
        assert!(!matches(&document, &doc! { "score": { "$gt": "5" } }));
    }

    #[test]
    fn exists_checks_key_presence_not_value() {
        let document = doc! { "age": Bson::Null };

        assert!(matches(&document, &doc! { "age": { "$exists": true } }));
        assert!(!matches(&document, &doc! { "name": { "$exists": true } }));
        assert!(matches(&document, &doc! { "name": { "$exists": false } }));
    }

    #[test]
    fn nested_plain_documents_are_equality_matches() {
        let document = doc! { "meta": { "city": "x" } };

        assert!(matches(&document, &doc! { "meta": { "city": "x" } }));
        assert!(!matches(&document, &doc! { "meta": { "city": "y" } }));
    }

    #[test]
    fn multi_key_sort_with_directions() {
        let mut documents = vec![
            doc! { "age": 30, "name": "b" },
            doc! { "age": 25, "name": "a" },
            doc! { "age": 30, "name": "a" },
        ];

        sort_documents(&mut documents, &doc! { "age": -1, "name": 1 });

        assert_eq!(documents[0].get_str("name").unwrap(), "a");
        assert_eq!(documents[0].get_i32("age").unwrap(), 30);
        assert_eq!(documents[1].get_str("name").unwrap(), "b");
        assert_eq!(documents[2].get_i32("age").unwrap(), 25);
    }

    #[test]
    fn missing_sort_key_orders_first_ascending() {
        let mut documents = vec![doc! { "age": 10 }, doc! {}];

        sort_documents(&mut documents, &doc! { "age": 1 });

        assert!(!documents[0].contains_key("age"));
    }

    #[test]
    fn operator_document_detection() {
        assert!(is_operator_document(&doc! { "$ne": 1 }));
        assert!(is_operator_document(&doc! { "$gte": 1, "$lt": 5 }));
        assert!(!is_operator_document(&doc! { "city": "x" }));
        assert!(!is_operator_document(&doc! {}));
    }
}
