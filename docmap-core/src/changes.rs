//! Dirty-state computation against a field snapshot.
//!
//! A record keeps a BSON snapshot of its public-field values as of the last
//! load or save. These helpers compare a current serialization against that
//! snapshot; a missing key compares equal to `Null` on either side, so
//! unset and explicitly-null fields are indistinguishable for dirtiness.
//!
//! Snapshots are taken explicitly after each successful persistence
//! operation and after each load, never on plain attribute writes.

use bson::{Bson, Document};

use crate::fields::FieldRegistry;

/// True iff `field`'s value differs between `current` and `snapshot`,
/// comparing by value with missing treated as `Null`.
pub fn value_changed(current: &Document, snapshot: &Document, field: &str) -> bool {
    let now = current.get(field).unwrap_or(&Bson::Null);
    let then = snapshot.get(field).unwrap_or(&Bson::Null);

    now != then
}

/// Returns the public fields whose values differ from the snapshot, in
/// registry declaration order.
pub fn changed_fields(
    registry: &FieldRegistry,
    current: &Document,
    snapshot: &Document,
) -> Vec<String> {
    registry
        .public_fields()
        .into_iter()
        .filter(|field| value_changed(current, snapshot, field))
        .map(str::to_string)
        .collect()
}
