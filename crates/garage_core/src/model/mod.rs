//! Typed domain records for cars and users.
//!
//! # Responsibility
//! - Replace loosely typed form maps with typed records and patches.
//! - Own the field-level validation rules applied before persistence.
//!
//! # Invariants
//! - Identifiers are optional until first persistence, then immutable.
//! - Cars and users are unrelated; no ownership link exists between them.

use std::collections::BTreeMap;

pub mod car;
pub mod user;
pub mod validation;

/// Integer identifier shared by both entity kinds.
pub type RecordId = i64;

/// Reads one submitted form value; absent keys read as an empty string.
pub(crate) fn form_field(fields: &BTreeMap<String, String>, key: &str) -> String {
    fields.get(key).cloned().unwrap_or_default()
}
