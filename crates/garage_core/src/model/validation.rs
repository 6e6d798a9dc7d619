//! Field-keyed validation for submitted records.
//!
//! # Responsibility
//! - Map a candidate record to human-readable rejection reasons per field.
//!
//! # Invariants
//! - Validation is pure: it never touches storage or logging.
//! - An empty error map means the record may be persisted.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum accepted user name length, counted in UTF-8 code units.
pub const MIN_NAME_LEN: usize = 4;

pub const NAME_TOO_SHORT: &str = "name must be at least 4 characters long";
pub const FIELD_REQUIRED: &str = "must not be blank";

/// Field name -> message mapping returned by [`Validate::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    /// Converts into `Ok(())` when empty, or `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        let mut separator = ": ";
        for (field, message) in &self.fields {
            write!(f, "{separator}{field}: {message}")?;
            separator = "; ";
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Records that can be checked before persistence.
pub trait Validate {
    fn validate(&self) -> ValidationErrors;
}

/// Shared rule for user names.
pub(crate) fn check_name(name: &str, errors: &mut ValidationErrors) {
    if name.len() < MIN_NAME_LEN {
        errors.add("name", NAME_TOO_SHORT);
    }
}

pub(crate) fn check_required(field: &'static str, value: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(field, FIELD_REQUIRED);
    }
}
