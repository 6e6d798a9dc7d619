//! Car domain model.
//!
//! # Responsibility
//! - Define the relationally stored car record and its partial-update shape.
//!
//! # Invariants
//! - `id` is `None` until the record is first persisted, then never changes.
//! - A car with `id` set is saved by update, never by insert.

use crate::model::validation::{check_required, Validate, ValidationErrors};
use crate::model::{form_field, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Engine-generated primary key.
    pub id: Option<RecordId>,
    pub make: String,
    pub model: String,
}

impl Car {
    /// Creates an unsaved car.
    pub fn new(make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: None,
            make: make.into(),
            model: model.into(),
        }
    }

    /// Builds an unsaved car from submitted form fields.
    ///
    /// Missing fields become empty strings and are caught by validation.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        Self::new(form_field(fields, "make"), form_field(fields, "model"))
    }

    /// Returns whether this car has been persisted.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }
}

impl Validate for Car {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_required("make", &self.make, &mut errors);
        check_required("model", &self.model, &mut errors);
        errors
    }
}

/// Partial update for a stored car. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarPatch {
    pub make: Option<String>,
    pub model: Option<String>,
}

impl CarPatch {
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none()
    }
}

impl Validate for CarPatch {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(make) = self.make.as_deref() {
            check_required("make", make, &mut errors);
        }
        if let Some(model) = self.model.as_deref() {
            check_required("model", model, &mut errors);
        }
        errors
    }
}
