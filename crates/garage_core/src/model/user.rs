//! User domain model stored in the flat-file document store.
//!
//! # Responsibility
//! - Define the user record and its on-disk JSON shape.
//! - Define the partial-update shape accepted by the store.
//!
//! # Invariants
//! - `id` is assigned by the store at creation time and never changes.
//! - Keys this model does not know about are carried through rewrites.
//! - Stored ids are read loosely: JSON numbers and numeric strings both match.
//! - Decoding one stored object never fails: scalar business fields are read
//!   as text and an unreadable id stays in `extra` untouched.

use crate::model::validation::{check_name, Validate, ValidationErrors};
use crate::model::{form_field, RecordId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One element of the users JSON array.
///
/// Field order matches the on-disk layout written by earlier deployments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "passwordConfirmation")]
    pub password_confirmation: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Unrecognized keys, preserved verbatim. Also holds a stored `id` that is
    /// not a readable integer.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Creates an unsaved user.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            name: name.into(),
            email: email.into(),
            password_confirmation: password.clone(),
            password,
            city: city.into(),
            id: None,
            extra: Map::new(),
        }
    }

    /// Builds an unsaved user from submitted form fields.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        Self {
            name: form_field(fields, "name"),
            email: form_field(fields, "email"),
            password: form_field(fields, "password"),
            password_confirmation: form_field(fields, "passwordConfirmation"),
            city: form_field(fields, "city"),
            id: None,
            extra: Map::new(),
        }
    }

    /// Builds a user from one stored JSON object.
    pub(crate) fn from_stored(mut fields: Map<String, Value>) -> Self {
        let name = take_text(&mut fields, "name");
        let email = take_text(&mut fields, "email");
        let password = take_text(&mut fields, "password");
        let password_confirmation = take_text(&mut fields, "passwordConfirmation");
        let city = take_text(&mut fields, "city");
        let id = match fields.remove("id") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let id = loose_id(&raw);
                if id.is_none() {
                    fields.insert("id".to_string(), raw);
                }
                id
            }
        };

        Self {
            name,
            email,
            password,
            password_confirmation,
            city,
            id,
            extra: fields,
        }
    }

    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Copies every business field from `other`, keeping `id` and extra keys.
    pub(crate) fn replace_fields(&mut self, other: &User) {
        self.name = other.name.clone();
        self.email = other.email.clone();
        self.password = other.password.clone();
        self.password_confirmation = other.password_confirmation.clone();
        self.city = other.city.clone();
    }
}

impl Validate for User {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_name(&self.name, &mut errors);
        errors
    }
}

/// Partial update for a stored user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

impl UserPatch {
    /// Patch that only renames the user.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builds a patch from submitted form fields; absent keys stay `None`.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        Self {
            name: fields.get("name").cloned(),
            email: fields.get("email").cloned(),
            city: fields.get("city").cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.city.is_none()
    }

    pub(crate) fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(city) = &self.city {
            user.city = city.clone();
        }
    }
}

impl Validate for UserPatch {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(name) = self.name.as_deref() {
            check_name(name, &mut errors);
        }
        errors
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_stored)
    }
}

/// Removes `key` and reads it as text. Null reads as empty; other non-string
/// values keep their JSON rendering.
fn take_text(fields: &mut Map<String, Value>, key: &str) -> String {
    match fields.remove(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

/// Reads a stored JSON id loosely: integral numbers and numeric strings.
pub(crate) fn loose_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .map(|float| float as RecordId)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
