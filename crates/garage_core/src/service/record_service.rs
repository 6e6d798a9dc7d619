//! Generic CRUD use-case service over any [`RecordStore`].
//!
//! # Responsibility
//! - Provide list/show/submit/edit/remove entry points for request handlers.
//! - Map validation failures and missing records to distinct error variants.
//!
//! # Invariants
//! - Service APIs never bypass store validation or locking.
//! - Removing an absent record succeeds.

use crate::model::validation::ValidationErrors;
use crate::model::RecordId;
use crate::repo::{RecordStore, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for record use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Submitted data was rejected; the map is shown next to the form.
    Invalid(ValidationErrors),
    /// Target record does not exist.
    NotFound(RecordId),
    /// Persistence-layer failure.
    Store(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(errors) => write!(f, "{errors}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(errors) => Self::Invalid(errors),
            other => Self::Store(other),
        }
    }
}

impl ServiceError {
    /// Returns the field error map when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Record service facade over a store implementation.
pub struct RecordService<S: RecordStore> {
    store: S,
    kind: &'static str,
}

impl<S: RecordStore> RecordService<S> {
    /// Creates a service; `kind` names the entity in log events.
    pub fn new(store: S, kind: &'static str) -> Self {
        Self { store, kind }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists every record.
    pub fn list(&self) -> ServiceResult<Vec<S::Record>> {
        Ok(self.store.list()?)
    }

    /// Gets one record, mapping absence to [`ServiceError::NotFound`].
    pub fn show(&self, id: RecordId) -> ServiceResult<S::Record> {
        self.store.get(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Validates and persists a submitted record, returning it with its id.
    pub fn submit(&self, mut record: S::Record) -> ServiceResult<S::Record> {
        self.store.save(&mut record)?;
        info!(
            "event=record_submit module=service status=ok kind={}",
            self.kind
        );
        Ok(record)
    }

    /// Applies a partial update to an existing record.
    pub fn edit(&self, id: RecordId, patch: &S::Patch) -> ServiceResult<S::Record> {
        let updated = self.store.update(id, patch)?;
        let record = updated.ok_or(ServiceError::NotFound(id))?;
        info!(
            "event=record_edit module=service status=ok kind={} id={}",
            self.kind, id
        );
        Ok(record)
    }

    /// Deletes a record. Returns whether a record was removed.
    pub fn remove(&self, id: RecordId) -> ServiceResult<bool> {
        let removed = self.store.delete(id)?;
        info!(
            "event=record_remove module=service status=ok kind={} id={} removed={}",
            self.kind, id, removed
        );
        Ok(removed)
    }
}
