//! Record store contract and its two persistence backends.
//!
//! # Responsibility
//! - Define the CRUD capability set every backend offers.
//! - Isolate SQL and file-format details from the service layer.
//!
//! # Invariants
//! - Write paths validate before touching storage; a non-empty error map
//!   blocks persistence.
//! - Not-found is an `Option`/`bool` result, never an error.
//! - Storage failures propagate unchanged; nothing retries.

use crate::db::DbError;
use crate::model::validation::ValidationErrors;
use crate::model::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod car_repo;
pub mod file_lock;
pub mod id_alloc;
pub mod user_store;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by record store operations.
#[derive(Debug)]
pub enum RepoError {
    /// The record was rejected before persistence.
    Validation(ValidationErrors),
    /// Relational engine failure.
    Db(DbError),
    /// Reading or replacing a data file failed.
    Io { path: PathBuf, source: io::Error },
    /// The collection could not be serialized.
    Json(serde_json::Error),
    /// The exclusive lock guarding a data file could not be taken.
    Lock { path: PathBuf, source: io::Error },
    /// No unused id is left above the highest stored id.
    IdsExhausted { path: PathBuf },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Json(err) => write!(f, "failed to encode collection: {err}"),
            Self::Lock { path, source } => {
                write!(f, "failed to lock `{}`: {source}", path.display())
            }
            Self::IdsExhausted { path } => {
                write!(f, "no ids left to allocate in `{}`", path.display())
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io { source, .. } | Self::Lock { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::IdsExhausted { .. } => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// CRUD capability set over one entity kind.
///
/// Callers hold a `RecordStore` and never learn which backend serves it.
pub trait RecordStore {
    type Record;
    type Patch;

    /// Returns every stored record in backend order.
    fn list(&self) -> RepoResult<Vec<Self::Record>>;

    /// Returns the record with `id`, or `None`.
    fn get(&self, id: RecordId) -> RepoResult<Option<Self::Record>>;

    /// Inserts `record` when it has no id (writing the new id back into it),
    /// otherwise overwrites the stored record with the same id.
    ///
    /// Saving a record whose id is not stored is a silent no-op.
    fn save(&self, record: &mut Self::Record) -> RepoResult<()>;

    /// Applies `patch` to the record with `id` and returns the result, or
    /// `None` when no record matched.
    fn update(&self, id: RecordId, patch: &Self::Patch) -> RepoResult<Option<Self::Record>>;

    /// Removes the record with `id`. Returns whether anything was removed.
    fn delete(&self, id: RecordId) -> RepoResult<bool>;
}
