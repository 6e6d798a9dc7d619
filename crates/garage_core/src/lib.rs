//! Persistence core for the garage CRUD application.
//!
//! Cars live in a SQLite table; users live in a flat JSON document file
//! guarded by a full-duration exclusive lock. Both sit behind [`RecordStore`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{ConfigError, GarageConfig, LogLevel};
pub use logging::{flush_logging, init_logging, logging_status, LoggingError};
pub use model::car::{Car, CarPatch};
pub use model::user::{User, UserPatch};
pub use model::validation::{Validate, ValidationErrors};
pub use model::RecordId;
pub use repo::car_repo::SqliteCarRepository;
pub use repo::id_alloc::{next_id, IdPolicy};
pub use repo::user_store::JsonFileUserStore;
pub use repo::{RecordStore, RepoError, RepoResult};
pub use service::record_service::{RecordService, ServiceError, ServiceResult};
pub use session::{Session, SessionStore, SessionToken};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
