//! Use-case services consumed by the request layer.
//!
//! # Responsibility
//! - Translate record store results into the request-layer contract:
//!   persisted entity, error map, not-found, or storage failure.
//! - Keep callers independent of which backend serves an entity kind.

pub mod record_service;
