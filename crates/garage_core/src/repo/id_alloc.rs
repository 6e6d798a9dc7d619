//! Next-identifier rule for the flat-file store.
//!
//! # Invariants
//! - An empty collection always yields `1`.
//! - A record without a readable id counts as id `0`.
//! - `MaxPlusOne` never returns an id already present in the collection.
//! - No id is handed out once the id space is exhausted.

use crate::model::RecordId;
use serde::{Deserialize, Serialize};

/// Id allocation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// `last + 1`. Trusts insertion order; reordered or hand-edited files can
    /// produce duplicates.
    LastPlusOne,
    /// `max + 1` across the whole collection.
    #[default]
    MaxPlusOne,
}

impl IdPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastPlusOne => "last_plus_one",
            Self::MaxPlusOne => "max_plus_one",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "last" | "last_plus_one" => Some(Self::LastPlusOne),
            "max" | "max_plus_one" => Some(Self::MaxPlusOne),
            _ => None,
        }
    }
}

/// Returns the id to assign to the next record appended to a collection whose
/// existing ids are `ids`, in collection order.
///
/// Returns `None` when the base id is already `RecordId::MAX`.
pub fn next_id<I>(policy: IdPolicy, ids: I) -> Option<RecordId>
where
    I: IntoIterator<Item = Option<RecordId>>,
{
    let ids = ids.into_iter().map(|id| id.unwrap_or(0));
    let base = match policy {
        IdPolicy::LastPlusOne => ids.last(),
        IdPolicy::MaxPlusOne => ids.max(),
    };
    base.map_or(Some(1), |id| id.checked_add(1))
}
