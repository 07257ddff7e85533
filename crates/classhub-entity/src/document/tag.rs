//! Tag entity and name normalization.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A global tag, many-to-many with documents.
///
/// Tag names are stored normalized (lowercased, trimmed) and unique, so
/// `"Rust "`, `"rust"`, and `"RUST"` all resolve to the same row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: Uuid,
    /// Normalized tag name.
    pub name: String,
}

impl Tag {
    /// Normalize a raw tag name: lowercase and trim.
    ///
    /// Returns `None` when nothing is left after trimming, so blank
    /// entries in a tag list are dropped rather than stored.
    pub fn normalize(raw: &str) -> Option<String> {
        let name = raw.trim().to_lowercase();
        if name.is_empty() { None } else { Some(name) }
    }

    /// Normalize a list of raw tag names, dropping blanks and duplicates.
    ///
    /// The result is sorted, which also makes tag association order
    /// deterministic.
    pub fn normalize_all(raw: &[String]) -> Vec<String> {
        let mut names: Vec<String> = raw.iter().filter_map(|t| Self::normalize(t)).collect();
        names.sort();
        names.dedup();
        names
    }
}
