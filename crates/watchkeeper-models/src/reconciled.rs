use serde::{Deserialize, Serialize};
use crate::media::MediaKind;

/// Rating value used when no external rating could be obtained
pub const RATING_UNKNOWN: &str = "N/A";

/// The merged record for one watchlist entry after a pass.
///
/// Every field except `owners` is rebuilt from fetched sources on each pass.
/// `owners` is user-assigned and carried forward by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciledEntry {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_title: Option<String>,
    pub year: Option<u32>,
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    pub reference_url: String,
    pub available: bool,
    /// Library names in order of first discovery
    #[serde(default)]
    pub locations: Vec<String>,
    pub rating: String,
    /// Ingestion timestamp of the matching library item, 0 if unavailable
    #[serde(default)]
    pub first_seen_at: i64,
    #[serde(default)]
    pub owners: Vec<String>,
    /// Position among the kept entries of the freshly fetched watchlist,
    /// after duplicates are dropped (0 = most recently added)
    pub rank: usize,
}

impl ReconciledEntry {
    pub fn has_rating(&self) -> bool {
        self.rating != RATING_UNKNOWN
    }
}
