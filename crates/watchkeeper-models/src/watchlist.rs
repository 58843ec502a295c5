use serde::{Deserialize, Serialize};
use crate::media::MediaKind;

/// A title the user wants to track, as received from the watchlist feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    /// Provider identifier (Plex ratingKey). May be absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub title: String,
    /// Original-language title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_title: Option<String>,
    pub year: Option<u32>,
    pub kind: MediaKind,
    /// Absolute URL or provider-relative path that still needs signing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    /// Cross-reference identifiers, primary guid first
    #[serde(default)]
    pub cross_refs: Vec<String>,
}

impl WatchlistEntry {
    pub fn new(title: impl Into<String>, year: Option<u32>, kind: MediaKind) -> Self {
        Self {
            identifier: None,
            title: title.into(),
            alternate_title: None,
            year,
            kind,
            artwork: None,
            cross_refs: Vec::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_alternate_title(mut self, alternate_title: impl Into<String>) -> Self {
        self.alternate_title = Some(alternate_title.into());
        self
    }

    pub fn with_cross_ref(mut self, cross_ref: impl Into<String>) -> Self {
        self.cross_refs.push(cross_ref.into());
        self
    }

    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    /// Year if present and non-zero
    pub fn known_year(&self) -> Option<u32> {
        self.year.filter(|y| *y > 0)
    }

    /// Join key across passes.
    ///
    /// Prefers the provider identifier, then the first cross-reference, and
    /// finally a key built from the normalized title and year.
    pub fn join_key(&self) -> String {
        if let Some(id) = self.identifier.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        if let Some(cross_ref) = self.cross_refs.iter().map(|r| r.trim()).find(|r| !r.is_empty()) {
            return cross_ref.to_string();
        }
        format!(
            "title:{}:{}",
            self.title.trim().to_lowercase(),
            self.known_year().unwrap_or(0)
        )
    }
}
