use serde::{Deserialize, Serialize};

/// A library section discovered on the configured media server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub key: String,
    /// Connection URI that answered during discovery
    pub endpoint: String,
    #[serde(skip_serializing, default)]
    pub access_token: String,
}

/// A title present in one of the server's libraries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_title: Option<String>,
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_ref: Option<String>,
    /// Name of the owning library
    pub library: String,
    /// Ingestion timestamp (epoch seconds), 0 when unknown
    #[serde(default)]
    pub added_at: i64,
}

impl LibraryItem {
    pub fn new(title: impl Into<String>, year: Option<u32>, library: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            alternate_title: None,
            year,
            cross_ref: None,
            library: library.into(),
            added_at: 0,
        }
    }

    pub fn with_alternate_title(mut self, alternate_title: impl Into<String>) -> Self {
        self.alternate_title = Some(alternate_title.into());
        self
    }

    pub fn with_cross_ref(mut self, cross_ref: impl Into<String>) -> Self {
        self.cross_ref = Some(cross_ref.into());
        self
    }

    pub fn with_added_at(mut self, added_at: i64) -> Self {
        self.added_at = added_at;
        self
    }

    pub fn known_year(&self) -> Option<u32> {
        self.year.filter(|y| *y > 0)
    }
}
