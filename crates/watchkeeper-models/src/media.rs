use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Film,
    Series,
}

impl MediaKind {
    /// Map a provider type string ("movie", "show") to a kind.
    /// Anything else (episodes, seasons, music) is not trackable.
    pub fn from_provider_type(type_: &str) -> Option<Self> {
        match type_.to_lowercase().as_str() {
            "movie" => Some(MediaKind::Film),
            "show" => Some(MediaKind::Series),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Film => "Film",
            MediaKind::Series => "Series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
