use thiserror::Error;

/// Failures surfaced by the watchlist and library gateways
#[derive(Debug, Error)]
pub enum SourceError {
    /// The watchlist feed could not be read at all (first page failed)
    #[error("watchlist feed unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("media server '{0}' unreachable")]
    ServerUnreachable(String),

    #[error("library '{library}' unreadable: {reason}")]
    LibraryUnreadable { library: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
