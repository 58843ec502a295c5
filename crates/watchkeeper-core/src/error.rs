use thiserror::Error;

/// Fatal outcomes of a reconciliation pass. Every other failure degrades.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The watchlist could not be fetched; nothing was written
    #[error("watchlist unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The new snapshot could not be stored; an error status was recorded
    #[error("snapshot persistence failed: {0}")]
    Persistence(String),
}
