use async_trait::async_trait;
use watchkeeper_models::{Library, LibraryItem, MediaKind, ReconciledEntry, WatchlistEntry};

use crate::error::SourceError;

/// Remote wishlist feed.
#[async_trait]
pub trait WatchlistSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Fetch every page of the watchlist, most recently added first.
    ///
    /// Fails with [`SourceError::UpstreamUnavailable`] only when the first page
    /// cannot be read; an empty feed is a successful empty result.
    async fn fetch_watchlist(&self) -> Result<Vec<WatchlistEntry>, SourceError>;

    /// Turn the entry's artwork reference into a URL a browser can load.
    fn resolve_artwork(&self, artwork: &str) -> Option<String> {
        if artwork.is_empty() {
            None
        } else {
            Some(artwork.to_string())
        }
    }
}

/// Media server catalog.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Libraries of the named server, from the first endpoint that answers.
    /// Empty when the server is unknown or unreachable.
    async fn discover_libraries(&self, server_name: &str) -> Result<Vec<Library>, SourceError>;

    async fn fetch_library_items(&self, library: &Library) -> Result<Vec<LibraryItem>, SourceError>;
}

/// External rating lookup. Never fails: any problem yields
/// [`watchkeeper_models::RATING_UNKNOWN`].
#[async_trait]
pub trait RatingLookup: Send + Sync {
    async fn lookup(
        &self,
        primary: &str,
        fallback: Option<&str>,
        year: Option<u32>,
        kind: MediaKind,
    ) -> String;
}

/// Availability alert channel. Delivery failures are logged by the implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, entry: &ReconciledEntry);
}
