pub mod library;
pub mod media;
pub mod reconciled;
pub mod status;
pub mod watchlist;

pub use library::{Library, LibraryItem};
pub use media::MediaKind;
pub use reconciled::{ReconciledEntry, RATING_UNKNOWN};
pub use status::{SyncOutcome, SyncStatus};
pub use watchlist::WatchlistEntry;
