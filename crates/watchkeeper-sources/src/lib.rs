pub mod error;
pub mod factory;
pub mod plex;
pub mod telegram;
pub mod tmdb;
pub mod traits;

pub use error::SourceError;
pub use factory::{Secrets, SourceSet};
pub use plex::{verify_token, PlexGateway};
pub use telegram::TelegramNotifier;
pub use tmdb::TmdbRatings;
pub use traits::{LibrarySource, Notifier, RatingLookup, WatchlistSource};
