//! Assembles the production collaborators from configuration and credentials.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};
use watchkeeper_config::{Config, CredentialStore};

use crate::plex::PlexGateway;
use crate::telegram::TelegramNotifier;
use crate::tmdb::TmdbRatings;
use crate::traits::{LibrarySource, Notifier, RatingLookup, WatchlistSource};

/// Credentials after environment overrides have been applied
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub plex_token: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
}

impl Secrets {
    pub fn from_store(store: &CredentialStore) -> Self {
        Self {
            plex_token: store.plex_token(),
            tmdb_api_key: store.tmdb_api_key(),
            telegram_bot_token: store.telegram_bot_token(),
        }
    }
}

/// Everything a reconciliation pass talks to.
///
/// The watchlist and library roles are served by the same Plex gateway.
pub struct SourceSet {
    pub watchlist: Arc<dyn WatchlistSource>,
    pub libraries: Arc<dyn LibrarySource>,
    pub ratings: Option<Arc<dyn RatingLookup>>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl SourceSet {
    pub fn build(config: &Config, secrets: &Secrets) -> Result<Self> {
        let token = secrets
            .plex_token
            .clone()
            .context("Plex token not configured. Run 'watchkeeper config plex' or set PLEX_TOKEN")?;

        let gateway = Arc::new(
            PlexGateway::new(token, config.server.language.clone(), config.server.accept_invalid_certs)
                .context("Failed to create Plex client")?,
        );

        Ok(Self {
            watchlist: gateway.clone(),
            libraries: gateway,
            ratings: build_ratings(config, secrets)?,
            notifier: build_notifier(config, secrets)?,
        })
    }
}

fn build_ratings(config: &Config, secrets: &Secrets) -> Result<Option<Arc<dyn RatingLookup>>> {
    if !config.ratings.enabled {
        debug!("Rating enrichment disabled in config");
        return Ok(None);
    }
    let Some(api_key) = secrets.tmdb_api_key.clone() else {
        info!("No TMDB API key configured, ratings will stay unknown");
        return Ok(None);
    };
    let ratings = TmdbRatings::new(api_key, config.ratings.language.clone())
        .context("Failed to create TMDB client")?;
    Ok(Some(Arc::new(ratings)))
}

fn build_notifier(config: &Config, secrets: &Secrets) -> Result<Option<Arc<dyn Notifier>>> {
    match (secrets.telegram_bot_token.clone(), config.telegram_chat_id()) {
        (Some(token), Some(chat_id)) => {
            let notifier = TelegramNotifier::new(token, chat_id.to_string())
                .context("Failed to create Telegram client")?;
            Ok(Some(Arc::new(notifier)))
        }
        _ => {
            debug!("Telegram not configured, notifications disabled");
            Ok(None)
        }
    }
}
