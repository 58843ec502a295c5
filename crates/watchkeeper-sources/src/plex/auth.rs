use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::plex::api::PLEX_TV_BASE_URL;

/// Verify that a token is valid by making an API call
pub async fn verify_token(token: &str) -> Result<bool> {
    let client = Client::new();
    let url = format!("{}/api/v2/user", PLEX_TV_BASE_URL);

    let response = client
        .get(&url)
        .header("X-Plex-Token", token)
        .header("Accept", "application/json")
        .send()
        .await
        .context("Failed to reach plex.tv")?;

    debug!("Plex token verification returned {}", response.status());
    Ok(response.status().is_success())
}
