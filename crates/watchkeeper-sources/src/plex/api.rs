use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;

pub const DISCOVER_BASE_URL: &str = "https://discover.provider.plex.tv";
pub const PLEX_TV_BASE_URL: &str = "https://plex.tv";
pub const METADATA_BASE_URL: &str = "https://metadata.provider.plex.tv";

pub const WATCHLIST_PAGE_SIZE: usize = 100;
const CLIENT_IDENTIFIER: &str = "watchkeeper";
const WATCHLIST_TIMEOUT: Duration = Duration::from_secs(15);
const RESOURCES_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECTION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const SECTION_ITEMS_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GuidRef {
    #[serde(default)]
    pub id: String,
}

/// One row of `MediaContainer.Metadata`, shared by the watchlist and section listings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataItem {
    #[serde(default)]
    pub rating_key: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default, rename = "Guid")]
    pub guids: Vec<GuidRef>,
    #[serde(default)]
    pub added_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SectionDirectory {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaContainer {
    #[serde(default)]
    pub total_size: Option<usize>,
    #[serde(default, rename = "Metadata")]
    pub metadata: Vec<MetadataItem>,
    #[serde(default, rename = "Directory")]
    pub directory: Vec<SectionDirectory>,
}

#[derive(Debug, Deserialize)]
pub struct PlexResponse {
    #[serde(rename = "MediaContainer", default)]
    pub media_container: MediaContainer,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConnection {
    pub uri: String,
    #[serde(default)]
    pub local: bool,
}

/// Entry of the account's `/api/v2/resources` listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provides: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub connections: Vec<ResourceConnection>,
}

impl Resource {
    pub fn is_server(&self) -> bool {
        self.provides.split(',').any(|p| p.trim() == "server")
    }

    /// Connection URIs with local ones first, preserving listing order otherwise
    pub fn candidate_uris(&self) -> Vec<String> {
        let (local, remote): (Vec<_>, Vec<_>) = self.connections.iter().partition(|c| c.local);
        local
            .into_iter()
            .chain(remote)
            .map(|c| c.uri.trim_end_matches('/').to_string())
            .collect()
    }
}

/// Pick the server resource with the given name
pub fn find_server<'a>(resources: &'a [Resource], server_name: &str) -> Option<&'a Resource> {
    resources
        .iter()
        .find(|r| r.is_server() && r.name == server_name)
}

pub struct PlexHttpClient {
    client: Client,
    server_client: Client,
    token: String,
    language: String,
    discover_base_url: String,
    plex_tv_base_url: String,
}

impl PlexHttpClient {
    pub fn new(token: String, language: String, accept_invalid_certs: bool) -> Result<Self, SourceError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
            reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
        );

        let client = Client::builder().default_headers(headers.clone()).build()?;
        // Server connections commonly use plex.direct certificates or plain LAN addresses
        let server_client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            server_client,
            token,
            language,
            discover_base_url: DISCOVER_BASE_URL.to_string(),
            plex_tv_base_url: PLEX_TV_BASE_URL.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// One page of the account watchlist
    pub async fn get_watchlist_page(&self, start: usize, size: usize) -> Result<MediaContainer, SourceError> {
        let url = format!("{}/library/sections/watchlist/all", self.discover_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("includeGuids", "1".to_string()),
                ("X-Plex-Container-Start", start.to_string()),
                ("X-Plex-Container-Size", size.to_string()),
            ])
            .header("X-Plex-Token", &self.token)
            .header("X-Plex-Language", &self.language)
            .timeout(WATCHLIST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body: PlexResponse = response.json().await?;
        debug!(
            start,
            returned = body.media_container.metadata.len(),
            total = ?body.media_container.total_size,
            "Plex watchlist page"
        );
        Ok(body.media_container)
    }

    pub async fn get_resources(&self) -> Result<Vec<Resource>, SourceError> {
        let url = format!("{}/api/v2/resources", self.plex_tv_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("includeHttps", "1")])
            .header("X-Plex-Token", &self.token)
            .timeout(RESOURCES_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let resources: Vec<Resource> = response.json().await?;
        debug!("Plex server discovery: {} resources", resources.len());
        Ok(resources)
    }

    /// Library sections of a server, probing one connection URI
    pub async fn get_sections(&self, endpoint: &str, access_token: &str) -> Result<Vec<SectionDirectory>, SourceError> {
        let url = format!("{}/library/sections", endpoint);
        let response = self
            .server_client
            .get(&url)
            .header("X-Plex-Token", access_token)
            .timeout(CONNECTION_PROBE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body: PlexResponse = response.json().await?;
        Ok(body.media_container.directory)
    }

    pub async fn get_section_items(
        &self,
        endpoint: &str,
        section_key: &str,
        access_token: &str,
    ) -> Result<Vec<MetadataItem>, SourceError> {
        let url = format!("{}/library/sections/{}/all", endpoint, section_key);
        let response = self
            .server_client
            .get(&url)
            .query(&[("includeGuids", "1")])
            .header("X-Plex-Token", access_token)
            .timeout(SECTION_ITEMS_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body: PlexResponse = response.json().await?;
        Ok(body.media_container.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watchlist_page() {
        let json = r#"{
            "MediaContainer": {
                "totalSize": 2,
                "size": 2,
                "Metadata": [
                    {
                        "ratingKey": "5d776b59ad5437001f79c6f8",
                        "type": "movie",
                        "title": "Dune",
                        "originalTitle": "Dune: Part One",
                        "year": 2021,
                        "thumb": "/library/metadata/5d776b59ad5437001f79c6f8/thumb/1",
                        "guid": "plex://movie/5d776b59ad5437001f79c6f8",
                        "Guid": [{"id": "imdb://tt1160419"}, {"id": "tmdb://438631"}]
                    },
                    {"ratingKey": "abc", "type": "show", "title": "Severance"}
                ]
            }
        }"#;

        let parsed: PlexResponse = serde_json::from_str(json).unwrap();
        let container = parsed.media_container;
        assert_eq!(container.total_size, Some(2));
        assert_eq!(container.metadata.len(), 2);

        let dune = &container.metadata[0];
        assert_eq!(dune.rating_key.as_deref(), Some("5d776b59ad5437001f79c6f8"));
        assert_eq!(dune.original_title.as_deref(), Some("Dune: Part One"));
        assert_eq!(dune.guids.len(), 2);

        let severance = &container.metadata[1];
        assert_eq!(severance.year, None);
        assert!(severance.guids.is_empty());
    }

    #[test]
    fn test_empty_container_parses() {
        let parsed: PlexResponse = serde_json::from_str(r#"{"MediaContainer": {"size": 0}}"#).unwrap();
        assert!(parsed.media_container.metadata.is_empty());
        assert!(parsed.media_container.directory.is_empty());
    }

    #[test]
    fn test_find_server_prefers_local_connections() {
        let json = r#"[
            {"name": "Phone", "provides": "client,player", "connections": []},
            {
                "name": "Navidad",
                "provides": "server",
                "accessToken": "server-token",
                "connections": [
                    {"uri": "https://1-2-3-4.abc.plex.direct:32400", "local": false},
                    {"uri": "http://192.168.1.10:32400/", "local": true}
                ]
            }
        ]"#;
        let resources: Vec<Resource> = serde_json::from_str(json).unwrap();

        assert!(find_server(&resources, "Phone").is_none());
        assert!(find_server(&resources, "Elsewhere").is_none());

        let server = find_server(&resources, "Navidad").unwrap();
        assert_eq!(server.access_token.as_deref(), Some("server-token"));
        assert_eq!(
            server.candidate_uris(),
            vec![
                "http://192.168.1.10:32400".to_string(),
                "https://1-2-3-4.abc.plex.direct:32400".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_sections() {
        let json = r#"{"MediaContainer": {"Directory": [
            {"key": "1", "title": "Películas", "type": "movie"},
            {"key": "2", "title": "Series", "type": "show"}
        ]}}"#;
        let parsed: PlexResponse = serde_json::from_str(json).unwrap();
        let sections = parsed.media_container.directory;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Películas");
        assert_eq!(sections[1].key, "2");
    }
}
