use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use watchkeeper_models::{Library, LibraryItem, MediaKind, WatchlistEntry};

use crate::error::SourceError;
use crate::plex::api::{find_server, MetadataItem, PlexHttpClient, METADATA_BASE_URL, WATCHLIST_PAGE_SIZE};
use crate::traits::{LibrarySource, WatchlistSource};

/// Plex account watchlist plus the libraries of one of the account's servers
pub struct PlexGateway {
    api: PlexHttpClient,
}

impl PlexGateway {
    pub fn new(token: String, language: String, accept_invalid_certs: bool) -> Result<Self, SourceError> {
        Ok(Self {
            api: PlexHttpClient::new(token, language, accept_invalid_certs)?,
        })
    }

    async fn probe_endpoints(&self, uris: &[String], access_token: &str, server_name: &str) -> Vec<Library> {
        for uri in uris {
            match self.api.get_sections(uri, access_token).await {
                Ok(sections) => {
                    info!(server = server_name, endpoint = %uri, libraries = sections.len(), "Plex server reachable");
                    return sections
                        .into_iter()
                        .map(|s| Library {
                            name: s.title,
                            key: s.key,
                            endpoint: uri.clone(),
                            access_token: access_token.to_string(),
                        })
                        .collect();
                }
                Err(e) => debug!(endpoint = %uri, "Plex connection attempt failed: {}", e),
            }
        }
        warn!(server = server_name, "{}", SourceError::ServerUnreachable(server_name.to_string()));
        Vec::new()
    }
}

/// Convert one watchlist row; rows that are neither films nor series are dropped
pub(crate) fn watchlist_entry_from(item: MetadataItem) -> Option<WatchlistEntry> {
    let kind = MediaKind::from_provider_type(item.type_.as_deref().unwrap_or(""))?;

    let mut entry = WatchlistEntry::new(item.title.clone(), item.year, kind);
    if let Some(key) = item.rating_key.filter(|k| !k.is_empty()) {
        entry = entry.with_identifier(key);
    }
    if let Some(original) = item
        .original_title
        .filter(|o| !o.is_empty() && !o.eq_ignore_ascii_case(&item.title))
    {
        entry = entry.with_alternate_title(original);
    }
    if let Some(thumb) = item.thumb.filter(|t| !t.is_empty()) {
        entry = entry.with_artwork(thumb);
    }
    let refs = item.guid.into_iter().chain(item.guids.into_iter().map(|g| g.id));
    for cross_ref in refs.filter(|r| !r.is_empty()) {
        entry = entry.with_cross_ref(cross_ref);
    }
    Some(entry)
}

pub(crate) fn library_item_from(item: MetadataItem, library: &str) -> LibraryItem {
    let mut converted = LibraryItem::new(item.title, item.year, library)
        .with_added_at(item.added_at.unwrap_or(0));
    if let Some(original) = item.original_title.filter(|o| !o.is_empty()) {
        converted = converted.with_alternate_title(original);
    }
    if let Some(guid) = item.guid.filter(|g| !g.is_empty()) {
        converted = converted.with_cross_ref(guid);
    }
    converted
}

pub(crate) fn sign_artwork(artwork: &str, token: &str) -> Option<String> {
    if artwork.is_empty() {
        None
    } else if artwork.starts_with("http://") || artwork.starts_with("https://") {
        Some(artwork.to_string())
    } else {
        Some(format!("{}{}?X-Plex-Token={}", METADATA_BASE_URL, artwork, token))
    }
}

#[async_trait]
impl WatchlistSource for PlexGateway {
    fn source_name(&self) -> &str {
        "plex"
    }

    #[instrument(skip(self))]
    async fn fetch_watchlist(&self) -> Result<Vec<WatchlistEntry>, SourceError> {
        let mut collected: Vec<MetadataItem> = Vec::new();
        let mut start = 0;

        loop {
            let page = match self.api.get_watchlist_page(start, WATCHLIST_PAGE_SIZE).await {
                Ok(page) => page,
                Err(e) if start == 0 => return Err(SourceError::UpstreamUnavailable(e.to_string())),
                Err(e) => {
                    warn!(start, collected = collected.len(), "Watchlist page failed, keeping partial result: {}", e);
                    break;
                }
            };

            let returned = page.metadata.len();
            let total = page.total_size.unwrap_or(0);
            collected.extend(page.metadata);

            if returned == 0 || collected.len() >= total {
                break;
            }
            start += WATCHLIST_PAGE_SIZE;
        }

        let raw = collected.len();
        let entries: Vec<WatchlistEntry> = collected.into_iter().filter_map(watchlist_entry_from).collect();
        if entries.len() < raw {
            debug!("Skipped {} watchlist rows of unsupported type", raw - entries.len());
        }
        info!(entries = entries.len(), "Fetched Plex watchlist");
        Ok(entries)
    }

    fn resolve_artwork(&self, artwork: &str) -> Option<String> {
        sign_artwork(artwork, self.api.token())
    }
}

#[async_trait]
impl LibrarySource for PlexGateway {
    #[instrument(skip(self))]
    async fn discover_libraries(&self, server_name: &str) -> Result<Vec<Library>, SourceError> {
        let resources = self.api.get_resources().await?;

        let Some(server) = find_server(&resources, server_name) else {
            warn!(server = server_name, "Plex server not found on this account");
            return Ok(Vec::new());
        };

        let access_token = server
            .access_token
            .clone()
            .unwrap_or_else(|| self.api.token().to_string());
        let uris = server.candidate_uris();
        Ok(self.probe_endpoints(&uris, &access_token, server_name).await)
    }

    async fn fetch_library_items(&self, library: &Library) -> Result<Vec<LibraryItem>, SourceError> {
        let items = self
            .api
            .get_section_items(&library.endpoint, &library.key, &library.access_token)
            .await
            .map_err(|e| SourceError::LibraryUnreadable {
                library: library.name.clone(),
                reason: e.to_string(),
            })?;

        debug!(library = %library.name, items = items.len(), "Fetched library items");
        Ok(items
            .into_iter()
            .map(|item| library_item_from(item, &library.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plex::api::GuidRef;

    fn movie_row() -> MetadataItem {
        MetadataItem {
            rating_key: Some("5d776b59".to_string()),
            type_: Some("movie".to_string()),
            title: "Dune".to_string(),
            original_title: Some("Dune: Part One".to_string()),
            year: Some(2021),
            thumb: Some("/library/metadata/5d776b59/thumb".to_string()),
            guid: Some("plex://movie/5d776b59".to_string()),
            guids: vec![GuidRef { id: "imdb://tt1160419".to_string() }],
            added_at: None,
        }
    }

    #[test]
    fn test_watchlist_entry_conversion() {
        let entry = watchlist_entry_from(movie_row()).unwrap();
        assert_eq!(entry.identifier.as_deref(), Some("5d776b59"));
        assert_eq!(entry.kind, MediaKind::Film);
        assert_eq!(entry.alternate_title.as_deref(), Some("Dune: Part One"));
        assert_eq!(
            entry.cross_refs,
            vec!["plex://movie/5d776b59".to_string(), "imdb://tt1160419".to_string()]
        );
    }

    #[test]
    fn test_unsupported_type_is_dropped() {
        let mut row = movie_row();
        row.type_ = Some("episode".to_string());
        assert!(watchlist_entry_from(row).is_none());
    }

    #[test]
    fn test_identical_original_title_is_not_an_alternate() {
        let mut row = movie_row();
        row.original_title = Some("DUNE".to_string());
        let entry = watchlist_entry_from(row).unwrap();
        assert_eq!(entry.alternate_title, None);
    }

    #[test]
    fn test_library_item_conversion() {
        let mut row = movie_row();
        row.added_at = Some(1_700_000_000);
        let item = library_item_from(row, "Películas");
        assert_eq!(item.library, "Películas");
        assert_eq!(item.added_at, 1_700_000_000);
        assert_eq!(item.cross_ref.as_deref(), Some("plex://movie/5d776b59"));
        assert_eq!(item.alternate_title.as_deref(), Some("Dune: Part One"));
    }

    #[test]
    fn test_sign_artwork() {
        assert_eq!(
            sign_artwork("/library/metadata/1/thumb", "tok"),
            Some("https://metadata.provider.plex.tv/library/metadata/1/thumb?X-Plex-Token=tok".to_string())
        );
        assert_eq!(
            sign_artwork("https://image.tmdb.org/p.jpg", "tok"),
            Some("https://image.tmdb.org/p.jpg".to_string())
        );
        assert_eq!(sign_artwork("", "tok"), None);
    }
}
