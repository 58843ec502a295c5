use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use watchkeeper_models::{MediaKind, RATING_UNKNOWN};

use crate::error::SourceError;
use crate::traits::RatingLookup;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum RatingError {
    #[error("TMDB request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TMDB returned HTTP {0}")]
    HttpStatus(u16),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    vote_count: Option<u64>,
}

/// Rating of the first search hit, `None` when there is no usable score
fn rating_from(response: &SearchResponse) -> Option<String> {
    let first = response.results.first()?;
    if first.vote_count == Some(0) {
        return None;
    }
    first
        .vote_average
        .filter(|avg| *avg > 0.0)
        .map(|avg| format!("{:.1}", avg))
}

/// The second query only runs when it names something different from the first
fn distinct_fallback<'a>(primary: &str, fallback: Option<&'a str>) -> Option<&'a str> {
    fallback
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case(primary.trim()))
}

/// Ratings from The Movie Database search API
pub struct TmdbRatings {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl TmdbRatings {
    pub fn new(api_key: String, language: String) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            language,
            base_url: TMDB_BASE_URL.to_string(),
        })
    }

    async fn search(&self, query: &str, year: Option<u32>, kind: MediaKind) -> Result<Option<String>, RatingError> {
        let (path, year_param) = match kind {
            MediaKind::Film => ("movie", "year"),
            MediaKind::Series => ("tv", "first_air_date_year"),
        };
        let url = format!("{}/search/{}", self.base_url, path);

        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("query", query.to_string()),
            ("language", self.language.clone()),
        ];
        if let Some(year) = year.filter(|y| *y > 0) {
            params.push((year_param, year.to_string()));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(RatingError::HttpStatus(response.status().as_u16()));
        }
        let body: SearchResponse = response.json().await?;
        Ok(rating_from(&body))
    }

    async fn try_query(&self, query: &str, year: Option<u32>, kind: MediaKind) -> Option<String> {
        match self.search(query, year, kind).await {
            Ok(rating) => rating,
            Err(e) => {
                debug!(query, error = %e, "Rating lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl RatingLookup for TmdbRatings {
    async fn lookup(&self, primary: &str, fallback: Option<&str>, year: Option<u32>, kind: MediaKind) -> String {
        if let Some(rating) = self.try_query(primary, year, kind).await {
            return rating;
        }
        if let Some(alternate) = distinct_fallback(primary, fallback) {
            if let Some(rating) = self.try_query(alternate, year, kind).await {
                return rating;
            }
        }
        debug!(title = primary, "No rating found");
        RATING_UNKNOWN.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SearchResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_result_rating_is_formatted() {
        let body = parse(r#"{"results": [{"vote_average": 7.26, "vote_count": 1200}, {"vote_average": 5.0}]}"#);
        assert_eq!(rating_from(&body), Some("7.3".to_string()));
    }

    #[test]
    fn test_empty_or_unvoted_results_have_no_rating() {
        assert_eq!(rating_from(&parse(r#"{"results": []}"#)), None);
        assert_eq!(rating_from(&parse(r#"{"page": 1}"#)), None);
        assert_eq!(
            rating_from(&parse(r#"{"results": [{"vote_average": 0.0, "vote_count": 0}]}"#)),
            None
        );
    }

    #[test]
    fn test_fallback_only_when_different() {
        assert_eq!(distinct_fallback("Wrath of Man", Some("Despierta la furia")), Some("Despierta la furia"));
        assert_eq!(distinct_fallback("Dune", Some("DUNE")), None);
        assert_eq!(distinct_fallback("Dune", Some("  ")), None);
        assert_eq!(distinct_fallback("Dune", None), None);
    }
}
