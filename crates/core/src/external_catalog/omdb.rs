//! OMDb-style catalog client.
//!
//! One endpoint serves both lookups: `?apikey=<KEY>&s=<query>` for search and
//! `?apikey=<KEY>&i=<id>` for detail. Every body carries a `Response` field;
//! `"False"` means the catalog found nothing, whatever the HTTP status says.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::types::{ItemDetail, SearchResult};
use super::{Catalog, CatalogError};
use crate::config::CatalogConfig;

/// OMDb API client.
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    /// Create a new client from catalog configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "catalog API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        param: &str,
        value: &str,
    ) -> Result<T, CatalogError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), (param, value)])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        classify(status, &body)
    }
}

#[async_trait]
impl Catalog for OmdbClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        debug!("Catalog search: query='{}'", query);

        let response: OmdbSearchResponse = self.lookup("s", query).await?;

        Ok(response.search.into_iter().map(|r| r.into()).collect())
    }

    async fn detail(&self, id: &str) -> Result<ItemDetail, CatalogError> {
        debug!("Catalog detail: id={}", id);

        let details: OmdbDetails = self.lookup("i", id).await?;

        Ok(details.into())
    }
}

/// Turn a raw status + body into a typed payload or a classified error.
fn classify<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, CatalogError> {
    if let Ok(envelope) = serde_json::from_str::<OmdbEnvelope>(body) {
        if envelope.response.as_deref() == Some("False") {
            return Err(CatalogError::NotFound(envelope.error.unwrap_or_default()));
        }
    }

    if !(200..300).contains(&status) {
        return Err(CatalogError::ApiError {
            status,
            message: body.to_string(),
        });
    }

    serde_json::from_str(body)
        .map_err(|e| CatalogError::ParseError(format!("Failed to parse catalog response: {}", e)))
}

/// The catalog writes "N/A" for missing fields.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

// ============================================================================
// OMDb API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OmdbEnvelope {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbDetails {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "Released")]
    released: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<OmdbSearchItem> for SearchResult {
    fn from(r: OmdbSearchItem) -> Self {
        Self {
            id: r.imdb_id,
            title: r.title,
            year: r.year,
            poster_url: present(r.poster),
        }
    }
}

impl From<OmdbDetails> for ItemDetail {
    fn from(d: OmdbDetails) -> Self {
        Self {
            id: d.imdb_id,
            title: d.title,
            year: d.year,
            poster_url: present(d.poster),
            runtime: present(d.runtime),
            imdb_rating: present(d.imdb_rating),
            plot: present(d.plot),
            released: present(d.released),
            actors: present(d.actors),
            director: present(d.director),
            genre: present(d.genre),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_search_response_conversion() {
        let body = r#"{"Search":[{"Title":"Batman","Year":"1989","imdbID":"tt0096895","Type":"movie","Poster":"https://img/b.jpg"},{"Title":"Batman Begins","Year":"2005","imdbID":"tt0372784","Type":"movie","Poster":"N/A"}],"totalResults":"2","Response":"True"}"#;

        let response: OmdbSearchResponse = classify(200, body).unwrap();
        let results: Vec<SearchResult> = response.search.into_iter().map(|r| r.into()).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "tt0096895");
        assert_eq!(results[0].poster_url.as_deref(), Some("https://img/b.jpg"));
        assert!(results[1].poster_url.is_none());
    }

    #[test]
    fn test_response_false_is_not_found() {
        let body = r#"{"Response":"False","Error":"Movie not found!"}"#;
        let result: Result<OmdbSearchResponse, _> = classify(200, body);
        match result {
            Err(CatalogError::NotFound(message)) => assert_eq!(message, "Movie not found!"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_response_false_wins_over_status() {
        let body = r#"{"Response":"False","Error":"Invalid API key!"}"#;
        let result: Result<OmdbSearchResponse, _> = classify(401, body);
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_non_success_status_is_api_error() {
        let result: Result<OmdbSearchResponse, _> = classify(503, "Service Unavailable");
        assert!(matches!(
            result,
            Err(CatalogError::ApiError { status: 503, .. })
        ));
    }

    #[test]
    fn test_garbage_body_is_parse_error() {
        let result: Result<OmdbDetails, _> = classify(200, "<html>");
        assert!(matches!(result, Err(CatalogError::ParseError(_))));
    }

    #[test]
    fn test_true_response_without_results_is_empty() {
        let response: OmdbSearchResponse = classify(200, r#"{"Response":"True"}"#).unwrap();
        assert!(response.search.is_empty());
    }

    #[test]
    fn test_details_conversion() {
        let body = r#"{"Title":"Batman","Year":"1989","Released":"23 Jun 1989","Runtime":"126 min","Genre":"Action, Adventure","Director":"Tim Burton","Actors":"Michael Keaton, Jack Nicholson","Plot":"The Dark Knight of Gotham City begins his war on crime.","Poster":"https://img/b.jpg","imdbRating":"7.5","imdbID":"tt0096895","Response":"True"}"#;

        let details: OmdbDetails = classify(200, body).unwrap();
        let detail: ItemDetail = details.into();

        assert_eq!(detail.id, "tt0096895");
        assert_eq!(detail.runtime_minutes(), Some(126));
        assert_eq!(detail.catalog_rating(), Some(7.5));
        assert_eq!(detail.director.as_deref(), Some("Tim Burton"));
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = OmdbClient::new(CatalogConfig::with_api_key(""));
        assert!(matches!(result, Err(CatalogError::NotConfigured(_))));
    }

    /// Serve exactly one canned HTTP response and hand back the request line.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}/", addr), handle)
    }

    #[tokio::test]
    async fn test_search_sends_key_and_query() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"Search":[{"Title":"Batman","Year":"1989","imdbID":"tt1"}],"Response":"True"}"#,
        )
        .await;

        let client = OmdbClient::new(CatalogConfig {
            base_url,
            ..CatalogConfig::with_api_key("d14a910e")
        })
        .unwrap();

        let results = client.search("dark knight").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tt1");

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /?"));
        assert!(request_line.contains("apikey=d14a910e"));
        assert!(request_line.contains("s=dark+knight"));
    }

    #[tokio::test]
    async fn test_server_error_status_is_classified() {
        let (base_url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;

        let client = OmdbClient::new(CatalogConfig {
            base_url,
            ..CatalogConfig::with_api_key("k")
        })
        .unwrap();

        let err = client.detail("tt1").await.unwrap_err();
        assert!(matches!(err, CatalogError::ApiError { status: 500, .. }));
        assert_eq!(err.user_message(), "Ooops. Something went wrong.");

        let request_line = server.await.unwrap();
        assert!(request_line.contains("i=tt1"));
    }
}
