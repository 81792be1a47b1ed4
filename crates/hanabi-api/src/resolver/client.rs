use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::matching::{best_hit, MatchKind};
use super::types::{InfoResponse, SearchResponse, WatchResponse};
use crate::error::ApiError;
use crate::traits::{PlaybackCandidate, PlaybackResolver};

/// Default minimum confidence for a fuzzy title match.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Client for a scraping-style resolver service exposing
/// `GET /{query}`, `GET /info?id=` and `GET /watch?episodeId=`.
///
/// Lookups are best-effort: any failure along the chain yields an empty
/// [`PlaybackCandidate`] instead of an error.
#[derive(Debug, Clone)]
pub struct ResolverClient {
    base_url: Url,
    http: Client,
    match_threshold: f64,
}

impl ResolverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        // A trailing slash makes `Url::join` append instead of replacing
        // the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            http,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        })
    }

    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        url: Url,
    ) -> Result<T, ApiError> {
        tracing::debug!(operation, url = %url, "Resolver request");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Full lookup chain: search → best title match → first episode → sources.
    async fn lookup(&self, title_hint: &str) -> Result<PlaybackCandidate, ApiError> {
        let mut search_url = self.endpoint("")?;
        search_url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(title_hint);

        let search: SearchResponse = self.get_json("Search", search_url).await?;
        let Some((hit, kind)) = best_hit(title_hint, &search.results, self.match_threshold) else {
            tracing::debug!(title = title_hint, hits = search.results.len(), "No matching title");
            return Ok(PlaybackCandidate::default());
        };
        if let MatchKind::Fuzzy(confidence) = kind {
            tracing::debug!(title = title_hint, matched = %hit.title, confidence, "Fuzzy title match");
        }

        let mut info_url = self.endpoint("info")?;
        info_url.query_pairs_mut().append_pair("id", &hit.id);
        let info: InfoResponse = self.get_json("Info", info_url).await?;

        let Some(episode) = info.first_episode() else {
            tracing::debug!(id = %hit.id, "No episodes listed");
            return Ok(PlaybackCandidate {
                external_id: Some(hit.id.clone()),
                watch_url: hit.url.clone(),
                ..Default::default()
            });
        };

        let mut watch_url = self.endpoint("watch")?;
        watch_url
            .query_pairs_mut()
            .append_pair("episodeId", &episode.id);
        let watch: WatchResponse = self.get_json("Watch", watch_url).await?;

        Ok(PlaybackCandidate {
            embed_url: watch.primary_source().map(|s| s.url.clone()),
            external_id: Some(hit.id.clone()),
            watch_url: episode.url.clone().or_else(|| hit.url.clone()),
        })
    }
}

impl PlaybackResolver for ResolverClient {
    async fn resolve(&self, title_hint: &str) -> Result<PlaybackCandidate, ApiError> {
        let title_hint = title_hint.trim();
        if title_hint.is_empty() {
            return Ok(PlaybackCandidate::default());
        }

        match self.lookup(title_hint).await {
            Ok(candidate) => Ok(candidate),
            Err(e) => {
                tracing::warn!(title = title_hint, error = %e, "Playback lookup failed");
                Ok(PlaybackCandidate::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ResolverClient {
        ResolverClient::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_full_lookup_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Sousou%20no%20Frieren"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "id": "frieren-2nd-season-999", "title": "Sousou no Frieren 2nd Season" },
                    { "id": "frieren-18542", "title": "Sousou no Frieren", "url": "https://site/frieren-18542" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/info"))
            .and(query_param("id", "frieren-18542"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "episodes": [{ "id": "frieren-18542?ep=107257", "number": 1 }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("episodeId", "frieren-18542?ep=107257"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sources": [{ "url": "https://cdn/master.m3u8", "quality": "auto", "isM3U8": true }]
            })))
            .mount(&server)
            .await;

        let candidate = client(&server).resolve("Sousou no Frieren").await.unwrap();
        assert_eq!(candidate.embed_url.as_deref(), Some("https://cdn/master.m3u8"));
        assert_eq!(candidate.external_id.as_deref(), Some("frieren-18542"));
        assert_eq!(candidate.watch_url.as_deref(), Some("https://site/frieren-18542"));
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{ "id": "aot", "title": "Attack on Titan" }]
            })))
            .mount(&server)
            .await;

        let candidate = client(&server).resolve("Frieren").await.unwrap();
        assert!(candidate.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let candidate = client(&server).resolve("Frieren").await.unwrap();
        assert!(candidate.is_empty());
    }

    #[tokio::test]
    async fn test_blank_hint_skips_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(client(&server).resolve("  ").await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ResolverClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
