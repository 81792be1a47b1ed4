use reqwest::{Client, StatusCode};

use crate::error::ApiError;
use crate::traits::{AnimeDetail, AnimeSummary, MetadataProvider};

use super::types::{AniListMedia, GraphQLResponse, MediaResponse, PageResponse};

pub const API_URL: &str = "https://graphql.anilist.co";

/// Page size used for search; AniList caps pages at 50.
const SEARCH_PAGE_SIZE: u32 = 20;

const TRENDING_QUERY: &str = r#"
query ($page: Int, $perPage: Int) {
    Page(page: $page, perPage: $perPage) {
        media(sort: TRENDING_DESC, type: ANIME) {
            id
            title { romaji english native }
            coverImage { large extraLarge }
            bannerImage
            genres
            episodes
            averageScore
            status
            startDate { year month day }
            studios(isMain: true) { nodes { name } }
        }
    }
}
"#;

const POPULAR_QUERY: &str = r#"
query ($page: Int, $perPage: Int) {
    Page(page: $page, perPage: $perPage) {
        media(sort: POPULARITY_DESC, type: ANIME) {
            id
            title { romaji english native }
            coverImage { large extraLarge }
            bannerImage
            genres
            episodes
            averageScore
            status
            startDate { year month day }
            studios(isMain: true) { nodes { name } }
        }
    }
}
"#;

const SEARCH_QUERY: &str = r#"
query ($search: String, $perPage: Int) {
    Page(page: 1, perPage: $perPage) {
        media(search: $search, type: ANIME) {
            id
            title { romaji english native }
            coverImage { large extraLarge }
            bannerImage
            genres
            episodes
            averageScore
            status
            startDate { year month day }
            studios(isMain: true) { nodes { name } }
        }
    }
}
"#;

const DETAIL_QUERY: &str = r#"
query ($id: Int) {
    Media(id: $id, type: ANIME) {
        id
        title { romaji english native }
        description(asHtml: false)
        coverImage { large extraLarge }
        bannerImage
        genres
        episodes
        averageScore
        status
        startDate { year month day }
        studios(isMain: true) { nodes { name } }
        trailer { id site thumbnail }
    }
}
"#;

/// AniList GraphQL API client. Only public (unauthenticated) queries are used.
#[derive(Debug, Clone)]
pub struct AniListClient {
    api_url: String,
    http: Client,
}

impl Default for AniListClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AniListClient {
    pub fn new() -> Self {
        Self::with_api_url(API_URL)
    }

    /// Point the client at a different GraphQL endpoint (mirrors, tests).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            http: Client::new(),
        }
    }

    async fn graphql_request<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ApiError> {
        tracing::debug!(operation, "AniList GraphQL request");

        let resp = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(operation, "AniList returned not found");
            return Err(ApiError::NotFound(operation.to_string()));
        }
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(operation, status = status_code, "AniList API error");
            return Err(ApiError::Api {
                status: status_code,
                message: body,
            });
        }

        tracing::debug!(operation, status = %status, "AniList response received");
        let body: GraphQLResponse<T> = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let message = body.error_message();
        match body.data {
            Some(data) => Ok(data),
            None if body.errors.iter().any(|e| e.status == Some(404)) => {
                Err(ApiError::NotFound(operation.to_string()))
            }
            None => Err(ApiError::Api {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| "response carried no data".into()),
            }),
        }
    }

    async fn page(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<Vec<AniListMedia>, ApiError> {
        let resp: PageResponse = self.graphql_request(operation, query, variables).await?;
        Ok(resp.page.media)
    }
}

impl MetadataProvider for AniListClient {
    async fn trending(&self, page: u32, per_page: u32) -> Result<Vec<AnimeSummary>, ApiError> {
        let media = self
            .page(
                "Trending",
                TRENDING_QUERY,
                serde_json::json!({ "page": page, "perPage": per_page }),
            )
            .await?;
        Ok(media.into_iter().map(AniListMedia::into_summary).collect())
    }

    async fn popular(&self, page: u32, per_page: u32) -> Result<Vec<AnimeSummary>, ApiError> {
        let media = self
            .page(
                "Popular",
                POPULAR_QUERY,
                serde_json::json!({ "page": page, "perPage": per_page }),
            )
            .await?;
        Ok(media.into_iter().map(AniListMedia::into_summary).collect())
    }

    async fn detail(&self, id: u64) -> Result<AnimeDetail, ApiError> {
        let resp: MediaResponse = self
            .graphql_request("Detail", DETAIL_QUERY, serde_json::json!({ "id": id }))
            .await?;
        resp.media
            .map(AniListMedia::into_detail)
            .ok_or_else(|| ApiError::NotFound(format!("anime {id}")))
    }

    async fn search(&self, query: &str) -> Result<Vec<AnimeSummary>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let media = self
            .page(
                "Search",
                SEARCH_QUERY,
                serde_json::json!({ "search": query, "perPage": SEARCH_PAGE_SIZE }),
            )
            .await?;
        Ok(media.into_iter().map(AniListMedia::into_summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn media_json(id: u64, english: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": { "romaji": null, "english": english, "native": null },
            "coverImage": { "large": "l.jpg", "extraLarge": null },
            "genres": ["Action"],
            "averageScore": 80
        })
    }

    #[tokio::test]
    async fn test_trending_sends_paging_variables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "variables": { "page": 2, "perPage": 5 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Page": { "media": [media_json(1, "One"), media_json(2, "Two")] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AniListClient::with_api_url(server.uri());
        let items = client.trending(2, 5).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].display_title(), "One");
        assert_eq!(items[1].id, 2);
    }

    #[tokio::test]
    async fn test_non_success_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = AniListClient::with_api_url(server.uri());
        match client.popular(1, 20).await {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "errors": [{ "message": "Not Found.", "status": 404 }],
                "data": { "Media": null }
            })))
            .mount(&server)
            .await;

        let client = AniListClient::with_api_url(server.uri());
        let err = client.detail(999_999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_detail_null_media_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Media": null }
            })))
            .mount(&server)
            .await;

        let client = AniListClient::with_api_url(server.uri());
        let err = client.detail(7).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_blank_search_skips_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = AniListClient::with_api_url(server.uri());
        assert!(client.search("").await.unwrap().is_empty());
        assert!(client.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_graphql_errors_without_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{ "message": "Too Many Requests." }]
            })))
            .mount(&server)
            .await;

        let client = AniListClient::with_api_url(server.uri());
        match client.search("frieren").await {
            Err(ApiError::Api { message, .. }) => assert_eq!(message, "Too Many Requests."),
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
