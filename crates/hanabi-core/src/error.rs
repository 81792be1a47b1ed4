use hanabi_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for CatalogError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotFound(what) => Self::NotFound(what),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl CatalogError {
    /// Text shown to the user in a failure banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream(msg) => {
                format!("Failed to reach the anime catalog ({msg}). Please try again.")
            }
            Self::NotFound(_) => "Anime not found.".to_string(),
            Self::InvalidIdentifier(raw) => format!("Invalid anime ID provided: {raw:?}."),
            other => other.to_string(),
        }
    }
}

/// Parse a route identifier into an upstream anime id.
pub fn parse_anime_id(raw: &str) -> Result<u64, CatalogError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CatalogError::InvalidIdentifier(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anime_id() {
        assert_eq!(parse_anime_id("101").unwrap(), 101);
        assert_eq!(parse_anime_id(" 42 ").unwrap(), 42);
        assert!(matches!(
            parse_anime_id("abc"),
            Err(CatalogError::InvalidIdentifier(_))
        ));
        assert!(parse_anime_id("0").is_err());
        assert!(parse_anime_id("-5").is_err());
        assert!(parse_anime_id("").is_err());
    }

    #[test]
    fn test_api_error_mapping() {
        let not_found: CatalogError = ApiError::NotFound("anime 5".into()).into();
        assert!(matches!(not_found, CatalogError::NotFound(_)));
        assert_eq!(not_found.user_message(), "Anime not found.");

        let upstream: CatalogError = ApiError::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(upstream, CatalogError::Upstream(_)));
        assert!(upstream.user_message().contains("Please try again"));
    }
}
