//! Provider trait definitions and the entity shapes they return.
//!
//! The metadata provider is the primary content source; the playback
//! resolver is a best-effort enrichment that callers must be able to
//! swap out or disable without touching the rest of the pipeline.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Catalog metadata service (trending, popular, detail, search).
pub trait MetadataProvider: Send + Sync {
    /// Fetch a page of currently trending anime.
    fn trending(
        &self,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<AnimeSummary>, ApiError>> + Send;

    /// Fetch a page of all-time popular anime, in upstream order.
    fn popular(
        &self,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<AnimeSummary>, ApiError>> + Send;

    /// Fetch full details for one anime. Fails with [`ApiError::NotFound`]
    /// when the upstream has no such entity.
    fn detail(&self, id: u64) -> impl Future<Output = Result<AnimeDetail, ApiError>> + Send;

    /// Search by title. A blank query resolves to an empty list without
    /// contacting the upstream.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<AnimeSummary>, ApiError>> + Send;
}

/// Best-effort lookup of a playable source for a title.
pub trait PlaybackResolver: Send + Sync {
    /// Locate a playback candidate. Implementations should prefer returning
    /// an empty candidate over an error; callers treat both the same way.
    fn resolve(
        &self,
        title_hint: &str,
    ) -> impl Future<Output = Result<PlaybackCandidate, ApiError>> + Send;
}

/// Title in its language variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeTitles {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl AnimeTitles {
    /// Returns the best available display title.
    pub fn display(&self) -> &str {
        self.english
            .as_deref()
            .or(self.romaji.as_deref())
            .or(self.native.as_deref())
            .unwrap_or("Unknown Title")
    }

    /// Title used as a hint for playback lookups (romaji matches release
    /// naming better than the localized title).
    pub fn lookup_hint(&self) -> Option<&str> {
        self.romaji
            .as_deref()
            .or(self.english.as_deref())
            .or(self.native.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImages {
    pub large: Option<String>,
    pub extra_large: Option<String>,
}

impl CoverImages {
    /// Highest resolution cover available.
    pub fn best(&self) -> Option<&str> {
        self.extra_large.as_deref().or(self.large.as_deref())
    }
}

/// One anime as it appears in a list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSummary {
    pub id: u64,
    pub titles: AnimeTitles,
    pub cover_image_urls: CoverImages,
    pub banner_image_url: Option<String>,
    pub genres: Vec<String>,
    pub episode_count: Option<u32>,
    /// 0-100.
    pub average_score: Option<u32>,
    pub status: Option<String>,
    pub start_year: Option<u32>,
    pub studio_name: Option<String>,
}

impl AnimeSummary {
    pub fn display_title(&self) -> &str {
        self.titles.display()
    }

    /// Banner image, falling back to the cover.
    pub fn banner_or_cover(&self) -> Option<&str> {
        self.banner_image_url
            .as_deref()
            .or_else(|| self.cover_image_urls.best())
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trailer {
    pub id: String,
    pub site: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Full detail for the selected anime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetail {
    #[serde(flatten)]
    pub summary: AnimeSummary,
    /// Raw upstream description; may contain markup.
    pub description: String,
    pub trailer: Option<Trailer>,
}

impl AnimeDetail {
    pub fn id(&self) -> u64 {
        self.summary.id
    }

    /// Description with markup removed.
    pub fn plain_description(&self) -> String {
        let text = strip_markup(&self.description);
        if text.is_empty() {
            "No description available.".to_string()
        } else {
            text
        }
    }
}

/// Result of a best-effort playback lookup. Every field is optional; an
/// all-empty value means nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCandidate {
    pub embed_url: Option<String>,
    pub external_id: Option<String>,
    pub watch_url: Option<String>,
}

impl PlaybackCandidate {
    pub fn is_empty(&self) -> bool {
        self.embed_url.as_deref().is_none_or(|u| u.trim().is_empty())
            && self.external_id.is_none()
    }
}

static RE_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Remove `<...>` tags, turning line breaks into newlines.
pub fn strip_markup(raw: &str) -> String {
    let with_breaks = RE_LINE_BREAK.replace_all(raw, "\n");
    RE_TAG.replace_all(&with_breaks, "").trim().to_string()
}
