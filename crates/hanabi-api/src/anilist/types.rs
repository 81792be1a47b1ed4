use serde::Deserialize;

use crate::traits::{AnimeDetail, AnimeSummary, AnimeTitles, CoverImages, Trailer};

// ── GraphQL response wrappers ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    pub status: Option<u16>,
}

impl<T> GraphQLResponse<T> {
    /// Joined error messages, if the response carried any.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

// ── Page / media queries ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageResponse {
    #[serde(rename = "Page")]
    pub page: PageData,
}

#[derive(Debug, Deserialize)]
pub struct PageData {
    pub media: Vec<AniListMedia>,
}

#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    #[serde(rename = "Media")]
    pub media: Option<AniListMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniListMedia {
    pub id: u64,
    pub title: Option<AniListTitle>,
    pub cover_image: Option<CoverImage>,
    pub banner_image: Option<String>,
    pub genres: Option<Vec<String>>,
    pub episodes: Option<u32>,
    pub average_score: Option<u32>,
    pub status: Option<String>,
    pub start_date: Option<FuzzyDate>,
    pub studios: Option<StudioConnection>,
    pub description: Option<String>,
    pub trailer: Option<AniListTrailer>,
}

#[derive(Debug, Deserialize)]
pub struct AniListTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub large: Option<String>,
    pub extra_large: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StudioConnection {
    pub nodes: Option<Vec<StudioNode>>,
}

#[derive(Debug, Deserialize)]
pub struct StudioNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FuzzyDate {
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AniListTrailer {
    pub id: Option<String>,
    pub site: Option<String>,
    pub thumbnail: Option<String>,
}

impl AniListMedia {
    pub fn into_summary(self) -> AnimeSummary {
        self.split().0
    }

    pub fn into_detail(self) -> AnimeDetail {
        let (summary, description, trailer) = self.split();
        AnimeDetail {
            summary,
            description: description.unwrap_or_default(),
            trailer,
        }
    }

    fn split(self) -> (AnimeSummary, Option<String>, Option<Trailer>) {
        let titles = self
            .title
            .map(|t| AnimeTitles {
                romaji: t.romaji,
                english: t.english,
                native: t.native,
            })
            .unwrap_or_default();

        let cover_image_urls = self
            .cover_image
            .map(|c| CoverImages {
                large: c.large,
                extra_large: c.extra_large,
            })
            .unwrap_or_default();

        // Queries ask for main studios only; the first one is the credit shown.
        let studio_name = self
            .studios
            .and_then(|s| s.nodes)
            .and_then(|nodes| nodes.into_iter().next())
            .map(|n| n.name);

        // A trailer without an id can't be linked to.
        let trailer = self.trailer.and_then(|t| {
            t.id.filter(|id| !id.is_empty()).map(|id| Trailer {
                id,
                site: t.site,
                thumbnail_url: t.thumbnail,
            })
        });

        let summary = AnimeSummary {
            id: self.id,
            titles,
            cover_image_urls,
            banner_image_url: self.banner_image,
            genres: self.genres.unwrap_or_default(),
            episode_count: self.episodes,
            average_score: self.average_score,
            status: self.status,
            start_year: self.start_date.and_then(|d| d.year),
            studio_name,
        };

        (summary, self.description, trailer)
    }
}
