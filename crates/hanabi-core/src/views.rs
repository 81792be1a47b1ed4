//! Derived read-only views over fetched lists.

use serde::Serialize;

use crate::models::AnimeSummary;

/// Number of popular titles promoted on the home page.
pub const FEATURED_COUNT: usize = 3;

/// Maximum number of related titles shown under a detail view.
pub const RELATED_LIMIT: usize = 12;

/// Pseudo-genre that disables filtering.
pub const ALL_GENRES: &str = "All";

/// Genres offered for browsing.
pub const GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Fantasy",
    "Horror",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Slice of Life",
    "Sports",
    "Supernatural",
    "Thriller",
    "Mecha",
    "Music",
    "Psychological",
];

/// Compact card for the featured strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCard {
    pub id: u64,
    pub title: String,
    pub image_url: Option<String>,
    /// 0.0-10.0.
    pub rating: f32,
    pub year: Option<u32>,
    pub episodes: Option<u32>,
    pub genre_label: String,
}

impl FeatureCard {
    pub fn from_summary(anime: &AnimeSummary) -> Self {
        let genre_label = if anime.genres.is_empty() {
            "Unknown".to_string()
        } else {
            anime
                .genres
                .iter()
                .take(2)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            id: anime.id,
            title: anime.display_title().to_string(),
            image_url: anime.cover_image_urls.best().map(str::to_string),
            rating: score_to_rating(anime.average_score),
            year: anime.start_year,
            episodes: anime.episode_count,
            genre_label,
        }
    }
}

/// Convert a 0-100 score to a 0-10 rating; missing scores rate 0.
pub fn score_to_rating(score: Option<u32>) -> f32 {
    score.unwrap_or(0).min(100) as f32 / 10.0
}

/// Human-readable airing status, e.g. `NOT_YET_RELEASED` → `NOT YET RELEASED`.
pub fn status_label(status: &str) -> String {
    status.replace('_', " ")
}

/// The top of the popular list, in upstream order.
pub fn featured(popular: &[AnimeSummary]) -> Vec<FeatureCard> {
    popular
        .iter()
        .take(FEATURED_COUNT)
        .map(FeatureCard::from_summary)
        .collect()
}

/// Entries tagged with `genre` (case-insensitive). [`ALL_GENRES`] or a
/// blank genre returns the list unfiltered.
pub fn filter_by_genre<'a>(list: &'a [AnimeSummary], genre: &str) -> Vec<&'a AnimeSummary> {
    let genre = genre.trim();
    if genre.is_empty() || genre.eq_ignore_ascii_case(ALL_GENRES) {
        return list.iter().collect();
    }
    list.iter().filter(|a| a.has_genre(genre)).collect()
}

/// Canonical spelling of a browsable genre, if it is one.
pub fn known_genre(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.eq_ignore_ascii_case(ALL_GENRES) {
        return Some(ALL_GENRES);
    }
    GENRES.iter().copied().find(|g| g.eq_ignore_ascii_case(name))
}

/// Other trending titles to suggest alongside `current_id`.
pub fn related(trending: &[AnimeSummary], current_id: u64) -> Vec<&AnimeSummary> {
    trending
        .iter()
        .filter(|a| a.id != current_id)
        .take(RELATED_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnimeTitles, CoverImages};

    fn anime(id: u64, genres: &[&str]) -> AnimeSummary {
        AnimeSummary {
            id,
            titles: AnimeTitles {
                english: Some(format!("Show {id}")),
                ..Default::default()
            },
            cover_image_urls: CoverImages {
                large: Some(format!("https://img/{id}-l.jpg")),
                extra_large: None,
            },
            banner_image_url: None,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            episode_count: Some(24),
            average_score: Some(87),
            status: None,
            start_year: Some(2020),
            studio_name: None,
        }
    }

    #[test]
    fn test_featured_cards() {
        let popular: Vec<_> = (1..=5)
            .map(|id| anime(id, &["Action", "Drama", "Fantasy"]))
            .collect();
        let cards = featured(&popular);

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].id, 1);
        assert_eq!(cards[0].title, "Show 1");
        assert_eq!(cards[0].genre_label, "Action, Drama");
        assert!((cards[0].rating - 8.7).abs() < f32::EPSILON);
        assert_eq!(cards[0].image_url.as_deref(), Some("https://img/1-l.jpg"));

        let bare = FeatureCard::from_summary(&AnimeSummary {
            average_score: None,
            ..anime(9, &[])
        });
        assert_eq!(bare.genre_label, "Unknown");
        assert_eq!(bare.rating, 0.0);
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label("NOT_YET_RELEASED"), "NOT YET RELEASED");
        assert_eq!(status_label("FINISHED"), "FINISHED");
    }

    #[test]
    fn test_filter_by_genre() {
        let list = vec![
            anime(1, &["Action"]),
            anime(2, &["Comedy", "Slice of Life"]),
            anime(3, &["action", "Mecha"]),
        ];

        assert_eq!(filter_by_genre(&list, "All").len(), 3);
        assert_eq!(filter_by_genre(&list, "").len(), 3);

        let ids: Vec<u64> = filter_by_genre(&list, "Action").iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(filter_by_genre(&list, "Horror").is_empty());
    }

    #[test]
    fn test_known_genre() {
        assert_eq!(known_genre("slice of life"), Some("Slice of Life"));
        assert_eq!(known_genre(" all "), Some("All"));
        assert_eq!(known_genre("Isekai"), None);
    }

    #[test]
    fn test_related_excludes_current_and_caps() {
        let trending: Vec<_> = (1..=20).map(|id| anime(id, &[])).collect();
        let picks = related(&trending, 3);

        assert_eq!(picks.len(), RELATED_LIMIT);
        assert!(picks.iter().all(|a| a.id != 3));
        assert_eq!(picks[2].id, 4);
    }
}
