//! Terminal rendering of store state.
//!
//! Commands await their fetches, so `Loading` is only ever seen if a
//! category was never started; it renders like `Idle`.

use hanabi_core::models::{AnimeDetail, AnimeSummary, QueryState, QueryStatus, ResolvedSource};
use hanabi_core::presentation::Presentation;
use hanabi_core::views::{score_to_rating, status_label, FeatureCard};

const DESCRIPTION_PREVIEW_CHARS: usize = 300;

pub fn featured(cards: &[FeatureCard]) {
    if cards.is_empty() {
        return;
    }
    println!("== Featured ==");
    for card in cards {
        println!(
            "  [{}] {}  ★ {:.1}  {}  {} eps  {}",
            card.id,
            card.title,
            card.rating,
            optional(card.year),
            optional(card.episodes),
            card.genre_label,
        );
    }
    println!();
}

/// Print a list category. Returns `false` if it is `Failed`.
pub fn list(heading: &str, state: &QueryState<Vec<AnimeSummary>>) -> bool {
    println!("== {heading} ==");
    let ok = report_failure(state.status, state.error_message.as_deref());
    if state.data.is_empty() {
        if ok {
            println!("  No anime found.");
        }
    } else {
        for anime in &state.data {
            summary_line(anime);
        }
    }
    println!();
    ok
}

pub fn genre(name: &str, state: &QueryState<Vec<AnimeSummary>>, matches: &[&AnimeSummary]) {
    println!("== {name} ==");
    report_failure(state.status, state.error_message.as_deref());
    if matches.is_empty() {
        println!("  No anime found for this genre.");
    }
    for anime in matches {
        summary_line(anime);
    }
}

pub fn related(picks: &[&AnimeSummary]) {
    if picks.is_empty() {
        return;
    }
    println!("== You Might Also Like ==");
    for anime in picks {
        summary_line(anime);
    }
}

/// Print the selected detail and its source. Returns `false` if the
/// detail failed to load.
pub fn detail(state: &QueryState<Option<AnimeDetail>>, source: Option<&ResolvedSource>) -> bool {
    if !report_failure(state.status, state.error_message.as_deref()) {
        return false;
    }
    let Some(anime) = state.data.as_ref() else {
        return true;
    };
    let summary = &anime.summary;

    println!("{}", summary.display_title());
    if let Some(native) = summary.titles.native.as_deref() {
        println!("{native}");
    }
    println!(
        "★ {:.1}  {}  {} eps  {}",
        score_to_rating(summary.average_score),
        optional(summary.start_year),
        optional(summary.episode_count),
        status_text(summary.status.as_deref()),
    );
    if let Some(studio) = summary.studio_name.as_deref() {
        println!("Studio: {studio}");
    }
    if !summary.genres.is_empty() {
        println!("Genres: {}", summary.genres.join(", "));
    }
    if let Some(banner) = summary.banner_or_cover() {
        println!("Image: {banner}");
    }
    println!();
    println!("{}", preview(&anime.plain_description()));
    println!();

    if let Some(source) = source {
        playback(source);
    }
    true
}

fn playback(source: &ResolvedSource) {
    println!("== Watch ({}) ==", source.kind);
    if let Some(episode) = source.inferred_episode {
        println!("Episode {episode}");
    }
    match source.presentation() {
        Presentation::InlinePlayer { url, mime_type } => println!("Play: {url} ({mime_type})"),
        Presentation::Framed { url } => println!("Open: {url}"),
        Presentation::Demonstration { url, notice } => {
            println!("Play: {url}");
            println!("Note: {notice}");
        }
    }
    if let Some(external) = source.external_watch_url.as_deref() {
        if external != source.url {
            println!("More: {external}");
        }
    }
    println!();
}

fn summary_line(anime: &AnimeSummary) {
    let score = anime
        .average_score
        .map(|s| format!("★ {:.1}", score_to_rating(Some(s))))
        .unwrap_or_else(|| "★ -".into());
    let genres: Vec<&str> = anime.genres.iter().take(2).map(String::as_str).collect();
    println!(
        "  [{}] {}  {}  {}",
        anime.id,
        anime.display_title(),
        score,
        genres.join(", ")
    );
}

/// Print a failure banner. Returns `false` if the category failed.
fn report_failure(status: QueryStatus, message: Option<&str>) -> bool {
    if status != QueryStatus::Failed {
        return true;
    }
    eprintln!("  ! {}", message.unwrap_or("Something went wrong."));
    false
}

fn status_text(status: Option<&str>) -> String {
    status.map_or_else(|| "Unknown".to_string(), status_label)
}

fn optional(value: Option<u32>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn preview(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "葬".repeat(DESCRIPTION_PREVIEW_CHARS + 5);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), DESCRIPTION_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(Some(2023)), "2023");
        assert_eq!(optional(None), "N/A");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(Some("NOT_YET_RELEASED")), "NOT YET RELEASED");
        assert_eq!(status_text(Some("RELEASING")), "RELEASING");
        assert_eq!(status_text(None), "Unknown");
    }
}
