//! Source resolution: turn a playback candidate and trailer metadata into
//! exactly one [`ResolvedSource`].
//!
//! Preference order, first match wins:
//! 1. a non-empty candidate URL (classified as HLS, file or embed),
//! 2. the trailer, linked through its hosting site,
//! 3. the fixed placeholder asset.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::models::{PlaybackCandidate, ResolvedSource, SourceKind, Trailer};

/// Marker identifying an HLS manifest anywhere in a URL.
const HLS_MARKER: &str = ".m3u8";

/// Extensions played directly by an inline player.
pub const VIDEO_FILE_EXTENSIONS: &[&str] = &["mp4", "m4v", "webm", "mkv", "mov", "ogv", "avi"];

const DEFAULT_EPISODE: u32 = 1;

static RE_EPISODE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&#;/])ep=(\d+)").unwrap());

/// Base for resolving bare relative paths like `foo.mp4`.
static RELATIVE_BASE: LazyLock<Url> = LazyLock::new(|| Url::parse("file:///").unwrap());

/// Pick the source to present for a detail view.
pub fn resolve_source(
    candidate: Option<&PlaybackCandidate>,
    trailer: Option<&Trailer>,
    placeholder_url: &str,
) -> ResolvedSource {
    let candidate_url = candidate
        .and_then(|c| c.embed_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let candidate_watch = candidate
        .and_then(|c| c.watch_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    if let Some(url) = candidate_url {
        return ResolvedSource {
            kind: classify_url(url),
            url: url.to_string(),
            inferred_episode: Some(infer_episode(url)),
            external_watch_url: candidate_watch,
        };
    }

    if let Some(trailer) = trailer.filter(|t| !t.id.trim().is_empty()) {
        let url = trailer_link(trailer);
        return ResolvedSource {
            kind: SourceKind::Embed,
            inferred_episode: Some(infer_episode(&url)),
            external_watch_url: candidate_watch.or_else(|| Some(url.clone())),
            url,
        };
    }

    ResolvedSource {
        kind: SourceKind::Placeholder,
        url: placeholder_url.to_string(),
        inferred_episode: Some(DEFAULT_EPISODE),
        external_watch_url: candidate_watch,
    }
}

/// Classify a playback URL by its shape.
pub fn classify_url(url: &str) -> SourceKind {
    let lower = url.to_ascii_lowercase();
    if lower.contains(HLS_MARKER) {
        return SourceKind::HlsStream;
    }
    match file_extension(url).as_deref() {
        Some(ext) if VIDEO_FILE_EXTENSIONS.contains(&ext) => SourceKind::NativeFile,
        _ => SourceKind::Embed,
    }
}

/// Lowercased extension of the last path segment. Query and fragment
/// never contribute.
pub fn file_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).or_else(|_| RELATIVE_BASE.join(url)).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let (stem, ext) = last.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Episode number from the first positive `ep=<digits>` parameter,
/// defaulting to 1.
pub fn infer_episode(url: &str) -> u32 {
    RE_EPISODE_PARAM
        .captures_iter(url)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .find(|&n| n > 0)
        .unwrap_or(DEFAULT_EPISODE)
}

/// Canonical external link for a trailer on its hosting site.
pub fn trailer_link(trailer: &Trailer) -> String {
    let id = trailer.id.trim();
    match trailer.site.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("dailymotion") => format!("https://www.dailymotion.com/video/{id}"),
        _ => format!("https://youtu.be/{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "https://example.com/sample.mp4";

    fn candidate(url: &str) -> PlaybackCandidate {
        PlaybackCandidate {
            embed_url: Some(url.into()),
            ..Default::default()
        }
    }

    fn trailer(id: &str, site: Option<&str>) -> Trailer {
        Trailer {
            id: id.into(),
            site: site.map(Into::into),
            thumbnail_url: None,
        }
    }

    #[test]
    fn test_candidate_kinds() {
        let hls = resolve_source(Some(&candidate("foo.m3u8")), None, PLACEHOLDER);
        assert_eq!(hls.kind, SourceKind::HlsStream);
        assert_eq!(hls.url, "foo.m3u8");

        let file = resolve_source(Some(&candidate("foo.mp4")), None, PLACEHOLDER);
        assert_eq!(file.kind, SourceKind::NativeFile);

        let embed = resolve_source(Some(&candidate("https://host/embed/x")), None, PLACEHOLDER);
        assert_eq!(embed.kind, SourceKind::Embed);
    }

    #[test]
    fn test_candidate_beats_trailer() {
        let source = resolve_source(
            Some(&candidate("https://cdn/master.m3u8?token=1")),
            Some(&trailer("abc123", Some("youtube"))),
            PLACEHOLDER,
        );
        assert_eq!(source.kind, SourceKind::HlsStream);
    }

    #[test]
    fn test_blank_candidate_falls_through() {
        let source = resolve_source(
            Some(&candidate("   ")),
            Some(&trailer("abc123", None)),
            PLACEHOLDER,
        );
        assert_eq!(source.kind, SourceKind::Embed);
        assert_eq!(source.url, "https://youtu.be/abc123");
    }

    #[test]
    fn test_trailer_fallback() {
        let source = resolve_source(None, Some(&trailer("abc123", Some("youtube"))), PLACEHOLDER);
        assert_eq!(source.kind, SourceKind::Embed);
        assert_eq!(source.url, "https://youtu.be/abc123");
        assert_eq!(source.external_watch_url.as_deref(), Some("https://youtu.be/abc123"));
        assert_eq!(source.inferred_episode, Some(1));

        let dm = resolve_source(None, Some(&trailer("x8abc", Some("dailymotion"))), PLACEHOLDER);
        assert_eq!(dm.url, "https://www.dailymotion.com/video/x8abc");
    }

    #[test]
    fn test_placeholder_fallback() {
        let source = resolve_source(None, None, PLACEHOLDER);
        assert_eq!(source.kind, SourceKind::Placeholder);
        assert_eq!(source.url, PLACEHOLDER);
        assert_eq!(source.inferred_episode, Some(1));

        let empty = resolve_source(Some(&PlaybackCandidate::default()), None, PLACEHOLDER);
        assert_eq!(empty.kind, SourceKind::Placeholder);
    }

    #[test]
    fn test_classify_ignores_query_and_case() {
        assert_eq!(classify_url("https://cdn/Episode.MP4?sig=abc"), SourceKind::NativeFile);
        assert_eq!(classify_url("https://cdn/video.webm#t=10"), SourceKind::NativeFile);
        assert_eq!(classify_url("https://cdn/hls/index.m3u8"), SourceKind::HlsStream);
        assert_eq!(classify_url("https://host/watch/show.mp4/embed"), SourceKind::Embed);
        assert_eq!(classify_url("https://host.example/player"), SourceKind::Embed);
    }

    #[test]
    fn test_infer_episode() {
        assert_eq!(infer_episode("https://site/watch/show?ep=7"), 7);
        assert_eq!(infer_episode("https://site/watch/show#ep=12"), 12);
        assert_eq!(infer_episode("https://site/watch?id=1&ep=3&lang=en"), 3);
        assert_eq!(infer_episode("https://site/watch/show"), 1);
        assert_eq!(infer_episode("https://site/watch?ep=abc"), 1);
        assert_eq!(infer_episode("https://site/watch?ep=0"), 1);
        // `step=5` is not an episode parameter.
        assert_eq!(infer_episode("https://site/watch?step=5"), 1);
        assert_eq!(infer_episode("https://site/watch?step=5&ep=2"), 2);
        assert_eq!(infer_episode("https://site/watch?ep=0&ep=4"), 4);
        assert_eq!(infer_episode("ep=9"), 9);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("https://cdn/Episode.MP4?sig=a.b"), Some("mp4".into()));
        assert_eq!(file_extension("https://cdn/clip.mkv#frag.avi"), Some("mkv".into()));
        assert_eq!(file_extension("videos/foo.webm"), Some("webm".into()));
        assert_eq!(file_extension("https://cdn/dir/"), None);
        assert_eq!(file_extension("https://cdn/.hidden"), None);
        assert_eq!(file_extension("https://cdn/player"), None);
    }

    #[test]
    fn test_candidate_watch_url_survives_fallback() {
        let watch_only = PlaybackCandidate {
            watch_url: Some("https://site/watch/frieren".into()),
            ..Default::default()
        };

        let source = resolve_source(
            Some(&watch_only),
            Some(&trailer("abc123", Some("youtube"))),
            PLACEHOLDER,
        );
        assert_eq!(source.kind, SourceKind::Embed);
        assert_eq!(source.url, "https://youtu.be/abc123");
        assert_eq!(
            source.external_watch_url.as_deref(),
            Some("https://site/watch/frieren")
        );

        let source = resolve_source(Some(&watch_only), None, PLACEHOLDER);
        assert_eq!(source.kind, SourceKind::Placeholder);
        assert_eq!(
            source.external_watch_url.as_deref(),
            Some("https://site/watch/frieren")
        );

        let blank_watch = PlaybackCandidate {
            watch_url: Some("  ".into()),
            ..Default::default()
        };
        let source = resolve_source(Some(&blank_watch), None, PLACEHOLDER);
        assert_eq!(source.external_watch_url, None);
    }
}
