//! How a view layer should render a [`ResolvedSource`].

use serde::Serialize;
use url::Url;

use crate::models::{ResolvedSource, SourceKind};
use crate::resolution::file_extension;

pub const PLACEHOLDER_NOTICE: &str = "This is a placeholder video for demonstration purposes only. \
     Actual anime streaming content is not provided.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Presentation {
    /// Inline video element.
    InlinePlayer { url: String, mime_type: &'static str },
    /// Framed third-party viewer.
    Framed { url: String },
    /// Demonstration content with an explicit "not the real content" notice.
    Demonstration { url: String, notice: &'static str },
}

impl ResolvedSource {
    pub fn presentation(&self) -> Presentation {
        match self.kind {
            SourceKind::HlsStream => Presentation::InlinePlayer {
                url: self.url.clone(),
                mime_type: "application/x-mpegURL",
            },
            SourceKind::NativeFile => Presentation::InlinePlayer {
                url: self.url.clone(),
                mime_type: mime_for(&self.url),
            },
            SourceKind::Embed => Presentation::Framed {
                url: frame_url(&self.url),
            },
            SourceKind::Placeholder => Presentation::Demonstration {
                url: self.url.clone(),
                notice: PLACEHOLDER_NOTICE,
            },
        }
    }
}

fn mime_for(url: &str) -> &'static str {
    match file_extension(url).as_deref() {
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("ogv") => "video/ogg",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}

/// Rewrite watch links into their embeddable form where the host needs it.
/// Anything unrecognized is returned unchanged.
pub fn frame_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.to_string();
    };
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host);
    let mut segments = parsed
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty());

    let embedded = match host {
        "youtu.be" => segments.next().and_then(|id| youtube_embed(&parsed, id)),
        "youtube.com" if parsed.path() == "/watch" => parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .and_then(|(_, id)| youtube_embed(&parsed, &id)),
        "dailymotion.com" => match (segments.next(), segments.next()) {
            (Some("video"), Some(id)) => {
                Some(format!("https://www.dailymotion.com/embed/video/{id}"))
            }
            _ => None,
        },
        _ => None,
    };
    embedded.unwrap_or_else(|| url.to_string())
}

/// YouTube embed URL for `id`, keeping every query parameter except `v`.
fn youtube_embed(watch: &Url, id: &str) -> Option<String> {
    if id.is_empty() {
        return None;
    }
    let kept: Vec<(String, String)> = watch
        .query_pairs()
        .filter(|(k, _)| k != "v")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut embed = watch.clone();
    embed.set_scheme("https").ok()?;
    embed.set_host(Some("www.youtube.com")).ok()?;
    embed.set_path(&format!("/embed/{id}"));
    embed.set_query(None);
    if !kept.is_empty() {
        embed.query_pairs_mut().extend_pairs(kept);
    }
    Some(String::from(embed))
}
