use serde::{Deserialize, Serialize};

/// What the detail view should present as playable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    NativeFile,
    HlsStream,
    Embed,
    Placeholder,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NativeFile => write!(f, "Video file"),
            Self::HlsStream => write!(f, "HLS stream"),
            Self::Embed => write!(f, "Embedded player"),
            Self::Placeholder => write!(f, "Placeholder"),
        }
    }
}

/// The resolved source for one detail selection. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSource {
    pub kind: SourceKind,
    pub url: String,
    /// Advisory display metadata only.
    pub inferred_episode: Option<u32>,
    pub external_watch_url: Option<String>,
}
