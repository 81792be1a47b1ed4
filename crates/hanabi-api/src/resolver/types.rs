use serde::Deserialize;

// ── Search ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
}

// ── Info (episode list) ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub episodes: Vec<EpisodeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeEntry {
    pub id: String,
    pub number: Option<u32>,
    pub url: Option<String>,
}

// ── Watch (sources for one episode) ──────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WatchResponse {
    #[serde(default)]
    pub sources: Vec<VideoSource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    pub url: String,
    pub quality: Option<String>,
    #[serde(default, rename = "isM3U8")]
    pub is_m3u8: bool,
}

impl WatchResponse {
    /// Prefer the adaptive "auto" source, otherwise the first listed.
    /// Sources with a blank URL are never chosen.
    pub fn primary_source(&self) -> Option<&VideoSource> {
        let mut playable = self.sources.iter().filter(|s| !s.url.trim().is_empty());
        playable
            .clone()
            .find(|s| s.quality.as_deref() == Some("auto"))
            .or_else(|| playable.next())
    }
}

impl InfoResponse {
    /// Lowest-numbered episode; entries without a number keep list order.
    pub fn first_episode(&self) -> Option<&EpisodeEntry> {
        self.episodes
            .iter()
            .min_by_key(|e| e.number.unwrap_or(u32::MAX))
    }
}
