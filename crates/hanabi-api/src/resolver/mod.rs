//! Best-effort playback resolvers.

pub mod client;
pub mod matching;
pub mod types;

pub use client::ResolverClient;

use crate::error::ApiError;
use crate::traits::{PlaybackCandidate, PlaybackResolver};

/// Resolver used when enrichment is disabled. Never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl PlaybackResolver for NoopResolver {
    async fn resolve(&self, _title_hint: &str) -> Result<PlaybackCandidate, ApiError> {
        Ok(PlaybackCandidate::default())
    }
}
