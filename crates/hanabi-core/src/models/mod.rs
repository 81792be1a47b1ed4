mod query;
mod source;

pub use query::{Category, QueryState, QueryStatus};
pub use source::{ResolvedSource, SourceKind};

pub use hanabi_api::traits::{
    AnimeDetail, AnimeSummary, AnimeTitles, CoverImages, PlaybackCandidate, Trailer,
};
