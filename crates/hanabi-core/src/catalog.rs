//! Fetch orchestration: drives the providers and feeds results into the
//! [`ViewStore`] through its dispatch contract.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hanabi_api::traits::{MetadataProvider, PlaybackResolver};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{parse_anime_id, CatalogError};
use crate::models::{PlaybackCandidate, QueryStatus, Trailer};
use crate::resolution::resolve_source;
use crate::store::{self, QueryKind, Ticket, ViewStore};

/// Tunables the orchestrator needs from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub page_size: u32,
    pub cache_ttl: Duration,
    pub enrichment_timeout: Duration,
    pub search_debounce: Duration,
    pub placeholder_url: String,
}

impl From<&AppConfig> for CatalogSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.metadata.page_size,
            cache_ttl: Duration::from_secs(config.metadata.cache_ttl_secs),
            enrichment_timeout: config.enrichment.timeout(),
            search_debounce: Duration::from_millis(config.search.debounce_ms),
            placeholder_url: config.playback.placeholder_url.clone(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// What a list or search fetch ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh data landed in the store.
    Loaded,
    /// The category is now `Failed`.
    Failed,
    /// Nothing dispatched: cached data is fresh, a fetch is already in
    /// flight, or the input was empty.
    Skipped,
    /// The result arrived after a newer request took over and was dropped.
    Superseded,
}

/// Outcome of selecting a detail id.
#[derive(Debug)]
pub enum Selection {
    /// Already selected and loading or loaded; nothing dispatched.
    Unchanged,
    /// Malformed identifier; detail is `Failed` without a network call.
    Invalid,
    /// The metadata fetch failed; detail is `Failed`.
    Failed,
    /// Another selection replaced this one before its response arrived.
    Superseded,
    /// Detail is `Ready` with a provisional source. `enrichment` finishes
    /// once the playback lookup has settled.
    Loaded { enrichment: Option<JoinHandle<()>> },
}

/// Coordinates the metadata provider, the playback resolver and the store.
///
/// Cheap to clone; clones share the same store and in-flight bookkeeping.
pub struct Catalog<M, R> {
    inner: Arc<Shared<M, R>>,
}

struct Shared<M, R> {
    metadata: M,
    resolver: R,
    store: Arc<ViewStore>,
    settings: CatalogSettings,
    search_generation: AtomicU64,
    enrichment: Mutex<Option<AbortHandle>>,
}

impl<M, R> Clone for Catalog<M, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, R> Catalog<M, R>
where
    M: MetadataProvider + 'static,
    R: PlaybackResolver + 'static,
{
    pub fn new(metadata: M, resolver: R, store: Arc<ViewStore>, settings: CatalogSettings) -> Self {
        Self {
            inner: Arc::new(Shared {
                metadata,
                resolver,
                store,
                settings,
                search_generation: AtomicU64::new(0),
                enrichment: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &Arc<ViewStore> {
        &self.inner.store
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.inner.settings
    }

    pub fn metadata(&self) -> &M {
        &self.inner.metadata
    }

    // ── Lists ───────────────────────────────────────────────────

    /// Load the first trending page unless the cached one is still fresh.
    pub async fn ensure_trending(&self) -> FetchOutcome {
        if self.is_fresh::<store::Trending>() {
            debug!("Trending list is fresh, skipping fetch");
            return FetchOutcome::Skipped;
        }
        self.refresh_trending(1).await
    }

    pub async fn refresh_trending(&self, page: u32) -> FetchOutcome {
        let Some(ticket) = self.inner.store.dispatch_start::<store::Trending>() else {
            return FetchOutcome::Skipped;
        };
        let result = self
            .inner
            .metadata
            .trending(page.max(1), self.inner.settings.page_size)
            .await;
        self.apply::<store::Trending>(ticket, result.map_err(CatalogError::from))
    }

    /// Load the first popular page unless the cached one is still fresh.
    pub async fn ensure_popular(&self) -> FetchOutcome {
        if self.is_fresh::<store::Popular>() {
            debug!("Popular list is fresh, skipping fetch");
            return FetchOutcome::Skipped;
        }
        self.refresh_popular(1).await
    }

    pub async fn refresh_popular(&self, page: u32) -> FetchOutcome {
        let Some(ticket) = self.inner.store.dispatch_start::<store::Popular>() else {
            return FetchOutcome::Skipped;
        };
        let result = self
            .inner
            .metadata
            .popular(page.max(1), self.inner.settings.page_size)
            .await;
        self.apply::<store::Popular>(ticket, result.map_err(CatalogError::from))
    }

    /// Trending and popular, fetched concurrently. Each list fails on its own.
    pub async fn load_home(&self) -> (FetchOutcome, FetchOutcome) {
        futures::join!(self.ensure_trending(), self.ensure_popular())
    }

    fn is_fresh<K: QueryKind>(&self) -> bool {
        self.inner
            .store
            .state::<K>()
            .is_fresh(self.inner.settings.cache_ttl)
    }

    fn apply<K: QueryKind>(
        &self,
        ticket: Ticket,
        result: Result<K::Data, CatalogError>,
    ) -> FetchOutcome {
        let store = &self.inner.store;
        match result {
            Ok(data) => {
                if store.dispatch_success::<K>(ticket, data) {
                    info!(category = %K::CATEGORY, "Fetch complete");
                    FetchOutcome::Loaded
                } else {
                    FetchOutcome::Superseded
                }
            }
            Err(e) => {
                warn!(category = %K::CATEGORY, error = %e, "Fetch failed");
                if store.dispatch_failure::<K>(ticket, e.user_message()) {
                    FetchOutcome::Failed
                } else {
                    FetchOutcome::Superseded
                }
            }
        }
    }

    // ── Detail ──────────────────────────────────────────────────

    /// Select the anime identified by `raw_id`, fetch it, and start the
    /// playback lookup once it is `Ready`.
    pub async fn select_detail(&self, raw_id: &str) -> Selection {
        let store = &self.inner.store;

        let id = match parse_anime_id(raw_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(raw_id, "Rejected detail identifier");
                self.clear_selected();
                if let Some(ticket) = store.dispatch_start::<store::Detail>() {
                    store.dispatch_failure::<store::Detail>(ticket, e.user_message());
                }
                return Selection::Invalid;
            }
        };

        if store.selected_id() == Some(id) {
            let state = store.state::<store::Detail>();
            if state.is_loading() || state.status == QueryStatus::Ready {
                debug!(id, "Detail already selected");
                return Selection::Unchanged;
            }
        }

        self.abort_enrichment();
        let ticket = store.dispatch_select(id);
        let result = self.inner.metadata.detail(id).await;

        let detail = match result {
            Ok(detail) => detail,
            Err(e) => {
                let e = CatalogError::from(e);
                warn!(id, error = %e, "Detail fetch failed");
                return if store.dispatch_failure::<store::Detail>(ticket, e.user_message()) {
                    Selection::Failed
                } else {
                    Selection::Superseded
                };
            }
        };

        let hint = detail.summary.titles.lookup_hint().map(str::to_string);
        let trailer = detail.trailer.clone();
        if !store.dispatch_success::<store::Detail>(ticket, Some(detail)) {
            debug!(id, "Detail response arrived for an abandoned selection");
            return Selection::Superseded;
        }
        info!(id, "Detail loaded");

        // Visible immediately; enrichment may replace it.
        let fallback = resolve_source(None, trailer.as_ref(), &self.inner.settings.placeholder_url);
        store.set_source(ticket, fallback);

        let enrichment = hint.map(|hint| self.spawn_enrichment(ticket, hint, trailer));
        Selection::Loaded { enrichment }
    }

    /// Drop the selected detail and stop its playback lookup.
    pub fn clear_selected(&self) {
        self.abort_enrichment();
        self.inner.store.clear_selected();
    }

    fn spawn_enrichment(
        &self,
        ticket: Ticket,
        hint: String,
        trailer: Option<Trailer>,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let candidate = match inner.enrich(&hint).await {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!(title = %hint, error = %e, "Keeping fallback source");
                    return;
                }
            };
            let source = resolve_source(
                Some(&candidate),
                trailer.as_ref(),
                &inner.settings.placeholder_url,
            );
            let kind = source.kind;
            if inner.store.set_source(ticket, source) {
                info!(title = %hint, %kind, "Playback source resolved");
            } else {
                debug!(title = %hint, "Playback source arrived for an abandoned selection");
            }
        });

        let mut slot = self
            .inner
            .enrichment
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(handle.abort_handle());
        handle
    }

    fn abort_enrichment(&self) {
        let previous = self
            .inner
            .enrichment
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = previous {
            task.abort();
        }
    }

    // ── Search ──────────────────────────────────────────────────

    /// Feed one keystroke's worth of input. Only input that stays unchanged
    /// for the debounce window reaches the provider; each newer call
    /// supersedes the pending one. Blank input clears search immediately
    /// and returns `None`.
    pub fn search_input(&self, text: &str) -> Option<JoinHandle<FetchOutcome>> {
        let generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = text.trim().to_string();
        if query.is_empty() {
            self.inner.store.clear_search();
            return None;
        }

        let this = self.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(this.inner.settings.search_debounce).await;
            if this.inner.search_generation.load(Ordering::SeqCst) != generation {
                return FetchOutcome::Superseded;
            }
            this.run_search(&query).await
        }))
    }

    /// Search without debouncing. Also cancels any pending debounced input.
    pub async fn search_now(&self, text: &str) -> FetchOutcome {
        self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
        let query = text.trim();
        if query.is_empty() {
            self.inner.store.clear_search();
            return FetchOutcome::Skipped;
        }
        self.run_search(query).await
    }

    async fn run_search(&self, query: &str) -> FetchOutcome {
        let ticket = self.inner.store.dispatch_search(query);
        let result = self.inner.metadata.search(query).await;
        self.apply::<store::Search>(ticket, result.map_err(CatalogError::from))
    }
}

impl<M, R: PlaybackResolver> Shared<M, R> {
    /// Bounded playback lookup. Every failure mode collapses into
    /// [`CatalogError::EnrichmentUnavailable`].
    async fn enrich(&self, hint: &str) -> Result<PlaybackCandidate, CatalogError> {
        let timeout = self.settings.enrichment_timeout;
        match tokio::time::timeout(timeout, self.resolver.resolve(hint)).await {
            Ok(Ok(candidate)) if !candidate.is_empty() => Ok(candidate),
            Ok(Ok(_)) => Err(CatalogError::EnrichmentUnavailable(
                "no playback candidate".into(),
            )),
            Ok(Err(e)) => Err(CatalogError::EnrichmentUnavailable(e.to_string())),
            Err(_) => Err(CatalogError::EnrichmentUnavailable(format!(
                "lookup timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}
