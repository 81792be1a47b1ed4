//! View-state store: one [`QueryState`] per category plus the resolved
//! source for the selected detail.
//!
//! Every transition goes through the dispatch methods below. A fetch is
//! identified by the [`Ticket`] returned from `dispatch_start`; success and
//! failure are applied only while that ticket is still the category's
//! current one, so a late response for an abandoned request is dropped
//! instead of overwriting newer state.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{
    AnimeDetail, AnimeSummary, Category, QueryState, QueryStatus, ResolvedSource, SourceKind,
};

const EVENT_CAPACITY: usize = 64;

/// Identity of one dispatched fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    category: Category,
    seq: u64,
}

/// Published after every applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Query {
        category: Category,
        status: QueryStatus,
    },
    Source {
        anime_id: u64,
        kind: SourceKind,
    },
    SelectionCleared,
}

/// Typed access to one category's slot.
pub trait QueryKind {
    type Data: Clone + Default + Send;
    const CATEGORY: Category;

    #[doc(hidden)]
    fn slot(slots: &mut Slots) -> &mut Slot<Self::Data>;
}

pub struct Trending;
pub struct Popular;
pub struct Detail;
pub struct Search;

impl QueryKind for Trending {
    type Data = Vec<AnimeSummary>;
    const CATEGORY: Category = Category::Trending;

    fn slot(slots: &mut Slots) -> &mut Slot<Self::Data> {
        &mut slots.trending
    }
}

impl QueryKind for Popular {
    type Data = Vec<AnimeSummary>;
    const CATEGORY: Category = Category::Popular;

    fn slot(slots: &mut Slots) -> &mut Slot<Self::Data> {
        &mut slots.popular
    }
}

impl QueryKind for Detail {
    type Data = Option<AnimeDetail>;
    const CATEGORY: Category = Category::Detail;

    fn slot(slots: &mut Slots) -> &mut Slot<Self::Data> {
        &mut slots.detail
    }
}

impl QueryKind for Search {
    type Data = Vec<AnimeSummary>;
    const CATEGORY: Category = Category::Search;

    fn slot(slots: &mut Slots) -> &mut Slot<Self::Data> {
        &mut slots.search
    }
}

#[doc(hidden)]
#[derive(Debug, Default)]
pub struct Slot<T> {
    state: QueryState<T>,
    /// Sequence of the fetch currently allowed to land; 0 = none.
    current: u64,
}

#[doc(hidden)]
#[derive(Debug, Default)]
pub struct Slots {
    trending: Slot<Vec<AnimeSummary>>,
    popular: Slot<Vec<AnimeSummary>>,
    detail: Slot<Option<AnimeDetail>>,
    search: Slot<Vec<AnimeSummary>>,
    selected_id: Option<u64>,
    search_query: Option<String>,
    source: Option<ResolvedSource>,
    next_seq: u64,
}

impl Slots {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Consistent copy of the whole store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub trending: QueryState<Vec<AnimeSummary>>,
    pub popular: QueryState<Vec<AnimeSummary>>,
    pub detail: QueryState<Option<AnimeDetail>>,
    pub search: QueryState<Vec<AnimeSummary>>,
    pub selected_id: Option<u64>,
    pub search_query: Option<String>,
    pub source: Option<ResolvedSource>,
}

/// Process-wide view state. Construct one and share it (`Arc`) with every
/// consumer; nothing else mutates it.
#[derive(Debug)]
pub struct ViewStore {
    slots: Mutex<Slots>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slots: Mutex::new(Slots::default()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Receive an event for every applied transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ── Dispatch ────────────────────────────────────────────────

    /// Move the category to `Loading` and hand out the ticket its result
    /// must present. Returns `None` while a fetch is already outstanding;
    /// callers check [`Self::is_loading`] first.
    pub fn dispatch_start<K: QueryKind>(&self) -> Option<Ticket> {
        let ticket = {
            let mut slots = self.lock();
            let seq = slots.next_seq();
            let slot = K::slot(&mut slots);
            if slot.state.is_loading() {
                tracing::debug!(category = %K::CATEGORY, "Start ignored, fetch already in flight");
                return None;
            }
            slot.state.status = QueryStatus::Loading;
            slot.state.error_message = None;
            slot.current = seq;
            Ticket {
                category: K::CATEGORY,
                seq,
            }
        };
        self.publish_status(K::CATEGORY, QueryStatus::Loading);
        Some(ticket)
    }

    /// Apply a successful fetch. Returns `false` if the ticket is stale.
    pub fn dispatch_success<K: QueryKind>(&self, ticket: Ticket, data: K::Data) -> bool {
        {
            let mut slots = self.lock();
            let slot = K::slot(&mut slots);
            if !slot.accepts(ticket) {
                tracing::debug!(category = %K::CATEGORY, "Dropping stale success");
                return false;
            }
            slot.state = QueryState {
                status: QueryStatus::Ready,
                data,
                error_message: None,
                updated_at: Some(Utc::now()),
            };
        }
        self.publish_status(K::CATEGORY, QueryStatus::Ready);
        true
    }

    /// Apply a failed fetch, keeping the last good data visible. Returns
    /// `false` if the ticket is stale.
    pub fn dispatch_failure<K: QueryKind>(&self, ticket: Ticket, message: impl Into<String>) -> bool {
        {
            let mut slots = self.lock();
            let slot = K::slot(&mut slots);
            if !slot.accepts(ticket) {
                tracing::debug!(category = %K::CATEGORY, "Dropping stale failure");
                return false;
            }
            slot.state.status = QueryStatus::Failed;
            slot.state.error_message = Some(message.into());
        }
        self.publish_status(K::CATEGORY, QueryStatus::Failed);
        true
    }

    /// Tear down the selected detail and its source. Any in-flight detail
    /// or enrichment result for it will be dropped on arrival.
    pub fn clear_selected(&self) {
        {
            let mut slots = self.lock();
            slots.selected_id = None;
            slots.source = None;
            slots.detail = Slot::default();
        }
        self.publish(StoreEvent::SelectionCleared);
        self.publish_status(Category::Detail, QueryStatus::Idle);
    }

    /// Replace the selection with `id` and start its fetch. The new ticket
    /// supersedes any detail fetch in flight; a detail that is already
    /// `Loading` stays so without publishing another transition.
    pub fn dispatch_select(&self, id: u64) -> Ticket {
        let (ticket, was_loading) = {
            let mut slots = self.lock();
            let seq = slots.next_seq();
            let was_loading = slots.detail.state.is_loading();
            slots.selected_id = Some(id);
            slots.source = None;
            slots.detail = Slot {
                state: QueryState {
                    status: QueryStatus::Loading,
                    ..QueryState::default()
                },
                current: seq,
            };
            let ticket = Ticket {
                category: Category::Detail,
                seq,
            };
            (ticket, was_loading)
        };
        if !was_loading {
            self.publish_status(Category::Detail, QueryStatus::Loading);
        }
        ticket
    }

    /// Reset search to empty results without a fetch.
    pub fn clear_search(&self) {
        {
            let mut slots = self.lock();
            slots.search = Slot::default();
            slots.search_query = None;
        }
        self.publish_status(Category::Search, QueryStatus::Idle);
    }

    /// Start a search for `query`, abandoning any search still in flight.
    /// Search stays `Loading` across the handover without a second event.
    pub fn dispatch_search(&self, query: &str) -> Ticket {
        let (ticket, was_loading) = {
            let mut slots = self.lock();
            let seq = slots.next_seq();
            let was_loading = slots.search.state.is_loading();
            slots.search_query = Some(query.to_string());
            slots.search.state.status = QueryStatus::Loading;
            slots.search.state.error_message = None;
            slots.search.current = seq;
            let ticket = Ticket {
                category: Category::Search,
                seq,
            };
            (ticket, was_loading)
        };
        if !was_loading {
            self.publish_status(Category::Search, QueryStatus::Loading);
        }
        ticket
    }

    /// Attach the resolved source to the detail fetched under `ticket`.
    /// Returns `false` if that selection is no longer current.
    pub fn set_source(&self, ticket: Ticket, source: ResolvedSource) -> bool {
        let kind = source.kind;
        let anime_id = {
            let mut slots = self.lock();
            let detail = &slots.detail;
            if ticket.category != Category::Detail
                || detail.current != ticket.seq
                || detail.state.status != QueryStatus::Ready
            {
                tracing::debug!("Dropping source for abandoned selection");
                return false;
            }
            let Some(anime_id) = detail.state.data.as_ref().map(AnimeDetail::id) else {
                return false;
            };
            slots.source = Some(source);
            anime_id
        };
        self.publish(StoreEvent::Source { anime_id, kind });
        true
    }

    fn publish_status(&self, category: Category, status: QueryStatus) {
        self.publish(StoreEvent::Query { category, status });
    }

    // ── Reads ───────────────────────────────────────────────────

    pub fn state<K: QueryKind>(&self) -> QueryState<K::Data> {
        let mut slots = self.lock();
        K::slot(&mut slots).state.clone()
    }

    pub fn status(&self, category: Category) -> QueryStatus {
        let slots = self.lock();
        match category {
            Category::Trending => slots.trending.state.status,
            Category::Popular => slots.popular.state.status,
            Category::Detail => slots.detail.state.status,
            Category::Search => slots.search.state.status,
        }
    }

    pub fn is_loading(&self, category: Category) -> bool {
        self.status(category) == QueryStatus::Loading
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.lock().selected_id
    }

    pub fn search_query(&self) -> Option<String> {
        self.lock().search_query.clone()
    }

    pub fn source(&self) -> Option<ResolvedSource> {
        self.lock().source.clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let slots = self.lock();
        StoreSnapshot {
            trending: slots.trending.state.clone(),
            popular: slots.popular.state.clone(),
            detail: slots.detail.state.clone(),
            search: slots.search.state.clone(),
            selected_id: slots.selected_id,
            search_query: slots.search_query.clone(),
            source: slots.source.clone(),
        }
    }
}

impl<T> Slot<T> {
    fn accepts(&self, ticket: Ticket) -> bool {
        self.current == ticket.seq && self.state.status == QueryStatus::Loading
    }
}
