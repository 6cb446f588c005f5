//! The list page controller: query state, fetch coordination and mutations
//! for one resource, wired to a backend and a notification surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use itertools::Itertools;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::client::{Backend, ListRequest, Notifier, Resource};
use crate::config::ListSettings;
use crate::error::AdminError;
use crate::logic::{normalize_records, Debouncer, FetchCoordinator, FetchOutcome, MutationDispatcher};
use crate::model::{
    is_missing_id, Ack, Filter, MutationIntent, MutationKind, Pagination, QueryState, SortOrder,
};

/// Shared collaborators handed to every list page
#[derive(Clone)]
pub struct ListContext {
    pub backend: Arc<dyn Backend>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: ListSettings,
}

impl ListContext {
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>, settings: ListSettings) -> Self {
        Self {
            backend,
            notifier,
            settings,
        }
    }
}

/// Why a list shows no rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// The very first load failed
    LoadFailed { message: String },
    /// The committed search matched nothing
    NoMatches { search: String },
    /// The selected tab holds nothing
    NoneInCategory { category: String },
    /// There is nothing to list at all
    NoData,
}

impl EmptyState {
    pub fn message(&self, noun: &str) -> String {
        match self {
            EmptyState::LoadFailed { message } => message.clone(),
            EmptyState::NoMatches { search } => format!("No {noun} match \"{search}\"."),
            EmptyState::NoneInCategory { category } => format!("No {noun} found in {category}."),
            EmptyState::NoData => format!("No {noun} available yet."),
        }
    }
}

/// Everything a page needs to render, taken at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub search_raw: String,
    pub search: String,
    pub filter: Filter,
    pub tabs: Vec<String>,
    pub loading: bool,
    pub empty_state: Option<EmptyState>,
    pub pending_confirmation: Option<String>,
    pub refresh_version: u64,
}

impl<T> ListView<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationReceipt {
    pub ack: Ack,
    pub refresh_version: u64,
    pub refresh: FetchOutcome,
}

struct PageState<T> {
    query: QueryState,
    fetch: FetchCoordinator<T>,
    mutations: MutationDispatcher,
    tabs: Vec<String>,
}

struct Inner<R: Resource> {
    resource: R,
    context: ListContext,
    state: Mutex<PageState<R::Row>>,
    debouncer: Debouncer,
    tabs_requested: AtomicBool,
}

/// One admin list page. Cheap to clone; clones share state.
pub struct ListController<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for ListController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> ListController<R> {
    pub fn new(resource: R, context: ListContext) -> Self {
        let query = resource.initial_query(&context.settings);
        let state = PageState {
            fetch: FetchCoordinator::new(query.page_size()),
            query,
            mutations: MutationDispatcher::new(),
            tabs: resource.base_tabs(),
        };
        Self {
            inner: Arc::new(Inner {
                debouncer: Debouncer::new(context.settings.debounce()),
                resource,
                context,
                state: Mutex::new(state),
                tabs_requested: AtomicBool::new(false),
            }),
        }
    }

    pub fn resource(&self) -> &R {
        &self.inner.resource
    }

    /// Fetch the current query; also used for the initial load
    pub async fn load(&self) -> FetchOutcome {
        self.inner.fetch().await
    }

    /// Echo the text right away and commit it once typing pauses
    pub fn set_search_text(&self, raw: &str) {
        self.inner.state.lock().query.set_search_raw(raw);

        let weak: Weak<Inner<R>> = Arc::downgrade(&self.inner);
        let text = raw.to_string();
        self.inner.debouncer.schedule(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let committed = inner.state.lock().query.commit_search(&text);
            if committed {
                debug!("search committed: {:?}", text.trim());
                tokio::spawn(async move {
                    inner.fetch().await;
                });
            }
        });
    }

    /// Commit the typed text now, skipping the quiet window
    pub async fn submit_search(&self) -> FetchOutcome {
        self.inner.debouncer.cancel();
        let committed = {
            let mut state = self.inner.state.lock();
            let raw = state.query.search_raw().to_string();
            state.query.commit_search(&raw)
        };
        if committed {
            self.inner.fetch().await
        } else {
            FetchOutcome::Skipped
        }
    }

    pub async fn set_filter(&self, tag: &str) -> FetchOutcome {
        let changed = self.inner.state.lock().query.set_filter(Filter::from_tag(tag));
        if changed {
            self.inner.fetch().await
        } else {
            FetchOutcome::Skipped
        }
    }

    /// Jump to `page`; pages outside `1..=total_pages` are refused without a request
    pub async fn go_to_page(&self, page: u32) -> FetchOutcome {
        let changed = {
            let mut state = self.inner.state.lock();
            let total_pages = state.fetch.total_pages();
            let changed = state.query.set_page(page, total_pages);
            if !changed {
                debug!("page {} refused (1..={})", page, total_pages);
            }
            changed
        };
        if changed {
            self.inner.fetch().await
        } else {
            FetchOutcome::Skipped
        }
    }

    pub async fn next_page(&self) -> FetchOutcome {
        let page = self.inner.state.lock().query.page().saturating_add(1);
        self.go_to_page(page).await
    }

    pub async fn previous_page(&self) -> FetchOutcome {
        let page = self.inner.state.lock().query.page().saturating_sub(1);
        self.go_to_page(page).await
    }

    pub async fn set_sort(&self, sort_by: Option<&str>, order: Option<SortOrder>) -> FetchOutcome {
        let changed = self
            .inner
            .state
            .lock()
            .query
            .set_sort(sort_by.map(str::to_string), order);
        if changed {
            self.inner.fetch().await
        } else {
            FetchOutcome::Skipped
        }
    }

    /// Tabs for the category filter.
    ///
    /// Pages whose tabs come from data look at the first page once per
    /// controller; later calls return the cached list without a request.
    pub async fn load_filter_tabs(&self) -> Vec<String> {
        let inner = &self.inner;
        if !inner.resource.tabs_from_snapshot() || inner.tabs_requested.swap(true, Ordering::SeqCst)
        {
            return self.tabs();
        }

        let request = ListRequest::new(
            inner.resource.list_path(),
            1,
            inner.context.settings.tab_snapshot_limit,
        );
        match inner.context.backend.list(&request).await {
            Ok(page) => {
                let rows = normalize_records(&inner.resource, page.records);
                let base = inner.resource.base_tabs();
                let discovered = rows
                    .iter()
                    .filter_map(|row| inner.resource.category(row))
                    .filter(|name| !is_missing_id(name) && !base.contains(name))
                    .unique()
                    .sorted()
                    .collect::<Vec<_>>();
                let mut state = inner.state.lock();
                state.tabs = base.into_iter().chain(discovered).collect();
                state.tabs.clone()
            }
            Err(error) => {
                warn!(
                    "could not load {} tabs: {}",
                    inner.resource.noun(),
                    error
                );
                self.tabs()
            }
        }
    }

    pub fn tabs(&self) -> Vec<String> {
        self.inner.state.lock().tabs.clone()
    }

    pub fn refresh_version(&self) -> u64 {
        self.inner.state.lock().mutations.refresh_version()
    }

    /// Fire a reversible mutation
    pub async fn dispatch(&self, intent: MutationIntent) -> Result<MutationReceipt, AdminError> {
        self.inner.execute(intent, false).await
    }

    /// Arm the confirmation for an irreversible mutation
    pub fn request_confirmation(&self, intent: MutationIntent) -> Result<(), AdminError> {
        let armed = self.inner.state.lock().mutations.arm(intent);
        if let Err(error) = &armed {
            self.inner.context.notifier.error(&error.to_string());
        }
        armed
    }

    pub fn pending_confirmation(&self) -> Option<MutationIntent> {
        self.inner.state.lock().mutations.pending().cloned()
    }

    pub fn cancel_confirmation(&self) -> Option<MutationIntent> {
        self.inner.state.lock().mutations.cancel()
    }

    /// Fire the armed mutation
    pub async fn confirm(&self) -> Result<MutationReceipt, AdminError> {
        let pending = self.pending_confirmation();
        match pending {
            Some(intent) => self.inner.execute(intent, true).await,
            None => {
                let error = AdminError::ConfirmationRequired {
                    action: "continue".to_string(),
                };
                self.inner.context.notifier.error(&error.to_string());
                Err(error)
            }
        }
    }

    pub fn snapshot(&self) -> ListView<R::Row> {
        let state = self.inner.state.lock();
        let rows = state.fetch.rows().to_vec();
        let empty_state = if rows.is_empty() {
            empty_state(&state)
        } else {
            None
        };
        let pagination = state.fetch.pagination();
        ListView {
            rows,
            page: state.query.page(),
            page_size: state.query.page_size(),
            total: pagination.total,
            total_pages: state.fetch.total_pages(),
            search_raw: state.query.search_raw().to_string(),
            search: state.query.search().to_string(),
            filter: state.query.filter().clone(),
            tabs: state.tabs.clone(),
            loading: state.fetch.is_loading(),
            empty_state,
            pending_confirmation: state.mutations.pending().map(|intent| intent.action.clone()),
            refresh_version: state.mutations.refresh_version(),
        }
    }

    /// The message for the current empty state, if the list is empty
    pub fn empty_message(&self) -> Option<String> {
        self.snapshot()
            .empty_state
            .map(|state| state.message(self.inner.resource.noun()))
    }
}

fn empty_state<T>(state: &PageState<T>) -> Option<EmptyState> {
    if let Some(error) = state.fetch.load_error() {
        return Some(EmptyState::LoadFailed {
            message: error.to_string(),
        });
    }
    if !state.fetch.has_loaded() {
        return None;
    }
    if !state.query.search().is_empty() {
        return Some(EmptyState::NoMatches {
            search: state.query.search().to_string(),
        });
    }
    match state.query.filter().tag() {
        Some(category) => Some(EmptyState::NoneInCategory {
            category: category.to_string(),
        }),
        None => Some(EmptyState::NoData),
    }
}

impl<R: Resource> Inner<R> {
    /// One list request for the current query. When the result shrank under
    /// the current page for reasons this page did not cause, the page is
    /// pulled back and fetched once more.
    async fn fetch(&self) -> FetchOutcome {
        let mut outcome = self.fetch_once().await;
        if outcome == FetchOutcome::Applied {
            let clamped = {
                let mut state = self.state.lock();
                let pagination = state.fetch.pagination();
                pagination.total > 0 && state.query.clamp_page(pagination.total_pages)
            };
            if clamped {
                debug!("{} page beyond the last page, refetching", self.resource.noun());
                outcome = self.fetch_once().await;
            }
        }
        outcome
    }

    async fn fetch_once(&self) -> FetchOutcome {
        let (seq, request) = {
            let mut state = self.state.lock();
            let version = state.mutations.refresh_version();
            let seq = state.fetch.begin(version);
            (seq, self.resource.list_request(&state.query))
        };

        match self.context.backend.list(&request).await {
            Ok(page) => {
                let rows = normalize_records(&self.resource, page.records);
                self.state.lock().fetch.apply(seq, rows, page.pagination)
            }
            Err(error) => {
                let outcome = self.state.lock().fetch.fail(seq, &error);
                if outcome == FetchOutcome::Failed {
                    warn!("fetching {} failed: {:?}", self.resource.noun(), error);
                    let fallback = format!("Unexpected error while fetching {}.", self.resource.noun());
                    self.context.notifier.error(&error.user_message(&fallback));
                }
                outcome
            }
        }
    }

    async fn execute(
        &self,
        intent: MutationIntent,
        confirmed: bool,
    ) -> Result<MutationReceipt, AdminError> {
        let started = self.state.lock().mutations.start(&intent, confirmed);
        if let Err(error) = started {
            self.context.notifier.error(&error.to_string());
            return Err(error);
        }

        match self.context.backend.mutate(&intent).await {
            Ok(ack) => {
                let refresh_version = {
                    let mut state = self.state.lock();
                    match intent.kind {
                        MutationKind::Create => {
                            state.query.reset_page();
                        }
                        MutationKind::Delete => {
                            // step off a page the removed row leaves empty
                            let remaining = state.fetch.pagination().total.saturating_sub(1);
                            let last =
                                Pagination::from_total(remaining, 1, state.query.page_size());
                            state.query.clamp_page(last.total_pages);
                        }
                        MutationKind::Update | MutationKind::StatusTransition => {}
                    }
                    state.mutations.succeeded(&intent)
                };
                let message = if ack.message.trim().is_empty() {
                    intent.success_message.as_str()
                } else {
                    ack.message.as_str()
                };
                self.context.notifier.success(message);
                let refresh = self.fetch().await;
                Ok(MutationReceipt {
                    ack,
                    refresh_version,
                    refresh,
                })
            }
            Err(error) => {
                self.state.lock().mutations.failed(&intent);
                warn!("{} failed: {:?}", intent.action, error);
                self.context
                    .notifier
                    .error(&error.user_message(&intent.failure_message));
                Err(error)
            }
        }
    }
}
