//! Paged, filtered complaint list view.
//!
//! Each page or filter change issues exactly one fetch. Fetches are tagged with
//! a generation number; only the most recently issued one may update the view,
//! so a slow response can never overwrite a newer one. Superseded requests are
//! not cancelled, their results are just dropped.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ComplaintQuery, ComplaintsApi};
use crate::error::ClientError;
use crate::models::{Complaint, ComplaintPage, ComplaintSort, ComplaintStatus};

/// Result of a navigation or refresh call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetch completed and its page is now displayed.
    Applied,
    /// A newer fetch was issued while this one was in flight; result dropped.
    Superseded,
    /// Nothing to do (already at the boundary); no request was made.
    Unchanged,
}

/// Point-in-time copy of the view state, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub page: u32,
    pub total_pages: u32,
    pub status: Option<ComplaintStatus>,
    pub complaints: Vec<Complaint>,
    pub loading: bool,
    /// User-facing message from the last failed fetch, cleared on success.
    pub error: Option<String>,
}

impl ListSnapshot {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug)]
struct ListState {
    query: ComplaintQuery,
    complaints: Vec<Complaint>,
    total_pages: u32,
    loading: bool,
    error: Option<String>,
    /// Generation of the most recently issued fetch
    issued: u64,
}

struct Ticket {
    generation: u64,
    query: ComplaintQuery,
}

/// State of one complaint list view. Clones share the same view.
#[derive(Debug, Clone)]
pub struct ComplaintList {
    api: ComplaintsApi,
    state: Arc<Mutex<ListState>>,
}

impl ComplaintList {
    pub fn new(api: ComplaintsApi) -> Self {
        Self::with_query(api, ComplaintQuery::default())
    }

    /// Start from a specific query (e.g. a page number given on the command
    /// line). Nothing is fetched until the first navigation or refresh.
    pub fn with_query(api: ComplaintsApi, query: ComplaintQuery) -> Self {
        let query = ComplaintQuery {
            page: query.page.max(1),
            ..query
        };
        Self {
            api,
            state: Arc::new(Mutex::new(ListState {
                query,
                complaints: Vec::new(),
                total_pages: 1,
                loading: false,
                error: None,
                issued: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock();
        ListSnapshot {
            page: state.query.page,
            total_pages: state.total_pages,
            status: state.query.status,
            complaints: state.complaints.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn page(&self) -> u32 {
        self.state.lock().query.page
    }

    pub fn total_pages(&self) -> u32 {
        self.state.lock().total_pages
    }

    /// Fetch the current page again.
    pub async fn refresh(&self) -> Result<FetchOutcome, ClientError> {
        self.navigate(|_, _| true).await
    }

    /// Change the status filter. Always goes back to page 1 first.
    pub async fn set_status_filter(
        &self,
        status: Option<ComplaintStatus>,
    ) -> Result<FetchOutcome, ClientError> {
        self.navigate(|query, _| {
            query.page = 1;
            query.status = status;
            true
        })
        .await
    }

    /// Change the sort order. Also returns to page 1.
    pub async fn set_sort(&self, sort: Option<ComplaintSort>) -> Result<FetchOutcome, ClientError> {
        self.navigate(|query, _| {
            query.page = 1;
            query.sort = sort;
            true
        })
        .await
    }

    /// Move forward one page. A no-op on the last known page.
    pub async fn next_page(&self) -> Result<FetchOutcome, ClientError> {
        self.navigate(|query, total_pages| {
            if query.page >= total_pages {
                return false;
            }
            query.page += 1;
            true
        })
        .await
    }

    /// Move back one page. A no-op on page 1.
    pub async fn previous_page(&self) -> Result<FetchOutcome, ClientError> {
        self.navigate(|query, _| {
            if query.page <= 1 {
                return false;
            }
            query.page -= 1;
            true
        })
        .await
    }

    /// Jump to a page, clamped to the known page range.
    pub async fn go_to_page(&self, page: u32) -> Result<FetchOutcome, ClientError> {
        self.navigate(|query, total_pages| {
            let target = page.clamp(1, total_pages.max(1));
            if target == query.page {
                return false;
            }
            query.page = target;
            true
        })
        .await
    }

    /// Apply `change` to the query and, if it asks for it, run one fetch.
    async fn navigate<F>(&self, change: F) -> Result<FetchOutcome, ClientError>
    where
        F: FnOnce(&mut ComplaintQuery, u32) -> bool,
    {
        let Some(ticket) = self.begin(change) else {
            return Ok(FetchOutcome::Unchanged);
        };
        let result = self.api.list(&ticket.query).await;
        self.finish(ticket, result)
    }

    fn begin<F>(&self, change: F) -> Option<Ticket>
    where
        F: FnOnce(&mut ComplaintQuery, u32) -> bool,
    {
        let mut state = self.state.lock();
        let total_pages = state.total_pages;
        if !change(&mut state.query, total_pages) {
            return None;
        }

        state.issued += 1;
        state.loading = true;
        debug!(generation = state.issued, page = state.query.page, "Fetching complaint page");
        Some(Ticket {
            generation: state.issued,
            query: state.query.clone(),
        })
    }

    fn finish(
        &self,
        ticket: Ticket,
        result: Result<ComplaintPage, ClientError>,
    ) -> Result<FetchOutcome, ClientError> {
        let mut state = self.state.lock();
        if ticket.generation != state.issued {
            debug!(
                generation = ticket.generation,
                latest = state.issued,
                ok = result.is_ok(),
                "Discarding superseded complaint page"
            );
            return Ok(FetchOutcome::Superseded);
        }

        state.loading = false;
        match result {
            Ok(page) => {
                state.total_pages = page.total_pages();
                state.complaints = page.complaints;
                state.error = None;
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                // Keep showing what we had.
                warn!(page = ticket.query.page, error = %e, "Unable to load complaints");
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
