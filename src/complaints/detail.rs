use tracing::warn;

use super::ComplaintsApi;
use crate::models::Complaint;

/// What a single-complaint view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(Complaint),
    /// The id does not exist; shown as its own view, not as an error.
    NotFound,
    /// Anything else went wrong. Holds a user-facing message.
    Failed(String),
}

impl DetailState {
    pub(crate) async fn load(api: &ComplaintsApi, id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() {
            return DetailState::NotFound;
        }

        match api.get(id).await {
            Ok(complaint) => DetailState::Loaded(complaint),
            Err(e) if e.is_not_found() => DetailState::NotFound,
            Err(e) => {
                warn!(complaint_id = %id, error = %e, "Failed to load complaint");
                DetailState::Failed(e.user_message())
            }
        }
    }

    pub fn complaint(&self) -> Option<&Complaint> {
        match self {
            DetailState::Loaded(complaint) => Some(complaint),
            _ => None,
        }
    }
}
