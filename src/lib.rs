pub mod auth;
pub mod cli;
pub mod complaints;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::AuthService;
pub use complaints::{ComplaintList, ComplaintQuery, ComplaintsApi};
pub use error::ClientError;
pub use http::ApiClient;
pub use session::Session;

use std::sync::Arc;

use config::Config;
use storage::{FileTokenStore, TokenStore};

/// Everything a front end needs, wired around one shared session.
#[derive(Debug, Clone)]
pub struct ComplaintDesk {
    pub auth: AuthService,
    pub complaints: ComplaintsApi,
}

impl ComplaintDesk {
    /// Build the client stack from configuration, with the token persisted
    /// at `config.session.token_file`.
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        let store = Arc::new(FileTokenStore::open(&config.session.token_file));
        Self::with_store(config, store)
    }

    pub fn with_store(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let session = Arc::new(Session::new(store));
        let api = ApiClient::new(&config.api, session)?;
        Ok(Self::new(api))
    }

    pub fn new(api: ApiClient) -> Self {
        Self {
            auth: AuthService::new(api.clone()),
            complaints: ComplaintsApi::new(api),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.auth.session()
    }

    /// A fresh paged list view over this client.
    pub fn complaint_list(&self, query: ComplaintQuery) -> ComplaintList {
        ComplaintList::with_query(self.complaints.clone(), query)
    }
}
