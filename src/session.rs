//! Process-wide session state: the persisted access token and the
//! in-memory current user.
//!
//! A [`Session`] is created once at startup and shared as `Arc<Session>`
//! between the HTTP client and the auth service. Its writers are crate
//! private: only [`AuthService`](crate::auth::AuthService) stores tokens and
//! users, and the HTTP client may only [`invalidate`](Session::invalidate).
//!
//! Invariant: a current user is only ever held while a token is present.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::models::User;
use crate::storage::TokenStore;

pub struct Session {
    store: Arc<dyn TokenStore>,
    user: RwLock<Option<User>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.has_token())
            .field("user", &*self.user.read())
            .finish()
    }
}

impl Session {
    /// Start with whatever token the store already holds and no user.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            user: RwLock::new(None),
        }
    }

    /// The stored access token. An empty string counts as absent.
    pub fn access_token(&self) -> Option<String> {
        self.store.load().filter(|token| !token.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    /// True once the token has been resolved to a user.
    pub fn is_authenticated(&self) -> bool {
        self.user.read().is_some()
    }

    pub(crate) fn store_token(&self, token: &str) -> Result<(), ClientError> {
        self.store.save(token)
    }

    /// Record the resolved user. Ignored if the token was cleared meanwhile,
    /// so a late response cannot resurrect a logged-out session.
    pub(crate) fn set_user(&self, user: User) -> bool {
        let mut slot = self.user.write();
        if !self.has_token() {
            debug!(user_id = %user.id, "Token gone before user resolved; not storing user");
            *slot = None;
            return false;
        }
        *slot = Some(user);
        true
    }

    /// Drop both the token and the user.
    ///
    /// The user slot stays locked until the store is cleared, so a concurrent
    /// [`set_user`](Session::set_user) either lands before and is wiped, or
    /// runs after and finds no token.
    pub(crate) fn invalidate(&self) -> Result<(), ClientError> {
        let mut slot = self.user.write();
        slot.take();
        let cleared = self.store.clear();
        if let Err(e) = &cleared {
            warn!(error = %e, "Failed to clear stored access token");
        }
        cleared
    }
}
