//! Login, logout, registration and startup session restore.
//!
//! [`AuthService`] is the only component that writes the stored access token.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::{RegisterPayload, User, UserRole};
use crate::session::Session;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.api.session()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session().current_user()
    }

    /// Resolve a persisted token to a user at startup.
    ///
    /// Never fails: any error (including a rejected token) clears the stored
    /// token and leaves the session unauthenticated.
    pub async fn restore_session(&self) -> Option<User> {
        if !self.session().has_token() {
            info!("No stored access token; starting unauthenticated");
            return None;
        }

        match self.fetch_current_user().await {
            Ok(user) => {
                if self.session().set_user(user.clone()) {
                    info!(user_id = %user.id, "Restored session");
                    Some(user)
                } else {
                    None
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not restore session; clearing stored token");
                let _ = self.session().invalidate();
                None
            }
        }
    }

    /// Exchange credentials for an access token, persist it, and load the user.
    ///
    /// Credentials go out as `application/x-www-form-urlencoded` with the
    /// email in the `username` field. On any failure the session is left
    /// without a token or user.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let request = self
            .api
            .post("/auth/login")
            .form(&[("username", email), ("password", password)]);

        let response: LoginResponse = self.api.send_json(request).await?;
        let token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingToken)?;

        self.session().store_token(&token)?;

        let user = match self.fetch_current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Login succeeded but user lookup failed; discarding token");
                let _ = self.session().invalidate();
                return Err(e);
            }
        };

        self.session().set_user(user.clone());
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Create an account. Does not log in.
    ///
    /// Returns the created user when the server echoes one back.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<Option<User>, ClientError> {
        let body = payload.normalize()?;

        // The server decides whether a self-assigned role is honoured.
        if body.role == UserRole::Admin {
            warn!(email = %body.email, "Registering with the ADMIN role; the server must authorize this");
        }

        let response: serde_json::Value = self
            .api
            .send_json(self.api.post("/auth/register").json(&body))
            .await?;

        info!(email = %body.email, "Registered account");
        Ok(serde_json::from_value(response).ok())
    }

    /// Forget the token and the user. No network call.
    ///
    /// The user is always dropped. An error means the persisted token could not
    /// be removed and would come back on the next start.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session().invalidate()?;
        info!("Logged out");
        Ok(())
    }

    /// `GET /auth/user` with whatever token is stored.
    pub async fn fetch_current_user(&self) -> Result<User, ClientError> {
        self.api.send_json(self.api.get("/auth/user")).await
    }
}
