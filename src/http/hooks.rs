//! Credential hooks run around every request.
//!
//! Both hooks are plain functions of the request (or response status) and the
//! session, so the client stays a thin pipeline: authorize, send, observe.

use reqwest::{RequestBuilder, StatusCode};
use tracing::info;

use crate::session::Session;

/// Attach the stored token as a bearer credential, if there is one.
///
/// The token is read here, at dispatch time. A request already in flight keeps
/// whatever credential it was built with.
pub fn authorize(request: RequestBuilder, session: &Session) -> RequestBuilder {
    match session.access_token() {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// React to a response status. A 401 drops the stored token and the current
/// user; every other status is left alone. The caller still receives the
/// original failure.
pub fn observe_status(status: StatusCode, session: &Session) {
    if status == StatusCode::UNAUTHORIZED && session.has_token() {
        info!("Server rejected the access token; clearing session");
        // failures are logged by the session; the caller still gets the 401
        let _ = session.invalidate();
    }
}
