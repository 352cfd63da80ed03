//! User and registration models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Role assigned to an account by the server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    Citizen,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "CITIZEN",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CITIZEN" => Ok(Self::Citizen),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// The authenticated account as returned by `GET /auth/user`.
///
/// Only ever replaced wholesale; the client never edits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Registration form contents as entered by the user.
///
/// `dob` is kept as raw text; [`RegisterPayload::normalize`] turns it into a
/// calendar date before anything is sent.
#[derive(Clone, Default)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub dob: String,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

impl std::fmt::Debug for RegisterPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterPayload")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("dob", &self.dob)
            .field("phone", &self.phone)
            .field("role", &self.role)
            .finish()
    }
}

impl RegisterPayload {
    /// Produce the request body for `POST /auth/register`.
    ///
    /// The date of birth loses any time-of-day component, the role falls back
    /// to [`UserRole::Citizen`], and a blank phone number is dropped entirely.
    pub fn normalize(&self) -> Result<NewUser, ClientError> {
        let dob = parse_calendar_date(&self.dob)?;

        let phone = self
            .phone
            .as_ref()
            .filter(|phone| !phone.trim().is_empty())
            .cloned();

        Ok(NewUser {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            dob,
            phone,
            role: self.role.unwrap_or_default(),
        })
    }
}

/// Normalized registration request body.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub dob: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Parse a date of birth into a plain calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (converted to their UTC date)
/// and naive `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, ClientError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ClientError::InvalidInput(
            "date of birth is required".to_string(),
        ));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }

    Err(ClientError::InvalidInput(format!(
        "unrecognized date of birth: {}",
        input
    )))
}
