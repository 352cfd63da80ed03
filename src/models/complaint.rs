//! Complaint records and listing envelopes.

use serde::{Deserialize, Serialize};

use super::user::UserRole;

/// Lifecycle status of a complaint. Transitions are owned by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
    Closed,
    /// A status this client does not know. Shown as is, never sent.
    #[serde(other)]
    Unknown,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 5] = [
        Self::Open,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Rejected => "REJECTED",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable label, e.g. "In Progress".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
            Self::Closed => "Closed",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "RESOLVED" => Ok(Self::Resolved),
            "REJECTED" => Ok(Self::Rejected),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("Unknown complaint status: {}", s)),
        }
    }
}

/// Parse a status filter as it comes from a form: an empty value means "all".
pub fn parse_status_filter(value: &str) -> Result<Option<ComplaintStatus>, String> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

/// Status-changing action sent with a complaint update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintAction {
    Start,
    Reject,
    Resolve,
    Close,
    Reopen,
}

/// Who may perform a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actor {
    Role(UserRole),
    Any,
}

impl Actor {
    fn permits(self, role: UserRole) -> bool {
        match self {
            Actor::Any => true,
            Actor::Role(required) => required == role,
        }
    }
}

impl ComplaintAction {
    pub const ALL: [ComplaintAction; 5] = [
        Self::Start,
        Self::Reject,
        Self::Resolve,
        Self::Close,
        Self::Reopen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Reject => "REJECT",
            Self::Resolve => "RESOLVE",
            Self::Close => "CLOSE",
            Self::Reopen => "REOPEN",
        }
    }

    fn transitions(&self) -> &'static [(ComplaintStatus, ComplaintStatus, Actor)] {
        use ComplaintStatus::*;
        const ADMIN: Actor = Actor::Role(UserRole::Admin);
        const CITIZEN: Actor = Actor::Role(UserRole::Citizen);

        match self {
            Self::Start => &[(Open, InProgress, ADMIN)],
            Self::Reject => &[(Open, Rejected, ADMIN), (InProgress, Rejected, ADMIN)],
            Self::Resolve => &[(InProgress, Resolved, ADMIN)],
            Self::Close => &[
                (Open, Closed, CITIZEN),
                (InProgress, Closed, CITIZEN),
                (Resolved, Closed, CITIZEN),
                (Rejected, Closed, CITIZEN),
            ],
            Self::Reopen => &[(Resolved, Open, Actor::Any), (Rejected, Open, CITIZEN)],
        }
    }

    /// Status the complaint would move to, if `role` may apply this action
    /// from `from`. Only a hint for the front end; the server decides.
    pub fn target(&self, from: ComplaintStatus, role: UserRole) -> Option<ComplaintStatus> {
        self.transitions()
            .iter()
            .find(|(source, _, actor)| *source == from && actor.permits(role))
            .map(|(_, to, _)| *to)
    }

    /// Actions `role` can offer for a complaint currently in `status`.
    pub fn available(status: ComplaintStatus, role: UserRole) -> Vec<ComplaintAction> {
        Self::ALL
            .into_iter()
            .filter(|action| action.target(status, role).is_some())
            .collect()
    }
}

impl std::fmt::Display for ComplaintAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "START" => Ok(Self::Start),
            "REJECT" => Ok(Self::Reject),
            "RESOLVE" => Ok(Self::Resolve),
            "CLOSE" => Ok(Self::Close),
            "REOPEN" => Ok(Self::Reopen),
            _ => Err(format!("Unknown action: {}", s)),
        }
    }
}

/// Sort order accepted by the listing endpoint (`sort_by`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComplaintSort {
    #[serde(rename = "createdAt")]
    CreatedAsc,
    #[serde(rename = "-createdAt")]
    CreatedDesc,
    #[serde(rename = "updatedAt")]
    UpdatedAsc,
    #[serde(rename = "-updatedAt")]
    UpdatedDesc,
    #[serde(rename = "title")]
    TitleAsc,
    #[serde(rename = "-title")]
    TitleDesc,
}

impl ComplaintSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAsc => "createdAt",
            Self::CreatedDesc => "-createdAt",
            Self::UpdatedAsc => "updatedAt",
            Self::UpdatedDesc => "-updatedAt",
            Self::TitleAsc => "title",
            Self::TitleDesc => "-title",
        }
    }
}

impl std::fmt::Display for ComplaintSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplaintSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "createdAt" | "oldest" => Ok(Self::CreatedAsc),
            "-createdAt" | "newest" => Ok(Self::CreatedDesc),
            "updatedAt" => Ok(Self::UpdatedAsc),
            "-updatedAt" => Ok(Self::UpdatedDesc),
            "title" => Ok(Self::TitleAsc),
            "-title" => Ok(Self::TitleDesc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// A complaint as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ComplaintStatus,
    /// Attachment references, relative to the API base URL.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

/// Pagination block of a listing response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_prev: Option<bool>,
}

/// Response of `GET /complaints`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplaintPage {
    #[serde(default)]
    pub complaints: Vec<Complaint>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ComplaintPage {
    /// Known page count. Missing metadata counts as one page, and so does an
    /// empty result set (the server reports zero pages for it).
    pub fn total_pages(&self) -> u32 {
        self.pagination
            .as_ref()
            .and_then(|p| p.total_pages)
            .unwrap_or(1)
            .max(1)
    }
}

/// `POST /complaints` answers with `{message, complaint}`; older servers send
/// the bare complaint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreatedComplaint {
    Envelope { complaint: Complaint },
    Bare(Complaint),
}

impl CreatedComplaint {
    pub(crate) fn into_complaint(self) -> Complaint {
        match self {
            CreatedComplaint::Envelope { complaint } | CreatedComplaint::Bare(complaint) => {
                complaint
            }
        }
    }
}

/// `PUT /complaints/{id}` answers with `{message, data}` where `data` may or
/// may not be the updated complaint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UpdatedComplaint {
    Envelope { data: Complaint },
    Bare(Complaint),
    Other(serde_json::Value),
}

impl UpdatedComplaint {
    pub(crate) fn into_complaint(self) -> Option<Complaint> {
        match self {
            UpdatedComplaint::Envelope { data } | UpdatedComplaint::Bare(data) => Some(data),
            UpdatedComplaint::Other(_) => None,
        }
    }
}
