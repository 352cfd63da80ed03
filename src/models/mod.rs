//! Wire models shared by the session and complaint components.

pub mod complaint;
pub mod dashboard;
pub mod user;

pub use complaint::{
    parse_status_filter, Complaint, ComplaintAction, ComplaintPage, ComplaintSort,
    ComplaintStatus, Pagination,
};
pub use dashboard::{AgingBuckets, ComplaintSummary, DailyCount, DashboardStats, UserCount};
pub use user::{parse_calendar_date, NewUser, RegisterPayload, User, UserRole};
