//! Admin dashboard statistics (`GET /dashboard/`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::complaint::ComplaintStatus;

/// Short complaint entry used in dashboard lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintSummary {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Complaints created on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    #[serde(rename = "_id", alias = "date")]
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCount {
    #[serde(default)]
    pub user_id: Option<String>,
    pub count: u64,
}

/// Complaints grouped by age since creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgingBuckets {
    #[serde(default, rename = "<24h")]
    pub under_one_day: u64,
    #[serde(default, rename = "1-3d")]
    pub one_to_three_days: u64,
    #[serde(default, rename = "3-7d")]
    pub three_to_seven_days: u64,
    #[serde(default, rename = ">7d")]
    pub over_seven_days: u64,
}

/// Aggregate view of all complaints. Only admins may fetch it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    #[serde(default, rename = "totalComplaints")]
    pub total_complaints: u64,
    #[serde(default, rename = "statusCounts")]
    pub status_counts: HashMap<ComplaintStatus, u64>,
    #[serde(default, rename = "last24hComplaints")]
    pub last_24h_complaints: u64,
    #[serde(default, rename = "recentComplaints")]
    pub recent_complaints: Vec<ComplaintSummary>,
    #[serde(default, rename = "complaintsPerDay7")]
    pub complaints_per_day_7: Vec<DailyCount>,
    #[serde(default, rename = "complaintsPerDay30")]
    pub complaints_per_day_30: Vec<DailyCount>,
    #[serde(default, rename = "topUsers")]
    pub top_users: Vec<UserCount>,
    /// Resolved plus closed, as a percentage of all complaints
    #[serde(default, rename = "completionRate")]
    pub completion_rate: f64,
    #[serde(default, rename = "agingBuckets")]
    pub aging_buckets: AgingBuckets,
    /// Oldest complaints still open
    #[serde(default, rename = "longestOpenComplaints")]
    pub longest_open_complaints: Vec<ComplaintSummary>,
    #[serde(default, rename = "adminEfficiencyScore")]
    pub admin_efficiency_score: f64,
}

impl DashboardStats {
    pub fn count_for(&self, status: ComplaintStatus) -> u64 {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }
}
