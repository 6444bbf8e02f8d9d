use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub module_leader_id: Option<String>,
    #[serde(default)]
    pub has_access: bool,
}

/// Filters for the course listing
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub page: PageRequest,
    pub search: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessRequestStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "rejected")]
    Rejected,
}

impl std::fmt::Display for AccessRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessRequestStatus::Pending => write!(f, "pending"),
            AccessRequestStatus::Approved => write!(f, "approved"),
            AccessRequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome chosen by a reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl From<ReviewDecision> for AccessRequestStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approve => AccessRequestStatus::Approved,
            ReviewDecision::Reject => AccessRequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub id: String,
    pub course_id: String,
    pub requester_id: String,
    pub status: AccessRequestStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccessRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewAccessRequest {
    pub status: AccessRequestStatus,
}
