use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub owner_id: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub shared_with: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub page: PageRequest,
    pub course_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDocumentRequest {
    pub recipient_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeDocumentRequest {
    pub course_id: String,
}
