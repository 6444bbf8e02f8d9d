use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub score: f64,
    #[serde(default)]
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One row of a mark sheet as entered by a teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    pub student_id: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl MarkEntry {
    pub fn new(student_id: impl Into<String>, score: f64) -> Self {
        Self {
            student_id: student_id.into(),
            score,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitMarksRequest {
    pub marks: Vec<MarkEntry>,
}
