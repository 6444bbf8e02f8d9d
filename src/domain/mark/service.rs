use super::model::{Mark, MarkEntry, SubmitMarksRequest, MAX_SCORE, MIN_SCORE};
use crate::domain::access::Permission;
use crate::error::{ClientError, ClientResult};
use crate::infrastructure::http::{segment, ApiClient, ApiRequest};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

pub struct MarkService {
    client: Arc<ApiClient>,
}

impl MarkService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

/// Reject empty sheets, out-of-range scores and repeated students
pub fn validate_entries(entries: &[MarkEntry]) -> ClientResult<()> {
    if entries.is_empty() {
        return Err(ClientError::Validation("No marks to submit".to_string()));
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if entry.student_id.trim().is_empty() {
            return Err(ClientError::Validation("Student id is required".to_string()));
        }
        if !entry.score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&entry.score) {
            return Err(ClientError::Validation(format!(
                "Score for student {} must be between {} and {}",
                entry.student_id, MIN_SCORE, MAX_SCORE
            )));
        }
        if !seen.insert(entry.student_id.as_str()) {
            return Err(ClientError::Validation(format!(
                "Student {} appears more than once",
                entry.student_id
            )));
        }
    }

    Ok(())
}

#[async_trait]
pub trait MarkServiceApi: Send + Sync {
    async fn list_marks(&self, course_id: &str) -> ClientResult<Vec<Mark>>;

    async fn submit_marks(&self, course_id: &str, entries: Vec<MarkEntry>)
        -> ClientResult<Vec<Mark>>;
}

#[async_trait]
impl MarkServiceApi for MarkService {
    async fn list_marks(&self, course_id: &str) -> ClientResult<Vec<Mark>> {
        self.client.authorize(Permission::ViewMarks).await?;

        let path = format!("/courses/{}/marks", segment(course_id));
        self.client.send_json(ApiRequest::get(path)).await
    }

    async fn submit_marks(
        &self,
        course_id: &str,
        entries: Vec<MarkEntry>,
    ) -> ClientResult<Vec<Mark>> {
        self.client.authorize(Permission::EnterMarks).await?;
        validate_entries(&entries)?;

        let count = entries.len();
        let path = format!("/courses/{}/marks", segment(course_id));
        let request = ApiRequest::put(path).json(&SubmitMarksRequest { marks: entries })?;
        let saved: Vec<Mark> = self.client.send_json(request).await?;

        tracing::info!(course_id = %course_id, submitted = count, "Marks submitted");

        Ok(saved)
    }
}
