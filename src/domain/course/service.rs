use super::model::{
    AccessRequest, AccessRequestStatus, Course, CourseQuery, CreateAccessRequest,
    ReviewAccessRequest, ReviewDecision,
};
use crate::domain::access::Permission;
use crate::domain::shared::Page;
use crate::error::{ClientError, ClientResult};
use crate::infrastructure::http::{segment, ApiClient, ApiRequest};
use async_trait::async_trait;
use std::sync::Arc;

const MAX_MESSAGE_LEN: usize = 500;

pub struct CourseService {
    client: Arc<ApiClient>,
}

impl CourseService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
pub trait CourseServiceApi: Send + Sync {
    async fn list_courses(&self, query: CourseQuery) -> ClientResult<Page<Course>>;

    async fn get_course(&self, course_id: &str) -> ClientResult<Course>;

    async fn request_access(
        &self,
        course_id: &str,
        message: Option<String>,
    ) -> ClientResult<AccessRequest>;

    async fn list_access_requests(
        &self,
        status: Option<AccessRequestStatus>,
    ) -> ClientResult<Vec<AccessRequest>>;

    async fn review_access_request(
        &self,
        request_id: &str,
        decision: ReviewDecision,
    ) -> ClientResult<AccessRequest>;
}

#[async_trait]
impl CourseServiceApi for CourseService {
    async fn list_courses(&self, query: CourseQuery) -> ClientResult<Page<Course>> {
        query.page.validate()?;

        let request = ApiRequest::get("/courses")
            .query("page", query.page.page)
            .query("limit", query.page.limit)
            .query_opt("search", query.search.filter(|s| !s.trim().is_empty()))
            .query_opt("department", query.department);

        self.client.send_json(request).await
    }

    async fn get_course(&self, course_id: &str) -> ClientResult<Course> {
        let path = format!("/courses/{}", segment(course_id));
        self.client.send_json(ApiRequest::get(path)).await
    }

    async fn request_access(
        &self,
        course_id: &str,
        message: Option<String>,
    ) -> ClientResult<AccessRequest> {
        self.client.authorize(Permission::RequestCourseAccess).await?;

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if let Some(message) = &message {
            if message.chars().count() > MAX_MESSAGE_LEN {
                return Err(ClientError::Validation(format!(
                    "Message must be at most {} characters",
                    MAX_MESSAGE_LEN
                )));
            }
        }

        let path = format!("/courses/{}/access-requests", segment(course_id));
        let request = ApiRequest::post(path).json(&CreateAccessRequest { message })?;
        let created: AccessRequest = self.client.send_json(request).await?;

        tracing::info!(course_id = %course_id, request_id = %created.id, "Course access requested");

        Ok(created)
    }

    async fn list_access_requests(
        &self,
        status: Option<AccessRequestStatus>,
    ) -> ClientResult<Vec<AccessRequest>> {
        let request = ApiRequest::get("/access-requests").query_opt("status", status);
        self.client.send_json(request).await
    }

    async fn review_access_request(
        &self,
        request_id: &str,
        decision: ReviewDecision,
    ) -> ClientResult<AccessRequest> {
        self.client.authorize(Permission::ReviewAccessRequests).await?;

        let path = format!("/access-requests/{}", segment(request_id));
        let request = ApiRequest::patch(path).json(&ReviewAccessRequest {
            status: decision.into(),
        })?;
        let reviewed: AccessRequest = self.client.send_json(request).await?;

        tracing::info!(
            request_id = %request_id,
            status = %reviewed.status,
            "Access request reviewed"
        );

        Ok(reviewed)
    }
}
