use super::model::{Document, DocumentQuery, DistributeDocumentRequest, ShareDocumentRequest};
use crate::domain::access::Permission;
use crate::domain::shared::Page;
use crate::error::{ClientError, ClientResult};
use crate::infrastructure::http::{segment, ApiClient, ApiRequest};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct DocumentService {
    client: Arc<ApiClient>,
}

impl DocumentService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
pub trait DocumentServiceApi: Send + Sync {
    async fn list_documents(&self, query: DocumentQuery) -> ClientResult<Page<Document>>;

    async fn get_document(&self, document_id: &str) -> ClientResult<Document>;

    /// Share with individual users; duplicates and blanks are dropped
    async fn share_document(
        &self,
        document_id: &str,
        recipient_ids: Vec<String>,
    ) -> ClientResult<Document>;

    /// Make the document available to everyone enrolled on a course
    async fn distribute_document(&self, document_id: &str, course_id: &str)
        -> ClientResult<Document>;
}

#[async_trait]
impl DocumentServiceApi for DocumentService {
    async fn list_documents(&self, query: DocumentQuery) -> ClientResult<Page<Document>> {
        query.page.validate()?;

        let request = ApiRequest::get("/documents")
            .query("page", query.page.page)
            .query("limit", query.page.limit)
            .query_opt("courseId", query.course_id);

        self.client.send_json(request).await
    }

    async fn get_document(&self, document_id: &str) -> ClientResult<Document> {
        let path = format!("/documents/{}", segment(document_id));
        self.client.send_json(ApiRequest::get(path)).await
    }

    async fn share_document(
        &self,
        document_id: &str,
        recipient_ids: Vec<String>,
    ) -> ClientResult<Document> {
        self.client.authorize(Permission::ShareDocuments).await?;

        let recipient_ids: Vec<String> = recipient_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if recipient_ids.is_empty() {
            return Err(ClientError::Validation(
                "At least one recipient is required".to_string(),
            ));
        }

        let path = format!("/documents/{}/share", segment(document_id));
        let request = ApiRequest::post(path).json(&ShareDocumentRequest { recipient_ids })?;
        let document: Document = self.client.send_json(request).await?;

        tracing::info!(
            document_id = %document_id,
            recipients = document.shared_with.len(),
            "Document shared"
        );

        Ok(document)
    }

    async fn distribute_document(
        &self,
        document_id: &str,
        course_id: &str,
    ) -> ClientResult<Document> {
        self.client.authorize(Permission::DistributeDocuments).await?;

        if course_id.trim().is_empty() {
            return Err(ClientError::Validation("Course is required".to_string()));
        }

        let path = format!("/documents/{}/distribute", segment(document_id));
        let request = ApiRequest::post(path).json(&DistributeDocumentRequest {
            course_id: course_id.trim().to_string(),
        })?;

        self.client.send_json(request).await
    }
}
