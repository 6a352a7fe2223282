/// Document service contract
///
/// Handlers talk to external document storage only through
/// [`DocumentService`]. Implementations:
///
/// - [`GoogleWorkspaceClient`](crate::google::GoogleWorkspaceClient): Google Docs, Sheets, Slides, Forms and Drive
/// - [`InMemoryDocumentService`](crate::memory::InMemoryDocumentService): tests and local development
/// - [`DisabledDocumentService`]: used when no credentials are configured
///
/// # Example
///
/// ```no_run
/// use eventdesk_docs::service::{DocumentService, DocumentResult};
/// use eventdesk_shared::models::project_file::FileType;
///
/// # async fn example(service: &dyn DocumentService) -> DocumentResult<()> {
/// let id = service.create_document(FileType::Document, "Run sheet").await?;
/// assert!(service.delete_document(&id).await?);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use eventdesk_shared::models::project_file::FileType;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// No credentials were configured at startup
    #[error("Document service is not configured")]
    NotConfigured,

    /// Links are stored as-is and never created remotely
    #[error("Unsupported document type: {0}")]
    UnsupportedKind(&'static str),

    /// Service account file missing or malformed
    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    /// Token exchange failed
    #[error("Authentication with the document service failed: {0}")]
    Auth(String),

    /// Transport-level failure (DNS, TLS, connection reset)
    #[error("Request to the document service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("Document service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from the document service: {0}")]
    InvalidResponse(String),

    #[error("Document service did not answer within {0:?}")]
    Timeout(Duration),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Creates and deletes externally hosted documents
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Creates an empty document of `kind` titled `title` and returns its id
    async fn create_document(&self, kind: FileType, title: &str) -> DocumentResult<String>;

    /// Deletes the document; `Ok(false)` means the service refused
    async fn delete_document(&self, file_id: &str) -> DocumentResult<bool>;
}

/// Stand-in used when Google credentials are absent; every call fails
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDocumentService;

#[async_trait]
impl DocumentService for DisabledDocumentService {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn create_document(&self, _kind: FileType, _title: &str) -> DocumentResult<String> {
        Err(DocumentError::NotConfigured)
    }

    async fn delete_document(&self, _file_id: &str) -> DocumentResult<bool> {
        Err(DocumentError::NotConfigured)
    }
}
