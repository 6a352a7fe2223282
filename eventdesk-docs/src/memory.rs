/// In-memory document service
///
/// Keeps "documents" in a map and hands out random ids. Failures can be
/// switched on to exercise error paths, and call counters let tests assert
/// that no external call happened.

use async_trait::async_trait;
use eventdesk_shared::models::project_file::FileType;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::service::{DocumentError, DocumentResult, DocumentService};

#[derive(Debug, Default)]
pub struct InMemoryDocumentService {
    documents: Mutex<HashMap<String, (FileType, String)>>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_document` return an API error
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Makes `delete_document` report a refused delete
    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, file_id: &str) -> bool {
        self.documents.lock().await.contains_key(file_id)
    }

    /// Kind and title of a stored document
    pub async fn get(&self, file_id: &str) -> Option<(FileType, String)> {
        self.documents.lock().await.get(file_id).cloned()
    }
}

#[async_trait]
impl DocumentService for InMemoryDocumentService {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_document(&self, kind: FileType, title: &str) -> DocumentResult<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if kind.is_link() {
            return Err(DocumentError::UnsupportedKind(kind.doc_type()));
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DocumentError::Api {
                status: 503,
                message: "simulated outage".to_string(),
            });
        }

        let id = Uuid::new_v4().simple().to_string();
        self.documents
            .lock()
            .await
            .insert(id.clone(), (kind, title.to_string()));

        Ok(id)
    }

    async fn delete_document(&self, file_id: &str) -> DocumentResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_delete.load(Ordering::SeqCst) {
            return Ok(false);
        }

        Ok(self.documents.lock().await.remove(file_id).is_some())
    }
}
