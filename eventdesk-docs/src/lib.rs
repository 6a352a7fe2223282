//! # EventDesk Document Service
//!
//! Creates and deletes the Google Workspace documents attached to projects.
//!
//! ## Modules
//!
//! - `service`: The [`DocumentService`] trait, its error type and the disabled stand-in
//! - `google`: Service-account client for Docs, Sheets, Slides, Forms and Drive
//! - `memory`: In-memory implementation with switchable failures
//! - `urls`: Canonical edit URLs and id extraction
//! - `timeout`: Per-call deadlines
//!
//! ## Example
//!
//! ```no_run
//! use eventdesk_docs::{urls, DocumentService, InMemoryDocumentService};
//! use eventdesk_shared::models::project_file::FileType;
//!
//! # async fn example() -> eventdesk_docs::DocumentResult<()> {
//! let service = InMemoryDocumentService::new();
//! let id = service.create_document(FileType::Document, "Run sheet").await?;
//! let url = urls::view_url(FileType::Document, &id);
//! # Ok(())
//! # }
//! ```

pub mod google;
pub mod memory;
pub mod service;
pub mod timeout;
pub mod urls;

pub use google::{GoogleWorkspaceClient, ServiceAccountKey};
pub use memory::InMemoryDocumentService;
pub use service::{DisabledDocumentService, DocumentError, DocumentResult, DocumentService};
