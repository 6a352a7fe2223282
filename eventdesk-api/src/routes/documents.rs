/// Project documents
///
/// - `POST /projects/:id/create_google_service/`: Attach a link or a newly
///   created Google document to a project (Editor)
/// - `DELETE /project_file/:id/`: Detach a file; generated documents are
///   deleted remotely first (Editor)
///
/// # Attach
///
/// ```json
/// { "doc_type": "sheet", "title": "Budget", "custom_name": "Budget 2025" }
/// { "doc_type": "link", "title": "Venue", "file_url": "https://example.com/venue" }
/// ```
///
/// `doc_type` is one of `link`, `doc`, `sheet`, `slide`, `form`. Links are
/// recorded as given and never reach the document service. The stored name is
/// `custom_name`, falling back to `title`.
///
/// # Detach
///
/// The local row of a generated document is removed only after the document
/// service confirms the remote delete.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use eventdesk_docs::urls::{extract_file_id, view_url};
use eventdesk_shared::{
    auth::{
        authorization::{require, Action},
        middleware::AuthContext,
    },
    models::{
        project::Project,
        project_file::{CreateProjectFile, FileType, ProjectFile},
    },
};
use serde::Deserialize;

const REMOTE_DELETE_FAILED: &str = "Failed to delete file from Google Drive.";

#[derive(Debug, Default, Deserialize)]
pub struct AttachDocumentRequest {
    pub doc_type: Option<String>,
    pub title: Option<String>,
    pub custom_name: Option<String>,
    pub file_url: Option<String>,
}

/// `None` for absent or blank strings
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Required fields and doc type, checked before anything touches storage
fn parse_attach(req: AttachDocumentRequest) -> ApiResult<(FileType, String, String, Option<String>)> {
    let (doc_type, title) = match (non_blank(req.doc_type), non_blank(req.title)) {
        (Some(doc_type), Some(title)) => (doc_type, title),
        _ => {
            return Err(ApiError::BadRequest(
                "doc_type and title are required fields.".to_string(),
            ))
        }
    };

    let kind = FileType::from_doc_type(&doc_type)
        .ok_or_else(|| ApiError::BadRequest("Invalid doc_type".to_string()))?;

    let file_name = non_blank(req.custom_name).unwrap_or_else(|| title.clone());

    Ok((kind, title, file_name, non_blank(req.file_url)))
}

pub async fn attach_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<i64>,
    ApiJson(req): ApiJson<AttachDocumentRequest>,
) -> ApiResult<(StatusCode, Json<ProjectFile>)> {
    require(&state.db, auth.user_id, Action::ManageDocument).await?;

    let (kind, title, file_name, file_url) = parse_attach(req)?;

    if Project::find_by_id(&state.db, project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    let (file_url, remote_id) = if kind.is_link() {
        let url = file_url
            .ok_or_else(|| ApiError::BadRequest("file_url is required for link".to_string()))?;
        (url, None)
    } else {
        let id = state.documents.create_document(kind, &title).await?;
        let url = view_url(kind, &id).ok_or_else(|| {
            ApiError::InternalError(format!("No view URL for {}", kind.doc_type()))
        })?;
        (url, Some(id))
    };

    let created = ProjectFile::create(
        &state.db,
        CreateProjectFile {
            project_id,
            file_type: kind,
            file_url,
            file_name,
        },
    )
    .await;

    let file = match created {
        Ok(file) => file,
        Err(e) => {
            if let Some(id) = remote_id {
                // Do not leave an orphaned remote document behind
                if let Err(cleanup) = state.documents.delete_document(&id).await {
                    tracing::warn!(file_id = %id, error = %cleanup, "Orphaned remote document");
                }
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        project_id,
        project_file_id = file.id,
        doc_type = kind.doc_type(),
        service = state.documents.name(),
        user_id = auth.user_id,
        "Document attached"
    );
    Ok((StatusCode::CREATED, Json(file)))
}

pub async fn detach_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require(&state.db, auth.user_id, Action::ManageDocument).await?;

    let file = ProjectFile::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    if !file.file_type.is_link() {
        let remote_id = extract_file_id(&file.file_url).ok_or_else(|| {
            ApiError::ExternalService(format!("Cannot find a document id in {}", file.file_url))
        })?;

        if !state.documents.delete_document(remote_id).await? {
            tracing::warn!(project_file_id = id, file_id = remote_id, "Remote delete refused");
            return Err(ApiError::ExternalService(REMOTE_DELETE_FAILED.to_string()));
        }
    }

    ProjectFile::delete(&state.db, id).await?;

    tracing::info!(
        project_file_id = id,
        project_id = file.project_id,
        user_id = auth.user_id,
        "Document detached"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(doc_type: &str, title: &str) -> AttachDocumentRequest {
        AttachDocumentRequest {
            doc_type: Some(doc_type.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_required_fields() {
        for req in [
            AttachDocumentRequest::default(),
            request("", "Budget"),
            request("sheet", "  "),
        ] {
            match parse_attach(req) {
                Err(ApiError::BadRequest(msg)) => {
                    assert_eq!(msg, "doc_type and title are required fields.")
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_invalid_doc_type() {
        assert!(matches!(
            parse_attach(request("pdf", "Budget")),
            Err(ApiError::BadRequest(msg)) if msg == "Invalid doc_type"
        ));
    }

    #[test]
    fn test_file_name_falls_back_to_title() {
        let (kind, title, name, url) = parse_attach(request("sheet", "Budget")).unwrap();
        assert_eq!(kind, FileType::Spreadsheet);
        assert_eq!(title, "Budget");
        assert_eq!(name, "Budget");
        assert!(url.is_none());

        let mut req = request("link", "Venue");
        req.custom_name = Some("Venue map".to_string());
        req.file_url = Some("https://example.com/venue".to_string());
        let (kind, _, name, url) = parse_attach(req).unwrap();
        assert!(kind.is_link());
        assert_eq!(name, "Venue map");
        assert_eq!(url.as_deref(), Some("https://example.com/venue"));
    }
}
