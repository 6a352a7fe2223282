/// Google Workspace client
///
/// Authenticates as a service account with the OAuth2 JWT-bearer grant
/// (RFC 7523): an RS256 assertion signed with the account's private key is
/// exchanged for a short-lived bearer token, cached until shortly before it
/// expires.
///
/// | Kind          | Endpoint                                        | Id field         |
/// |---------------|-------------------------------------------------|------------------|
/// | Document      | `POST docs.googleapis.com/v1/documents`         | `documentId`     |
/// | Spreadsheet   | `POST sheets.googleapis.com/v4/spreadsheets`    | `spreadsheetId`  |
/// | Presentation  | `POST slides.googleapis.com/v1/presentations`   | `presentationId` |
/// | Form          | `POST forms.googleapis.com/v1/forms`            | `formId`         |
///
/// Deletion goes through `DELETE www.googleapis.com/drive/v3/files/{id}`.

use async_trait::async_trait;
use chrono::Utc;
use eventdesk_shared::models::project_file::FileType;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::service::{DocumentError, DocumentResult, DocumentService};
use crate::timeout::with_deadline;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Scopes requested for the service account
pub const SCOPES: [&str; 5] = [
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/forms.body",
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/presentations",
];

/// Lifetime requested for each assertion (Google's maximum)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cached tokens are refreshed this long before they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Fields read from a service-account JSON key file
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> DocumentResult<Self> {
        serde_json::from_str(raw).map_err(|e| DocumentError::Credentials(e.to_string()))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DocumentError::Credentials(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&raw)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs the assertion exchanged for an access token
fn build_assertion(key: &ServiceAccountKey, issued_at: i64) -> DocumentResult<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: SCOPES.join(" "),
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| DocumentError::Credentials(format!("private_key: {}", e)))?;

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| DocumentError::Auth(e.to_string()))
}

/// Endpoint, request body and response id field for creating `kind`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCall {
    pub url: &'static str,
    pub body: Value,
    pub id_field: &'static str,
}

pub fn create_call(kind: FileType, title: &str) -> Option<CreateCall> {
    let call = match kind {
        FileType::Link => return None,
        FileType::Document => CreateCall {
            url: "https://docs.googleapis.com/v1/documents",
            body: json!({ "title": title }),
            id_field: "documentId",
        },
        FileType::Spreadsheet => CreateCall {
            url: "https://sheets.googleapis.com/v4/spreadsheets",
            body: json!({ "properties": { "title": title } }),
            id_field: "spreadsheetId",
        },
        FileType::Presentation => CreateCall {
            url: "https://slides.googleapis.com/v1/presentations",
            body: json!({ "title": title }),
            id_field: "presentationId",
        },
        FileType::Form => CreateCall {
            url: "https://forms.googleapis.com/v1/forms",
            body: json!({ "info": { "title": title } }),
            id_field: "formId",
        },
    };

    Some(call)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// [`DocumentService`] backed by Google Workspace APIs
pub struct GoogleWorkspaceClient {
    http: reqwest::Client,
    key: ServiceAccountKey,
    timeout: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleWorkspaceClient {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> DocumentResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            key,
            timeout,
            token: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Returns a cached bearer token or exchanges a new assertion
    async fn access_token(&self) -> DocumentResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_after {
                return Ok(token.value.clone());
            }
        }

        let assertion = build_assertion(&self.key, Utc::now().timestamp())?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DocumentError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DocumentError::InvalidResponse(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_after: Instant::now() + lifetime,
        });

        tracing::debug!(client_email = %self.key.client_email, "Obtained Google access token");
        Ok(token.access_token)
    }

    async fn create(&self, kind: FileType, title: &str) -> DocumentResult<String> {
        let call = create_call(kind, title)
            .ok_or(DocumentError::UnsupportedKind(kind.doc_type()))?;

        let token = self.access_token().await?;
        let response = self
            .http
            .post(call.url)
            .bearer_auth(token)
            .json(&call.body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| DocumentError::InvalidResponse(e.to_string()))?;

        payload
            .get(call.id_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DocumentError::InvalidResponse(format!("missing {}", call.id_field)))
    }

    async fn delete(&self, file_id: &str) -> DocumentResult<bool> {
        let token = self.access_token().await?;
        let response = self
            .http
            .delete(format!("{}/{}", DRIVE_FILES_URL, file_id))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(file_id, status = status.as_u16(), body = %body, "Drive refused delete");
        Ok(false)
    }
}

/// Converts a non-2xx response into [`DocumentError::Api`]
async fn ensure_success(response: reqwest::Response) -> DocumentResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());

    Err(DocumentError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentService for GoogleWorkspaceClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn create_document(&self, kind: FileType, title: &str) -> DocumentResult<String> {
        let id = with_deadline(self.timeout, self.create(kind, title)).await?;
        tracing::info!(kind = kind.doc_type(), file_id = %id, "Created Google document");
        Ok(id)
    }

    async fn delete_document(&self, file_id: &str) -> DocumentResult<bool> {
        with_deadline(self.timeout, self.delete(file_id)).await
    }
}
