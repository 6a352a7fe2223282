/// Request extractors that reject with [`ApiError`]
///
/// axum's own `Json` and `Query` reject with plain-text 4xx bodies. These
/// wrappers run the same extraction but turn every rejection into a 400 with
/// the usual `{"error": ...}` body.
///
/// ```no_run
/// use eventdesk_api::extract::ApiJson;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Rename {
///     name: String,
/// }
///
/// async fn rename(ApiJson(req): ApiJson<Rename>) -> String {
///     req.name
/// }
/// ```

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON body extractor
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
