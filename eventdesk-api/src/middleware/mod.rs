/// HTTP middleware for the API server
///
/// - `security`: Response security headers
///
/// Bearer-token authentication lives in `eventdesk_shared::auth::middleware`
/// and is wired up in [`crate::app`].

pub mod security;
