/// Route handlers, one module per resource
///
/// - `health`: Liveness and database ping
/// - `auth`: Tokens and registration
/// - `users`: User directory and access levels
/// - `profiles`: Own profile and admin profile view
/// - `events`: Events
/// - `tasks`: Tasks
/// - `projects`: Project tree
/// - `documents`: Project files backed by the document service

pub mod auth;
pub mod documents;
pub mod events;
pub mod health;
pub mod profiles;
pub mod projects;
pub mod tasks;
pub mod users;
