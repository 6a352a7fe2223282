//! # EventDesk Shared Library
//!
//! Shared types, persistence and access-control logic used by the EventDesk
//! API server and the document adapter.
//!
//! ## Module Organization
//!
//! - `models`: Entities (users, profiles, projects, files, events, tasks) and their SQL
//! - `auth`: Token issuance, password hashing, auth context and the access-level gate
//! - `db`: Connection pool and embedded migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the EventDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
