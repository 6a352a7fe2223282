//! # EventDesk API Server Library
//!
//! HTTP layer for EventDesk: projects, events, tasks and profiles behind
//! Viewer / Editor / Admin access levels.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON and query extractors that reject with `ApiError`
//! - `middleware`: Security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
