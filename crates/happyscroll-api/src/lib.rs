//! happyScroll verdict service — HTTP surface and C8 orchestration.
//!
//! This crate wires the component crates (`happyscroll-core`,
//! `happyscroll-metadata`, `happyscroll-classifiers`, `happyscroll-cache`,
//! `happyscroll-ratelimit`) into a single axum application.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod orchestrator;
pub mod routes;
pub mod security;
pub mod state;

pub use config::AppConfig;
pub use routes::create_router;
pub use state::AppState;
