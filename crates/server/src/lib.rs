//! CallGuard webhook server
//!
//! HTTP adapter over the fraud gate:
//!
//! - `GET  /healthcheck`
//! - `POST /phone-numbers:check/` - block list lookup, answered in the agent's envelope
//! - `POST /queries/` - record (phone number, national ID), evaluate in the background
//!
//! Identifiers are normalized here, before they reach the gate.

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;

pub use config::{CallGuardConfig, ConfigLoader, LoadError, StorageBackend};
pub use routes::create_router;
pub use state::{AppState, Stores};
