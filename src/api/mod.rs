//! HTTP API layer for tapi.
//!
//! Provides REST endpoints for managing todos, plus health and OpenAPI docs.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
