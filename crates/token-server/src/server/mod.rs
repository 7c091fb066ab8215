//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.
//! - Map codec outcomes onto HTTP responses without revealing why a token
//!   was rejected.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
