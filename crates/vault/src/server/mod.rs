//! Axum HTTP server exposing the record adapters.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.
//! - Map adapter errors onto HTTP statuses without echoing plaintext.

pub mod handlers;
pub mod router;
pub mod state;
