//! Common types, protocol definitions, and errors shared across `memvault-svc` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
