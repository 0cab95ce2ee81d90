//! `memvault-svc` — authenticated encryption for integration credentials and
//! memory payloads.
//!
//! [`crypto`] holds the AES-256-GCM codec and is usable on its own. [`records`]
//! lays sealed envelopes out as storable rows, and [`server`] exposes those
//! adapters over HTTP.

pub mod config;
pub mod crypto;
pub mod records;
pub mod server;
pub mod telemetry;
