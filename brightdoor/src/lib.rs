//! Pushes form submissions into BrightDoor CRM as contacts.
//!
//! A submission and its feed configuration are mapped onto a `CreateOrUpdate`
//! payload ([`mapping`]), optionally matched against an existing contact by
//! email, pruned of empty values and sent through the [`gateway`]. Every
//! attempt ends with one [`sync::SyncReport`].

pub mod api;
pub mod config;
pub mod credentials;
pub mod email;
pub mod errors;
pub mod feed;
pub mod gateway;
pub mod mapping;
pub mod metrics_defs;
pub mod payload;
pub mod prune;
pub mod service;
pub mod settings;
pub mod sync;
pub mod types;

#[cfg(test)]
mod testutils;

pub use errors::{BrightDoorError, Result};
pub use feed::{FeedConfig, SubmissionRecord};
pub use sync::{SyncOrchestrator, SyncReport, SyncStatus};
