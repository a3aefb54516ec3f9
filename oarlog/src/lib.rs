//! # Oarlog
//!
//! Local data synchronization engine for a personal rowing analytics
//! dashboard. Reconciles the Concept2 logbook API with a local SQLite cache
//! under an incremental-sync policy and hands the cached records to the
//! [`ergstats`] analytics engine.
//!
//! This crate provides:
//! - HTTP client for the paginated logbook results endpoint ([`http`])
//! - SQLite persistence with append-only, identity-keyed upserts
//!   ([`persistence`])
//! - Sync coordination: staleness checks, safety-overlap windows, and the
//!   single-flight rule ([`sync`])
//!
//! The web route layer, OAuth flow, and presentation live outside this
//! crate; they construct a [`SyncCoordinator`] with a valid bearer token and
//! consume plain serializable results.

// Re-export the analytics engine so consumers need only one dependency
pub use ergstats::*;

pub mod config;
pub mod error;
pub mod http;
pub mod persistence;
pub mod sync;
pub mod types;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use http::{LogbookClient, RecordSource};
pub use persistence::WorkoutStore;
pub use sync::{SyncCoordinator, SyncPhase};
pub use types::{SyncOutcome, SyncReport, SyncState};
