//! # CareLog Core
//!
//! Offline health record store with encrypted backup and restore.
//!
//! This crate provides:
//! - a five-collection record store (profile, symptom logs, medication logs,
//!   cycles, progress logs) with last-write-wins puts and key-ordered reads
//! - passphrase-based key derivation and AES-256-GCM encryption
//! - backup export into a portable encrypted envelope and merge-on-import
//! - tabular text export of each collection
//!
//! Everything is async on tokio; disk and key-derivation work runs on the
//! blocking pool.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
mod config;
pub mod crypto;
mod error;
mod record;
mod snapshot;
mod store;
pub mod tabular;
mod types;

pub use backup::{BackupEnvelope, BackupService, ImportStats};
pub use config::{BackupConfig, Config, SnapshotMode};
pub use error::{CoreError, CoreResult};
pub use record::{CycleRecord, MedicationLog, Profile, ProgressLog, Record, SymptomLog};
pub use snapshot::Snapshot;
pub use store::{Manifest, Store, SCHEMA_VERSION};
pub use tabular::{export_tables, write_tables, Table};
pub use types::{CollectionKind, KeyPolicy, RecordKey};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
