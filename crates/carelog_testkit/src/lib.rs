//! # CareLog Testkit
//!
//! Test utilities for CareLog.
//!
//! This crate provides:
//! - temporary stores, in memory or on disk, with reopen support
//! - sample records and pre-populated stores
//! - proptest strategies for records and snapshots
//! - helpers that damage collection logs the way a crash would
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carelog_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn survives_reopen() {
//!     let store = TestStore::file().await;
//!     store.put(sample_symptom(100)).await.unwrap();
//!     let store = store.reopen().await;
//!     assert_eq!(store.count(CollectionKind::SymptomLogs).await, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
