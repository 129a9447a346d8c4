//! Store manifest: schema version and collection registry.

use crate::error::{CoreError, CoreResult};
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Persisted description of the store schema.
///
/// Collections are only ever appended to `collections`; an upgrade adds
/// what is missing and never drops or renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version the store was last initialized with.
    pub schema_version: u32,
    /// Names of every collection created so far.
    pub collections: Vec<String>,
}

impl Manifest {
    /// A manifest for a fresh store holding the full current schema.
    #[must_use]
    pub fn current() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            collections: CollectionKind::ALL
                .iter()
                .map(|kind| kind.name().to_string())
                .collect(),
        }
    }

    /// Brings a loaded manifest up to the current schema.
    ///
    /// Returns the collections that were added; an empty list means the
    /// manifest was already current and need not be rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaMismatch`] if the manifest was written by a
    /// newer schema.
    pub fn upgrade(&mut self) -> CoreResult<Vec<CollectionKind>> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(CoreError::SchemaMismatch {
                found: self.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let added: Vec<CollectionKind> = CollectionKind::ALL
            .into_iter()
            .filter(|kind| !self.has_collection(kind.name()))
            .collect();
        for kind in &added {
            self.collections.push(kind.name().to_string());
        }
        if !added.is_empty() || self.schema_version < SCHEMA_VERSION {
            self.schema_version = SCHEMA_VERSION;
        }
        Ok(added)
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c == name)
    }

    /// Serializes the manifest.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::format(format!("cannot encode manifest: {e}")))
    }

    /// Parses a manifest.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| CoreError::format(format!("invalid manifest: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_manifest_lists_all_collections() {
        let manifest = Manifest::current();
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert_eq!(manifest.collections.len(), 5);
        assert!(manifest.has_collection("cycles"));
    }

    #[test]
    fn upgrade_adds_missing_collections_only() {
        let mut manifest = Manifest {
            schema_version: 0,
            collections: vec!["profile".into(), "symptom_logs".into(), "legacy_notes".into()],
        };
        let added = manifest.upgrade().unwrap();

        assert_eq!(
            added,
            vec![
                CollectionKind::MedicationLogs,
                CollectionKind::Cycles,
                CollectionKind::ProgressLogs
            ]
        );
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        // unknown collections are never dropped
        assert!(manifest.has_collection("legacy_notes"));
        assert_eq!(manifest.collections[0], "profile");
    }

    #[test]
    fn upgrade_of_current_manifest_is_noop() {
        let mut manifest = Manifest::current();
        assert!(manifest.upgrade().unwrap().is_empty());
        assert_eq!(manifest, Manifest::current());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut manifest = Manifest {
            schema_version: SCHEMA_VERSION + 1,
            collections: vec![],
        };
        assert!(matches!(
            manifest.upgrade(),
            Err(CoreError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn garbage_manifest_is_format_error() {
        assert!(matches!(
            Manifest::decode(b"not json"),
            Err(CoreError::Format { .. })
        ));
    }
}
