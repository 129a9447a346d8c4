//! The full contents of a store at one moment.

use crate::error::CoreResult;
use crate::record::{CycleRecord, MedicationLog, Profile, ProgressLog, Record, SymptomLog};
use serde::{Deserialize, Serialize};

/// All five collections, each in key-ascending order.
///
/// Produced by an export read and consumed by an import merge. Whether the
/// collections are mutually consistent depends on how it was read; see
/// [`SnapshotMode`](crate::SnapshotMode).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// The profile, if onboarding has happened.
    pub profile: Option<Profile>,
    /// Symptom entries.
    pub symptom_logs: Vec<SymptomLog>,
    /// Medication entries.
    pub medication_logs: Vec<MedicationLog>,
    /// Cycles, open and closed.
    pub cycles: Vec<CycleRecord>,
    /// Progress entries.
    pub progress_logs: Vec<ProgressLog>,
}

impl Snapshot {
    /// Total number of records across all collections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        usize::from(self.profile.is_some())
            + self.symptom_logs.len()
            + self.medication_logs.len()
            + self.cycles.len()
            + self.progress_logs.len()
    }

    /// Returns true if every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Runs [`Record::validate`] over every record.
    ///
    /// # Errors
    ///
    /// Returns the first record's validation error.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        validate_all(&self.symptom_logs)?;
        validate_all(&self.medication_logs)?;
        validate_all(&self.cycles)?;
        validate_all(&self.progress_logs)
    }
}

fn validate_all<R: Record>(records: &[R]) -> CoreResult<()> {
    records.iter().try_for_each(Record::validate)
}
