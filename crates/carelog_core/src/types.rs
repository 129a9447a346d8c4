//! Core identifiers: collection kinds, key policies and record keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The key a record is stored under.
///
/// Timestamps (milliseconds since the Unix epoch) for logs, a sequential id
/// for cycles, and the fixed [`RecordKey::PROFILE`] sentinel for the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(pub u64);

impl RecordKey {
    /// The single key of the profile collection.
    pub const PROFILE: RecordKey = RecordKey(1);

    /// Creates a key from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a collection derives the key of an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Every record lives at the same key.
    Fixed(RecordKey),
    /// The record carries its key (a timestamp).
    Explicit,
    /// The record may carry a key; if it doesn't, the store assigns the next
    /// sequence number.
    Sequential,
}

/// The five collections of the fixed schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectionKind {
    /// The onboarding profile.
    Profile,
    /// Symptom entries keyed by timestamp.
    SymptomLogs,
    /// Medication entries keyed by timestamp.
    MedicationLogs,
    /// Menstrual cycles keyed by sequential id.
    Cycles,
    /// Progress entries keyed by timestamp.
    ProgressLogs,
}

impl CollectionKind {
    /// All collections, in schema (and lock acquisition) order.
    pub const ALL: [CollectionKind; 5] = [
        Self::Profile,
        Self::SymptomLogs,
        Self::MedicationLogs,
        Self::Cycles,
        Self::ProgressLogs,
    ];

    /// Stable collection name used in the manifest and file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::SymptomLogs => "symptom_logs",
            Self::MedicationLogs => "medication_logs",
            Self::Cycles => "cycles",
            Self::ProgressLogs => "progress_logs",
        }
    }

    /// Looks a collection up by its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The key policy of this collection.
    #[must_use]
    pub const fn key_policy(self) -> KeyPolicy {
        match self {
            Self::Profile => KeyPolicy::Fixed(RecordKey::PROFILE),
            Self::SymptomLogs | Self::MedicationLogs | Self::ProgressLogs => KeyPolicy::Explicit,
            Self::Cycles => KeyPolicy::Sequential,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
