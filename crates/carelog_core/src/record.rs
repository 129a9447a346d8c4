//! Typed health records and the [`Record`] trait binding them to collections.

use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionKind, RecordKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A type that can be stored in one of the five collections.
///
/// Implementors choose their collection through [`Record::KIND`] and expose
/// their key; the store applies the collection's
/// [`KeyPolicy`](crate::KeyPolicy) on top of that.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection this record lives in.
    const KIND: CollectionKind;

    /// Column names for tabular export, in [`field_values`](Record::field_values) order.
    const FIELDS: &'static [&'static str];

    /// The key carried by the record, if any.
    fn key(&self) -> Option<RecordKey>;

    /// Returns the record with a store-assigned key filled in.
    ///
    /// Only sequential collections ever receive a key they did not carry.
    #[must_use]
    fn with_key(self, key: RecordKey) -> Self;

    /// Field values rendered as text, nulls as the empty string.
    fn field_values(&self) -> Vec<String>;

    /// Checks field ranges the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] for an out-of-range field.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }
}

/// The onboarding profile. There is at most one per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Height in centimetres.
    pub height: f64,
    /// Weight in kilograms.
    pub weight: f64,
}

impl Record for Profile {
    const KIND: CollectionKind = CollectionKind::Profile;
    const FIELDS: &'static [&'static str] = &["name", "age", "height", "weight"];

    fn key(&self) -> Option<RecordKey> {
        Some(RecordKey::PROFILE)
    }

    fn with_key(self, _key: RecordKey) -> Self {
        self
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.age.to_string(),
            self.height.to_string(),
            self.weight.to_string(),
        ]
    }
}

/// A logged symptom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomLog {
    /// Milliseconds since the Unix epoch; the record key.
    pub timestamp: u64,
    /// What was felt.
    pub symptom: String,
    /// Severity from 0 to [`SymptomLog::MAX_SEVERITY`].
    pub severity: u8,
    /// Free-form notes.
    pub notes: String,
}

impl SymptomLog {
    /// Highest severity a symptom can be logged with.
    pub const MAX_SEVERITY: u8 = 10;
}

impl Record for SymptomLog {
    const KIND: CollectionKind = CollectionKind::SymptomLogs;
    const FIELDS: &'static [&'static str] = &["timestamp", "symptom", "severity", "notes"];

    fn key(&self) -> Option<RecordKey> {
        Some(RecordKey(self.timestamp))
    }

    fn with_key(self, key: RecordKey) -> Self {
        Self {
            timestamp: key.as_u64(),
            ..self
        }
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.symptom.clone(),
            self.severity.to_string(),
            self.notes.clone(),
        ]
    }

    fn validate(&self) -> CoreResult<()> {
        if self.severity > Self::MAX_SEVERITY {
            return Err(CoreError::invalid_record(
                Self::KIND.name(),
                format!(
                    "severity {} is outside 0..={}",
                    self.severity,
                    Self::MAX_SEVERITY
                ),
            ));
        }
        Ok(())
    }
}

/// A logged medication dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationLog {
    /// Milliseconds since the Unix epoch; the record key.
    pub timestamp: u64,
    /// Medication name.
    pub medication: String,
    /// Dosage as entered, e.g. "200 mg".
    pub dosage: String,
    /// Whether the dose was taken.
    pub taken: bool,
}

impl Record for MedicationLog {
    const KIND: CollectionKind = CollectionKind::MedicationLogs;
    const FIELDS: &'static [&'static str] = &["timestamp", "medication", "dosage", "taken"];

    fn key(&self) -> Option<RecordKey> {
        Some(RecordKey(self.timestamp))
    }

    fn with_key(self, key: RecordKey) -> Self {
        Self {
            timestamp: key.as_u64(),
            ..self
        }
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.medication.clone(),
            self.dosage.clone(),
            self.taken.to_string(),
        ]
    }
}

/// A logged progress measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressLog {
    /// Milliseconds since the Unix epoch; the record key.
    pub timestamp: u64,
    /// Weight in kilograms.
    pub weight: f64,
    /// Free-form notes.
    pub notes: String,
}

impl Record for ProgressLog {
    const KIND: CollectionKind = CollectionKind::ProgressLogs;
    const FIELDS: &'static [&'static str] = &["timestamp", "weight", "notes"];

    fn key(&self) -> Option<RecordKey> {
        Some(RecordKey(self.timestamp))
    }

    fn with_key(self, key: RecordKey) -> Self {
        Self {
            timestamp: key.as_u64(),
            ..self
        }
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.timestamp.to_string(),
            self.weight.to_string(),
            self.notes.clone(),
        ]
    }
}

/// A menstrual cycle. `end` stays `None` while the cycle is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Store-assigned sequential id; `None` until first stored.
    pub id: Option<u64>,
    /// Start date, e.g. "2024-03-01".
    pub start: String,
    /// End date of a closed cycle.
    pub end: Option<String>,
    /// Free-form notes.
    pub notes: String,
}

impl CycleRecord {
    /// Creates an open cycle without an id.
    #[must_use]
    pub fn open(start: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id: None,
            start: start.into(),
            end: None,
            notes: notes.into(),
        }
    }

    /// Returns true while the cycle has no end date.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Returns the cycle closed at `end`, keeping its id.
    #[must_use]
    pub fn closed(self, end: impl Into<String>) -> Self {
        Self {
            end: Some(end.into()),
            ..self
        }
    }
}

impl Record for CycleRecord {
    const KIND: CollectionKind = CollectionKind::Cycles;
    const FIELDS: &'static [&'static str] = &["id", "start", "end", "notes"];

    fn key(&self) -> Option<RecordKey> {
        self.id.map(RecordKey)
    }

    fn with_key(self, key: RecordKey) -> Self {
        Self {
            id: Some(key.as_u64()),
            ..self
        }
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.id.map(|id| id.to_string()).unwrap_or_default(),
            self.start.clone(),
            self.end.clone().unwrap_or_default(),
            self.notes.clone(),
        ]
    }
}

/// Encodes a record payload as CBOR.
pub(crate) fn encode<R: Record>(record: &R) -> CoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(record, &mut bytes).map_err(|e| {
        CoreError::format(format!("cannot encode {} record: {e}", R::KIND))
    })?;
    Ok(bytes)
}

/// Decodes a record payload written by [`encode`].
pub(crate) fn decode<R: Record>(bytes: &[u8]) -> CoreResult<R> {
    ciborium::from_reader(bytes)
        .map_err(|e| CoreError::format(format!("cannot decode {} record: {e}", R::KIND)))
}
