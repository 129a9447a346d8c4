//! Binary payload codec for backups.
//!
//! The payload is one CBOR map:
//!
//! ```text
//! { format_version, profile, symptom_logs, medication_logs, cycles, progress_logs }
//! ```
//!
//! The version is read before the body is decoded, so a payload from a
//! newer build fails with a clear message instead of a field mismatch.

use crate::error::{CoreError, CoreResult};
use crate::record::{CycleRecord, MedicationLog, Profile, ProgressLog, SymptomLog};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// Payload format written by this build.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct PayloadRef<'a> {
    format_version: u32,
    profile: &'a Option<Profile>,
    symptom_logs: &'a [SymptomLog],
    medication_logs: &'a [MedicationLog],
    cycles: &'a [CycleRecord],
    progress_logs: &'a [ProgressLog],
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

#[derive(Deserialize)]
struct Payload {
    #[allow(dead_code)]
    format_version: u32,
    profile: Option<Profile>,
    symptom_logs: Vec<SymptomLog>,
    medication_logs: Vec<MedicationLog>,
    cycles: Vec<CycleRecord>,
    progress_logs: Vec<ProgressLog>,
}

/// Serializes a snapshot into payload bytes.
///
/// # Errors
///
/// Returns a format error if CBOR encoding fails.
pub fn serialize(snapshot: &Snapshot) -> CoreResult<Vec<u8>> {
    let payload = PayloadRef {
        format_version: FORMAT_VERSION,
        profile: &snapshot.profile,
        symptom_logs: &snapshot.symptom_logs,
        medication_logs: &snapshot.medication_logs,
        cycles: &snapshot.cycles,
        progress_logs: &snapshot.progress_logs,
    };

    let mut bytes = Vec::new();
    ciborium::into_writer(&payload, &mut bytes)
        .map_err(|e| CoreError::format(format!("payload encoding failed: {e}")))?;
    Ok(bytes)
}

/// Deserializes payload bytes back into a snapshot.
///
/// # Errors
///
/// Returns a format error for malformed or truncated input, trailing bytes,
/// or a payload written by a newer format.
pub fn deserialize(bytes: &[u8]) -> CoreResult<Snapshot> {
    let header: VersionHeader = decode_exact(bytes)?;
    if header.format_version == 0 || header.format_version > FORMAT_VERSION {
        return Err(CoreError::format(format!(
            "unsupported payload format version {} (supported: {FORMAT_VERSION})",
            header.format_version
        )));
    }

    let payload: Payload = decode_exact(bytes)?;
    Ok(Snapshot {
        profile: payload.profile,
        symptom_logs: payload.symptom_logs,
        medication_logs: payload.medication_logs,
        cycles: payload.cycles,
        progress_logs: payload.progress_logs,
    })
}

fn decode_exact<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    let mut reader = bytes;
    let value = ciborium::from_reader(&mut reader)
        .map_err(|e| CoreError::format(format!("malformed payload: {e}")))?;
    if !reader.is_empty() {
        return Err(CoreError::format(format!(
            "{} trailing bytes after payload",
            reader.len()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            profile: Some(Profile {
                name: "Ana".into(),
                age: 34,
                height: 168.5,
                weight: 61.2,
            }),
            symptom_logs: vec![
                SymptomLog {
                    timestamp: 100,
                    symptom: "headache".into(),
                    severity: 4,
                    notes: String::new(),
                },
                SymptomLog {
                    timestamp: 200,
                    symptom: "cramps".into(),
                    severity: 7,
                    notes: "after lunch".into(),
                },
            ],
            medication_logs: vec![MedicationLog {
                timestamp: 150,
                medication: "ibuprofen".into(),
                dosage: "200mg".into(),
                taken: true,
            }],
            cycles: vec![
                CycleRecord {
                    id: Some(1),
                    start: "2024-01-01".into(),
                    end: Some("2024-01-05".into()),
                    notes: String::new(),
                },
                CycleRecord {
                    id: Some(2),
                    start: "2024-01-29".into(),
                    end: None,
                    notes: "light".into(),
                },
            ],
            progress_logs: vec![ProgressLog {
                timestamp: 300,
                weight: 60.9,
                notes: "morning".into(),
            }],
        }
    }

    #[test]
    fn full_snapshot_roundtrips() {
        let snapshot = sample();
        let bytes = serialize(&snapshot).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn empty_snapshot_roundtrips() {
        let bytes = serialize(&Snapshot::default()).unwrap();
        let decoded = deserialize(&bytes).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded, Snapshot::default());
    }

    #[test]
    fn truncated_payload_is_format_error() {
        let bytes = serialize(&sample()).unwrap();
        let result = deserialize(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(CoreError::Format { .. })));
    }

    #[test]
    fn garbage_is_format_error() {
        assert!(matches!(
            deserialize(b"not cbor at all"),
            Err(CoreError::Format { .. })
        ));
        assert!(matches!(deserialize(&[]), Err(CoreError::Format { .. })));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = serialize(&sample()).unwrap();
        bytes.push(0x00);
        assert!(matches!(deserialize(&bytes), Err(CoreError::Format { .. })));
    }

    #[test]
    fn newer_format_version_is_rejected() {
        #[derive(Serialize)]
        struct Future {
            format_version: u32,
        }
        let mut bytes = Vec::new();
        ciborium::into_writer(&Future { format_version: 99 }, &mut bytes).unwrap();

        let err = deserialize(&bytes).unwrap_err();
        assert!(err.to_string().contains("99"));
    }
}
