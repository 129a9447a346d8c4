//! Property-based test generators using proptest.
//!
//! Collections are generated with unique, ascending keys so a generated
//! [`Snapshot`] looks exactly like one read back from a store.

use carelog_core::{CycleRecord, MedicationLog, Profile, ProgressLog, Snapshot, SymptomLog};
use proptest::prelude::*;

/// Strategy for free text, including commas and non-ASCII.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ,.é]{0,24}").expect("Invalid regex")
}

/// Strategy for passphrases.
pub fn passphrase_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{1,32}").expect("Invalid regex")
}

/// Strategy for profiles with finite measurements.
pub fn profile_strategy() -> impl Strategy<Value = Profile> {
    (text_strategy(), 0u32..120, 40.0f64..230.0, 2.0f64..300.0).prop_map(
        |(name, age, height, weight)| Profile {
            name,
            age,
            height,
            weight,
        },
    )
}

/// Strategy for symptom logs with unique timestamps.
pub fn symptom_logs_strategy(max: usize) -> impl Strategy<Value = Vec<SymptomLog>> {
    prop::collection::btree_map(any::<u64>(), (text_strategy(), 0u8..=10, text_strategy()), 0..max)
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(timestamp, (symptom, severity, notes))| SymptomLog {
                    timestamp,
                    symptom,
                    severity,
                    notes,
                })
                .collect()
        })
}

/// Strategy for medication logs with unique timestamps.
pub fn medication_logs_strategy(max: usize) -> impl Strategy<Value = Vec<MedicationLog>> {
    prop::collection::btree_map(
        any::<u64>(),
        (text_strategy(), text_strategy(), any::<bool>()),
        0..max,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(timestamp, (medication, dosage, taken))| MedicationLog {
                timestamp,
                medication,
                dosage,
                taken,
            })
            .collect()
    })
}

/// Strategy for progress logs with unique timestamps.
pub fn progress_logs_strategy(max: usize) -> impl Strategy<Value = Vec<ProgressLog>> {
    prop::collection::btree_map(any::<u64>(), (2.0f64..300.0, text_strategy()), 0..max).prop_map(
        |entries| {
            entries
                .into_iter()
                .map(|(timestamp, (weight, notes))| ProgressLog {
                    timestamp,
                    weight,
                    notes,
                })
                .collect()
        },
    )
}

/// Strategy for cycles with ids `1..=n`, the last one possibly open.
pub fn cycles_strategy(max: usize) -> impl Strategy<Value = Vec<CycleRecord>> {
    prop::collection::vec((text_strategy(), any::<bool>(), text_strategy()), 0..max).prop_map(
        |entries| {
            let count = entries.len();
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (notes, open, end))| CycleRecord {
                    id: Some(i as u64 + 1),
                    start: format!("2024-{:02}-01", i % 12 + 1),
                    end: if open && i + 1 == count { None } else { Some(end) },
                    notes,
                })
                .collect()
        },
    )
}

/// Strategy for whole snapshots, each collection holding fewer than `max` records.
pub fn snapshot_strategy(max: usize) -> impl Strategy<Value = Snapshot> {
    (
        prop::option::of(profile_strategy()),
        symptom_logs_strategy(max),
        medication_logs_strategy(max),
        cycles_strategy(max),
        progress_logs_strategy(max),
    )
        .prop_map(
            |(profile, symptom_logs, medication_logs, cycles, progress_logs)| Snapshot {
                profile,
                symptom_logs,
                medication_logs,
                cycles,
                progress_logs,
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn symptom_keys_are_unique_and_ascending(logs in symptom_logs_strategy(16)) {
            prop_assert!(logs.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        }

        #[test]
        fn cycle_ids_are_sequential(cycles in cycles_strategy(8)) {
            for (i, cycle) in cycles.iter().enumerate() {
                prop_assert_eq!(cycle.id, Some(i as u64 + 1));
            }
            let open = cycles.iter().filter(|c| c.is_open()).count();
            prop_assert!(open <= 1);
        }

        #[test]
        fn profile_measurements_are_finite(profile in profile_strategy()) {
            prop_assert!(profile.height.is_finite());
            prop_assert!(profile.weight.is_finite());
        }
    }
}
