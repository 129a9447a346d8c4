//! Inspect command implementation.

use super::open_existing;
use carelog_core::{CollectionKind, Store};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

/// Output format for `inspect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Schema version from the manifest.
    pub schema_version: u32,
    /// Per-collection record counts, in schema order.
    pub collections: Vec<CollectionStats>,
    /// Records across all collections.
    pub total_records: usize,
}

/// Statistics for a single collection.
#[derive(Debug, Serialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: &'static str,
    /// Number of records.
    pub records: usize,
}

/// Runs the inspect command.
pub async fn run(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path).await?;
    let result = inspect(&store, path).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

async fn inspect(store: &Store, path: &Path) -> InspectResult {
    let mut collections = Vec::with_capacity(CollectionKind::ALL.len());
    for kind in CollectionKind::ALL {
        collections.push(CollectionStats {
            name: kind.name(),
            records: store.count(kind).await,
        });
    }

    InspectResult {
        path: path.display().to_string(),
        schema_version: store.schema_version(),
        total_records: collections.iter().map(|c| c.records).sum(),
        collections,
    }
}

fn print_text_output(result: &InspectResult) {
    println!("CareLog Store Inspection");
    println!("========================");
    println!();
    println!("Path:           {}", result.path);
    println!("Schema version: {}", result.schema_version);
    println!();
    println!("Collections:");
    for collection in &result.collections {
        println!("  {:<16} {}", collection.name, collection.records);
    }
    println!();
    println!("Total records: {}", result.total_records);
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_core::{CycleRecord, Profile};

    #[tokio::test]
    async fn counts_every_collection() {
        let store = Store::open_in_memory().unwrap();
        store
            .put(Profile {
                name: "Ana".into(),
                age: 30,
                height: 165.0,
                weight: 58.0,
            })
            .await
            .unwrap();
        store.put(CycleRecord::open("2024-01-01", "")).await.unwrap();
        store.put(CycleRecord::open("2024-01-29", "")).await.unwrap();

        let result = inspect(&store, Path::new("mem")).await;
        assert_eq!(result.collections.len(), 5);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.collections[0].name, "profile");
        assert_eq!(result.collections[3].name, "cycles");
        assert_eq!(result.collections[3].records, 2);

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"schema_version\":1"));
    }
}
