//! Tabular export command.

use super::open_existing;
use std::path::Path;

/// Writes one table per non-empty collection into `output_dir`.
pub async fn run(store_path: &Path, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(store_path).await?;
    let written = carelog_core::write_tables(&store, output_dir).await?;

    if written.is_empty() {
        println!("Store is empty; nothing written");
    }
    for path in &written {
        println!("✓ {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_core::{Config, Store, SymptomLog};
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_tables_for_existing_store() {
        let temp = tempdir().unwrap();
        let store_path = temp.path().join("store");
        let store = Store::open(&store_path, Config::default()).await.unwrap();
        store
            .put(SymptomLog {
                timestamp: 1,
                symptom: "cramps".into(),
                severity: 6,
                notes: String::new(),
            })
            .await
            .unwrap();
        drop(store);

        let out = temp.path().join("out");
        run(&store_path, &out).await.unwrap();
        assert!(out.join("symptom_logs.csv").exists());
        assert!(!out.join("profile.csv").exists());
    }

    #[tokio::test]
    async fn missing_store_is_an_error() {
        let temp = tempdir().unwrap();
        let result = run(&temp.path().join("nope"), &temp.path().join("out")).await;
        assert!(result.is_err());
    }
}
