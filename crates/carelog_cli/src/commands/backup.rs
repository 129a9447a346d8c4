//! Backup export and import commands.

use super::open_existing;
use carelog_core::{BackupConfig, BackupEnvelope, BackupService, SnapshotMode, Store};
use std::path::Path;
use tracing::info;

/// Writes an encrypted backup of the store at `store_path` to `output`.
pub async fn export(
    store_path: &Path,
    output: &Path,
    passphrase_env: &str,
    consistent: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(store = %store_path.display(), "creating backup");

    let store = open_existing(store_path).await?;
    let mode = if consistent {
        SnapshotMode::Consistent
    } else {
        SnapshotMode::Independent
    };
    let passphrase = read_passphrase(passphrase_env);

    let config = BackupConfig::default().snapshot_mode(mode);
    let envelope = export_store(&store, config, passphrase.as_deref()).await?;
    envelope.write_to(output)?;

    println!("✓ Backup created successfully");
    println!("  Path: {}", output.display());
    println!("  Size: {} bytes", envelope.ciphertext.len());
    Ok(())
}

/// Merges the backup at `input` into the store at `store_path`.
pub async fn import(
    store_path: &Path,
    input: &Path,
    passphrase_env: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(backup = %input.display(), "restoring backup");

    let envelope = BackupEnvelope::read_from(input)?;
    let store = open_existing(store_path).await?;
    let passphrase = read_passphrase(passphrase_env);

    let stats = BackupService::new(store, BackupConfig::default())
        .import(&envelope, passphrase.as_deref())
        .await?;

    println!("✓ Backup restored successfully");
    println!("  Profile:     {}", if stats.profile { "restored" } else { "none" });
    println!("  Symptoms:    {}", stats.symptom_logs);
    println!("  Medications: {}", stats.medication_logs);
    println!("  Cycles:      {}", stats.cycles);
    println!("  Progress:    {}", stats.progress_logs);
    Ok(())
}

async fn export_store(
    store: &Store,
    config: BackupConfig,
    passphrase: Option<&str>,
) -> carelog_core::CoreResult<BackupEnvelope> {
    BackupService::new(store.clone(), config)
        .export(passphrase)
        .await
}

/// Reads the passphrase from the environment; unset and empty both count as missing.
fn read_passphrase(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_core::{Config, CoreError, SymptomLog};
    use tempfile::tempdir;

    #[test]
    fn unset_passphrase_is_none() {
        assert_eq!(read_passphrase("CARELOG_TEST_SURELY_UNSET_VARIABLE"), None);
    }

    #[tokio::test]
    async fn export_without_passphrase_is_rejected() {
        let temp = tempdir().unwrap();
        let store = Store::open(temp.path().join("store"), Config::default())
            .await
            .unwrap();

        let result = export_store(&store, BackupConfig::default(), None).await;
        assert!(matches!(result, Err(CoreError::PassphraseRequired)));
    }

    #[tokio::test]
    async fn exported_file_imports_into_another_store() {
        let temp = tempdir().unwrap();
        let source = Store::open(temp.path().join("a"), Config::default())
            .await
            .unwrap();
        source
            .put(SymptomLog {
                timestamp: 100,
                symptom: "headache".into(),
                severity: 2,
                notes: String::new(),
            })
            .await
            .unwrap();

        let config = BackupConfig::default().kdf_iterations(1_000);
        let file = temp.path().join("backup.json");
        export_store(&source, config.clone(), Some("pw"))
            .await
            .unwrap()
            .write_to(&file)
            .unwrap();

        let target = Store::open(temp.path().join("b"), Config::default())
            .await
            .unwrap();
        let envelope = BackupEnvelope::read_from(&file).unwrap();
        BackupService::new(target.clone(), config)
            .import(&envelope, Some("pw"))
            .await
            .unwrap();

        let logs: Vec<SymptomLog> = target.get_all().await.unwrap();
        assert_eq!(logs.len(), 1);
    }
}
