//! The collection store.
//!
//! A [`Store`] owns the five collections of the fixed schema. Each
//! collection is an append-only log on its own backend plus an in-memory
//! view rebuilt on open.
//!
//! ## Concurrency
//!
//! Every collection sits behind its own FIFO async mutex. Puts to one
//! collection are applied in the order their futures first reach the lock,
//! so the later of two writes to a key wins. Collections do not wait for
//! each other and nothing orders writes across them.
//!
//! ## Durability
//!
//! A put returns only after its frame has been synced (or flushed, with
//! `sync_on_commit` off). Disk work runs on the blocking thread pool.

mod dir;
mod log;
mod manifest;

pub use manifest::{Manifest, SCHEMA_VERSION};

use crate::config::Config;
use crate::error::CoreResult;
use crate::record::{self, CycleRecord, MedicationLog, Profile, ProgressLog, Record, SymptomLog};
use crate::snapshot::Snapshot;
use crate::types::{CollectionKind, RecordKey};
use carelog_storage::{FileBackend, InMemoryBackend, StorageBackend};
use dir::StoreDir;
use log::CollectionLog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Handle to an open store.
///
/// Cloning is cheap and every clone refers to the same collections. Pass
/// the handle to whatever needs the store; there is no global instance.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> carelog_core::CoreResult<()> {
/// use carelog_core::{Config, Store, SymptomLog};
///
/// let store = Store::open("carelog-data", Config::default()).await?;
/// store
///     .put(SymptomLog {
///         timestamp: 1_700_000_000_000,
///         symptom: "headache".into(),
///         severity: 3,
///         notes: String::new(),
///     })
///     .await?;
/// let logs: Vec<SymptomLog> = store.get_all().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    collections: [Arc<Mutex<CollectionLog>>; 5],
    schema_version: u32,
    path: Option<PathBuf>,
    _dir: Option<StoreDir>,
}

impl Store {
    /// Opens the store in `path`, initializing or upgrading its schema.
    ///
    /// Initialization runs once, before any read or write is possible; if it
    /// fails no handle is returned.
    ///
    /// # Errors
    ///
    /// - [`CoreError::StoreLocked`](crate::CoreError::StoreLocked) if another
    ///   handle owns the directory
    /// - [`CoreError::SchemaMismatch`](crate::CoreError::SchemaMismatch) if
    ///   the schema is newer than this build
    /// - a storage fault if a log cannot be opened or replayed
    pub async fn open(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || Self::open_blocking(&path, &config)).await?
    }

    fn open_blocking(path: &Path, config: &Config) -> CoreResult<Self> {
        let dir = StoreDir::open(path, config.create_if_missing)?;

        let manifest = match dir.load_manifest()? {
            None => {
                let manifest = Manifest::current();
                dir.save_manifest(&manifest)?;
                info!(path = %path.display(), "initialized new store");
                manifest
            }
            Some(mut manifest) => {
                let previous = manifest.schema_version;
                let added = manifest.upgrade()?;
                if !added.is_empty() || previous != manifest.schema_version {
                    dir.save_manifest(&manifest)?;
                    info!(
                        from = previous,
                        to = manifest.schema_version,
                        added = ?added,
                        "upgraded store schema"
                    );
                }
                manifest
            }
        };

        let mut backends: Vec<Box<dyn StorageBackend>> = Vec::with_capacity(5);
        for kind in CollectionKind::ALL {
            backends.push(Box::new(FileBackend::open(&dir.log_path(kind))?));
        }

        let store = Self::assemble(
            config,
            backends,
            manifest.schema_version,
            Some(dir),
        )?;
        info!(path = %path.display(), "opened store");
        Ok(store)
    }

    /// Opens an isolated store that lives only in memory.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other constructors.
    pub fn open_in_memory() -> CoreResult<Self> {
        let backends = CollectionKind::ALL
            .iter()
            .map(|_| Box::new(InMemoryBackend::new()) as Box<dyn StorageBackend>)
            .collect();
        Self::assemble(&Config::default(), backends, SCHEMA_VERSION, None)
    }

    /// Opens a store over caller-supplied backends, one per collection in
    /// [`CollectionKind::ALL`] order.
    ///
    /// Existing frames in the backends are replayed. No manifest or lock is
    /// involved; the caller owns the backends' lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend cannot be read or holds a damaged log.
    pub fn open_with_backends(
        config: Config,
        backends: [Box<dyn StorageBackend>; 5],
    ) -> CoreResult<Self> {
        Self::assemble(&config, Vec::from(backends), SCHEMA_VERSION, None)
    }

    fn assemble(
        config: &Config,
        backends: Vec<Box<dyn StorageBackend>>,
        schema_version: u32,
        dir: Option<StoreDir>,
    ) -> CoreResult<Self> {
        let mut logs = Vec::with_capacity(5);
        for (kind, backend) in CollectionKind::ALL.into_iter().zip(backends) {
            logs.push(Arc::new(Mutex::new(CollectionLog::open(
                kind,
                backend,
                config.sync_on_commit,
            )?)));
        }
        let collections: [Arc<Mutex<CollectionLog>>; 5] = logs
            .try_into()
            .map_err(|_| crate::CoreError::format("expected one backend per collection"))?;

        Ok(Self {
            inner: Arc::new(StoreInner {
                collections,
                schema_version,
                path: dir.as_ref().map(|d| d.path().to_path_buf()),
                _dir: dir,
            }),
        })
    }

    fn collection(&self, kind: CollectionKind) -> &Arc<Mutex<CollectionLog>> {
        &self.inner.collections[kind.index()]
    }

    /// Schema version the store was opened with.
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.inner.schema_version
    }

    /// Directory of a file-backed store.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Writes `record` at its key, replacing any record already there.
    ///
    /// Cycles without an id get the next sequential id. The returned record
    /// is exactly what was stored, including an assigned id. The write is
    /// durable before this returns.
    ///
    /// # Errors
    ///
    /// - a storage fault if the medium is unavailable or the write was not
    ///   committed; the collection is left as it was
    /// - [`CoreError::InvalidRecord`](crate::CoreError::InvalidRecord) if the
    ///   record does not fit its collection's key policy or fails
    ///   [`Record::validate`]; nothing is written
    pub async fn put<R: Record>(&self, record: R) -> CoreResult<R> {
        record.validate()?;
        let mut log = Arc::clone(self.collection(R::KIND)).lock_owned().await;
        tokio::task::spawn_blocking(move || {
            let key = log.resolve_key(record.key())?;
            let record = record.with_key(key);
            let payload = record::encode(&record)?;
            log.commit(key, payload)?;
            Ok(record)
        })
        .await?
    }

    /// Returns every record of `R`'s collection, sorted ascending by key.
    ///
    /// # Errors
    ///
    /// Returns a format error if a stored payload cannot be decoded.
    pub async fn get_all<R: Record>(&self) -> CoreResult<Vec<R>> {
        let log = self.collection(R::KIND).lock().await;
        decode_all(&log)
    }

    /// Returns the record at `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload cannot be decoded.
    pub async fn get<R: Record>(&self, key: RecordKey) -> CoreResult<Option<R>> {
        let log = self.collection(R::KIND).lock().await;
        log.get(key).map(record::decode::<R>).transpose()
    }

    /// Returns the `n` records with the highest keys, newest first.
    ///
    /// # Errors
    ///
    /// Returns a format error if a payload cannot be decoded.
    pub async fn latest<R: Record>(&self, n: usize) -> CoreResult<Vec<R>> {
        let log = self.collection(R::KIND).lock().await;
        let mut entries = log.sorted_entries();
        entries.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        entries
            .into_iter()
            .take(n)
            .map(|(_, payload)| record::decode(payload))
            .collect()
    }

    /// Number of records in `kind`.
    pub async fn count(&self, kind: CollectionKind) -> usize {
        self.collection(kind).lock().await.len()
    }

    /// Returns the profile, if one has been stored.
    ///
    /// # Errors
    ///
    /// Returns a format error if the payload cannot be decoded.
    pub async fn profile(&self) -> CoreResult<Option<Profile>> {
        self.get(RecordKey::PROFILE).await
    }

    /// Reads all five collections while holding every collection lock.
    ///
    /// Locks are taken in [`CollectionKind::ALL`] order, so the result is a
    /// cross-collection consistent view: no put lands between two of the
    /// reads.
    ///
    /// # Errors
    ///
    /// Returns a format error if a payload cannot be decoded.
    pub async fn snapshot(&self) -> CoreResult<Snapshot> {
        let mut guards = Vec::with_capacity(5);
        for kind in CollectionKind::ALL {
            guards.push(self.collection(kind).lock().await);
        }

        let profile: Vec<Profile> = decode_all(&guards[CollectionKind::Profile.index()])?;
        Ok(Snapshot {
            profile: profile.into_iter().next(),
            symptom_logs: decode_all(&guards[CollectionKind::SymptomLogs.index()])?,
            medication_logs: decode_all(&guards[CollectionKind::MedicationLogs.index()])?,
            cycles: decode_all(&guards[CollectionKind::Cycles.index()])?,
            progress_logs: decode_all(&guards[CollectionKind::ProgressLogs.index()])?,
        })
    }

    /// Reads the five collections one after another, each under its own lock.
    ///
    /// Puts may land between the reads, so the collections can disagree
    /// with each other.
    ///
    /// # Errors
    ///
    /// Returns a format error if a payload cannot be decoded.
    pub async fn read_independently(&self) -> CoreResult<Snapshot> {
        Ok(Snapshot {
            profile: self.profile().await?,
            symptom_logs: self.get_all::<SymptomLog>().await?,
            medication_logs: self.get_all::<MedicationLog>().await?,
            cycles: self.get_all::<CycleRecord>().await?,
            progress_logs: self.get_all::<ProgressLog>().await?,
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.path)
            .field("schema_version", &self.inner.schema_version)
            .finish_non_exhaustive()
    }
}

fn decode_all<R: Record>(log: &CollectionLog) -> CoreResult<Vec<R>> {
    log.sorted_entries()
        .into_iter()
        .map(|(_, payload)| record::decode(payload))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    fn symptom(timestamp: u64, symptom: &str) -> SymptomLog {
        SymptomLog {
            timestamp,
            symptom: symptom.into(),
            severity: 2,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn put_replaces_record_at_same_key() {
        let store = Store::open_in_memory().unwrap();
        store.put(symptom(100, "nausea")).await.unwrap();
        store.put(symptom(100, "fatigue")).await.unwrap();

        let logs: Vec<SymptomLog> = store.get_all().await.unwrap();
        assert_eq!(logs, vec![symptom(100, "fatigue")]);
    }

    #[tokio::test]
    async fn out_of_range_severity_is_not_stored() {
        let store = Store::open_in_memory().unwrap();
        store.put(symptom(100, "nausea")).await.unwrap();

        let mut bad = symptom(200, "migraine");
        bad.severity = 11;
        let result = store.put(bad).await;
        assert!(matches!(result, Err(CoreError::InvalidRecord { .. })));

        let logs: Vec<SymptomLog> = store.get_all().await.unwrap();
        assert_eq!(logs, vec![symptom(100, "nausea")]);
    }

    #[tokio::test]
    async fn get_all_is_key_ascending() {
        let store = Store::open_in_memory().unwrap();
        for ts in [30, 10, 20] {
            store.put(symptom(ts, "x")).await.unwrap();
        }
        let keys: Vec<u64> = store
            .get_all::<SymptomLog>()
            .await
            .unwrap()
            .iter()
            .map(|l| l.timestamp)
            .collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn latest_sorts_by_key_not_insertion() {
        let store = Store::open_in_memory().unwrap();
        for ts in [5, 50, 1, 20] {
            store.put(symptom(ts, "x")).await.unwrap();
        }
        let latest: Vec<u64> = store
            .latest::<SymptomLog>(2)
            .await
            .unwrap()
            .iter()
            .map(|l| l.timestamp)
            .collect();
        assert_eq!(latest, vec![50, 20]);
    }

    #[tokio::test]
    async fn cycles_get_sequential_ids_and_close_in_place() {
        let store = Store::open_in_memory().unwrap();
        let first = store.put(CycleRecord::open("2024-01-01", "")).await.unwrap();
        let second = store.put(CycleRecord::open("2024-01-29", "")).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        store.put(second.clone().closed("2024-02-03")).await.unwrap();
        let cycles: Vec<CycleRecord> = store.get_all().await.unwrap();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[1].end.as_deref(), Some("2024-02-03"));
        assert!(cycles[0].is_open());
    }

    #[tokio::test]
    async fn profile_is_single_record() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.profile().await.unwrap().is_none());

        let mut profile = Profile {
            name: "Sam".into(),
            age: 29,
            height: 172.0,
            weight: 70.0,
        };
        store.put(profile.clone()).await.unwrap();
        profile.weight = 68.5;
        store.put(profile.clone()).await.unwrap();

        assert_eq!(store.count(CollectionKind::Profile).await, 1);
        assert_eq!(store.profile().await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn offline_medium_surfaces_storage_fault() {
        let handle = InMemoryBackend::new();
        let backends: [Box<dyn StorageBackend>; 5] = [
            Box::new(InMemoryBackend::new()),
            Box::new(handle.clone()),
            Box::new(InMemoryBackend::new()),
            Box::new(InMemoryBackend::new()),
            Box::new(InMemoryBackend::new()),
        ];
        let store = Store::open_with_backends(Config::default(), backends).unwrap();

        handle.set_offline(true);
        let err = store.put(symptom(1, "x")).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(store.count(CollectionKind::SymptomLogs).await, 0);
    }

    #[tokio::test]
    async fn snapshot_and_independent_read_agree_when_quiet() {
        let store = Store::open_in_memory().unwrap();
        store.put(symptom(1, "a")).await.unwrap();
        store.put(CycleRecord::open("2024-03-01", "")).await.unwrap();

        let consistent = store.snapshot().await.unwrap();
        let independent = store.read_independently().await.unwrap();
        assert_eq!(consistent, independent);
        assert_eq!(consistent.record_count(), 2);
    }
}
