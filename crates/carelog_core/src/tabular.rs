//! Row-oriented text export of the collections.
//!
//! Each non-empty collection becomes one table: a header line with the
//! record's field names, then one line per record in key order. Values are
//! joined with commas as-is. A value containing a comma or a newline is not
//! quoted and will break the row; readers of these files must know their data.

use crate::error::CoreResult;
use crate::record::{CycleRecord, MedicationLog, Profile, ProgressLog, Record, SymptomLog};
use crate::store::Store;
use crate::types::CollectionKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// One exported collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// The collection the rows came from.
    pub collection: CollectionKind,
    /// Header line followed by one line per record, each ending in `\n`.
    pub contents: String,
}

impl Table {
    /// File name the table is written under.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.collection.name())
    }
}

/// Renders every non-empty collection, in schema order.
///
/// # Errors
///
/// Returns a format error if a stored record cannot be decoded.
pub async fn export_tables(store: &Store) -> CoreResult<Vec<Table>> {
    let tables = [
        render(store.get_all::<Profile>().await?),
        render(store.get_all::<SymptomLog>().await?),
        render(store.get_all::<MedicationLog>().await?),
        render(store.get_all::<CycleRecord>().await?),
        render(store.get_all::<ProgressLog>().await?),
    ];
    Ok(tables.into_iter().flatten().collect())
}

/// Writes `<collection>.csv` into `dir` for each non-empty collection.
///
/// Creates `dir` if needed and returns the paths written.
///
/// # Errors
///
/// Returns an I/O error if a file cannot be written.
pub async fn write_tables(store: &Store, dir: impl AsRef<Path>) -> CoreResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::new();
    for table in export_tables(store).await? {
        let path = dir.join(table.file_name());
        tokio::fs::write(&path, table.contents.as_bytes()).await?;
        written.push(path);
    }

    info!(dir = %dir.display(), tables = written.len(), "wrote tabular export");
    Ok(written)
}

fn render<R: Record>(records: Vec<R>) -> Option<Table> {
    if records.is_empty() {
        return None;
    }

    let mut contents = R::FIELDS.join(",");
    contents.push('\n');
    for record in &records {
        contents.push_str(&record.field_values().join(","));
        contents.push('\n');
    }

    Some(Table {
        collection: R::KIND,
        contents,
    })
}
