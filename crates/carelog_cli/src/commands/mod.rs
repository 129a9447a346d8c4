//! CLI command implementations.

pub mod backup;
pub mod csv;
pub mod inspect;

use carelog_core::{Config, Store};
use std::path::Path;

/// Opens an existing store; commands never create one.
pub(crate) async fn open_existing(path: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No store found at {}", path.display()).into());
    }
    Ok(Store::open(path, Config::default().create_if_missing(false)).await?)
}
