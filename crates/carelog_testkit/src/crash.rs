//! Helpers that damage collection logs the way an interrupted write would.
//!
//! All helpers work on a closed store directory; drop every handle first.

use carelog_core::CollectionKind;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Path of a collection's log inside a store directory.
pub fn log_path(store_dir: &Path, kind: CollectionKind) -> PathBuf {
    store_dir.join(format!("{}.log", kind.name()))
}

/// Size of a collection's log in bytes.
pub fn log_len(store_dir: &Path, kind: CollectionKind) -> u64 {
    fs::metadata(log_path(store_dir, kind))
        .expect("Failed to stat log")
        .len()
}

/// Cuts `bytes` off the end of a log, leaving a partial last frame.
pub fn tear_tail(store_dir: &Path, kind: CollectionKind, bytes: u64) {
    let path = log_path(store_dir, kind);
    let len = fs::metadata(&path).expect("Failed to stat log").len();
    let file = OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("Failed to open log");
    file.set_len(len.saturating_sub(bytes))
        .expect("Failed to truncate log");
}

/// Appends raw bytes to a log, as if a frame was only partly written.
pub fn append_garbage(store_dir: &Path, kind: CollectionKind, garbage: &[u8]) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(log_path(store_dir, kind))
        .expect("Failed to open log");
    file.write_all(garbage).expect("Failed to append to log");
}

/// Flips one byte at `offset` in a log.
pub fn flip_byte(store_dir: &Path, kind: CollectionKind, offset: usize) {
    let path = log_path(store_dir, kind);
    let mut bytes = fs::read(&path).expect("Failed to read log");
    bytes[offset] ^= 0xFF;
    fs::write(&path, bytes).expect("Failed to write log");
}
