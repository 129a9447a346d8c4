//! Append-only collection log.
//!
//! Each collection is persisted as a sequence of frames on its own
//! [`StorageBackend`]:
//!
//! ```text
//! | body_len (4) | crc32(body) (4) | body: key (8) | payload... |
//! ```
//!
//! All integers are little-endian. Replaying the frames in order with
//! last-write-wins per key rebuilds the collection. A frame cut short by a
//! crash can only be the last one; it is truncated away on open.

use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionKind, KeyPolicy, RecordKey};
use carelog_storage::StorageBackend;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Frame header size (body length + checksum).
const HEADER_SIZE: usize = 8;
/// Size of the key at the start of every body.
const KEY_SIZE: usize = 8;
/// First id handed out by a sequential collection.
const FIRST_SEQUENCE: u64 = 1;

/// Computes the IEEE CRC32 of `data`.
pub(crate) fn compute_crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        crc = (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize];
    }
    !crc
}

/// Builds one frame for `key` and `payload`.
pub(crate) fn encode_frame(key: RecordKey, payload: &[u8]) -> CoreResult<Vec<u8>> {
    let body_len = u32::try_from(KEY_SIZE + payload.len())
        .map_err(|_| CoreError::format(format!("record of {} bytes is too large", payload.len())))?;

    let mut body = Vec::with_capacity(KEY_SIZE + payload.len());
    body.extend_from_slice(&key.as_u64().to_le_bytes());
    body.extend_from_slice(payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.extend_from_slice(&body_len.to_le_bytes());
    frame.extend_from_slice(&compute_crc32(&body).to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// The outcome of replaying a log.
#[derive(Debug, Default)]
pub(crate) struct Replay {
    /// Latest payload per key.
    pub records: HashMap<RecordKey, Vec<u8>>,
    /// Length of the intact prefix.
    pub valid_len: u64,
    /// Number of frames applied.
    pub frames: usize,
}

/// Replays `bytes` frame by frame.
///
/// Stops at a torn final frame, reporting the intact prefix in
/// [`Replay::valid_len`]. A damaged frame (short, over-long or failing its
/// checksum) counts as torn only when no intact frame follows it anywhere
/// in the log; otherwise it fails with a format error.
pub(crate) fn replay(bytes: &[u8]) -> CoreResult<Replay> {
    let mut replay = Replay::default();
    let mut offset = 0usize;

    while offset < bytes.len() {
        let Some((key, payload, frame_len)) = parse_frame(&bytes[offset..]) else {
            if intact_frame_after(bytes, offset) {
                return Err(CoreError::format(format!(
                    "damaged log frame at offset {offset}"
                )));
            }
            break;
        };

        replay.records.insert(key, payload.to_vec());
        replay.frames += 1;
        offset += frame_len;
    }

    replay.valid_len = offset as u64;
    Ok(replay)
}

/// Parses one complete, checksummed frame at the start of `rest`.
fn parse_frame(rest: &[u8]) -> Option<(RecordKey, &[u8], usize)> {
    if rest.len() < HEADER_SIZE {
        return None;
    }

    let body_len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
    let stored_crc = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
    let frame_len = HEADER_SIZE.saturating_add(body_len);
    if body_len < KEY_SIZE || rest.len() < frame_len {
        return None;
    }

    let body = &rest[HEADER_SIZE..frame_len];
    if compute_crc32(body) != stored_crc {
        return None;
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&body[..KEY_SIZE]);
    Some((
        RecordKey(u64::from_le_bytes(key_bytes)),
        &body[KEY_SIZE..],
        frame_len,
    ))
}

/// Returns true if any offset past `damaged` starts an intact frame.
///
/// Only runs once a frame fails to parse; a real torn tail is at most one
/// frame long, so the scan is short in the common case.
fn intact_frame_after(bytes: &[u8], damaged: usize) -> bool {
    let min_frame = HEADER_SIZE + KEY_SIZE;
    (damaged + 1..bytes.len().saturating_sub(min_frame - 1))
        .any(|start| parse_frame(&bytes[start..]).is_some())
}

/// One collection: its backend plus the replayed in-memory view.
pub(crate) struct CollectionLog {
    kind: CollectionKind,
    backend: Box<dyn StorageBackend>,
    records: HashMap<RecordKey, Vec<u8>>,
    /// Next id a sequential collection hands out; `None` once `u64::MAX` is taken.
    next_sequence: Option<u64>,
    sync_on_commit: bool,
}

impl CollectionLog {
    /// Opens a collection over `backend`, replaying and repairing its log.
    pub fn open(
        kind: CollectionKind,
        mut backend: Box<dyn StorageBackend>,
        sync_on_commit: bool,
    ) -> CoreResult<Self> {
        let bytes = backend.read_all()?;
        let replay = replay(&bytes)?;

        let torn = bytes.len() as u64 - replay.valid_len;
        if torn > 0 {
            warn!(
                collection = kind.name(),
                torn_bytes = torn,
                "truncating torn write at end of collection log"
            );
            backend.truncate(replay.valid_len)?;
            backend.sync()?;
        }

        let next_sequence = match replay.records.keys().max() {
            None => Some(FIRST_SEQUENCE),
            Some(highest) => highest.as_u64().checked_add(1).map(|n| n.max(FIRST_SEQUENCE)),
        };

        debug!(
            collection = kind.name(),
            frames = replay.frames,
            records = replay.records.len(),
            "replayed collection log"
        );

        Ok(Self {
            kind,
            backend,
            records: replay.records,
            next_sequence,
            sync_on_commit,
        })
    }

    /// Decides the key a record is stored under.
    ///
    /// Nothing is reserved: a sequential id becomes taken only once
    /// [`commit`](Self::commit) succeeds.
    pub fn resolve_key(&self, carried: Option<RecordKey>) -> CoreResult<RecordKey> {
        match (self.kind.key_policy(), carried) {
            (KeyPolicy::Fixed(fixed), Some(key)) if key == fixed => Ok(fixed),
            (KeyPolicy::Fixed(fixed), other) => Err(CoreError::invalid_record(
                self.kind.name(),
                format!("key must be {fixed}, got {other:?}"),
            )),
            (KeyPolicy::Explicit, Some(key)) => Ok(key),
            (KeyPolicy::Explicit, None) => Err(CoreError::invalid_record(
                self.kind.name(),
                "record carries no timestamp key",
            )),
            (KeyPolicy::Sequential, Some(key)) => Ok(key),
            (KeyPolicy::Sequential, None) => match self.next_sequence {
                Some(next) if !self.records.contains_key(&RecordKey(next)) => Ok(RecordKey(next)),
                _ => Err(CoreError::invalid_record(
                    self.kind.name(),
                    "no free sequential id left",
                )),
            },
        }
    }

    /// Durably writes `payload` at `key`, replacing any previous record.
    ///
    /// The in-memory view changes only after the frame is on the medium. If
    /// the flush or sync fails the appended frame is cut off again.
    pub fn commit(&mut self, key: RecordKey, payload: Vec<u8>) -> CoreResult<()> {
        let frame = encode_frame(key, &payload)?;
        let offset = self.backend.append(&frame)?;

        let durable = if self.sync_on_commit {
            self.backend.sync()
        } else {
            self.backend.flush()
        };
        if let Err(err) = durable {
            if let Err(rollback) = self.backend.truncate(offset) {
                warn!(
                    collection = self.kind.name(),
                    error = %rollback,
                    "could not roll back uncommitted frame"
                );
            }
            return Err(err.into());
        }

        if matches!(self.kind.key_policy(), KeyPolicy::Sequential) {
            self.next_sequence = match key.as_u64().checked_add(1) {
                Some(after) => self.next_sequence.map(|next| next.max(after)),
                None => None,
            };
        }
        let replaced = self.records.insert(key, payload).is_some();
        debug!(
            collection = self.kind.name(),
            key = key.as_u64(),
            replaced,
            "committed record"
        );
        Ok(())
    }

    /// Returns the payload at `key`.
    pub fn get(&self, key: RecordKey) -> Option<&[u8]> {
        self.records.get(&key).map(Vec::as_slice)
    }

    /// Returns every record, sorted ascending by key.
    pub fn sorted_entries(&self) -> Vec<(RecordKey, &[u8])> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(key, payload)| (*key, payload.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
