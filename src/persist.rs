//! Persistence backends behind the store.
//!
//! A backend owns the record table and hands out ids. [`VecDB`](crate::VecDB)
//! wraps one in a lock and never touches records except through this trait.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryBackend`]: a `BTreeMap` keyed by id. Nothing survives the process.
//! - [`FileBackend`]: the same table, mirrored by an append-only log of
//!   bincode-encoded entries. Every mutation is written and synced to the log
//!   before it is applied in memory, and the log is replayed on open.

use crate::error::{DbError, Result};
use crate::record::VectorRecord;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Seek, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

pub trait Persistence: Send + Sync {
    /// Hands out a fresh id. An id is never handed out twice, even after the
    /// record holding it is deleted.
    fn allocate_id(&mut self) -> Result<u64>;

    /// Stores `record`, replacing any record with the same id.
    fn put(&mut self, record: &VectorRecord) -> Result<()>;

    fn get(&self, id: u64) -> Result<Option<VectorRecord>>;

    /// Removes the record, returning whether one was present.
    fn delete(&mut self, id: u64) -> Result<bool>;

    /// Every live record, in ascending id order.
    fn scan_all(&self) -> Result<Vec<VectorRecord>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reclaims space held by overwritten or deleted records.
    fn compact(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory record table.
#[derive(Debug)]
pub struct MemoryBackend {
    records: BTreeMap<u64, VectorRecord>,
    next_id: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend { records: BTreeMap::new(), next_id: 1 }
    }

    fn apply(&mut self, entry: LogEntry) {
        match entry {
            LogEntry::Put(record) => {
                self.next_id = self.next_id.max(record.id.saturating_add(1));
                self.records.insert(record.id, record);
            }
            LogEntry::Delete(id) => {
                self.records.remove(&id);
            }
            LogEntry::Watermark(next_id) => {
                self.next_id = self.next_id.max(next_id);
            }
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Persistence for MemoryBackend {
    fn allocate_id(&mut self) -> Result<u64> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| DbError::Persistence("id space exhausted".to_string()))?;
        Ok(id)
    }

    fn put(&mut self, record: &VectorRecord) -> Result<()> {
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    fn get(&self, id: u64) -> Result<Option<VectorRecord>> {
        Ok(self.records.get(&id).cloned())
    }

    fn delete(&mut self, id: u64) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    fn scan_all(&self) -> Result<Vec<VectorRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// One entry of the on-disk log, as read back during replay.
#[derive(Deserialize)]
enum LogEntry {
    Put(VectorRecord),
    Delete(u64),
    /// Lower bound for the next id. Written by compaction so that ids of
    /// records it drops stay retired.
    Watermark(u64),
}

/// Borrowing twin of [`LogEntry`] used for writing. Variant order must match.
#[derive(Serialize)]
enum LogEntryRef<'a> {
    Put(&'a VectorRecord),
    Delete(u64),
    Watermark(u64),
}

/// Record table backed by an append-only log file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: File,
    /// Length of the log up to the last fully written entry.
    len: u64,
    /// Set once the log on disk can no longer be trusted to match `table`.
    /// Every later write is refused.
    poisoned: bool,
    table: MemoryBackend,
}

impl FileBackend {
    /// Opens the log at `path`, creating it if missing, and replays it.
    ///
    /// A torn entry at the tail (left by a crash mid-write) is cut off.
    /// Anything else that fails to decode is reported as a persistence failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| DbError::Persistence(format!("Fail to open '{}': {}", path.display(), e)))?;

        let mut table = MemoryBackend::new();
        let len = replay(&file, &mut table)?;

        let on_disk = file.metadata()?.len();
        if len < on_disk {
            warn!(path = %path.display(), kept = len, dropped = on_disk - len, "truncating torn log tail");
            file.set_len(len)?;
        }

        info!(path = %path.display(), records = table.len(), "opened vector log");
        Ok(FileBackend { path, file, len, poisoned: false, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.poisoned {
            return Err(DbError::Persistence(format!(
                "Log '{}' is in an unknown state after an earlier failure; reopen it",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn append(&mut self, entry: &LogEntryRef<'_>) -> Result<()> {
        self.ensure_writable()?;
        let bytes = bincode::serialize(entry)?;

        if let Err(err) = write_synced(&mut self.file, &bytes) {
            // Drop whatever part of the entry made it to disk
            if let Err(trunc) = self.file.set_len(self.len) {
                warn!(path = %self.path.display(), error = %trunc, "fail to truncate partial log entry");
                self.poisoned = true;
            }
            return Err(DbError::Persistence(format!(
                "Fail to append to '{}': {}",
                self.path.display(),
                err
            )));
        }

        self.len += bytes.len() as u64;
        Ok(())
    }

    fn write_compacted(&self, tmp_path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(tmp_path)?);

        bincode::serialize_into(&mut writer, &LogEntryRef::Watermark(self.table.next_id))?;
        for record in self.table.records.values() {
            bincode::serialize_into(&mut writer, &LogEntryRef::Put(record))?;
        }

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

impl Persistence for FileBackend {
    fn allocate_id(&mut self) -> Result<u64> {
        self.table.allocate_id()
    }

    fn put(&mut self, record: &VectorRecord) -> Result<()> {
        self.append(&LogEntryRef::Put(record))?;
        self.table.put(record)
    }

    fn get(&self, id: u64) -> Result<Option<VectorRecord>> {
        self.table.get(id)
    }

    fn delete(&mut self, id: u64) -> Result<bool> {
        if !self.table.records.contains_key(&id) {
            return Ok(false);
        }

        self.append(&LogEntryRef::Delete(id))?;
        self.table.delete(id)
    }

    fn scan_all(&self) -> Result<Vec<VectorRecord>> {
        self.table.scan_all()
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    /// Rewrites the log as a watermark followed by one entry per live record,
    /// then swaps it in with a rename.
    fn compact(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let tmp_path = self.path.with_extension("compact");

        // Opened before the rename; the handle follows the file to its new name
        let opened = self.write_compacted(&tmp_path).and_then(|()| {
            let file = OpenOptions::new().read(true).append(true).open(&tmp_path)?;
            let len = file.metadata()?.len();
            Ok((file, len))
        });
        let (file, compacted_len) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(err);
            }
        };
        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        self.file = file;
        let before = self.len;
        self.len = compacted_len;

        debug!(path = %self.path.display(), before, after = self.len, "compacted vector log");
        Ok(())
    }
}

fn write_synced(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.sync_data()
}

/// Applies every complete entry of the log to `table` and returns the byte
/// length those entries occupy.
fn replay(file: &File, table: &mut MemoryBackend) -> Result<u64> {
    let total = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut good = 0;

    while good < total {
        match bincode::deserialize_from::<_, LogEntry>(&mut reader) {
            Ok(entry) => {
                table.apply(entry);
                good = reader.stream_position()?;
            }
            Err(err) => match *err {
                bincode::ErrorKind::Io(ref io) if io.kind() == ErrorKind::UnexpectedEof => break,
                _ => return Err(DbError::Persistence(format!("Corrupt log entry at byte {}: {}", good, err))),
            },
        }
    }

    Ok(good)
}
