//! Append-only journal of store mutations.
//!
//! Layout: a 5-byte header (magic + version) followed by frames of
//! `len: u32 | MessagePack(entry) | crc32: u32`, little endian. Replaying the
//! frames in order rebuilds the store.

use crate::error::{StoreError, StoreResult};
use crate::types::{Session, Signup, SignupId, SignupStatus};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic bytes for the journal file.
const JOURNAL_MAGIC: &[u8; 4] = b"RJN\0";

/// Current journal format version.
const JOURNAL_VERSION: u8 = 1;

const HEADER_SIZE: u64 = 5;

/// Frames larger than this are treated as corruption.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// One durable mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    SessionCreated(Session),
    SignupAppended(Signup),
    StatusChanged { id: SignupId, status: SignupStatus },
}

struct JournalFile {
    file: File,

    /// Offset just past the last complete frame.
    end: u64,

    writes_since_sync: u64,
}

/// Append-only journal file.
pub struct Journal {
    path: PathBuf,
    inner: Mutex<JournalFile>,

    /// fsync after this many appends (at least 1).
    sync_interval: u64,
}

impl Journal {
    /// Open or create a journal, returning it with the entries already on disk.
    ///
    /// A frame cut short at the end of the file (a write interrupted by a
    /// crash) is dropped and the file truncated to the last complete frame.
    /// A frame whose checksum does not match is an error.
    pub fn open(
        path: impl AsRef<Path>,
        sync_interval: u64,
    ) -> StoreResult<(Self, Vec<JournalEntry>)> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let size = file.metadata()?.len();
        let (entries, end) = if size == 0 {
            file.write_all(JOURNAL_MAGIC)?;
            file.write_all(&[JOURNAL_VERSION])?;
            file.sync_all()?;
            (Vec::new(), HEADER_SIZE)
        } else {
            Self::replay(&file, &path, size)?
        };

        if end < size {
            warn!(
                path = %path.display(),
                dropped_bytes = size - end,
                "truncating incomplete journal tail"
            );
            file.set_len(end)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(end))?;

        debug!(path = %path.display(), entries = entries.len(), "journal opened");

        Ok((
            Self {
                path,
                inner: Mutex::new(JournalFile {
                    file,
                    end,
                    writes_since_sync: 0,
                }),
                sync_interval: sync_interval.max(1),
            },
            entries,
        ))
    }

    /// Durably append an entry.
    ///
    /// On failure, including a failed fsync, the frame is cut off again so the
    /// journal ends on the previous complete frame.
    pub fn append(&self, entry: &JournalEntry) -> StoreResult<()> {
        let frame = Self::encode_frame(entry)?;

        let mut inner = self.inner.lock();
        let end = inner.end;
        if let Err(e) = inner.file.write_all(&frame) {
            Self::rollback(&mut inner, end);
            return Err(e.into());
        }

        if inner.writes_since_sync + 1 >= self.sync_interval {
            if let Err(e) = inner.file.sync_data() {
                Self::rollback(&mut inner, end);
                return Err(e.into());
            }
            inner.writes_since_sync = 0;
        } else {
            inner.writes_since_sync += 1;
        }

        inner.end = end + frame.len() as u64;
        Ok(())
    }

    fn rollback(inner: &mut JournalFile, end: u64) {
        if let Err(e) = inner
            .file
            .set_len(end)
            .and_then(|()| inner.file.seek(SeekFrom::Start(end)).map(|_| ()))
        {
            warn!(error = %e, offset = end, "failed to roll back journal append");
        }
    }

    /// Force pending writes to disk.
    pub fn sync(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.file.sync_all()?;
        inner.writes_since_sync = 0;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes of complete frames, header included.
    pub fn size(&self) -> u64 {
        self.inner.lock().end
    }

    fn encode_frame(entry: &JournalEntry) -> StoreResult<Vec<u8>> {
        let encoded = rmp_serde::to_vec(entry)?;
        if encoded.len() > MAX_FRAME_SIZE {
            return Err(StoreError::Serialization(format!(
                "journal entry of {} bytes exceeds frame limit",
                encoded.len()
            )));
        }

        let mut frame = Vec::with_capacity(encoded.len() + 8);
        frame.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        frame.extend_from_slice(&encoded);
        frame.extend_from_slice(&crc32fast::hash(&encoded).to_le_bytes());
        Ok(frame)
    }

    /// Read every complete frame, returning the entries and the offset after
    /// the last one.
    fn replay(file: &File, path: &Path, size: u64) -> StoreResult<(Vec<JournalEntry>, u64)> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != JOURNAL_MAGIC {
            return Err(StoreError::InvalidFormat(format!(
                "invalid journal magic in {}",
                path.display()
            )));
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != JOURNAL_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "unsupported journal version: {}",
                version[0]
            )));
        }

        let mut entries = Vec::new();
        let mut end = HEADER_SIZE;
        while end < size {
            match Self::read_frame(&mut reader) {
                Ok((entry, frame_len)) => {
                    entries.push(entry);
                    end += frame_len;
                }
                Err(StoreError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
        }

        Ok((entries, end))
    }

    fn read_frame(reader: &mut impl Read) -> StoreResult<(JournalEntry, u64)> {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > MAX_FRAME_SIZE {
            return Err(StoreError::Corruption("journal frame too large".into()));
        }

        let mut encoded = vec![0u8; len];
        reader.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        reader.read_exact(&mut checksum_bytes)?;
        let stored = u32::from_le_bytes(checksum_bytes);
        let computed = crc32fast::hash(&encoded);
        if stored != computed {
            return Err(StoreError::ChecksumMismatch {
                expected: stored,
                got: computed,
            });
        }

        let entry = rmp_serde::from_slice(&encoded)?;
        Ok((entry, len as u64 + 8))
    }
}
