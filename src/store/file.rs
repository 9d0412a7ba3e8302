//! Durable store backed by a journal on disk.

use super::journal::{Journal, JournalEntry};
use super::tables::Tables;
use super::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::types::{
    Session, SessionId, SessionInput, Signup, SignupId, SignupInput, SignupStatus,
};
use fs2::FileExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Magic bytes for the store manifest.
const STORE_MAGIC: &[u8; 4] = b"RST\0";

/// Current store format version.
const STORE_VERSION: u8 = 1;

const JOURNAL_FILE: &str = "roster.journal";

/// File store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the store.
    pub path: PathBuf,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// fsync the journal every N writes. 0 and 1 both mean every write.
    pub sync_interval: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./roster-data"),
            create_if_missing: true,
            sync_interval: 1,
        }
    }
}

/// Record store persisted to a directory.
///
/// Every mutation is appended to the journal before the in-memory tables
/// change. Reads are served from memory.
pub struct FileStore {
    config: StoreConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    journal: Journal,
    tables: RwLock<Tables>,
}

impl FileStore {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: StoreConfig) -> StoreResult<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new, empty store.
    pub fn create(config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.path)?;
        let lock_file = Self::acquire_lock(&config.path)?;
        Self::write_manifest(&config.path)?;

        let (journal, _) = Journal::open(config.path.join(JOURNAL_FILE), config.sync_interval)?;

        info!(path = %config.path.display(), "created roster store");

        Ok(Self {
            config,
            _lock_file: lock_file,
            journal,
            tables: RwLock::new(Tables::new()),
        })
    }

    /// Open an existing store and replay its journal.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        Self::verify_manifest(&config.path)?;
        let lock_file = Self::acquire_lock(&config.path)?;

        let (journal, entries) =
            Journal::open(config.path.join(JOURNAL_FILE), config.sync_interval)?;

        let mut tables = Tables::new();
        let replayed = entries.len();
        for entry in entries {
            tables.apply(entry)?;
        }

        info!(path = %config.path.display(), replayed, "opened roster store");

        Ok(Self {
            config,
            _lock_file: lock_file,
            journal,
            tables: RwLock::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Force pending journal writes to disk.
    pub fn sync(&self) -> StoreResult<()> {
        self.journal.sync()
    }

    /// Journal first, then memory, all under the table lock so readers never
    /// see a write that isn't durable.
    fn commit(&self, tables: &mut Tables, entry: JournalEntry) -> StoreResult<()> {
        self.journal.append(&entry)?;
        tables.apply(entry)
    }

    fn write_manifest(path: &Path) -> StoreResult<()> {
        use std::io::Write;

        let mut file = File::create(path.join("MANIFEST"))?;
        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> StoreResult<()> {
        use std::io::Read;

        let mut file = File::open(path.join("MANIFEST"))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> StoreResult<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl RecordStore for FileStore {
    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        Ok(self.tables.read().sessions())
    }

    fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self.tables.read().session(id))
    }

    fn create_session(&self, input: SessionInput) -> StoreResult<SessionId> {
        let mut tables = self.tables.write();
        let session = tables.prepare_session(input);
        let id = session.id;
        self.commit(&mut tables, JournalEntry::SessionCreated(session))?;
        Ok(id)
    }

    fn list_active_signups(&self, session_id: SessionId) -> StoreResult<Vec<Signup>> {
        Ok(self.tables.read().active_signups(session_id))
    }

    fn get_signup(&self, id: SignupId) -> StoreResult<Option<Signup>> {
        Ok(self.tables.read().signup(id))
    }

    fn append_signup(&self, input: SignupInput) -> StoreResult<SignupId> {
        let mut tables = self.tables.write();
        let signup = tables.prepare_signup(input)?;
        let id = signup.id;
        self.commit(&mut tables, JournalEntry::SignupAppended(signup))?;
        Ok(id)
    }

    fn set_signup_status(&self, id: SignupId, status: SignupStatus) -> StoreResult<()> {
        let mut tables = self.tables.write();
        match tables.prepare_status(id, status)? {
            Some(entry) => self.commit(&mut tables, entry),
            None => Ok(()),
        }
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort sync on drop
        let _ = self.sync();
    }
}
