//! JSONL journal repository: append-only persistence of setup and signal records.
//!
//! Every accepted write appends the full record as one JSON object per line.
//! Opening a journal replays it from the top; the last record per id wins.
//! A torn final line is skipped with a warning on replay.
//!
//! An open repository holds an exclusive lock on `<journal>.lock` until it is
//! dropped, so at most one process writes a journal at a time. Superseded
//! records are compacted away on open.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wickscan_core::domain::{ActiveSetup, Signal, Timeframe};

use crate::memory::{lock, RepositoryState};
use crate::repository::{InsertOutcome, RepositoryError, SetupRepository};

/// One journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalRecord {
    Setup(ActiveSetup),
    Signal(Signal),
}

/// Repository backed by a JSONL file.
///
/// Writes are checked against the in-memory replay, appended and flushed,
/// and only then applied in memory. A failed append leaves both untouched.
pub struct JournalRepository {
    path: PathBuf,
    state: Mutex<RepositoryState>,
    _lock: File,
}

impl JournalRepository {
    /// Open (or create on first write) the journal at `path` and replay it.
    ///
    /// Fails with [`RepositoryError::Locked`] while another repository holds
    /// the same journal. When the file carries superseded or unreadable lines
    /// it is rewritten to one record per id; otherwise a torn final line is
    /// terminated so later appends start on a fresh line.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let lock = acquire_lock(&path)?;
        let mut state = RepositoryState::default();
        let mut replayed = 0usize;

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
            let mut lines = 0usize;
            for (n, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                lines += 1;
                match serde_json::from_str::<JournalRecord>(line) {
                    Ok(JournalRecord::Setup(setup)) => state.put_setup(setup),
                    Ok(JournalRecord::Signal(signal)) => state.put_signal(signal),
                    Err(e) => {
                        warn!(path = %path.display(), line = n + 1, error = %e, "skipping malformed journal line");
                        continue;
                    }
                }
                replayed += 1;
            }

            let live = snapshot(&state);
            if lines > live.len() {
                compact(&path, &live)?;
                info!(path = %path.display(), lines, records = live.len(), "journal compacted");
            } else if !content.is_empty() && !content.ends_with('\n') {
                let mut file = OpenOptions::new()
                    .append(true)
                    .open(&path)
                    .map_err(|source| io_error(&path, source))?;
                writeln!(file).map_err(|source| io_error(&path, source))?;
            }
        }

        debug!(path = %path.display(), records = replayed, "journal replayed");
        Ok(Self {
            path,
            state: Mutex::new(state),
            _lock: lock,
        })
    }

    /// Current file size in bytes (0 before the first write).
    pub fn file_size_bytes(&self) -> Result<u64, RepositoryError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    fn append(&self, record: &JournalRecord) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(record)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| io_error(&self.path, source))?;
        writeln!(file, "{json}").map_err(|source| io_error(&self.path, source))?;
        file.flush().map_err(|source| io_error(&self.path, source))?;
        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn acquire_lock(path: &Path) -> Result<File, RepositoryError> {
    let lock_path = sibling(path, ".lock");
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|source| io_error(&lock_path, source))?;
    match file.try_lock_exclusive() {
        Ok(true) => Ok(file),
        Ok(false) => Err(RepositoryError::Locked {
            path: path.display().to_string(),
        }),
        Err(source) => Err(io_error(&lock_path, source)),
    }
}

/// The latest record per id, setups first.
fn snapshot(state: &RepositoryState) -> Vec<JournalRecord> {
    state
        .setups()
        .into_iter()
        .map(JournalRecord::Setup)
        .chain(state.signals().into_iter().map(JournalRecord::Signal))
        .collect()
}

/// Rewrite the journal to `records` through a temporary file and a rename.
fn compact(path: &Path, records: &[JournalRecord]) -> Result<(), RepositoryError> {
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, body).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl SetupRepository for JournalRepository {
    fn insert_setup(&self, setup: ActiveSetup) -> Result<InsertOutcome, RepositoryError> {
        let mut state = lock(&self.state);
        if let Some(existing) = state.check_insert_setup(&setup)? {
            return Ok(InsertOutcome::Duplicate { existing });
        }
        self.append(&JournalRecord::Setup(setup.clone()))?;
        let id = setup.id.clone();
        state.put_setup(setup);
        Ok(InsertOutcome::Created { id })
    }

    fn waiting_setups(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<ActiveSetup>, RepositoryError> {
        Ok(lock(&self.state).waiting_setups(pair, timeframe))
    }

    fn update_setup(&self, previous: &ActiveSetup, next: &ActiveSetup) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.check_update_setup(previous, next)?;
        self.append(&JournalRecord::Setup(next.clone()))?;
        state.put_setup(next.clone());
        Ok(())
    }

    fn insert_signal(&self, signal: Signal) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.check_insert_signal(&signal)?;
        self.append(&JournalRecord::Signal(signal.clone()))?;
        state.put_signal(signal);
        Ok(())
    }

    fn triggered_without_signal(
        &self,
        pair: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<ActiveSetup>, RepositoryError> {
        Ok(lock(&self.state).triggered_without_signal(pair, timeframe))
    }

    fn open_signals(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Signal>, RepositoryError> {
        Ok(lock(&self.state).open_signals(pair, timeframe))
    }

    fn update_signal(&self, previous: &Signal, next: &Signal) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.check_update_signal(previous, next)?;
        self.append(&JournalRecord::Signal(next.clone()))?;
        state.put_signal(next.clone());
        Ok(())
    }

    fn setups(&self) -> Result<Vec<ActiveSetup>, RepositoryError> {
        Ok(lock(&self.state).setups())
    }

    fn signals(&self) -> Result<Vec<Signal>, RepositoryError> {
        Ok(lock(&self.state).signals())
    }
}
