use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;

/// Identifier of a session log. Assigned in creation order, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A session log opened for reading, with its length at open time.
///
/// Readers stop at `len` even if the log grows afterwards.
#[derive(Debug)]
pub struct SessionLog {
    pub file: File,
    pub len: u64,
}

/// File-backed session logs, one file per identifier under a root directory.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    next_id: u64,
}

impl SessionStore {
    /// Opens (creating if needed) the session directory.
    ///
    /// Numbering resumes after the largest numeric log name already present,
    /// so identifiers stay unique across restarts.
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create session directory {}", root.display()))?;

        let mut last = 0;
        let entries = fs::read_dir(&root)
            .with_context(|| format!("failed to scan session directory {}", root.display()))?;
        for entry in entries {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse::<u64>().ok()) {
                last = last.max(id);
            }
        }

        let next_id = last.checked_add(1).with_context(|| {
            format!("session identifiers exhausted in {}", root.display())
        })?;

        tracing::debug!(dir = %root.display(), last_session = last, "Session store opened");

        Ok(Self { root, next_id })
    }

    /// Location of a session's log.
    pub fn path_of(&self, id: SessionId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// True for identifiers this store (or an earlier run over the same
    /// directory) has handed out.
    pub fn is_issued(&self, id: SessionId) -> bool {
        id.0 >= 1 && id.0 < self.next_id
    }

    /// Allocates the next identifier and creates its empty log.
    pub fn create(&mut self) -> anyhow::Result<SessionId> {
        loop {
            let id = SessionId(self.next_id);
            self.next_id = self
                .next_id
                .checked_add(1)
                .context("session identifiers exhausted")?;

            let path = self.path_of(id);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    tracing::info!(session = %id, "Session created");
                    return Ok(id);
                }
                // Left behind by someone else; skip rather than share it.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to create session log {}", path.display()));
                }
            }
        }
    }

    /// Appends bytes to a session's log.
    ///
    /// A missing log is recreated, but only for identifiers already issued;
    /// a cookie can never claim a number ahead of the counter.
    pub fn append(&mut self, id: SessionId, bytes: &[u8]) -> anyhow::Result<()> {
        if !self.is_issued(id) {
            anyhow::bail!("session {} was never issued", id);
        }

        let path = self.path_of(id);
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("failed to open session log {}", path.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("failed to append to session log {}", path.display()))?;

        tracing::debug!(session = %id, bytes = bytes.len(), "Appended to session");
        Ok(())
    }

    /// Opens a session's log for reading. `Ok(None)` means it does not exist.
    pub fn read(&self, id: SessionId) -> anyhow::Result<Option<SessionLog>> {
        let path = self.path_of(id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to open session log {}", path.display()));
            }
        };
        let len = file
            .metadata()
            .with_context(|| format!("failed to stat session log {}", path.display()))?
            .len();

        Ok(Some(SessionLog { file, len }))
    }
}
