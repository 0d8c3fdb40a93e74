//! Rate limiting of license-server checks.
//!
//! A single timestamp, shared by every evaluation on the host, records the
//! last successful check. Evaluations take an exclusive advisory lock on a
//! sidecar file for the whole read-check-write sequence so two concurrent
//! evaluations cannot both see the interval as elapsed.

use crate::decision::Decision;
use crate::error::Result;
use crate::io;
use crate::paths;
use chrono::{DateTime, Duration, Utc};
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

// ---------------------------------------------------------------------------
// ThrottleState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleState {
    pub last_check: Option<DateTime<Utc>>,
}

impl ThrottleState {
    pub fn at(last_check: DateTime<Utc>) -> Self {
        Self {
            last_check: Some(last_check),
        }
    }

    /// Earliest instant the next check may run, if one is pending.
    pub fn next_allowed(&self, now: DateTime<Utc>, interval: Duration) -> Option<DateTime<Utc>> {
        // A stamp from the future (clock skew between hosts) is capped at
        // `now` so it can delay checks by at most one interval.
        let last = self.last_check?.min(now);
        let next = last + interval;
        (next > now).then_some(next)
    }
}

/// Defer when the last successful check is less than `interval` ago.
pub fn check(state: &ThrottleState, now: DateTime<Utc>, interval: Duration) -> Option<Decision> {
    let next = state.next_allowed(now, interval)?;
    Some(Decision::defer(
        next,
        "too little time has passed since the last license check",
    ))
}

/// Read the persisted state without locking. A missing file means no check
/// has succeeded yet. Content that is not an RFC 3339 instant (such as an
/// old marker file) falls back to the file's modification time.
pub fn read_state(path: &Path) -> Result<ThrottleState> {
    let Some(content) = io::read_optional(path)? else {
        return Ok(ThrottleState::default());
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(content.trim()) {
        return Ok(ThrottleState::at(ts.with_timezone(&Utc)));
    }
    warn!(
        path = %path.display(),
        "throttle state is not a timestamp, using file modification time"
    );
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(ThrottleState::at(DateTime::<Utc>::from(modified)))
}

// ---------------------------------------------------------------------------
// ThrottleStore
// ---------------------------------------------------------------------------

pub struct ThrottleStore {
    path: PathBuf,
    lock: RwLock<File>,
}

impl ThrottleStore {
    /// Open the store for `path`, creating the sidecar lock file if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let lock_path = paths::throttle_lock_path(path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive lock without blocking. `None` means another
    /// evaluation holds it and is checking licenses right now.
    pub fn try_lock(&mut self) -> Result<Option<ThrottleLease<'_>>> {
        match self.lock.try_write() {
            Ok(guard) => Ok(Some(ThrottleLease {
                _guard: guard,
                path: &self.path,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Exclusive access to the throttle state, released on drop.
pub struct ThrottleLease<'a> {
    _guard: RwLockWriteGuard<'a, File>,
    path: &'a Path,
}

impl ThrottleLease<'_> {
    pub fn load(&self) -> Result<ThrottleState> {
        read_state(self.path)
    }

    /// Overwrite the state with `now` as the last successful check.
    pub fn record(&self, now: DateTime<Utc>) -> Result<()> {
        io::atomic_write(self.path, now.to_rfc3339().as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
