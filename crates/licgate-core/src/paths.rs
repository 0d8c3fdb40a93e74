use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Project-local config file, found by walking up from the working directory.
pub const CONFIG_FILE: &str = "licgate.yaml";

/// System-wide config used when nothing closer is found.
pub const SYSTEM_CONFIG: &str = "/etc/licgate/config.yaml";

/// Default throttle state file name, created under the temp directory.
pub const THROTTLE_STATE_FILE: &str = "licgate-last-check";

const LOCK_SUFFIX: &str = "lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn default_throttle_state_path() -> PathBuf {
    std::env::temp_dir().join(THROTTLE_STATE_FILE)
}

/// Sidecar lock file guarding a throttle state file. The state itself is
/// replaced by rename on every update, so it cannot carry the lock.
pub fn throttle_lock_path(state: &Path) -> PathBuf {
    let mut name = state
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| THROTTLE_STATE_FILE.into());
    name.push(".");
    name.push(LOCK_SUFFIX);
    state.with_file_name(name)
}
