use licgate_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the hook configuration file.
///
/// Priority:
/// 1. `--config` flag / `LICGATE_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `licgate.yaml`
/// 3. Fall back to the system-wide config
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, paths::CONFIG_FILE).unwrap_or_else(|| PathBuf::from(paths::SYSTEM_CONFIG))
}

fn find_upward(start: &Path, name: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}
