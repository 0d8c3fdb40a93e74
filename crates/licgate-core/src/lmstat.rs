//! FlexLM availability via `lmutil lmstat`.
//!
//! Each query runs
//! `<lmutil> lmstat -c <server> -f <feature> -S <vendor>` and reads the
//! summary line
//! `Users of <feature>:  (Total of <issued> licenses issued;  Total of <used> licenses in use)`.
//!
//! The subprocess is bounded by a timeout: stdout/stderr are drained on
//! dedicated threads (no pipe-buffer deadlock), a waiter thread reports
//! exit, and all three report through one `mpsc` channel read with
//! `recv_timeout` against a single deadline.

use crate::error::{GateError, Result};
use crate::oracle::{AvailabilityQuote, LicenseOracle, OracleSource};
use regex::Regex;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cap on captured stderr carried into error messages.
const MAX_DIAGNOSTIC: usize = 2 * 1024;

// ---------------------------------------------------------------------------
// Lmstat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Lmstat {
    tool: PathBuf,
    vendor: String,
    timeout: Duration,
}

impl Lmstat {
    pub fn new(tool: impl Into<PathBuf>, vendor: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tool: tool.into(),
            vendor: vendor.into(),
            timeout,
        }
    }

    pub fn query(&self, server: &str, feature: &str) -> Result<AvailabilityQuote> {
        let mut cmd = Command::new(&self.tool);
        cmd.args(["lmstat", "-c", server, "-f", feature, "-S", &self.vendor]);

        let start = Instant::now();
        let output = run_with_timeout(cmd, self.timeout).map_err(|e| match e {
            RunError::Spawn(e) => GateError::query(
                feature,
                format!("failed to run {}: {e}", self.tool.display()),
            ),
            RunError::TimedOut => GateError::query(
                feature,
                format!(
                    "no answer from license server {server} within {}s",
                    self.timeout.as_secs()
                ),
            ),
        })?;
        debug!(
            feature,
            server,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "lmstat finished"
        );

        if !output.status.success() {
            return Err(GateError::query(
                feature,
                format!(
                    "lmstat exited with {}: {}",
                    output.status,
                    tail(output.stderr.trim(), MAX_DIAGNOSTIC)
                ),
            ));
        }

        parse_lmstat(&output.stdout, feature)
    }
}

impl OracleSource for Lmstat {
    fn connect<'a>(&'a self, server: &str) -> Result<Box<dyn LicenseOracle + 'a>> {
        Ok(Box::new(LmstatOracle {
            lmstat: self,
            server: server.to_string(),
        }))
    }
}

struct LmstatOracle<'a> {
    lmstat: &'a Lmstat,
    server: String,
}

impl LicenseOracle for LmstatOracle<'_> {
    fn query(&self, feature: &str) -> Result<AvailabilityQuote> {
        self.lmstat.query(&self.server, feature)
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// Extract issued/used counts for `feature` from `lmstat` output.
pub fn parse_lmstat(output: &str, feature: &str) -> Result<AvailabilityQuote> {
    let pattern = format!(
        r"Users of {}:  \(Total of (\d+) licenses? issued;  Total of (\d+) licenses? in use\)",
        regex::escape(feature)
    );
    let re = Regex::new(&pattern)
        .map_err(|e| GateError::query(feature, format!("invalid feature pattern: {e}")))?;

    let caps = re
        .captures(output)
        .ok_or_else(|| GateError::query(feature, "license feature is not found in lmstat output"))?;

    let count = |i: usize| -> Result<u32> {
        caps[i]
            .parse()
            .map_err(|_| GateError::query(feature, format!("count out of range: {}", &caps[i])))
    };
    Ok(AvailabilityQuote::new(count(1)?, count(2)?))
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

// ---------------------------------------------------------------------------
// Bounded subprocess
// ---------------------------------------------------------------------------

struct CapturedOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

enum RunError {
    Spawn(std::io::Error),
    TimedOut,
}

enum Event {
    Stdout(String),
    Stderr(String),
    Exited(std::io::Result<ExitStatus>),
}

/// Run `cmd` to completion, including EOF on both output pipes, within
/// `timeout`. The child leads its own process group so that anything it
/// forks is killed with it.
fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> std::result::Result<CapturedOutput, RunError> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let deadline = Instant::now() + timeout;
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(RunError::Spawn)?;

    let child_pid = child.id();

    let (tx, rx) = mpsc::channel();
    let stdout_handle = child.stdout.take();
    let stdout_tx = tx.clone();
    std::thread::spawn(move || {
        let _ = stdout_tx.send(Event::Stdout(read_all(stdout_handle)));
    });
    let stderr_handle = child.stderr.take();
    let stderr_tx = tx.clone();
    std::thread::spawn(move || {
        let _ = stderr_tx.send(Event::Stderr(read_all(stderr_handle)));
    });
    std::thread::spawn(move || {
        let _ = tx.send(Event::Exited(child.wait()));
    });

    let mut status = None;
    let mut stdout = None;
    let mut stderr = None;
    while status.is_none() || stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Event::Stdout(out)) => stdout = Some(out),
            Ok(Event::Stderr(err)) => stderr = Some(err),
            Ok(Event::Exited(Ok(s))) => status = Some(s),
            Ok(Event::Exited(Err(e))) => {
                kill_process_group(child_pid);
                return Err(RunError::Spawn(e));
            }
            Err(_) => {
                // A forked descendant may still hold the pipes open after
                // the tool itself exited; the group kill closes them.
                kill_process_group(child_pid);
                return Err(RunError::TimedOut);
            }
        }
    }

    Ok(CapturedOutput {
        status: status.unwrap_or_default(),
        stdout: stdout.unwrap_or_default(),
        stderr: stderr.unwrap_or_default(),
    })
}

fn read_all<R: Read>(handle: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut r) = handle {
        let _ = r.read_to_string(&mut buf);
    }
    buf
}

/// SIGKILL the process group led by `pid`. Best-effort.
fn kill_process_group(pid: u32) {
    let target = if cfg!(unix) {
        format!("-{pid}")
    } else {
        pid.to_string()
    };
    let _ = Command::new("kill")
        .args(["-9", "--", target.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
