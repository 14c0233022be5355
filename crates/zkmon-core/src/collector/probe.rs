//! Runs the external probe (usually `nc`) as a child process.
//!
//! The probe is invoked as `<executable> <host> <port>` with the command
//! written to its stdin. Stdout is the response; stderr is only logged.
//! Any failure (missing binary, nonzero exit, timeout, cancellation) turns
//! into an empty response so one failed command never aborts a cycle.

use std::env;
use std::ffi::OsStr;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::traits::ProbeExecutor;

/// Default upper bound for one probe invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a running child or its pipes are checked for timeout and
/// cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Why a probe invocation produced no output.
#[derive(Debug)]
pub enum ProbeError {
    /// The executable could not be started.
    Spawn(io::Error),
    /// Waiting for or reading from the child failed.
    Io(io::Error),
    /// The probe exited unsuccessfully.
    Exit(ExitStatus),
    /// The probe did not finish in time and was killed.
    Timeout(Duration),
    /// Collection was cancelled while the probe was running.
    Cancelled,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Spawn(e) => write!(f, "failed to start: {}", e),
            ProbeError::Io(e) => write!(f, "I/O error: {}", e),
            ProbeError::Exit(status) => write!(f, "{}", status),
            ProbeError::Timeout(d) => write!(f, "timed out after {:?}", d),
            ProbeError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Probe backed by a real executable on the host.
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    executable: String,
    timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProbeRunner {
    /// Creates a runner for `executable` with [`DEFAULT_TIMEOUT`].
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into().trim().to_string(),
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }

    /// Sets the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares a cancellation flag; once it is `true`, in-flight probes are
    /// killed and new ones are not started.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Resolves the executable and logs the outcome.
    pub fn check_executable(&self) -> Option<PathBuf> {
        let found = find_executable(&self.executable);
        match &found {
            Some(path) => debug!(
                "{} executable is in '{}'",
                self.executable,
                path.display()
            ),
            None => error!("{} executable not found in PATH", self.executable),
        }
        found
    }

    /// Runs one command, reporting why it failed instead of hiding it.
    pub fn try_run(&self, command: &str, host: &str, port: u16) -> Result<String, ProbeError> {
        if self.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        let deadline = Instant::now() + self.timeout;
        let mut child = Command::new(&self.executable)
            .arg(host.trim())
            .arg(port.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ProbeError::Spawn)?;

        // Readers must start before the write so a chatty probe cannot
        // block on a full pipe while we block on its stdin.
        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(Stream::Stdout, stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(Stream::Stderr, stderr, tx.clone());
        }
        drop(tx);

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(command.as_bytes())
        {
            debug!("Failed to write '{}' to probe stdin: {}", command, e);
        }

        let status = self.wait(&mut child, deadline)?;
        let (out, err_out) = self.collect_output(&rx, deadline)?;

        if !err_out.is_empty() {
            debug!(
                "Errors running command:\n{}",
                String::from_utf8_lossy(&err_out)
            );
        }

        if !status.success() {
            return Err(ProbeError::Exit(status));
        }

        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn wait(&self, child: &mut Child, deadline: Instant) -> Result<ExitStatus, ProbeError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if self.is_cancelled() {
                        kill(child);
                        return Err(ProbeError::Cancelled);
                    }
                    if Instant::now() >= deadline {
                        kill(child);
                        return Err(ProbeError::Timeout(self.timeout));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    kill(child);
                    return Err(ProbeError::Io(e));
                }
            }
        }
    }

    /// Gathers both pipes once the child has exited.
    ///
    /// A background process started by the probe can keep a pipe open after
    /// the child itself is gone, so this shares the child's deadline and
    /// cancel flag. Readers still blocked at that point are left detached.
    fn collect_output(
        &self,
        rx: &Receiver<(Stream, io::Result<Vec<u8>>)>,
        deadline: Instant,
    ) -> Result<(Vec<u8>, Vec<u8>), ProbeError> {
        let mut out = Vec::new();
        let mut err_out = Vec::new();
        loop {
            if self.is_cancelled() {
                return Err(ProbeError::Cancelled);
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return Err(ProbeError::Timeout(self.timeout));
            }
            match rx.recv_timeout(left.min(POLL_INTERVAL)) {
                Ok((Stream::Stdout, read)) => out = read.map_err(ProbeError::Io)?,
                Ok((Stream::Stderr, read)) => err_out = read.map_err(ProbeError::Io)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok((out, err_out)),
            }
        }
    }
}

impl ProbeExecutor for ProbeRunner {
    fn run(&self, command: &str, host: &str, port: u16) -> String {
        match self.try_run(command, host, port) {
            Ok(out) => out,
            Err(ProbeError::Cancelled) => {
                warn!("{} command '{}' cancelled", self.executable, command);
                String::new()
            }
            Err(e) => {
                error!("{} command failed with {}", self.executable, e);
                String::new()
            }
        }
    }

    fn check(&self) {
        self.check_executable();
    }
}

/// Kills and reaps a child. Errors are ignored: the child may already be gone.
fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: Stream,
    mut reader: R,
    tx: Sender<(Stream, io::Result<Vec<u8>>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let read = reader.read_to_end(&mut buf).map(|_| buf);
        // The receiver is gone once the run has timed out.
        let _ = tx.send((stream, read));
    });
}

/// Locates `name` the way a shell would: as a path when it contains a
/// separator, otherwise by searching `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    find_executable_in(name, &path_var)
}

/// Same as [`find_executable`] with an explicit search path.
pub fn find_executable_in(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
