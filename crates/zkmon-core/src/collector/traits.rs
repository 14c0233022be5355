//! Abstraction over the external probe so collectors can be tested.
//!
//! The `ProbeExecutor` trait lets the collector talk to a real probe
//! process ([`ProbeRunner`](super::ProbeRunner)) or to an in-memory
//! [`MockProbe`](super::MockProbe).

/// Sends one four-letter-word command to a server and returns its answer.
pub trait ProbeExecutor: Send + Sync {
    /// Runs `command` against `host:port` and returns the raw response.
    ///
    /// Failures are not surfaced: an unreachable server, a missing probe or
    /// a timeout all yield an empty string.
    fn run(&self, command: &str, host: &str, port: u16) -> String;

    /// Verifies the probe is usable before the first command.
    ///
    /// Only reports problems; never aborts collection.
    fn check(&self) {}
}

impl<P: ProbeExecutor + ?Sized> ProbeExecutor for &P {
    fn run(&self, command: &str, host: &str, port: u16) -> String {
        (**self).run(command, host, port)
    }

    fn check(&self) {
        (**self).check()
    }
}
