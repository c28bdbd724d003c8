//! Simulated-clock substitution for host processes.
//!
//! A process that should perceive simulated time injects a
//! [`ClockSource`] at startup and routes its wall-clock and monotonic
//! queries through it. [`SimClock`] is the source backed by the time
//! virtualization service. Redirecting an *uncooperative* process's
//! libc time calls additionally requires an OS-level preloading or
//! syscall-interposition facility (e.g. an `LD_PRELOAD` wrapper built
//! on this client), which sits outside the portable design.

use std::io::Read;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::BridgeError;
use crate::timesvc::default_socket_path;
use crate::types::SimTime;
use crate::wire::SIM_TIME_LEN;

/// Process-wide pluggable clock.
///
/// Failures propagate to the caller unchanged: falling back to real
/// time would silently desynchronize the simulated and real clocks.
pub trait ClockSource: Send + Sync {
    /// Wall-clock reading as seconds + microseconds.
    fn wall_clock(&self) -> Result<SimTime, BridgeError>;

    /// Monotonic reading derived from the same source.
    fn monotonic(&self) -> Result<Duration, BridgeError>;
}

/// Clock backed by the time virtualization service.
///
/// Every query performs a full connect/read/close cycle over the local
/// socket; there is no connection caching. Safe to call from multiple
/// threads, since each call owns its own connection.
#[derive(Debug, Clone)]
pub struct SimClock {
    path: PathBuf,
}

impl SimClock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the well-known endpoint under the user's home directory.
    pub fn from_home() -> Result<Self, BridgeError> {
        Ok(Self::new(default_socket_path()?))
    }

    fn query(&self) -> Result<SimTime, BridgeError> {
        let mut stream = UnixStream::connect(&self.path)?;
        let mut buf = [0u8; SIM_TIME_LEN];
        stream.read_exact(&mut buf)?;
        Ok(SimTime::decode(&buf))
    }
}

impl ClockSource for SimClock {
    fn wall_clock(&self) -> Result<SimTime, BridgeError> {
        self.query()
    }

    fn monotonic(&self) -> Result<Duration, BridgeError> {
        Ok(self.query()?.as_duration())
    }
}
