//! Time virtualization service.
//!
//! Exposes the simulator's authoritative clock to arbitrary local
//! processes: a time feed writes the current simulated time into a
//! mutex-guarded shared value, and an accept loop serves a fixed-size
//! snapshot of it to every connection on a local socket.

pub mod feed;

pub use feed::{TimeFeed, UdpTimeFeed};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::warn;
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;

use crate::error::BridgeError;
use crate::types::SimTime;

/// Well-known endpoint file name under the user's home directory.
pub const TIME_SOCKET_NAME: &str = ".gazebo_time";

/// Resolve the default endpoint path, `$HOME/.gazebo_time`.
pub fn default_socket_path() -> Result<PathBuf, BridgeError> {
    let home = std::env::var_os("HOME").ok_or(BridgeError::HomeNotSet)?;
    Ok(PathBuf::from(home).join(TIME_SOCKET_NAME))
}

/// Shared simulated-time value.
///
/// The one piece of shared mutable state in the service: written by
/// the feed pump, read by the accept loop, serialized by a single
/// mutex.
#[derive(Debug, Clone, Default)]
pub struct SimTimeHandle {
    inner: Arc<Mutex<SimTime>>,
}

impl SimTimeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the shared value.
    pub fn set(&self, time: SimTime) {
        *self.inner.lock().unwrap() = time;
    }

    /// Copy the current value.
    pub fn get(&self) -> SimTime {
        *self.inner.lock().unwrap()
    }
}

/// Connection-oriented local endpoint serving the shared sim time.
///
/// Explicit lifecycle: [`bind`](TimeService::bind) removes any stale
/// endpoint file and starts listening; dropping the service removes
/// the endpoint best-effort.
pub struct TimeService {
    listener: UnixListener,
    path: PathBuf,
    time: SimTimeHandle,
}

impl TimeService {
    /// Remove a stale endpoint file and bind + listen at `path`.
    ///
    /// Bind failure is fatal to a service process; callers are
    /// expected to log the error and terminate.
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self, BridgeError> {
        let path = path.into();
        // A previous instance may have died without cleanup.
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).map_err(|e| {
            BridgeError::ConnectionFailed(format!(
                "failed to bind time socket {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self {
            listener,
            path,
            time: SimTimeHandle::new(),
        })
    }

    /// Clone the shared time handle for the feed side.
    pub fn handle(&self) -> SimTimeHandle {
        self.time.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serve snapshots until `shutdown` flips to true (or its sender
    /// is dropped). Connections are handled one at a time; queueing
    /// beyond the OS backlog is deliberately absent.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => self.serve_one(stream).await,
                        Err(e) => warn!("accept failed on time socket: {e}"),
                    }
                }
            }
        }
    }

    /// Write one snapshot and close the connection. No request
    /// payload is read; connecting is the request.
    async fn serve_one(&self, mut stream: UnixStream) {
        let snapshot = self.time.get();
        if let Err(e) = stream.write_all(&snapshot.encode()).await {
            warn!("failed to write time snapshot: {e}");
        }
    }
}

impl Drop for TimeService {
    fn drop(&mut self) {
        // Best-effort endpoint cleanup.
        let _ = std::fs::remove_file(&self.path);
    }
}
