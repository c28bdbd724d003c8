//! Subscription seam for the simulator's time broadcast.

use async_trait::async_trait;
use log::{debug, warn};
use tokio::net::UdpSocket;

use crate::error::BridgeError;
use crate::timesvc::SimTimeHandle;
use crate::types::SimTime;

/// Source of published simulated-time samples.
///
/// Implementations must be `Send` so a feed can be pumped from a
/// spawned task.
#[async_trait]
pub trait TimeFeed: Send {
    /// Wait for the next published time sample.
    async fn recv(&mut self) -> Result<SimTime, BridgeError>;
}

/// Time feed reading seconds/nanoseconds datagrams over UDP.
///
/// Stand-in for the simulator's native transport subscription: anything
/// that can emit a 16-byte sec/nsec datagram can drive the service.
#[derive(Debug)]
pub struct UdpTimeFeed {
    socket: UdpSocket,
    buf: [u8; 64],
}

impl UdpTimeFeed {
    /// Bind the feed on the given local port (0 for kernel-assigned).
    pub async fn bind(port: u16) -> Result<Self, BridgeError> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await.map_err(|e| {
            BridgeError::ConnectionFailed(format!("failed to bind time feed on port {port}: {e}"))
        })?;
        Ok(Self {
            socket,
            buf: [0u8; 64],
        })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, BridgeError> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl TimeFeed for UdpTimeFeed {
    async fn recv(&mut self) -> Result<SimTime, BridgeError> {
        loop {
            let len = self.socket.recv(&mut self.buf).await?;
            if let Some(time) = SimTime::decode_feed(&self.buf[..len]) {
                return Ok(time);
            }
            debug!("ignoring malformed {len}-byte time sample");
        }
    }
}

/// Pump feed samples into the shared handle until the feed fails.
pub async fn pump<F: TimeFeed>(mut feed: F, handle: SimTimeHandle) {
    loop {
        match feed.recv().await {
            Ok(time) => handle.set(time),
            Err(e) => {
                warn!("time feed stopped: {e}");
                break;
            }
        }
    }
}
