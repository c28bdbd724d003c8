//! UDP session with the flight dynamics model.
//!
//! The bridge is stepped once per control tick: it sends one actuator
//! datagram, blocks (with a bounded per-attempt timeout) until exactly
//! one correctly-sized state packet arrives, validates and applies the
//! sensor fields, advances virtual time by the packet's timestamp
//! delta, and drains any queued datagrams.

pub mod clock;

pub use clock::{FramePacer, VirtualClock};

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::error::BridgeError;
use crate::types::SensorState;
use crate::validate::{channel_ok, quat_ok, VALIDITY_THRESHOLD};
use crate::wire::{FdmPacket, ServoPacket, SERVO_CHANNELS};

/// Input port used when the caller does not configure one.
pub const DEFAULT_BIND_PORT: u16 = 9003;

/// Longest delta (seconds) that still produces a frame-pacing hint.
/// Inclusive: an exact 100 Hz feed produces deltas of exactly 0.01.
const MAX_PACED_DELTA: f64 = 0.01;

/// Configuration for the FDM bridge session.
#[derive(Debug, Clone)]
pub struct FdmBridgeConfig {
    /// UDP port for receiving FDM state packets.
    pub bind_port: u16,
    /// Address the simulator listens on for actuator commands.
    pub simulator_addr: SocketAddr,
    /// Per-attempt receive timeout; each expiry re-sends the actuator
    /// packet to compensate for datagram loss.
    pub recv_timeout: Duration,
    /// Wall-clock silence after which the session assumes a simulator
    /// restart and resets its timestamp history.
    pub disconnect_timeout: Duration,
}

impl Default for FdmBridgeConfig {
    fn default() -> Self {
        Self {
            bind_port: DEFAULT_BIND_PORT,
            simulator_addr: "127.0.0.1:9002".parse().unwrap(),
            recv_timeout: Duration::from_millis(100),
            disconnect_timeout: Duration::from_secs(5),
        }
    }
}

/// Bridge session between the autopilot and an external FDM.
pub struct FdmBridge {
    config: FdmBridgeConfig,
    socket: UdpSocket,
    clock: VirtualClock,
    pacer: Option<Box<dyn FramePacer>>,
    sensors: SensorState,
    last_timestamp: f64,
    last_recv: Instant,
    recv_buf: Vec<u8>,
}

impl FdmBridge {
    /// Bind the UDP endpoint and record the simulator address.
    ///
    /// Bind failure is fatal to a SITL run; callers are expected to
    /// log the error and terminate.
    pub async fn connect(
        config: FdmBridgeConfig,
        clock: VirtualClock,
    ) -> Result<Self, BridgeError> {
        let bind_addr: SocketAddr = ([0, 0, 0, 0], config.bind_port).into();
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            BridgeError::ConnectionFailed(format!(
                "failed to bind FDM socket on port {}: {e}",
                config.bind_port
            ))
        })?;
        debug!(
            "FDM bridge bound on {}, simulator at {}",
            socket.local_addr()?,
            config.simulator_addr
        );
        Ok(Self {
            config,
            socket,
            clock,
            pacer: None,
            sensors: SensorState::default(),
            last_timestamp: 0.0,
            last_recv: Instant::now(),
            recv_buf: vec![0u8; 1024],
        })
    }

    /// Inject the pacing subsystem that receives frame-rate hints.
    pub fn set_pacer(&mut self, pacer: Box<dyn FramePacer>) {
        self.pacer = Some(pacer);
    }

    /// Address the bridge is actually bound on.
    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.socket.local_addr()?)
    }

    /// Last-accepted sensor values.
    pub fn sensors(&self) -> &SensorState {
        &self.sensors
    }

    /// The virtual clock this session advances.
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Timestamp of the last accepted FDM packet, in seconds.
    pub fn last_timestamp(&self) -> f64 {
        self.last_timestamp
    }

    /// Run one control step: send actuators, wait for a state packet,
    /// apply it, then flush stale datagrams.
    pub async fn step(&mut self, servos: &[u16; SERVO_CHANNELS]) -> Result<(), BridgeError> {
        let commands = ServoPacket::from_pwm(servos);
        self.send_servos(&commands).await?;
        let packet = self.recv_fdm(&commands).await?;
        self.apply_fdm(&packet);
        self.drain().await;
        Ok(())
    }

    /// Fire one best-effort actuator datagram. No acknowledgment is
    /// expected.
    async fn send_servos(&self, commands: &ServoPacket) -> Result<(), BridgeError> {
        self.socket
            .send_to(&commands.encode(), self.config.simulator_addr)
            .await?;
        Ok(())
    }

    /// Wait for exactly one correctly-sized FDM packet.
    ///
    /// Each timeout or wrong-size datagram triggers an actuator
    /// re-send; the loop is unbounded by design, matching the
    /// supervised-run model where the simulator is expected back.
    async fn recv_fdm(&mut self, commands: &ServoPacket) -> Result<FdmPacket, BridgeError> {
        loop {
            match timeout(self.config.recv_timeout, self.socket.recv(&mut self.recv_buf)).await {
                Ok(Ok(len)) => {
                    if let Some(packet) = FdmPacket::decode(&self.recv_buf[..len]) {
                        self.last_recv = Instant::now();
                        return Ok(packet);
                    }
                    debug!("discarding {len}-byte datagram from simulator");
                }
                Ok(Err(e)) => return Err(BridgeError::Io(e)),
                Err(_) => {}
            }
            self.send_servos(commands).await?;
            // A long silence means the simulator restarted (or was
            // paused); compute the next delta from zero rather than
            // stale history.
            if self.last_recv.elapsed() > self.config.disconnect_timeout {
                if self.last_timestamp != 0.0 {
                    debug!("simulator silent, resetting timestamp history");
                }
                self.last_timestamp = 0.0;
            }
        }
    }

    /// Validate the packet's sensor channels, apply the accepted ones,
    /// and advance virtual time.
    fn apply_fdm(&mut self, packet: &FdmPacket) {
        let delta = packet.timestamp - self.last_timestamp;
        if delta < 0.0 {
            // Stale or duplicate frame: drop the contents, but keep
            // virtual time moving with a minimal tick.
            self.clock.advance_us(1);
            return;
        }

        if channel_ok(
            &packet.linear_acceleration,
            &self.sensors.accel_body,
            VALIDITY_THRESHOLD,
        ) {
            self.sensors.accel_body = packet.linear_acceleration;
        }
        if channel_ok(&packet.angular_velocity, &self.sensors.gyro, VALIDITY_THRESHOLD) {
            self.sensors.gyro = packet.angular_velocity;
        }
        if quat_ok(&packet.orientation) {
            self.sensors.orientation = packet.orientation;
        }
        if channel_ok(&packet.velocity, &self.sensors.velocity_ef, VALIDITY_THRESHOLD) {
            self.sensors.velocity_ef = packet.velocity;
        }
        if channel_ok(&packet.position, &self.sensors.position, VALIDITY_THRESHOLD) {
            self.sensors.position = packet.position;
        }

        self.clock.advance_us((delta * 1.0e6) as u64);

        if delta > 0.0 && delta <= MAX_PACED_DELTA {
            if let Some(pacer) = self.pacer.as_mut() {
                pacer.adjust_frame_rate((1.0 / delta) as f32);
            }
        }
        self.last_timestamp = packet.timestamp;
    }

    /// Flush queued datagrams so the next step starts from the
    /// freshest state the simulator has sent.
    async fn drain(&mut self) {
        loop {
            match self.socket.try_recv(&mut self.recv_buf) {
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("error draining FDM socket: {e}");
                    break;
                }
            }
        }
    }
}

impl std::fmt::Debug for FdmBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdmBridge")
            .field("simulator_addr", &self.config.simulator_addr)
            .field("last_timestamp", &self.last_timestamp)
            .field("time_us", &self.clock.now_us())
            .finish()
    }
}
