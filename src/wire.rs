//! Fixed-size binary packet layouts exchanged with the simulator.
//!
//! All fields are little-endian. Datagram size is the only integrity
//! check: a packet that is not exactly the expected length is rejected.

use crate::types::SimTime;

/// Number of actuator channels in a servo packet.
pub const SERVO_CHANNELS: usize = 16;
/// Encoded size of a servo packet in bytes.
pub const SERVO_PACKET_LEN: usize = SERVO_CHANNELS * 4;
/// Encoded size of an FDM state packet in bytes.
pub const FDM_PACKET_LEN: usize = 8 + 16 * 4;
/// Encoded size of a time-service response in bytes.
pub const SIM_TIME_LEN: usize = 16;
/// Encoded size of a time-feed datagram in bytes.
pub const TIME_FEED_LEN: usize = 16;

/// Actuator command datagram: 16 normalized motor speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoPacket {
    pub motor_speed: [f32; SERVO_CHANNELS],
}

impl ServoPacket {
    /// Build a packet from raw PWM commands in [1000, 2000],
    /// mapped to [0.0, 1.0] via `(raw - 1000) / 1000`.
    pub fn from_pwm(raw: &[u16; SERVO_CHANNELS]) -> Self {
        let mut motor_speed = [0.0f32; SERVO_CHANNELS];
        for (out, &pwm) in motor_speed.iter_mut().zip(raw.iter()) {
            *out = (pwm as f32 - 1000.0) / 1000.0;
        }
        Self { motor_speed }
    }

    pub fn encode(&self) -> [u8; SERVO_PACKET_LEN] {
        let mut buf = [0u8; SERVO_PACKET_LEN];
        for (chunk, speed) in buf.chunks_exact_mut(4).zip(self.motor_speed.iter()) {
            chunk.copy_from_slice(&speed.to_le_bytes());
        }
        buf
    }

    /// Decode a servo packet. Returns `None` unless the buffer is
    /// exactly [`SERVO_PACKET_LEN`] bytes.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != SERVO_PACKET_LEN {
            return None;
        }
        let mut motor_speed = [0.0f32; SERVO_CHANNELS];
        for (chunk, speed) in buf.chunks_exact(4).zip(motor_speed.iter_mut()) {
            *speed = f32::from_le_bytes(chunk.try_into().unwrap());
        }
        Some(Self { motor_speed })
    }
}

/// FDM state datagram received from the simulator each control step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdmPacket {
    /// Simulation time in seconds.
    pub timestamp: f64,
    /// Linear acceleration in m/s² (body frame).
    pub linear_acceleration: [f32; 3],
    /// Angular velocity in rad/s (body frame).
    pub angular_velocity: [f32; 3],
    /// Attitude quaternion [w, x, y, z].
    pub orientation: [f32; 4],
    /// Velocity in m/s (earth frame).
    pub velocity: [f32; 3],
    /// Position in meters (earth frame).
    pub position: [f32; 3],
}

impl FdmPacket {
    pub fn encode(&self) -> [u8; FDM_PACKET_LEN] {
        let mut buf = [0u8; FDM_PACKET_LEN];
        buf[..8].copy_from_slice(&self.timestamp.to_le_bytes());
        let mut off = 8;
        for field in [
            &self.linear_acceleration[..],
            &self.angular_velocity[..],
            &self.orientation[..],
            &self.velocity[..],
            &self.position[..],
        ] {
            for v in field {
                buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
                off += 4;
            }
        }
        buf
    }

    /// Decode an FDM packet. Returns `None` unless the buffer is
    /// exactly [`FDM_PACKET_LEN`] bytes.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != FDM_PACKET_LEN {
            return None;
        }
        let timestamp = f64::from_le_bytes(buf[..8].try_into().unwrap());
        let mut off = 8;
        let mut next = || {
            let v = f32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
            off += 4;
            v
        };
        Some(Self {
            timestamp,
            linear_acceleration: [next(), next(), next()],
            angular_velocity: [next(), next(), next()],
            orientation: [next(), next(), next(), next()],
            velocity: [next(), next(), next()],
            position: [next(), next(), next()],
        })
    }
}

impl SimTime {
    /// Encode the fixed-size time-service response.
    pub fn encode(&self) -> [u8; SIM_TIME_LEN] {
        let mut buf = [0u8; SIM_TIME_LEN];
        buf[..8].copy_from_slice(&self.sec.to_le_bytes());
        buf[8..].copy_from_slice(&self.usec.to_le_bytes());
        buf
    }

    /// Decode a time-service response.
    pub fn decode(buf: &[u8; SIM_TIME_LEN]) -> Self {
        Self {
            sec: i64::from_le_bytes(buf[..8].try_into().unwrap()),
            usec: i64::from_le_bytes(buf[8..].try_into().unwrap()),
        }
    }

    /// Decode a time-feed datagram (seconds + nanoseconds). The
    /// nanosecond component is truncated to microseconds.
    pub fn decode_feed(buf: &[u8]) -> Option<Self> {
        if buf.len() != TIME_FEED_LEN {
            return None;
        }
        let sec = u64::from_le_bytes(buf[..8].try_into().unwrap());
        let nsec = u64::from_le_bytes(buf[8..].try_into().unwrap());
        Some(Self {
            sec: sec as i64,
            usec: (nsec / 1000) as i64,
        })
    }

    /// Encode a time-feed datagram from seconds + nanoseconds.
    pub fn encode_feed(sec: u64, nsec: u64) -> [u8; TIME_FEED_LEN] {
        let mut buf = [0u8; TIME_FEED_LEN];
        buf[..8].copy_from_slice(&sec.to_le_bytes());
        buf[8..].copy_from_slice(&nsec.to_le_bytes());
        buf
    }
}
