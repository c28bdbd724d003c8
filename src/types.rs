use core::fmt;
use std::time::Duration;

/// Simulated clock value: seconds plus sub-second microseconds.
///
/// This is the unit of exchange between the time feed, the time
/// virtualization service and its IPC clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimTime {
    /// Whole seconds of simulation time.
    pub sec: i64,
    /// Microseconds within the current second.
    pub usec: i64,
}

impl SimTime {
    pub const fn new(sec: i64, usec: i64) -> Self {
        Self { sec, usec }
    }

    /// Monotonic form of this time: the microsecond component scaled
    /// to nanoseconds. Assumes `usec` is a valid sub-second value.
    pub fn as_duration(&self) -> Duration {
        Duration::new(self.sec as u64, (self.usec * 1000) as u32)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.sec, self.usec)
    }
}

/// Last-accepted sensor values from the flight dynamics model.
///
/// Each channel is updated independently: a channel that fails
/// validation keeps its previous value.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    /// Linear acceleration in m/s² (body frame, [x, y, z]).
    pub accel_body: [f32; 3],
    /// Angular velocity in rad/s (body frame, [x, y, z]).
    pub gyro: [f32; 3],
    /// Attitude quaternion [w, x, y, z].
    pub orientation: [f32; 4],
    /// Velocity in m/s (earth frame, [x, y, z]).
    pub velocity_ef: [f32; 3],
    /// Position in meters (earth frame, [x, y, z]).
    pub position: [f32; 3],
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            accel_body: [0.0; 3],
            gyro: [0.0; 3],
            orientation: [1.0, 0.0, 0.0, 0.0],
            velocity_ef: [0.0; 3],
            position: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_time_display() {
        let t = SimTime::new(42, 1500);
        assert_eq!(format!("{t}"), "42.001500");
    }

    #[test]
    fn test_sim_time_as_duration_scales_usec_to_nanos() {
        let t = SimTime::new(2, 250);
        assert_eq!(t.as_duration(), Duration::new(2, 250_000));
    }

    #[test]
    fn test_sensor_state_default_orientation_is_identity() {
        let state = SensorState::default();
        assert_eq!(state.orientation, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(state.accel_body, [0.0; 3]);
    }
}
