pub mod bridge;
pub mod error;
pub mod shim;
pub mod timesvc;
pub mod types;
pub mod validate;
pub mod wire;

pub use bridge::{FdmBridge, FdmBridgeConfig, FramePacer, VirtualClock};
pub use error::BridgeError;
pub use shim::{ClockSource, SimClock};
pub use timesvc::{SimTimeHandle, TimeFeed, TimeService, UdpTimeFeed};
pub use types::{SensorState, SimTime};
