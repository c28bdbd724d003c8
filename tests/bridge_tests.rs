use std::sync::{Arc, Mutex};
use std::time::Duration;

use gzsitl::wire::{FdmPacket, ServoPacket, SERVO_CHANNELS};
use gzsitl::{FdmBridge, FdmBridgeConfig, FramePacer, VirtualClock};
use tokio::net::UdpSocket;

/// Pacer that records every frame-rate hint.
struct RecordingPacer(Arc<Mutex<Vec<f32>>>);

impl FramePacer for RecordingPacer {
    fn adjust_frame_rate(&mut self, hz: f32) {
        self.0.lock().unwrap().push(hz);
    }
}

fn fdm_at(timestamp: f64) -> FdmPacket {
    FdmPacket {
        timestamp,
        linear_acceleration: [0.1, 0.2, -1.0],
        angular_velocity: [0.01, 0.02, 0.03],
        orientation: [1.0, 0.0, 0.0, 0.0],
        velocity: [0.5, 0.0, 0.0],
        position: [0.0, 0.0, 0.0],
    }
}

async fn sim_socket() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

async fn connect_bridge(sim: &UdpSocket, recv_ms: u64, disconnect_ms: u64) -> FdmBridge {
    let config = FdmBridgeConfig {
        bind_port: 0,
        simulator_addr: sim.local_addr().unwrap(),
        recv_timeout: Duration::from_millis(recv_ms),
        disconnect_timeout: Duration::from_millis(disconnect_ms),
    };
    FdmBridge::connect(config, VirtualClock::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn virtual_time_advances_by_timestamp_delta() {
    let sim = sim_socket().await;
    // Generous receive timeout so no retransmission muddies the exchange.
    let mut bridge = connect_bridge(&sim, 2000, 10_000).await;
    let servos = [1500u16; SERVO_CHANNELS];

    let sim_task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        for timestamp in [1.0, 1.25] {
            let (_, src) = sim.recv_from(&mut buf).await.unwrap();
            sim.send_to(&fdm_at(timestamp).encode(), src).await.unwrap();
        }
    });

    bridge.step(&servos).await.unwrap();
    bridge.step(&servos).await.unwrap();
    sim_task.await.unwrap();

    assert_eq!(bridge.clock().now_us(), 1_250_000);
    assert_eq!(bridge.last_timestamp(), 1.25);
    assert_eq!(bridge.sensors().accel_body, [0.1, 0.2, -1.0]);
}

#[tokio::test]
async fn hundred_hertz_scenario_paces_and_accumulates() {
    let sim = sim_socket().await;
    let mut bridge = connect_bridge(&sim, 2000, 10_000).await;
    let hints = Arc::new(Mutex::new(Vec::new()));
    bridge.set_pacer(Box::new(RecordingPacer(hints.clone())));
    let servos = [1500u16; SERVO_CHANNELS];

    let sim_task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        for (i, timestamp) in [0.0, 0.01, 0.02].into_iter().enumerate() {
            let (_, src) = sim.recv_from(&mut buf).await.unwrap();
            let mut packet = fdm_at(timestamp);
            packet.position = [i as f32 * 0.5, 0.0, 0.0];
            sim.send_to(&packet.encode(), src).await.unwrap();
        }
    });

    for expected_x in [0.0f32, 0.5, 1.0] {
        bridge.step(&servos).await.unwrap();
        // Stored state updates on every packet, including the first
        // one whose timestamp equals the initial history.
        assert_eq!(bridge.sensors().position[0], expected_x);
    }
    sim_task.await.unwrap();

    assert_eq!(bridge.clock().now_us(), 20_000);
    let hints = hints.lock().unwrap();
    assert_eq!(hints.len(), 2);
    for hz in hints.iter() {
        assert!((hz - 100.0).abs() < 1e-3, "unexpected pacing hint {hz}");
    }
}

#[tokio::test]
async fn stale_packet_is_discarded_with_minimal_tick() {
    let sim = sim_socket().await;
    let mut bridge = connect_bridge(&sim, 2000, 10_000).await;
    let servos = [1500u16; SERVO_CHANNELS];

    let sim_task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        let (_, src) = sim.recv_from(&mut buf).await.unwrap();
        sim.send_to(&fdm_at(2.0).encode(), src).await.unwrap();

        let (_, src) = sim.recv_from(&mut buf).await.unwrap();
        // Older timestamp with different (still in-threshold) fields.
        let mut stale = fdm_at(1.0);
        stale.linear_acceleration = [1.5, 1.5, 0.5];
        sim.send_to(&stale.encode(), src).await.unwrap();
    });

    bridge.step(&servos).await.unwrap();
    let before = bridge.sensors().clone();
    bridge.step(&servos).await.unwrap();
    sim_task.await.unwrap();

    assert_eq!(bridge.sensors(), &before);
    assert_eq!(bridge.clock().now_us(), 2_000_001);
    assert_eq!(bridge.last_timestamp(), 2.0);
}

#[tokio::test]
async fn timeout_triggers_actuator_retransmission() {
    let sim = sim_socket().await;
    let mut bridge = connect_bridge(&sim, 30, 10_000).await;
    let mut servos = [1500u16; SERVO_CHANNELS];
    servos[0] = 1600;

    let sim_task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        // Swallow the first actuator packet, answer the retransmit.
        let (len, _) = sim.recv_from(&mut buf).await.unwrap();
        let first = ServoPacket::decode(&buf[..len]).unwrap();
        let (len, src) = sim.recv_from(&mut buf).await.unwrap();
        let second = ServoPacket::decode(&buf[..len]).unwrap();
        sim.send_to(&fdm_at(1.0).encode(), src).await.unwrap();
        (first, second)
    });

    bridge.step(&servos).await.unwrap();
    let (first, second) = sim_task.await.unwrap();

    assert_eq!(first, second);
    assert!((first.motor_speed[0] - 0.6).abs() < f32::EPSILON);
    assert!((first.motor_speed[1] - 0.5).abs() < f32::EPSILON);
    assert_eq!(bridge.clock().now_us(), 1_000_000);
}

#[tokio::test]
async fn wrong_size_datagram_is_rejected_and_resent() {
    let sim = sim_socket().await;
    let mut bridge = connect_bridge(&sim, 2000, 10_000).await;
    let servos = [1500u16; SERVO_CHANNELS];

    let sim_task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        let (_, src) = sim.recv_from(&mut buf).await.unwrap();
        // Undersized garbage must not satisfy the receive loop.
        sim.send_to(&[0u8; 10], src).await.unwrap();
        let (_, src) = sim.recv_from(&mut buf).await.unwrap();
        sim.send_to(&fdm_at(1.0).encode(), src).await.unwrap();
    });

    bridge.step(&servos).await.unwrap();
    sim_task.await.unwrap();

    assert_eq!(bridge.clock().now_us(), 1_000_000);
    assert_eq!(bridge.last_timestamp(), 1.0);
}

#[tokio::test]
async fn silence_resets_timestamp_history() {
    let sim = sim_socket().await;
    let mut bridge = connect_bridge(&sim, 20, 60).await;
    let servos = [1500u16; SERVO_CHANNELS];

    let sim_task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        let (_, src) = sim.recv_from(&mut buf).await.unwrap();
        sim.send_to(&fdm_at(5.0).encode(), src).await.unwrap();

        // Go silent past the disconnect threshold, then resume with a
        // timestamp far below the last one.
        tokio::time::sleep(Duration::from_millis(200)).await;
        sim.send_to(&fdm_at(0.5).encode(), src).await.unwrap();
    });

    bridge.step(&servos).await.unwrap();
    assert_eq!(bridge.last_timestamp(), 5.0);

    bridge.step(&servos).await.unwrap();
    sim_task.await.unwrap();

    // Accepted as a fresh session rather than a negative delta.
    assert_eq!(bridge.last_timestamp(), 0.5);
    assert_eq!(bridge.clock().now_us(), 5_000_000 + 500_000);
}
