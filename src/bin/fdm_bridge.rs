//! Supervised FDM bridge driver.
//!
//! Steps the bridge against a running simulator with neutral actuator
//! commands, printing periodic status. Useful for checking a simulator
//! setup before wiring in the autopilot.
//!
//! Usage:
//!   cargo run --bin fdm_bridge -- [OPTIONS]
//!
//! Options:
//!   --port <PORT>      UDP port for FDM state packets (default: 9003)
//!   --sim-addr <ADDR>  Simulator actuator address (default: 127.0.0.1:9002)

use std::env;
use std::net::SocketAddr;
use std::process;

use gzsitl::wire::SERVO_CHANNELS;
use gzsitl::{FdmBridge, FdmBridgeConfig, FramePacer, VirtualClock};

struct Args {
    port: u16,
    sim_addr: SocketAddr,
}

fn parse_args() -> Args {
    let defaults = FdmBridgeConfig::default();
    let mut args = Args {
        port: defaults.bind_port,
        sim_addr: defaults.simulator_addr,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--port" => {
                i += 1;
                args.port = parse_arg(&raw, i, "port");
            }
            "--sim-addr" => {
                i += 1;
                args.sim_addr = parse_arg(&raw, i, "sim-addr");
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    args
}

fn parse_arg<T: std::str::FromStr>(raw: &[String], i: usize, name: &str) -> T {
    raw.get(i)
        .unwrap_or_else(|| {
            eprintln!("Error: --{name} requires a value");
            process::exit(1);
        })
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("Error: invalid value for --{name}");
            process::exit(1);
        })
}

fn print_usage() {
    eprintln!(
        "Usage: fdm_bridge [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --port <PORT>      UDP port for FDM state packets (default: 9003)\n\
         \x20 --sim-addr <ADDR>  Simulator actuator address (default: 127.0.0.1:9002)\n\
         \x20 -h, --help         Show this help"
    );
}

/// Pacer that surfaces frame-rate hints in the debug log.
struct LogPacer;

impl FramePacer for LogPacer {
    fn adjust_frame_rate(&mut self, hz: f32) {
        log::debug!("frame rate hint: {hz:.1} Hz");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args = parse_args();

    let config = FdmBridgeConfig {
        bind_port: args.port,
        simulator_addr: args.sim_addr,
        ..Default::default()
    };

    let mut bridge = FdmBridge::connect(config, VirtualClock::new())
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        });
    bridge.set_pacer(Box::new(LogPacer));

    println!(
        "Bridge on port {}, simulator at {}. Press Ctrl+C to stop.",
        args.port, args.sim_addr
    );

    let neutral = [1500u16; SERVO_CHANNELS];
    let mut step_count: u64 = 0;
    let mut connected = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("\nShutdown requested.");
                break;
            }
            stepped = bridge.step(&neutral) => {
                if let Err(e) = stepped {
                    eprintln!("Step failed: {e}");
                    process::exit(1);
                }
                if !connected {
                    connected = true;
                    println!("Simulator connection established.");
                }
                step_count += 1;
                if step_count % 1000 == 0 {
                    println!(
                        "[{step_count} steps] sim time {:.3} s, virtual clock {} us",
                        bridge.last_timestamp(),
                        bridge.clock().now_us()
                    );
                }
            }
        }
    }

    println!(
        "Bridge stopped after {} steps, final virtual time: {} us",
        step_count,
        bridge.clock().now_us()
    );
}
