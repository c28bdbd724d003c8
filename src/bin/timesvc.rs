//! Time virtualization service process.
//!
//! Subscribes to the simulator's time broadcast and serves the current
//! simulated time to local IPC clients over a unix socket, so any
//! process loading the shim perceives simulation time.
//!
//! Usage:
//!   cargo run --bin timesvc -- [OPTIONS]
//!
//! Options:
//!   --socket-path <PATH>  IPC endpoint (default: $HOME/.gazebo_time)
//!   --feed-port <PORT>    UDP port for the time broadcast (default: 9005)

use std::env;
use std::path::PathBuf;
use std::process;

use gzsitl::timesvc::{self, feed, TimeService, UdpTimeFeed};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

struct Args {
    socket_path: Option<PathBuf>,
    feed_port: u16,
}

fn parse_args() -> Args {
    let mut args = Args {
        socket_path: None,
        feed_port: 9005,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--socket-path" => {
                i += 1;
                let value = raw.get(i).unwrap_or_else(|| {
                    eprintln!("Error: --socket-path requires a value");
                    process::exit(1);
                });
                args.socket_path = Some(PathBuf::from(value));
            }
            "--feed-port" => {
                i += 1;
                args.feed_port = raw
                    .get(i)
                    .unwrap_or_else(|| {
                        eprintln!("Error: --feed-port requires a value");
                        process::exit(1);
                    })
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("Error: invalid value for --feed-port");
                        process::exit(1);
                    });
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

fn print_usage() {
    eprintln!(
        "Usage: timesvc [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --socket-path <PATH>  IPC endpoint (default: $HOME/.gazebo_time)\n\
         \x20 --feed-port <PORT>    UDP port for the time broadcast (default: 9005)\n\
         \x20 -h, --help            Show this help"
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args = parse_args();

    let path = match args.socket_path {
        Some(path) => path,
        None => timesvc::default_socket_path().unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
    };

    let mut service = TimeService::bind(&path).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    let time_feed = UdpTimeFeed::bind(args.feed_port).await.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    println!(
        "Time service on {}, feed on UDP port {}. Press Ctrl+C to stop.",
        path.display(),
        args.feed_port
    );

    tokio::spawn(feed::pump(time_feed, service.handle()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
        let _ = shutdown_tx.send(true);
    });

    service.run(shutdown_rx).await;
    println!("Time service stopped.");
}
