//! Telemetry line relay demo
//!
//! Run with: cargo run --example telemetry_relay [ADDR]
//!
//! Connects to a TCP source emitting newline-delimited JSON (default
//! 127.0.0.1:8081) and prints each valid record, with heartbeats while
//! the source is quiet. Pair it with e.g.:
//!
//!   while true; do echo '{"batteryLevel": 87}'; sleep 1; done | nc -l 8081

use framehub::relay::{LineRelay, RelayConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framehub=info".parse()?),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8081".to_string());

    println!("Relaying from {}", addr);

    let (tx, mut rx) = mpsc::channel(64);
    let relay = tokio::spawn(LineRelay::with_config(addr, RelayConfig::default()).run(tx));

    while let Some(line) = rx.recv().await {
        println!("{}", line);
    }

    relay.await??;
    Ok(())
}
