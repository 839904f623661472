//! Single-producer line relay
//!
//! The smallest instance of the crate's discipline: one blocking
//! network source, one consumer, a read timeout standing in for a
//! heartbeat. Telemetry arrives as newline-delimited JSON records;
//! partial records are buffered across reads and the remainder is kept
//! until its terminator shows up.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Configuration for a [`LineRelay`]
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Per-read timeout; each expiry emits a heartbeat instead of data
    pub read_timeout: Duration,

    /// Read buffer size
    pub read_buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            read_buffer_size: 4096,
        }
    }
}

impl RelayConfig {
    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Relays line-delimited JSON from one TCP source to one consumer
pub struct LineRelay {
    addr: String,
    config: RelayConfig,
}

impl LineRelay {
    /// Create a relay for the given address
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_config(addr, RelayConfig::default())
    }

    /// Create a relay with custom configuration
    pub fn with_config(addr: impl Into<String>, config: RelayConfig) -> Self {
        Self {
            addr: addr.into(),
            config,
        }
    }

    /// Connect and relay until the source ends or the consumer is gone
    ///
    /// Valid JSON lines are forwarded verbatim; malformed lines are
    /// logged and discarded, the stream continues. Every read timeout
    /// emits `{"heartbeat": true}` so the consumer can tell a quiet
    /// source from a dead relay.
    pub async fn run(self, out: mpsc::Sender<String>) -> Result<()> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        tracing::info!(addr = %self.addr, "Relay connected");

        let mut pending = BytesMut::with_capacity(self.config.read_buffer_size);
        let mut chunk = vec![0u8; self.config.read_buffer_size];

        loop {
            match tokio::time::timeout(self.config.read_timeout, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => {
                    tracing::info!(addr = %self.addr, "Source closed");
                    return Ok(());
                }
                Ok(Ok(n)) => {
                    pending.extend_from_slice(&chunk[..n]);
                    if !Self::flush_lines(&mut pending, &out).await {
                        return Ok(());
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!(addr = %self.addr, error = %e, "Relay read failed");
                    return Err(Error::Io(e));
                }
                Err(_) => {
                    // Quiet source: let the consumer know we are alive
                    let heartbeat = serde_json::json!({"heartbeat": true}).to_string();
                    if out.send(heartbeat).await.is_err() {
                        tracing::info!(addr = %self.addr, "Consumer gone");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Split complete lines out of the buffer, keeping the remainder
    ///
    /// Returns `false` once the consumer is gone.
    async fn flush_lines(pending: &mut BytesMut, out: &mpsc::Sender<String>) -> bool {
        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line = pending.split_to(pos + 1);
            let line = String::from_utf8_lossy(&line[..pos]);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Forward only records that parse; garbage is dropped, the
            // stream is not
            if serde_json::from_str::<serde_json::Value>(line).is_err() {
                tracing::error!(line = %line, "Invalid JSON discarded");
                continue;
            }

            if out.send(line.to_string()).await.is_err() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    async fn serve_chunks(chunks: Vec<&'static [u8]>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            for chunk in chunks {
                socket.write_all(chunk).await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            // Socket drops, relay sees EOF
        });

        addr
    }

    #[tokio::test]
    async fn test_relays_complete_lines() {
        let addr = serve_chunks(vec![
            b"{\"batteryLevel\": 87}\n{\"batteryLevel\": 86}\n",
        ])
        .await;

        let (tx, mut rx) = mpsc::channel(16);
        tokio_test::assert_ok!(LineRelay::new(addr).run(tx).await);

        assert_eq!(rx.recv().await.unwrap(), "{\"batteryLevel\": 87}");
        assert_eq!(rx.recv().await.unwrap(), "{\"batteryLevel\": 86}");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_partial_record_is_buffered_across_reads() {
        let addr = serve_chunks(vec![
            b"{\"altitude\":",
            b" 120.5}\n{\"altitude\"",
            b": 121.0}\n",
        ])
        .await;

        let (tx, mut rx) = mpsc::channel(16);
        LineRelay::new(addr).run(tx).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "{\"altitude\": 120.5}");
        assert_eq!(rx.recv().await.unwrap(), "{\"altitude\": 121.0}");
    }

    #[tokio::test]
    async fn test_invalid_json_is_discarded() {
        let addr = serve_chunks(vec![b"not json at all\n{\"ok\": true}\n\n"]).await;

        let (tx, mut rx) = mpsc::channel(16);
        LineRelay::new(addr).run(tx).await.unwrap();

        // Only the valid record comes through; blank lines are skipped
        assert_eq!(rx.recv().await.unwrap(), "{\"ok\": true}");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_quiet_source_yields_heartbeat() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // Accept but send nothing for a while
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(socket);
        });

        let config = RelayConfig::default().read_timeout(Duration::from_millis(30));
        let (tx, mut rx) = mpsc::channel(16);
        let relay = tokio::spawn(LineRelay::with_config(addr, config).run(tx));

        let first = rx.recv().await.unwrap();
        assert_eq!(first, "{\"heartbeat\":true}");

        server.await.unwrap();
        relay.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_source_errors() {
        // Port 1 is essentially never listening
        tokio_test::assert_err!(LineRelay::new("127.0.0.1:1").run(mpsc::channel(1).0).await);
    }
}
