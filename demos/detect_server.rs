//! Shared-source detection demo
//!
//! Run with: cargo run --example detect_server
//!
//! Starts a synthetic video source, registers a stub detection backend,
//! and attaches two sessions to the same source id. The source is
//! opened once; both sessions sample the shared slot at their own rate
//! and print the messages a real transport would forward to clients.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use framehub::hub::{HubConfig, StreamHub};
use framehub::infer::{
    BackendRegistry, InferenceBackend, InferenceError, InferenceParams, Rect, Region,
};
use framehub::session::{Session, SessionConfig, StageSpec};
use framehub::sink::ChannelSink;
use framehub::source::{FrameSource, SourceError, SourceStream};
use framehub::Frame;

/// Produces a gray test pattern at roughly 25 fps
struct TestPattern;

struct TestPatternStream {
    counter: u8,
}

#[async_trait::async_trait]
impl FrameSource for TestPattern {
    async fn open(&self, id: &str) -> Result<Box<dyn SourceStream>, SourceError> {
        println!("Opening synthetic source {}", id);
        Ok(Box::new(TestPatternStream { counter: 0 }))
    }
}

#[async_trait::async_trait]
impl SourceStream for TestPatternStream {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        tokio::time::sleep(Duration::from_millis(40)).await;
        self.counter = self.counter.wrapping_add(1);
        let pixels = vec![self.counter; 64 * 48 * 3];
        Ok(Some(Frame::new(Bytes::from(pixels), 64, 48)))
    }
}

/// Pretends every frame contains one person
struct StubDetector;

#[async_trait::async_trait]
impl InferenceBackend for StubDetector {
    fn name(&self) -> &str {
        "stub-detector"
    }

    async fn infer(
        &self,
        _frame: &Frame,
        _params: &InferenceParams,
    ) -> Result<Vec<Region>, InferenceError> {
        // A real backend would run a model here
        tokio::time::sleep(Duration::from_millis(15)).await;
        Ok(vec![Region::object(
            "person",
            0.87,
            Rect(8.0, 4.0, 40.0, 44.0),
        )])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framehub=info".parse()?),
        )
        .init();

    let hub = Arc::new(StreamHub::with_config(
        Arc::new(TestPattern),
        HubConfig::default(),
    ));

    let mut backends = BackendRegistry::new();
    backends.register(Arc::new(StubDetector));
    let backends = Arc::new(backends);

    println!("Starting two sessions on the same source");
    println!();

    let mut handles = Vec::new();
    for (name, fps) in [("viewer-a", 2.0), ("viewer-b", 1.0)] {
        let config = SessionConfig::new("pattern/0")
            .stage(StageSpec::new("stub-detector"))
            .target_fps(fps);
        let (sink, mut rx) = ChannelSink::new(64);
        let session = Session::new(
            name,
            config,
            Arc::clone(&hub),
            Arc::clone(&backends),
            Box::new(sink),
        );

        handles.push(tokio::spawn(session.run()));
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message.to_json() {
                    Ok(json) => println!("[{}] {}", name, json),
                    Err(e) => eprintln!("[{}] serialize failed: {}", name, e),
                }
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");
    hub.shutdown().await;

    Ok(())
}
