//! Common utilities for integration tests

use std::collections::HashMap;
use std::sync::{atomic::AtomicU64, Arc};

use axum::body::Body;
use axum::http::Request;
use axum::Router;

use audiobook_core::{SampleBuffer, SpeechEngine, VoiceManager};
use server::config::ServerConfig;
use server::jobs::JobRegistry;
use server::{build_router, AppState};

/// Deterministic engine: every chunk becomes `samples_per_chunk` samples at
/// a fixed rate, so the size of the final WAV is predictable.
pub struct StubEngine {
    pub sample_rate: u32,
    pub samples_per_chunk: usize,
}

impl SpeechEngine for StubEngine {
    fn synthesize(&self, _text: &str) -> anyhow::Result<SampleBuffer> {
        Ok(SampleBuffer::new(
            vec![0.25; self.samples_per_chunk],
            self.sample_rate,
        ))
    }
}

/// Create a test app with one stub voice named "test".
pub fn create_test_app() -> Router {
    let mut voices = VoiceManager::new(None, HashMap::new());
    voices.install_engine(
        "test",
        Some("Test voice".to_string()),
        Arc::new(StubEngine {
            sample_rate: 22050,
            samples_per_chunk: 100,
        }),
    );

    let config = ServerConfig::default();
    let state = AppState {
        voices: Arc::new(voices),
        jobs: Arc::new(JobRegistry::new(config.job_ttl())),
        request_count: Arc::new(AtomicU64::new(0)),
        config,
    };
    build_router(state)
}

pub const BOUNDARY: &str = "integration-test-boundary";

/// Build a multipart POST /audiobooks request from raw file bytes.
pub fn upload_request(filename: &str, content: &[u8], voice: Option<&str>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(voice) = voice {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"voice\"\r\n\r\n");
        body.extend_from_slice(voice.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/audiobooks")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
