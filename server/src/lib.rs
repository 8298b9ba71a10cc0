pub mod config;
pub mod error;
pub mod jobs;
pub mod validation;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, OnceLock,
};
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use audiobook_core::{
    chunk_text, encode_wav, synthesize_chunks, SpeechEngine, VoiceManager, MAX_CHUNK_LEN,
};
use doc_extract::extract_text;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::jobs::{FinishedAudio, JobRegistry, JobView};
use crate::validation::{validate_upload, validate_voice_id};

/// Download disposition with the fixed output filename.
const DOWNLOAD_DISPOSITION: &str = r#"attachment; filename="audiobook.wav""#;

#[derive(Clone)]
pub struct AppState {
    pub voices: Arc<VoiceManager>,
    pub jobs: Arc<JobRegistry>,
    pub request_count: Arc<AtomicU64>,
    pub config: ServerConfig,
}

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Record process start time for uptime reporting.
pub fn mark_started() {
    let _ = START_TIME.get_or_init(Instant::now);
}

pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/voices", get(list_voices))
        .route("/voices/detail", get(list_voices_detail))
        .route("/audiobooks", post(create_audiobook))
        .route("/audiobooks/{id}", get(audiobook_status))
        .route("/audiobooks/{id}/download", get(download_audiobook))
        .route("/metrics", get(metrics_endpoint))
        // multipart framing adds overhead on top of the file itself
        .layer(DefaultBodyLimit::max(max_upload + 64 * 1024))
        .with_state(state)
}

pub async fn index_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct VoiceInfo {
    pub id: String,
    pub config: String,
    pub display_name: Option<String>,
}

pub async fn list_voices(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.voices.voice_ids())
}

pub async fn list_voices_detail(State(state): State<AppState>) -> Json<Vec<VoiceInfo>> {
    let out = state
        .voices
        .entries()
        .into_iter()
        .map(|(id, entry)| VoiceInfo {
            id,
            config: entry.config,
            display_name: entry.display_name,
        })
        .collect();
    Json(out)
}

#[derive(Serialize)]
pub struct CreateAudiobookResponse {
    pub job_id: Uuid,
    pub total_chunks: usize,
}

pub async fn create_audiobook(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateAudiobookResponse>), ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let mut upload: Option<(String, Bytes)> = None;
    let mut voice: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart request: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::InvalidInput(format!("Failed to read uploaded file: {e}"))
                })?;
                upload = Some((filename, data));
            }
            "voice" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::InvalidInput(format!("Failed to read voice field: {e}"))
                })?;
                if !value.trim().is_empty() {
                    voice = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| ApiError::InvalidInput("Missing 'file' field".to_string()))?;
    let format = validate_upload(&filename, data.len(), state.config.max_upload_bytes)?;
    if let Some(ref v) = voice {
        validate_voice_id(v)?;
    }

    // Resolve the engine up front so an unknown voice fails before any
    // document parsing happens.
    let engine = state.voices.engine_for(voice.as_deref())?;

    // PDF/DOCX parsing is CPU-bound; keep it off the async runtime.
    let chunks = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ApiError> {
        let text = extract_text(format, &data)?;
        Ok(chunk_text(&text, MAX_CHUNK_LEN)?)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Task join error: {e}")))??;

    let total_chunks = chunks.len();
    let job_id = state.jobs.create(total_chunks);
    info!(%job_id, file = %filename, chunks = total_chunks, "audiobook job accepted");

    let jobs = state.jobs.clone();
    tokio::task::spawn_blocking(move || run_job(job_id, chunks, engine, jobs));

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateAudiobookResponse {
            job_id,
            total_chunks,
        }),
    ))
}

/// Synthesize one job to completion. Runs on the blocking pool; the job
/// registry entry is the only thing this writes to.
fn run_job(
    job_id: Uuid,
    chunks: Vec<String>,
    engine: Arc<dyn SpeechEngine>,
    jobs: Arc<JobRegistry>,
) {
    let started = Instant::now();
    let result = synthesize_chunks(&chunks, engine.as_ref(), |completed, _total| {
        jobs.set_progress(job_id, completed)
    });
    match result {
        Ok(buffer) => match encode_wav(&buffer.samples, buffer.sample_rate) {
            Ok(wav) => {
                info!(
                    %job_id,
                    audio_ms = buffer.duration_ms(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "audiobook complete"
                );
                jobs.finish(
                    job_id,
                    FinishedAudio {
                        sample_rate: buffer.sample_rate,
                        duration_ms: buffer.duration_ms(),
                        wav: Bytes::from(wav),
                    },
                );
            }
            Err(e) => {
                error!(%job_id, "WAV encoding error: {e}");
                jobs.fail(job_id, format!("WAV encoding error: {e}"));
            }
        },
        Err(e) => {
            error!(%job_id, "synthesis error: {e}");
            jobs.fail(job_id, e.to_string());
        }
    }
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: &'static str,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn audiobook_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let view = state
        .jobs
        .view(id)
        .ok_or_else(|| ApiError::NotFound(format!("No audiobook job {id}")))?;

    let response = match view {
        JobView::Running { completed, total } => JobStatusResponse {
            job_id: id,
            status: "running",
            completed_chunks: completed,
            total_chunks: total,
            sample_rate: None,
            duration_ms: None,
            error: None,
        },
        JobView::Complete { total, audio } => JobStatusResponse {
            job_id: id,
            status: "complete",
            completed_chunks: total,
            total_chunks: total,
            sample_rate: Some(audio.sample_rate),
            duration_ms: Some(audio.duration_ms),
            error: None,
        },
        JobView::Failed {
            completed,
            total,
            error,
        } => JobStatusResponse {
            job_id: id,
            status: "failed",
            completed_chunks: completed,
            total_chunks: total,
            sample_rate: None,
            duration_ms: None,
            error: Some(error),
        },
    };
    Ok(Json(response))
}

pub async fn download_audiobook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    match state.jobs.view(id) {
        None => Err(ApiError::NotFound(format!("No audiobook job {id}"))),
        Some(JobView::Running { .. }) => Err(ApiError::NotReady),
        Some(JobView::Failed { error, .. }) => Err(ApiError::JobFailed(error)),
        Some(JobView::Complete { audio, .. }) => Ok((
            [
                (header::CONTENT_TYPE, "audio/wav"),
                (header::CONTENT_DISPOSITION, DOWNLOAD_DISPOSITION),
            ],
            audio.wav,
        )
            .into_response()),
    }
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_usage_percent: f32,
    pub request_count: u64,
    pub uptime_seconds: u64,
    pub system_load: Option<f64>,
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let cpu_usage = system.global_cpu_info().cpu_usage();

    let memory_used = system.used_memory();
    let memory_total = system.total_memory();
    let memory_usage_percent = if memory_total > 0 {
        (memory_used as f64 / memory_total as f64 * 100.0) as f32
    } else {
        0.0
    };

    let request_count = state.request_count.load(Ordering::Relaxed);

    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);

    // System load (Unix-like systems only)
    let system_load = {
        #[cfg(unix)]
        {
            use std::fs;
            if let Ok(loadavg) = fs::read_to_string("/proc/loadavg") {
                loadavg
                    .split_whitespace()
                    .next()
                    .and_then(|s| s.parse::<f64>().ok())
            } else {
                None
            }
        }
        #[cfg(not(unix))]
        None
    };

    Json(MetricsResponse {
        cpu_usage_percent: cpu_usage,
        memory_used_mb: memory_used / 1024 / 1024,
        memory_total_mb: memory_total / 1024 / 1024,
        memory_usage_percent,
        request_count,
        uptime_seconds: uptime,
        system_load,
    })
}
