//! In-memory registry of audiobook generation jobs.
//!
//! One job per upload. The submitting handler creates the entry; the
//! background synthesis task is the only writer afterwards, updating
//! progress after each chunk and storing the encoded WAV on completion.
//! Finished audio stays in memory until the entry ages out.

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use uuid::Uuid;

/// The encoded result of a completed job.
#[derive(Clone)]
pub struct FinishedAudio {
    pub wav: Bytes,
    pub sample_rate: u32,
    pub duration_ms: u64,
}

enum Outcome {
    Finished(FinishedAudio),
    Failed(String),
}

struct Job {
    created_at: Instant,
    total_chunks: usize,
    completed_chunks: usize,
    outcome: Option<Outcome>,
}

/// Snapshot of one job, safe to hand to a response builder.
#[derive(Clone)]
pub enum JobView {
    Running {
        completed: usize,
        total: usize,
    },
    Complete {
        total: usize,
        audio: FinishedAudio,
    },
    Failed {
        completed: usize,
        total: usize,
        error: String,
    },
}

pub struct JobRegistry {
    jobs: DashMap<Uuid, Job>,
    ttl: Duration,
}

impl JobRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: DashMap::new(),
            ttl,
        }
    }

    /// Register a new job and return its id. Expired entries are pruned on
    /// every insert so the map stays bounded by the TTL window.
    pub fn create(&self, total_chunks: usize) -> Uuid {
        self.prune_expired();
        let id = Uuid::new_v4();
        self.jobs.insert(
            id,
            Job {
                created_at: Instant::now(),
                total_chunks,
                completed_chunks: 0,
                outcome: None,
            },
        );
        id
    }

    pub fn set_progress(&self, id: Uuid, completed: usize) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.completed_chunks = completed;
        }
    }

    pub fn finish(&self, id: Uuid, audio: FinishedAudio) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.completed_chunks = job.total_chunks;
            job.outcome = Some(Outcome::Finished(audio));
        }
    }

    pub fn fail(&self, id: Uuid, error: String) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.outcome = Some(Outcome::Failed(error));
        }
    }

    pub fn view(&self, id: Uuid) -> Option<JobView> {
        let job = self.jobs.get(&id)?;
        Some(match &job.outcome {
            None => JobView::Running {
                completed: job.completed_chunks,
                total: job.total_chunks,
            },
            Some(Outcome::Finished(audio)) => JobView::Complete {
                total: job.total_chunks,
                audio: audio.clone(),
            },
            Some(Outcome::Failed(error)) => JobView::Failed {
                completed: job.completed_chunks,
                total: job.total_chunks,
                error: error.clone(),
            },
        })
    }

    fn prune_expired(&self) {
        self.jobs
            .retain(|_, job| job.created_at.elapsed() < self.ttl);
    }
}
