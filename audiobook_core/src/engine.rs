//! The synthesis engine seam.
//!
//! The pipeline only ever sees `SpeechEngine`, an opaque text -> samples
//! function, so it can be exercised with stub engines in tests and is not
//! tied to Piper.

use std::{fs, path::Path};

use anyhow::Context;
use piper_rs::synth::{PiperSpeechStreamParallel, PiperSpeechSynthesizer};

/// A contiguous block of mono PCM samples at a known sample rate.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    /// Mono f32 samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 16000, 22050).
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of this buffer in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn duration_ms(&self) -> u64 {
        (self.duration_secs() * 1000.0) as u64
    }
}

/// A text-to-speech backend. One call synthesizes one chunk.
pub trait SpeechEngine: Send + Sync {
    fn synthesize(&self, text: &str) -> anyhow::Result<SampleBuffer>;
}

/// A loaded Piper voice model.
pub struct PiperVoice {
    synth: PiperSpeechSynthesizer,
    sample_rate: u32,
}

impl PiperVoice {
    /// Load a voice from a Piper model config JSON.
    pub fn from_config_path<P: AsRef<Path>>(cfg_path: P) -> anyhow::Result<Self> {
        let sample_rate = read_sample_rate(cfg_path.as_ref())?;
        let model = piper_rs::from_config_path(cfg_path.as_ref())
            .map_err(|e| anyhow::anyhow!("piper load error: {e}"))?;
        let synth = PiperSpeechSynthesizer::new(model)?;
        Ok(Self { synth, sample_rate })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl std::fmt::Debug for PiperVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiperVoice")
            .field("synth", &"<PiperSpeechSynthesizer>")
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl SpeechEngine for PiperVoice {
    fn synthesize(&self, text: &str) -> anyhow::Result<SampleBuffer> {
        let stream: PiperSpeechStreamParallel = self
            .synth
            .synthesize_parallel(text.to_string(), None)
            .map_err(|e| anyhow::anyhow!("piper synth error: {e}"))?;

        let mut samples: Vec<f32> = Vec::new();
        for part in stream {
            samples.extend(
                part.map_err(|e| anyhow::anyhow!("piper stream error: {e}"))?
                    .into_vec(),
            );
        }
        Ok(SampleBuffer::new(samples, self.sample_rate))
    }
}

/// Read the sample rate from a Piper model config JSON.
fn read_sample_rate(cfg_path: &Path) -> anyhow::Result<u32> {
    let text = fs::read_to_string(cfg_path)
        .with_context(|| format!("Failed to read config file: {}", cfg_path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| "Config file is not valid JSON")?;

    let sample_rate = json
        .get("audio")
        .and_then(|a| a.get("sample_rate"))
        .and_then(|sr| sr.as_u64())
        .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'audio.sample_rate' in config"))?;

    Ok(sample_rate as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_the_sample_rate() {
        let buffer = SampleBuffer::new(vec![0.0; 22050], 22050);
        assert_eq!(buffer.len(), 22050);
        assert!((buffer.duration_secs() - 1.0).abs() < f64::EPSILON);
        assert_eq!(buffer.duration_ms(), 1000);
    }

    #[test]
    fn empty_buffer_reports_empty() {
        let buffer = SampleBuffer::new(Vec::new(), 16000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_ms(), 0);
    }
}
