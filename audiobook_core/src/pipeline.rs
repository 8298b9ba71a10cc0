//! Sequential synthesis of chunked text into one audio buffer.

use thiserror::Error;

use crate::engine::{SampleBuffer, SpeechEngine};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("chunk size must be a positive number of characters")]
    InvalidConfiguration,

    #[error("nothing to synthesize")]
    EmptyInput,

    #[error("synthesis failed on chunk {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("chunk {index} was synthesized at {got} Hz, expected {expected} Hz")]
    InconsistentSampleRate {
        index: usize,
        expected: u32,
        got: u32,
    },
}

/// Synthesize `chunks` in order and concatenate the results.
///
/// Chunks are synthesized strictly sequentially; output audio order must
/// match document order, and downstream concatenation assumes chunk-index
/// order equals audio-time order. `on_progress(completed, total)` fires
/// after each chunk completes.
///
/// The first failing synthesis call aborts the whole run; there is no retry
/// and no partial result. Every chunk must come back at the same sample
/// rate; a mismatch aborts with [`PipelineError::InconsistentSampleRate`]
/// rather than concatenating buffers that play at different speeds.
///
/// All per-chunk buffers are held until the final merge, so peak memory is
/// proportional to the full audiobook's sample count.
pub fn synthesize_chunks<F>(
    chunks: &[String],
    engine: &dyn SpeechEngine,
    mut on_progress: F,
) -> Result<SampleBuffer, PipelineError>
where
    F: FnMut(usize, usize),
{
    if chunks.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let total = chunks.len();
    let mut buffers: Vec<SampleBuffer> = Vec::with_capacity(total);
    for (index, chunk) in chunks.iter().enumerate() {
        let buffer = engine
            .synthesize(chunk)
            .map_err(|source| PipelineError::Synthesis { index, source })?;

        if let Some(first) = buffers.first() {
            if buffer.sample_rate != first.sample_rate {
                return Err(PipelineError::InconsistentSampleRate {
                    index,
                    expected: first.sample_rate,
                    got: buffer.sample_rate,
                });
            }
        }

        buffers.push(buffer);
        on_progress(index + 1, total);
    }

    let sample_rate = buffers[0].sample_rate;
    let merged_len = buffers.iter().map(SampleBuffer::len).sum();
    let mut samples = Vec::with_capacity(merged_len);
    for buffer in buffers {
        samples.extend(buffer.samples);
    }

    Ok(SampleBuffer::new(samples, sample_rate))
}
