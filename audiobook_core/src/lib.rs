mod chunker;
mod engine;
mod pipeline;
mod voices;
mod wav;

pub use chunker::{chunk_text, MAX_CHUNK_LEN};
pub use engine::{PiperVoice, SampleBuffer, SpeechEngine};
pub use pipeline::{synthesize_chunks, PipelineError};
pub use voices::{VoiceEntry, VoiceError, VoiceManager};
pub use wav::encode_wav;
