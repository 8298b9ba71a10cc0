//! WAV encoding of the merged sample buffer.

use std::io::Cursor;

/// Encode mono f32 samples as a 16-bit PCM WAV (RIFF) file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // 44-byte RIFF header plus two bytes per sample.
    let mut cursor = Cursor::new(Vec::<u8>::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &s in samples {
        // Clamp and convert f32 [-1.0, 1.0] -> i16.
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(v)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}
