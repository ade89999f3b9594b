//! Sample-rate conversion and WAV encoding for upload to recognition backends

use std::io::Cursor;

/// Rate recognition models expect
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Linearly interpolate `samples` from `from` Hz to `to` Hz
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn resample_linear(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let step = f64::from(from) / f64::from(to);
    let out_len = ((samples.len() as f64) / step).round().max(1.0) as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let position = i as f64 * step;
            let index = (position.floor() as usize).min(last);
            let fraction = (position - index as f64) as f32;

            let current = samples[index];
            let next = samples[(index + 1).min(last)];

            (next - current).mul_add(fraction, current)
        })
        .collect()
}

/// Encode mono samples as a 16-bit PCM WAV file
///
/// Samples outside `[-1, 1]` are clipped.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));

    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[allow(clippy::cast_possible_truncation)]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}
