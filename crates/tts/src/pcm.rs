//! Raw PCM decoding

/// Decode signed 16-bit little-endian PCM into samples in `[-1, 1)`
///
/// A trailing odd byte is ignored.
pub fn decode_s16le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
        .collect()
}
