//! Decoding of the synthesis payload: base64 text wrapping raw little-endian
//! 16-bit signed PCM, single channel.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crate::error::DecodeError;
use crate::models::AudioBuffer;

/// Sample rate of the speech collaborator's output
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

const PCM16_SCALE: f32 = 32768.0;

/// Decode a base64 PCM16LE mono payload into a playable buffer tagged with `sample_rate`
pub fn decode_base64_pcm16(encoded: &str, sample_rate: u32) -> Result<AudioBuffer, DecodeError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    let samples = pcm16_le_to_f32(&bytes)?;
    Ok(AudioBuffer::mono(samples, sample_rate))
}

/// Reinterpret bytes as i16 little-endian samples and normalise to [-1.0, 1.0)
pub fn pcm16_le_to_f32(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddByteLength { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_SCALE)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn encode(samples: &[i16]) -> String {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_known_sample_vector() {
        let samples = [0i16, 1, -1, 16384, -16384, i16::MAX, i16::MIN];
        let buffer = decode_base64_pcm16(&encode(&samples), SPEECH_SAMPLE_RATE).unwrap();

        let expected = [
            0.0f32,
            1.0 / 32768.0,
            -1.0 / 32768.0,
            0.5,
            -0.5,
            32767.0 / 32768.0,
            -1.0,
        ];
        assert_eq!(buffer.samples, expected);
        assert_eq!(buffer.channels, 1);
        assert_eq!(buffer.sample_rate, SPEECH_SAMPLE_RATE);
    }

    #[test]
    fn test_every_sample_value_in_range() {
        let all: Vec<i16> = (i16::MIN..=i16::MAX).collect();
        let bytes: Vec<u8> = all.iter().flat_map(|s| s.to_le_bytes()).collect();
        let decoded = pcm16_le_to_f32(&bytes).unwrap();

        assert_eq!(decoded.len(), all.len());
        for (sample, value) in all.iter().zip(decoded.iter()) {
            assert_eq!(*value, *sample as f32 / 32768.0);
            assert!(*value >= -1.0 && *value < 1.0);
        }
    }

    #[test]
    fn test_frame_count_matches_sample_count() {
        let samples = vec![100i16; 24_000 * 3];
        let buffer = decode_base64_pcm16(&encode(&samples), SPEECH_SAMPLE_RATE).unwrap();

        assert_eq!(buffer.frames(), samples.len());
        assert_eq!(buffer.duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_decoding_is_idempotent() {
        let encoded = encode(&[5, -7, 300, -32000]);
        let first = decode_base64_pcm16(&encoded, SPEECH_SAMPLE_RATE).unwrap();
        let second = decode_base64_pcm16(&encoded, SPEECH_SAMPLE_RATE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_little_endian_byte_order() {
        // 0x0102 little-endian is [0x02, 0x01]
        let decoded = pcm16_le_to_f32(&[0x02, 0x01]).unwrap();
        assert_eq!(decoded, vec![0x0102 as f32 / 32768.0]);
    }

    #[test]
    fn test_empty_payload_yields_empty_buffer() {
        let buffer = decode_base64_pcm16("", SPEECH_SAMPLE_RATE).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_odd_length_rejected() {
        let encoded = STANDARD.encode([0u8, 1, 2]);
        let result = decode_base64_pcm16(&encoded, SPEECH_SAMPLE_RATE);
        assert_eq!(result, Err(DecodeError::OddByteLength { len: 3 }));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result = decode_base64_pcm16("not*base64!", SPEECH_SAMPLE_RATE);
        assert!(matches!(result, Err(DecodeError::InvalidBase64(_))));
    }
}
