//! Amplitude envelope: the immutable min/max source every view is derived from
//!
//! The envelope is created once from a loader payload and lives for the whole
//! session. Two payload layouts are understood, both produced by the common
//! waveform pre-computation tools:
//!
//! - **JSON**: `{ sample_rate, samples_per_pixel, bits, length, channels?, data: [min, max, ...] }`
//! - **Binary `.dat`**: little-endian header (v1: 20 bytes, v2: 24 bytes with channel count)
//!   followed by interleaved min/max pairs of 8 or 16 bit samples.
//!
//! Multi-channel payloads are folded into a single envelope (min of mins,
//! max of maxes). 16 bit payloads are reduced to the signed 8 bit range.

use serde::Deserialize;

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::types::Seconds;

/// Binary header flag: data is 8 bit
const DAT_FLAG_8_BIT: u32 = 0x1;

/// Header sizes for the two binary versions
const DAT_HEADER_V1: usize = 20;
const DAT_HEADER_V2: usize = 24;

/// Immutable min/max amplitude arrays at a fixed base resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    sample_rate: u32,
    /// Source samples represented by each min/max entry (1 = native resolution)
    base_scale: u32,
    min: Vec<i8>,
    max: Vec<i8>,
}

impl Envelope {
    /// Build an envelope from min/max arrays
    ///
    /// Both arrays must be the same length; `sample_rate` and `base_scale` must be positive.
    pub fn new(sample_rate: u32, base_scale: u32, min: Vec<i8>, max: Vec<i8>) -> EnvelopeResult<Self> {
        if sample_rate == 0 || base_scale == 0 {
            return Err(EnvelopeError::InvalidHeader {
                sample_rate: sample_rate as i64,
                samples_per_pixel: base_scale as i64,
            });
        }
        if min.len() != max.len() {
            return Err(EnvelopeError::DataMismatch {
                expected: min.len(),
                found: max.len(),
            });
        }
        Ok(Self {
            sample_rate,
            base_scale,
            min,
            max,
        })
    }

    /// Build a native-resolution envelope (one entry per source sample)
    pub fn from_native(sample_rate: u32, min: Vec<i8>, max: Vec<i8>) -> EnvelopeResult<Self> {
        Self::new(sample_rate, 1, min, max)
    }

    /// Number of min/max entries
    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn base_scale(&self) -> u32 {
        self.base_scale
    }

    pub fn min(&self) -> &[i8] {
        &self.min
    }

    pub fn max(&self) -> &[i8] {
        &self.max
    }

    /// Length of the recording in source samples
    pub fn source_samples(&self) -> u64 {
        self.len() as u64 * self.base_scale as u64
    }

    /// Length of the recording in seconds
    pub fn duration(&self) -> Seconds {
        self.source_samples() as f64 / self.sample_rate as f64
    }

    /// Decode the JSON payload layout
    pub fn from_json(json: &str) -> EnvelopeResult<Self> {
        let payload: JsonEnvelope = serde_json::from_str(json)?;
        payload.into_envelope()
    }

    /// Decode the binary `.dat` payload layout
    pub fn from_dat(bytes: &[u8]) -> EnvelopeResult<Self> {
        if bytes.len() < DAT_HEADER_V1 {
            return Err(EnvelopeError::TruncatedHeader(bytes.len()));
        }

        let version = read_i32(bytes, 0);
        let flags = read_u32(bytes, 4);
        let sample_rate = read_i32(bytes, 8) as i64;
        let samples_per_pixel = read_i32(bytes, 12) as i64;
        let length = read_u32(bytes, 16) as usize;

        let (channels, header_len) = match version {
            1 => (1usize, DAT_HEADER_V1),
            2 => {
                if bytes.len() < DAT_HEADER_V2 {
                    return Err(EnvelopeError::TruncatedHeader(bytes.len()));
                }
                (read_i32(bytes, 20).max(1) as usize, DAT_HEADER_V2)
            }
            other => return Err(EnvelopeError::UnsupportedVersion(other)),
        };

        let (sample_rate, base_scale) = checked_header(sample_rate, samples_per_pixel)?;
        let eight_bit = flags & DAT_FLAG_8_BIT != 0;
        let bytes_per_value = if eight_bit { 1 } else { 2 };

        let body = &bytes[header_len..];
        let values_per_entry = entry_values(1, channels)?;
        let total_values = entry_values(length, channels)?;
        let found = body.len() / bytes_per_value / values_per_entry;
        if found < length {
            return Err(EnvelopeError::DataMismatch { expected: length, found });
        }

        let values: Vec<i32> = if eight_bit {
            body.iter()
                .take(total_values)
                .map(|&b| b as i8 as i32)
                .collect()
        } else {
            body.chunks_exact(2)
                .take(total_values)
                .map(|c| i16::from_le_bytes([c[0], c[1]]) as i32)
                .collect()
        };

        let bits = if eight_bit { 8 } else { 16 };
        let (min, max) = fold_channels(&values, length, channels, bits);

        log::debug!(
            "Envelope::from_dat: v{} {} entries, {} channel(s), {} bit, {} Hz, {} samples/entry",
            version,
            length,
            channels,
            bits,
            sample_rate,
            base_scale
        );

        Self::new(sample_rate, base_scale, min, max)
    }
}

/// JSON envelope layout
#[derive(Debug, Deserialize)]
struct JsonEnvelope {
    #[serde(default = "default_channels")]
    channels: usize,
    sample_rate: i64,
    samples_per_pixel: i64,
    bits: u32,
    length: usize,
    data: Vec<i32>,
}

fn default_channels() -> usize {
    1
}

impl JsonEnvelope {
    fn into_envelope(self) -> EnvelopeResult<Envelope> {
        if self.bits != 8 && self.bits != 16 {
            return Err(EnvelopeError::UnsupportedBits(self.bits));
        }
        let (sample_rate, base_scale) = checked_header(self.sample_rate, self.samples_per_pixel)?;

        let channels = self.channels.max(1);
        let expected = entry_values(self.length, channels)?;
        if self.data.len() < expected {
            return Err(EnvelopeError::DataMismatch {
                expected: self.length,
                found: self.data.len() / (channels * 2),
            });
        }

        let (min, max) = fold_channels(&self.data, self.length, channels, self.bits);
        Envelope::new(sample_rate, base_scale, min, max)
    }
}

/// Number of min/max values `length` entries of `channels` occupy
fn entry_values(length: usize, channels: usize) -> EnvelopeResult<usize> {
    length
        .checked_mul(channels)
        .and_then(|n| n.checked_mul(2))
        .ok_or(EnvelopeError::TooLarge { length, channels })
}

fn checked_header(sample_rate: i64, samples_per_pixel: i64) -> EnvelopeResult<(u32, u32)> {
    if sample_rate <= 0 || samples_per_pixel <= 0 || sample_rate > u32::MAX as i64 || samples_per_pixel > u32::MAX as i64 {
        return Err(EnvelopeError::InvalidHeader {
            sample_rate,
            samples_per_pixel,
        });
    }
    Ok((sample_rate as u32, samples_per_pixel as u32))
}

/// Fold interleaved per-channel min/max values into single 8 bit arrays
fn fold_channels(values: &[i32], length: usize, channels: usize, bits: u32) -> (Vec<i8>, Vec<i8>) {
    let mut min = Vec::with_capacity(length);
    let mut max = Vec::with_capacity(length);

    for entry in values.chunks_exact(channels * 2).take(length) {
        let mut lo = i32::MAX;
        let mut hi = i32::MIN;
        for pair in entry.chunks_exact(2) {
            lo = lo.min(pair[0]);
            hi = hi.max(pair[1]);
        }
        min.push(to_i8(lo, bits));
        max.push(to_i8(hi, bits));
    }

    (min, max)
}

fn to_i8(value: i32, bits: u32) -> i8 {
    let scaled = if bits == 16 { value >> 8 } else { value };
    scaled.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dat_header(version: i32, flags: u32, rate: i32, spp: i32, length: u32, channels: Option<i32>) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&spp.to_le_bytes());
        out.extend_from_slice(&length.to_le_bytes());
        if let Some(ch) = channels {
            out.extend_from_slice(&ch.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_new_rejects_mismatched_arrays() {
        let result = Envelope::new(44100, 1, vec![0, 1], vec![0]);
        assert!(matches!(result, Err(EnvelopeError::DataMismatch { .. })));
    }

    #[test]
    fn test_new_rejects_zero_rate() {
        assert!(Envelope::new(0, 1, vec![], vec![]).is_err());
        assert!(Envelope::new(44100, 0, vec![], vec![]).is_err());
    }

    #[test]
    fn test_duration() {
        let env = Envelope::new(44100, 256, vec![0; 1723], vec![0; 1723]).unwrap();
        assert_eq!(env.source_samples(), 1723 * 256);
        assert!((env.duration() - (1723.0 * 256.0 / 44100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_from_json_8_bit() {
        let json = r#"{"version":2,"channels":1,"sample_rate":48000,"samples_per_pixel":512,"bits":8,"length":3,"data":[-10,10,-20,20,-128,127]}"#;
        let env = Envelope::from_json(json).unwrap();
        assert_eq!(env.len(), 3);
        assert_eq!(env.sample_rate(), 48000);
        assert_eq!(env.base_scale(), 512);
        assert_eq!(env.min(), &[-10, -20, -128]);
        assert_eq!(env.max(), &[10, 20, 127]);
    }

    #[test]
    fn test_from_json_16_bit_reduces_range() {
        let json = r#"{"sample_rate":44100,"samples_per_pixel":256,"bits":16,"length":1,"data":[-32768,32767]}"#;
        let env = Envelope::from_json(json).unwrap();
        assert_eq!(env.min(), &[-128]);
        assert_eq!(env.max(), &[127]);
    }

    #[test]
    fn test_from_json_folds_channels() {
        let json = r#"{"channels":2,"sample_rate":44100,"samples_per_pixel":256,"bits":8,"length":1,"data":[-5,3,-9,1]}"#;
        let env = Envelope::from_json(json).unwrap();
        assert_eq!(env.min(), &[-9]);
        assert_eq!(env.max(), &[3]);
    }

    #[test]
    fn test_from_json_short_data() {
        let json = r#"{"sample_rate":44100,"samples_per_pixel":256,"bits":8,"length":4,"data":[0,1]}"#;
        assert!(matches!(
            Envelope::from_json(json),
            Err(EnvelopeError::DataMismatch { expected: 4, found: 1 })
        ));
    }

    #[test]
    fn test_from_json_huge_length() {
        let json = r#"{"sample_rate":44100,"samples_per_pixel":256,"bits":8,"length":9223372036854775808,"data":[1,2]}"#;
        assert!(matches!(
            Envelope::from_json(json),
            Err(EnvelopeError::TooLarge { length: 9223372036854775808, channels: 1 })
        ));

        let json = r#"{"sample_rate":44100,"samples_per_pixel":256,"bits":8,"channels":4611686018427387904,"length":3,"data":[1,2]}"#;
        assert!(matches!(Envelope::from_json(json), Err(EnvelopeError::TooLarge { .. })));
    }

    #[test]
    fn test_from_json_bad_bits() {
        let json = r#"{"sample_rate":44100,"samples_per_pixel":256,"bits":12,"length":0,"data":[]}"#;
        assert!(matches!(Envelope::from_json(json), Err(EnvelopeError::UnsupportedBits(12))));
    }

    #[test]
    fn test_from_dat_v1_8_bit() {
        let mut bytes = dat_header(1, DAT_FLAG_8_BIT, 44100, 256, 2, None);
        bytes.extend_from_slice(&[(-3i8) as u8, 4, (-7i8) as u8, 8]);
        let env = Envelope::from_dat(&bytes).unwrap();
        assert_eq!(env.min(), &[-3, -7]);
        assert_eq!(env.max(), &[4, 8]);
    }

    #[test]
    fn test_from_dat_v2_16_bit() {
        let mut bytes = dat_header(2, 0, 48000, 128, 1, Some(1));
        bytes.extend_from_slice(&(-512i16).to_le_bytes());
        bytes.extend_from_slice(&(1024i16).to_le_bytes());
        let env = Envelope::from_dat(&bytes).unwrap();
        assert_eq!(env.min(), &[-2]);
        assert_eq!(env.max(), &[4]);
        assert_eq!(env.sample_rate(), 48000);
    }

    #[test]
    fn test_from_dat_huge_header_counts() {
        let mut bytes = dat_header(2, 0, 44100, 256, u32::MAX, Some(i32::MAX));
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            Envelope::from_dat(&bytes),
            Err(EnvelopeError::DataMismatch { expected, found: 0 }) if expected == u32::MAX as usize
        ));
    }

    #[test]
    fn test_from_dat_truncated() {
        assert!(matches!(Envelope::from_dat(&[0u8; 8]), Err(EnvelopeError::TruncatedHeader(8))));
    }

    #[test]
    fn test_from_dat_unknown_version() {
        let bytes = dat_header(7, 0, 44100, 256, 0, None);
        assert!(matches!(Envelope::from_dat(&bytes), Err(EnvelopeError::UnsupportedVersion(7))));
    }
}
