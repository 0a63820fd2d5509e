//! Resample engine: derives pixel-aligned min/max views of the envelope
//!
//! Every scroll, zoom frame and resize goes through [`Resampler::resample`].
//! Scales are always expressed in source samples per pixel, independent of
//! the envelope's own base resolution, so `timeToPixel`/`pixelToTime` are the
//! same arithmetic for every view:
//!
//! ```text
//! pixel = round(time * sample_rate / scale)
//! time  = pixel * scale / sample_rate
//! ```
//!
//! Down-sampling takes block extrema over the entries a pixel covers. When a
//! pixel covers less than one entry (zoomed past the envelope's resolution)
//! the covering entry is repeated. Columns that fall outside the envelope
//! read as silence; reads are clamped to the data and never panic.

use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::{ResampleError, ResampleResult};
use crate::types::Seconds;

/// Convert a time to an absolute pixel index at `scale`
pub fn time_to_pixel(time: Seconds, sample_rate: u32, scale: f64) -> i64 {
    (time * sample_rate as f64 / scale).round() as i64
}

/// Convert an absolute pixel index at `scale` back to a time
pub fn pixel_to_time(pixel: i64, sample_rate: u32, scale: f64) -> Seconds {
    pixel as f64 * scale / sample_rate as f64
}

/// What to resample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResampleRequest {
    /// Whole envelope fitted into `width` pixels; scale = ceil(source_samples / width)
    Width(u32),
    /// Whole envelope at a fixed samples-per-pixel scale
    Scale(f64),
    /// Exactly `ceil(length)` output pixels at `scale`, aligned so output pixel
    /// `output_index` starts at source sample `input_index`
    Window {
        scale: f64,
        input_index: i64,
        output_index: i64,
        length: f64,
    },
}

/// Disposable snapshot of the envelope at one scale
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledView {
    scale: f64,
    sample_rate: u32,
    /// Source sample at the left edge of column 0 (negative before the recording)
    start_sample: f64,
    min: Vec<i8>,
    max: Vec<i8>,
}

impl ResampledView {
    /// Source samples per pixel
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of pixel columns
    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    pub fn min(&self) -> &[i8] {
        &self.min
    }

    pub fn max(&self) -> &[i8] {
        &self.max
    }

    /// Absolute pixel index of column 0
    pub fn start_pixel(&self) -> i64 {
        (self.start_sample / self.scale).round() as i64
    }

    /// Absolute source sample offset of column 0, clamped to the recording
    pub fn offset(&self) -> u64 {
        self.start_sample.max(0.0) as u64
    }

    /// Min/max at an absolute pixel index, if the view covers it
    pub fn column(&self, pixel: i64) -> Option<(i8, i8)> {
        let idx = pixel - self.start_pixel();
        if idx < 0 {
            return None;
        }
        let idx = idx as usize;
        if idx >= self.min.len() {
            return None;
        }
        Some((self.min[idx], self.max[idx]))
    }

    pub fn time_to_pixel(&self, time: Seconds) -> i64 {
        time_to_pixel(time, self.sample_rate, self.scale)
    }

    pub fn pixel_to_time(&self, pixel: i64) -> Seconds {
        pixel_to_time(pixel, self.sample_rate, self.scale)
    }
}

/// Swappable resample backend
///
/// The only direct-call interface in the core; a streaming or cached backend
/// can stand in for [`ResampleEngine`] without touching the viewports.
pub trait Resampler {
    fn resample(&self, request: &ResampleRequest) -> ResampleResult<ResampledView>;

    /// Source sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Length of the recording in source samples
    fn source_samples(&self) -> u64;

    /// Length of the recording in seconds
    fn duration(&self) -> Seconds {
        self.source_samples() as f64 / self.sample_rate() as f64
    }
}

/// In-memory resampler over a shared envelope
#[derive(Debug, Clone)]
pub struct ResampleEngine {
    envelope: Arc<Envelope>,
}

impl ResampleEngine {
    pub fn new(envelope: Arc<Envelope>) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &Arc<Envelope> {
        &self.envelope
    }

    /// Scale that fits the whole envelope into `width` pixels
    pub fn scale_for_width(&self, width: u32) -> ResampleResult<f64> {
        if width == 0 {
            return Err(ResampleError::InvalidWidth(width));
        }
        let samples = self.envelope.source_samples();
        Ok(samples.div_ceil(width as u64).max(1) as f64)
    }

    fn build(&self, scale: f64, start_sample: f64, length: usize) -> ResampledView {
        let env = &self.envelope;
        let entries = env.len() as i64;
        let base = env.base_scale() as f64;
        let (src_min, src_max) = (env.min(), env.max());

        let mut min = Vec::with_capacity(length);
        let mut max = Vec::with_capacity(length);

        for col in 0..length {
            let s0 = start_sample + col as f64 * scale;
            let s1 = s0 + scale;
            let e0 = (s0 / base).floor() as i64;
            let e1 = ((s1 / base).floor() as i64).max(e0 + 1);

            let lo_idx = e0.max(0);
            let hi_idx = e1.min(entries);
            if lo_idx >= hi_idx {
                min.push(0);
                max.push(0);
                continue;
            }

            let range = lo_idx as usize..hi_idx as usize;
            let lo = src_min[range.clone()].iter().copied().min().unwrap_or(0);
            let hi = src_max[range].iter().copied().max().unwrap_or(0);
            min.push(lo);
            max.push(hi);
        }

        ResampledView {
            scale,
            sample_rate: env.sample_rate(),
            start_sample,
            min,
            max,
        }
    }
}

fn check_scale(scale: f64) -> ResampleResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ResampleError::InvalidScale(scale));
    }
    Ok(())
}

impl Resampler for ResampleEngine {
    fn resample(&self, request: &ResampleRequest) -> ResampleResult<ResampledView> {
        if self.envelope.is_empty() {
            return Err(ResampleError::EmptyEnvelope);
        }
        let samples = self.envelope.source_samples();

        let view = match *request {
            ResampleRequest::Width(width) => {
                let scale = self.scale_for_width(width)?;
                let length = (samples as f64 / scale).ceil() as usize;
                self.build(scale, 0.0, length)
            }
            ResampleRequest::Scale(scale) => {
                check_scale(scale)?;
                let length = (samples as f64 / scale).ceil() as usize;
                self.build(scale, 0.0, length)
            }
            ResampleRequest::Window {
                scale,
                input_index,
                output_index,
                length,
            } => {
                check_scale(scale)?;
                if !length.is_finite() || length < 0.0 {
                    return Err(ResampleError::InvalidLength(length));
                }
                let start_sample = input_index as f64 - output_index as f64 * scale;
                self.build(scale, start_sample, length.ceil() as usize)
            }
        };

        log::debug!(
            "resample: {:?} -> {} columns at scale {:.2}",
            request,
            view.len(),
            view.scale
        );
        Ok(view)
    }

    fn sample_rate(&self) -> u32 {
        self.envelope.sample_rate()
    }

    fn source_samples(&self) -> u64 {
        self.envelope.source_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_engine(len: usize) -> ResampleEngine {
        let min: Vec<i8> = (0..len).map(|i| -((i % 100) as i8)).collect();
        let max: Vec<i8> = (0..len).map(|i| (i % 100) as i8).collect();
        ResampleEngine::new(Arc::new(Envelope::from_native(44100, min, max).unwrap()))
    }

    #[test]
    fn test_width_scale_scenario() {
        // 10 seconds at 44.1kHz fitted into 500px
        let engine = ResampleEngine::new(Arc::new(
            Envelope::from_native(44100, vec![0; 441_000], vec![0; 441_000]).unwrap(),
        ));
        let view = engine.resample(&ResampleRequest::Width(500)).unwrap();
        assert_eq!(view.scale(), 882.0);
        assert_eq!(view.len(), 500);
    }

    #[test]
    fn test_scale_one_is_identity() {
        let engine = ramp_engine(1000);
        let view = engine.resample(&ResampleRequest::Scale(1.0)).unwrap();
        assert_eq!(view.len(), 1000);
        assert_eq!(view.min(), engine.envelope().min());
        assert_eq!(view.max(), engine.envelope().max());
    }

    #[test]
    fn test_block_extrema() {
        let min = vec![-1, -5, -2, -3, 0, -9];
        let max = vec![1, 5, 2, 3, 0, 9];
        let engine = ResampleEngine::new(Arc::new(Envelope::from_native(100, min, max).unwrap()));
        let view = engine.resample(&ResampleRequest::Scale(2.0)).unwrap();
        assert_eq!(view.min(), &[-5, -3, -9]);
        assert_eq!(view.max(), &[5, 3, 9]);
    }

    #[test]
    fn test_partial_last_block() {
        let engine = ramp_engine(10);
        let view = engine.resample(&ResampleRequest::Scale(4.0)).unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view.max()[2], 9);
    }

    #[test]
    fn test_base_scale_respected() {
        // 4 entries at 256 samples each; scale 512 merges pairs
        let env = Envelope::new(44100, 256, vec![-1, -4, -2, -8], vec![1, 4, 2, 8]).unwrap();
        let engine = ResampleEngine::new(Arc::new(env));
        let view = engine.resample(&ResampleRequest::Scale(512.0)).unwrap();
        assert_eq!(view.min(), &[-4, -8]);
        assert_eq!(view.max(), &[4, 8]);
    }

    #[test]
    fn test_sub_native_scale_repeats() {
        let env = Envelope::new(44100, 256, vec![-1, -4], vec![1, 4]).unwrap();
        let engine = ResampleEngine::new(Arc::new(env));
        let view = engine.resample(&ResampleRequest::Scale(128.0)).unwrap();
        assert_eq!(view.len(), 4);
        assert_eq!(view.max(), &[1, 1, 4, 4]);
    }

    #[test]
    fn test_window_alignment() {
        let engine = ramp_engine(1000);
        // Output pixel 5 starts at sample 100 at scale 10
        let view = engine
            .resample(&ResampleRequest::Window {
                scale: 10.0,
                input_index: 100,
                output_index: 5,
                length: 20.0,
            })
            .unwrap();
        assert_eq!(view.len(), 20);
        assert_eq!(view.start_pixel(), 5);
        // Column 5 covers samples 100..110 whose max is 109 % 100
        assert_eq!(view.max()[5], 9);
        assert_eq!(view.column(10), Some((view.min()[5], view.max()[5])));
    }

    #[test]
    fn test_window_out_of_range_is_silent() {
        let engine = ramp_engine(100);
        let view = engine
            .resample(&ResampleRequest::Window {
                scale: 10.0,
                input_index: 0,
                output_index: 5,
                length: 30.0,
            })
            .unwrap();
        assert_eq!(view.len(), 30);
        assert_eq!(view.max()[0], 0);
        assert_eq!(view.max()[4], 0);
        assert_eq!(view.max()[5], 9);
        // Past the end: columns 15.. read past 100 samples
        assert_eq!(view.max()[29], 0);
        assert_eq!(view.offset(), 0);
    }

    #[test]
    fn test_window_fractional_length_rounds_up() {
        let engine = ramp_engine(100);
        let view = engine
            .resample(&ResampleRequest::Window {
                scale: 2.0,
                input_index: 0,
                output_index: 0,
                length: 10.2,
            })
            .unwrap();
        assert_eq!(view.len(), 11);
    }

    #[test]
    fn test_invalid_requests() {
        let engine = ramp_engine(10);
        assert_eq!(
            engine.resample(&ResampleRequest::Width(0)),
            Err(ResampleError::InvalidWidth(0))
        );
        assert!(matches!(
            engine.resample(&ResampleRequest::Scale(0.0)),
            Err(ResampleError::InvalidScale(_))
        ));
        assert!(matches!(
            engine.resample(&ResampleRequest::Scale(f64::NAN)),
            Err(ResampleError::InvalidScale(_))
        ));
        assert!(matches!(
            engine.resample(&ResampleRequest::Window {
                scale: 1.0,
                input_index: 0,
                output_index: 0,
                length: -1.0
            }),
            Err(ResampleError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_empty_envelope() {
        let engine = ResampleEngine::new(Arc::new(Envelope::from_native(44100, vec![], vec![]).unwrap()));
        assert_eq!(
            engine.resample(&ResampleRequest::Scale(1.0)),
            Err(ResampleError::EmptyEnvelope)
        );
    }

    #[test]
    fn test_time_pixel_round_trip() {
        let sample_rate = 44100;
        for &scale in &[1.0, 256.0, 512.0, 882.0, 4096.0] {
            let pixel_duration = scale / sample_rate as f64;
            let mut t = 0.0;
            while t < 30.0 {
                let back = pixel_to_time(time_to_pixel(t, sample_rate, scale), sample_rate, scale);
                assert!((back - t).abs() < pixel_duration, "t={} scale={}", t, scale);
                t += 0.137;
            }
        }
    }

    #[test]
    fn test_segment_pixel_scenario() {
        assert_eq!(time_to_pixel(1.0, 44100, 512.0), 86);
        assert_eq!(time_to_pixel(2.0, 44100, 512.0), 172);
    }
}
