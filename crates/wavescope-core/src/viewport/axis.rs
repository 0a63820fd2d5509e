//! Time axis ruler
//!
//! Picks the smallest interval from a fixed ladder whose on-screen spacing is
//! at least `min_spacing_px`, then lays ticks on whole multiples of it.

use crate::types::{FrameGeometry, Seconds};
use crate::viewport::surface::AxisTick;

/// Tick intervals in seconds, smallest first
const TICK_INTERVALS: [f64; 19] = [
    0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0,
    900.0, 1800.0, 3600.0,
];

/// Interval between ticks for a frame's scale
pub fn tick_interval(scale: f64, sample_rate: u32, min_spacing_px: f64) -> Seconds {
    let pixels_per_second = sample_rate as f64 / scale;
    TICK_INTERVALS
        .iter()
        .copied()
        .find(|interval| interval * pixels_per_second >= min_spacing_px)
        .unwrap_or(TICK_INTERVALS[TICK_INTERVALS.len() - 1])
}

/// Recompute the ticks for a frame into `out`
pub fn compute_ticks(frame: &FrameGeometry, min_spacing_px: f64, out: &mut Vec<AxisTick>) {
    out.clear();

    let interval = tick_interval(frame.scale, frame.sample_rate, min_spacing_px);
    let hundredths = interval < 1.0;
    let start = frame.start_time();
    let end = frame.end_time();

    let mut k = (start / interval).ceil() as i64;
    loop {
        let time = k as f64 * interval;
        if time > end {
            break;
        }
        let x = (frame.time_to_pixel(time) - frame.frame_offset) as f32;
        out.push(AxisTick {
            x,
            time,
            label: format_time(time, hundredths),
        });
        k += 1;
    }
}

/// Format a time as `m:ss`, `h:mm:ss`, optionally with hundredths
pub fn format_time(time: Seconds, hundredths: bool) -> String {
    let total_hundredths = (time.max(0.0) * 100.0).round() as u64;
    let cs = total_hundredths % 100;
    let total_secs = total_hundredths / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    let base = if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    };

    if hundredths {
        format!("{}.{:02}", base, cs)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViewportKind;

    #[test]
    fn test_interval_grows_with_scale() {
        // 512 spp at 44.1kHz is ~86 px/s: 1s ticks are 86px apart
        assert_eq!(tick_interval(512.0, 44100, 60.0), 1.0);
        // 4096 spp is ~10.8 px/s: need 10s
        assert_eq!(tick_interval(4096.0, 44100, 60.0), 10.0);
        // Native resolution: 44100 px/s
        assert_eq!(tick_interval(1.0, 44100, 60.0), 0.01);
    }

    #[test]
    fn test_interval_caps_at_largest() {
        assert_eq!(tick_interval(1e9, 44100, 60.0), 3600.0);
    }

    #[test]
    fn test_ticks_cover_frame() {
        let frame = FrameGeometry {
            kind: ViewportKind::ZoomView,
            frame_offset: 0,
            width: 800,
            scale: 512.0,
            sample_rate: 44100,
        };
        let mut ticks = Vec::new();
        compute_ticks(&frame, 60.0, &mut ticks);

        // ~9.29s visible, ticks at 0..=9
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks[0].x, 0.0);
        assert_eq!(ticks[1].label, "0:01");
        assert!(ticks.iter().all(|t| t.x >= 0.0 && t.x <= 800.0));
    }

    #[test]
    fn test_ticks_start_at_multiple() {
        let frame = FrameGeometry {
            kind: ViewportKind::ZoomView,
            frame_offset: 130,
            width: 200,
            scale: 512.0,
            sample_rate: 44100,
        };
        let mut ticks = Vec::new();
        compute_ticks(&frame, 60.0, &mut ticks);
        assert_eq!(ticks[0].time, 2.0);
        assert_eq!(ticks[0].x, (172 - 130) as f32);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0, false), "0:00");
        assert_eq!(format_time(75.0, false), "1:15");
        assert_eq!(format_time(3723.0, false), "1:02:03");
        assert_eq!(format_time(1.5, true), "0:01.50");
        assert_eq!(format_time(-3.0, false), "0:00");
    }
}
