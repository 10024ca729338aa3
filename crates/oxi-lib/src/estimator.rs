use crate::detectors::ppg::{detect_extrema, pair_pulses};
use crate::filters::remove_baseline;
use crate::metrics::hr::estimate_heart_rate;
use crate::metrics::spo2::estimate_spo2;
use crate::signal::SampleWindow;
use log::debug;
use serde::{Deserialize, Serialize};

/// Tunable surface of the estimation cycle. Everything is expressed relative
/// to the window's sample rate so one configuration serves any front end.
#[derive(Debug, Clone, Copy)]
pub struct VitalsConfig {
    /// Baseline moving-average length (seconds). Long enough to straddle a
    /// pulse period, short enough to track drift.
    pub baseline_window_s: f64,
    /// Peak threshold in standard deviations above the channel mean.
    pub threshold_scale: f64,
    /// Slow end of the autocorrelation search band.
    pub min_bpm: f64,
    /// Fast end of the band; also sets the detector's refractory gap.
    pub max_bpm: f64,
    /// Minimum normalized autocorrelation for a heart-rate reading to count.
    pub min_confidence: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            baseline_window_s: 1.0,
            threshold_scale: 1.0,
            min_bpm: 40.0,
            max_bpm: 240.0,
            min_confidence: 0.3,
        }
    }
}

/// Result of one estimation cycle. The numeric fields are only meaningful
/// when their validity flag is set; a collaborator rendering this value must
/// report "no result" for an invalid field, never the number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsEstimate {
    pub heart_rate_bpm: i32,
    pub heart_rate_valid: bool,
    pub spo2_percent: i32,
    pub spo2_valid: bool,
    pub hr_confidence: f64,
    pub pulse_count: usize,
}

/// Run one estimation cycle over a completed window.
///
/// The cycle is a pure function of its input: filter both channels, detect
/// pulses on infrared, estimate rate and saturation, then gate. Nothing is
/// carried between calls and no stage performs I/O, so results for a window
/// sequence come out in window order.
pub fn estimate_vitals(window: &SampleWindow, cfg: &VitalsConfig) -> VitalsEstimate {
    let red = remove_baseline(window.red(), window.fs(), cfg.baseline_window_s);
    let ir = remove_baseline(window.ir(), window.fs(), cfg.baseline_window_s);

    let extrema = detect_extrema(&ir.ac, window.fs(), cfg.threshold_scale, cfg.max_bpm);
    let pulses = pair_pulses(&extrema);
    debug!(
        "cycle: {} samples at {} Hz, {} extrema, {} pulses",
        window.len(),
        window.fs(),
        extrema.len(),
        pulses.len()
    );

    let hr = estimate_heart_rate(&ir.ac, window.fs(), cfg.min_bpm, cfg.max_bpm);
    let spo2 = estimate_spo2(window, &red, &ir, &pulses);
    debug!(
        "cycle: hr {} bpm (confidence {:.3}), spo2 {}% (ratio {:.3})",
        hr.bpm, hr.confidence, spo2.percent, spo2.ratio
    );

    // Validity gate. A saturation estimate without a credible pulse is not
    // reported even when the arithmetic produced a plausible number.
    let heart_rate_valid = !pulses.is_empty() && hr.confidence >= cfg.min_confidence;
    let spo2_valid = spo2.valid && heart_rate_valid;

    VitalsEstimate {
        heart_rate_bpm: hr.bpm,
        heart_rate_valid,
        spo2_percent: spo2.percent,
        spo2_valid,
        hr_confidence: hr.confidence,
        pulse_count: pulses.len(),
    }
}
