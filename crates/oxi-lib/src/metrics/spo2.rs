use crate::signal::{FilteredChannel, Pulse, SampleWindow};
use serde::{Deserialize, Serialize};

/// Empirical ratio-of-ratios calibration, sampled from the standard
/// pulse-oximetry quadratic (-45.060 R^2 + 30.354 R + 94.845) over its
/// physiologically calibrated span. Linear interpolation between entries;
/// ratios outside the table are not extrapolated.
const CALIBRATION: &[(f64, f64)] = &[
    (0.35, 99.95),
    (0.40, 99.78),
    (0.45, 99.38),
    (0.50, 98.76),
    (0.55, 97.91),
    (0.60, 96.84),
    (0.65, 95.54),
    (0.70, 94.01),
    (0.75, 92.26),
    (0.80, 90.29),
    (0.85, 88.09),
    (0.90, 85.66),
    (0.95, 83.01),
    (1.00, 80.14),
    (1.05, 77.04),
    (1.10, 73.71),
    (1.15, 70.16),
    (1.20, 66.38),
    (1.25, 62.38),
    (1.30, 58.15),
    (1.35, 53.70),
    (1.40, 49.02),
    (1.45, 44.12),
    (1.50, 38.99),
    (1.55, 33.64),
    (1.60, 28.06),
    (1.65, 22.25),
    (1.70, 16.22),
    (1.75, 9.97),
    (1.80, 3.49),
];

/// Map a ratio-of-ratios to a saturation percentage, or `None` when the
/// ratio falls outside the calibrated domain.
pub fn spo2_for_ratio(ratio: f64) -> Option<f64> {
    let (lo, _) = CALIBRATION.first().copied()?;
    let (hi, _) = CALIBRATION.last().copied()?;
    if !ratio.is_finite() || ratio < lo || ratio > hi {
        return None;
    }
    for pair in CALIBRATION.windows(2) {
        let (r0, s0) = pair[0];
        let (r1, s1) = pair[1];
        if ratio <= r1 {
            let t = (ratio - r0) / (r1 - r0);
            return Some((s0 + t * (s1 - s0)).clamp(0.0, 100.0));
        }
    }
    None
}

/// Inverse lookup: the ratio a given saturation corresponds to. The table is
/// strictly decreasing so the answer is unique. Used by the synthetic window
/// generator, not by the estimation cycle.
pub fn ratio_for_spo2(percent: f64) -> Option<f64> {
    let (_, s_hi) = CALIBRATION.first().copied()?;
    let (_, s_lo) = CALIBRATION.last().copied()?;
    if !percent.is_finite() || percent > s_hi || percent < s_lo {
        return None;
    }
    for pair in CALIBRATION.windows(2) {
        let (r0, s0) = pair[0];
        let (r1, s1) = pair[1];
        if percent >= s1 {
            let t = (percent - s0) / (s1 - s0);
            return Some(r0 + t * (r1 - r0));
        }
    }
    None
}

/// Saturation estimate for one window. `percent` is only meaningful when
/// `valid` is set; `ratio` is kept for diagnostics either way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpO2Estimate {
    pub percent: i32,
    pub ratio: f64,
    pub valid: bool,
}

impl SpO2Estimate {
    fn invalid(ratio: f64) -> Self {
        Self {
            percent: 0,
            ratio,
            valid: false,
        }
    }
}

/// Ratio-of-ratios saturation estimate across the detected pulses.
///
/// Per pulse: AC is the raw peak-to-valley excursion of each channel, DC is
/// the filter baseline at the peak. Pulse ratios are averaged arithmetically;
/// an extreme pulse pulls the mean, which is the accepted behavior of this
/// estimator rather than something to down-weight. Invalid when fewer than
/// two pulses contribute, any denominator is zero, or the averaged ratio
/// leaves the calibration domain.
pub fn estimate_spo2(
    window: &SampleWindow,
    red: &FilteredChannel,
    ir: &FilteredChannel,
    pulses: &[Pulse],
) -> SpO2Estimate {
    if pulses.len() < 2 {
        return SpO2Estimate::invalid(0.0);
    }
    let mut sum = 0.0;
    for p in pulses {
        let ac_red = (window.red()[p.peak] as f64 - window.red()[p.valley] as f64).abs();
        let ac_ir = (window.ir()[p.peak] as f64 - window.ir()[p.valley] as f64).abs();
        let dc_red = red.baseline[p.peak];
        let dc_ir = ir.baseline[p.peak];
        if dc_red <= 0.0 || dc_ir <= 0.0 || ac_ir == 0.0 {
            return SpO2Estimate::invalid(0.0);
        }
        sum += (ac_red / dc_red) / (ac_ir / dc_ir);
    }
    let ratio = sum / pulses.len() as f64;
    match spo2_for_ratio(ratio) {
        Some(percent) => SpO2Estimate {
            percent: percent.round() as i32,
            ratio,
            valid: true,
        },
        None => SpO2Estimate::invalid(ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::ppg::{detect_extrema, pair_pulses};
    use crate::filters::remove_baseline;
    use std::f64::consts::PI;

    fn synthetic_window(fs: f64, n: usize, f: f64, ir_ac: f64, red_ac: f64) -> SampleWindow {
        let ir: Vec<u32> = (0..n)
            .map(|i| (5000.0 + ir_ac * (2.0 * PI * f * i as f64 / fs).sin()).round() as u32)
            .collect();
        let red: Vec<u32> = (0..n)
            .map(|i| (5000.0 + red_ac * (2.0 * PI * f * i as f64 / fs).sin()).round() as u32)
            .collect();
        SampleWindow::new(red, ir, fs).unwrap()
    }

    fn run(window: &SampleWindow) -> SpO2Estimate {
        let red = remove_baseline(window.red(), window.fs(), 1.0);
        let ir = remove_baseline(window.ir(), window.fs(), 1.0);
        let extrema = detect_extrema(&ir.ac, window.fs(), 1.0, 240.0);
        let pulses = pair_pulses(&extrema);
        estimate_spo2(window, &red, &ir, &pulses)
    }

    #[test]
    fn table_interpolates_known_point() {
        let s = spo2_for_ratio(0.545).unwrap();
        assert!((s - 98.0).abs() < 0.5, "got {s}");
    }

    #[test]
    fn table_rejects_out_of_domain_ratio() {
        assert!(spo2_for_ratio(0.1).is_none());
        assert!(spo2_for_ratio(2.5).is_none());
        assert!(spo2_for_ratio(f64::NAN).is_none());
    }

    #[test]
    fn inverse_lookup_round_trips() {
        for target in [98.0, 90.0, 75.0, 50.0] {
            let r = ratio_for_spo2(target).unwrap();
            let s = spo2_for_ratio(r).unwrap();
            assert!((s - target).abs() < 0.1, "{target} -> {r} -> {s}");
        }
    }

    #[test]
    fn known_ratio_maps_to_expected_saturation() {
        // red AC scaled for a 0.545 ratio-of-ratios, the table point for ~98%
        let window = synthetic_window(25.0, 100, 1.2, 1000.0, 545.0);
        let est = run(&window);
        assert!(est.valid);
        assert!((est.percent - 98).abs() <= 2, "got {}", est.percent);
    }

    #[test]
    fn saturation_stays_in_unit_interval() {
        // ratio near the high edge of the table maps to a few percent, never below 0
        let window = synthetic_window(25.0, 100, 1.2, 1000.0, 1700.0);
        let est = run(&window);
        assert!(est.valid);
        assert!((0..=100).contains(&est.percent));
    }

    #[test]
    fn adversarial_ratio_is_invalid_not_clamped() {
        // red AC far beyond the calibrated span pushes the ratio out of domain
        let window = synthetic_window(25.0, 100, 1.2, 1000.0, 2500.0);
        let est = run(&window);
        assert!(!est.valid);
    }

    #[test]
    fn fewer_than_two_pulses_is_invalid() {
        let window = synthetic_window(25.0, 100, 1.2, 1000.0, 545.0);
        let red = remove_baseline(window.red(), 25.0, 1.0);
        let ir = remove_baseline(window.ir(), 25.0, 1.0);
        let est = estimate_spo2(&window, &red, &ir, &[Pulse { peak: 26, valley: 36 }]);
        assert!(!est.valid);
        let est = estimate_spo2(&window, &red, &ir, &[]);
        assert!(!est.valid);
    }

    #[test]
    fn zero_dc_denominator_is_guarded() {
        let window = synthetic_window(25.0, 100, 1.2, 1000.0, 545.0);
        let mut red = remove_baseline(window.red(), 25.0, 1.0);
        let ir = remove_baseline(window.ir(), 25.0, 1.0);
        red.baseline[26] = 0.0;
        let pulses = [
            Pulse { peak: 26, valley: 36 },
            Pulse { peak: 47, valley: 57 },
        ];
        let est = estimate_spo2(&window, &red, &ir, &pulses);
        assert!(!est.valid);
    }
}
