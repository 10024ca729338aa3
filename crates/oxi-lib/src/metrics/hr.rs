use serde::{Deserialize, Serialize};

/// Beat-rate estimate from full-window autocorrelation.
///
/// `confidence` is the normalized correlation at the winning lag, in [-1, 1].
/// A zero-variance or too-short channel reports `bpm == 0` with zero
/// confidence; the validity gate turns that into an invalid reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HrEstimate {
    pub bpm: i32,
    pub confidence: f64,
}

impl HrEstimate {
    fn none() -> Self {
        Self {
            bpm: 0,
            confidence: 0.0,
        }
    }
}

/// Estimate the beat period of a filtered channel by maximizing normalized
/// autocorrelation over the lag range spanning `min_bpm..=max_bpm`.
///
/// Autocorrelation is deliberately independent of the peak list: a single
/// missed or double-counted peak does not move the winning lag. Each lag uses
/// the per-lag unbiased mean so short overlaps near the top of the range are
/// not penalized, and the winning integer lag is refined by parabolic
/// interpolation over its neighbors before conversion to bpm. The reported
/// rate never leaves the `min_bpm..=max_bpm` band.
pub fn estimate_heart_rate(ac: &[f64], fs: f64, min_bpm: f64, max_bpm: f64) -> HrEstimate {
    let n = ac.len();
    if n < 4 || fs <= 0.0 {
        return HrEstimate::none();
    }
    let mean = ac.iter().sum::<f64>() / n as f64;
    let x: Vec<f64> = ac.iter().map(|v| v - mean).collect();
    let r0 = x.iter().map(|v| v * v).sum::<f64>() / n as f64;
    if r0 <= 0.0 {
        return HrEstimate::none();
    }

    let lag_min = ((fs * 60.0 / max_bpm).round() as usize).max(1);
    let lag_max = ((fs * 60.0 / min_bpm).round() as usize).min(n - 2);
    if lag_min > lag_max {
        return HrEstimate::none();
    }

    // One guard lag beyond each end of the band, where the window allows it,
    // so a band-edge winner still refines against real neighbors. Guard lags
    // are computed but never eligible to win.
    let guard_lo = if lag_min > 1 { lag_min - 1 } else { lag_min };
    let guard_hi = (lag_max + 1).min(n - 2);

    let mut corr = vec![0.0; guard_hi + 1];
    let mut best_lag = 0usize;
    let mut best = f64::MIN;
    for lag in guard_lo..=guard_hi {
        let overlap = n - lag;
        let r = (0..overlap).map(|i| x[i] * x[i + lag]).sum::<f64>() / overlap as f64;
        corr[lag] = r / r0;
        if lag < lag_min || lag > lag_max {
            continue;
        }
        if corr[lag] > best {
            best = corr[lag];
            best_lag = lag;
        }
    }
    if best_lag == 0 {
        return HrEstimate::none();
    }

    // Every integer multiple of the true period correlates almost as well as
    // the period itself; the beat lag is the smallest local maximum within
    // reach of the global best, not the global best outright.
    if best > 0.0 {
        let cutoff = 0.9 * best;
        for lag in lag_min..=lag_max {
            let left = if lag > guard_lo { corr[lag - 1] } else { corr[lag] };
            let right = if lag < guard_hi { corr[lag + 1] } else { corr[lag] };
            if corr[lag] >= cutoff && corr[lag] >= left && corr[lag] >= right {
                best_lag = lag;
                break;
            }
        }
    }

    let confidence = corr[best_lag].clamp(-1.0, 1.0);
    let refined = refine_lag(&corr, best_lag, guard_lo, guard_hi);
    let bpm = (60.0 * fs / refined).clamp(min_bpm, max_bpm).round() as i32;
    HrEstimate { bpm, confidence }
}

fn refine_lag(corr: &[f64], lag: usize, guard_lo: usize, guard_hi: usize) -> f64 {
    let b = corr[lag];
    let a = if lag > guard_lo { corr[lag - 1] } else { b };
    let c = if lag < guard_hi { corr[lag + 1] } else { b };
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return lag as f64;
    }
    (lag as f64 + (a - c) / (2.0 * denom)).clamp(guard_lo as f64, guard_hi as f64)
}
