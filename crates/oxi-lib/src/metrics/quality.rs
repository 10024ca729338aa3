use crate::filters::remove_baseline;
use crate::signal::SampleWindow;
use realfft::RealFftPlanner;

/// Signal-quality indices for one PPG window. Diagnostic only: the validity
/// gate decides from pulse count, autocorrelation confidence and calibration
/// domain, not from these.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PpgQuality {
    /// Peak-to-peak AC over mean DC, in percent.
    pub perfusion_index: f64,
    pub kurtosis: f64,
    pub spectral_entropy: f64,
    pub spike_ratio: f64,
}

impl PpgQuality {
    pub fn is_acceptable(&self) -> bool {
        self.perfusion_index >= 0.05 && self.spike_ratio <= 0.05
    }
}

pub fn compute_kurtosis(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = data.iter().copied().sum::<f64>() / data.len() as f64;
    let m2 = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = data.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / data.len() as f64;
    m4 / (m2 * m2)
}

pub fn compute_spectral_entropy(data: &[f64]) -> f64 {
    let n = data.len();
    if n == 0 {
        return 0.0;
    }
    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer = data.to_vec();
    let mut spectrum = fft.make_output_vec();
    if fft.process(&mut buffer, &mut spectrum).is_err() {
        return 0.0;
    }
    let mut total_power = 0.0;
    let powers: Vec<f64> = spectrum
        .iter()
        .map(|c| {
            let p = c.norm_sqr();
            total_power += p;
            p
        })
        .collect();
    if total_power == 0.0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for power in powers {
        if power <= 0.0 {
            continue;
        }
        let p = power / total_power;
        entropy -= p * p.log2();
    }
    entropy
}

/// Fraction of sample-to-sample steps larger than mean + 2 sd of the step
/// sizes; motion artifacts show up as a burst of outsized steps.
pub fn compute_spike_ratio(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let diffs: Vec<f64> = data.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let mean = diffs.iter().copied().sum::<f64>() / diffs.len() as f64;
    let sd = (diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / diffs.len() as f64).sqrt();
    if sd == 0.0 {
        return 0.0;
    }
    let threshold = mean + 2.0 * sd;
    let spikes = diffs.iter().filter(|&&d| d > threshold).count();
    spikes as f64 / diffs.len() as f64
}

pub fn compute_perfusion_index(ac: &[f64], baseline: &[f64]) -> f64 {
    if ac.is_empty() || baseline.is_empty() {
        return 0.0;
    }
    let max = ac.iter().copied().fold(f64::MIN, f64::max);
    let min = ac.iter().copied().fold(f64::MAX, f64::min);
    let dc = baseline.iter().copied().sum::<f64>() / baseline.len() as f64;
    if dc <= 0.0 {
        return 0.0;
    }
    (max - min) / dc * 100.0
}

/// Evaluate all quality indices on the infrared channel of a window.
pub fn evaluate_quality(window: &SampleWindow, baseline_window_s: f64) -> PpgQuality {
    let ir = remove_baseline(window.ir(), window.fs(), baseline_window_s);
    PpgQuality {
        perfusion_index: compute_perfusion_index(&ir.ac, &ir.baseline),
        kurtosis: compute_kurtosis(&ir.ac),
        spectral_entropy: compute_spectral_entropy(&ir.ac),
        spike_ratio: compute_spike_ratio(&ir.ac),
    }
}
