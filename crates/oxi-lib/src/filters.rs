use crate::signal::FilteredChannel;

/// Trailing moving average with a warm-up correction: early outputs divide by
/// the number of samples actually seen, so the window start carries no step
/// artifact into the AC channel.
pub fn moving_baseline(data: &[f64], win: usize) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let win = win.max(1);
    let mut out = Vec::with_capacity(data.len());
    let mut acc = 0.0;
    for (i, &sample) in data.iter().enumerate() {
        acc += sample;
        if i >= win {
            acc -= data[i - win];
        }
        out.push(acc / win.min(i + 1) as f64);
    }
    out
}

/// Split a raw channel into pulsatile and baseline parts. The averaging
/// window is expressed in seconds so the same configuration holds across
/// front-end sample rates; it is clamped to the channel length.
pub fn remove_baseline(raw: &[u32], fs: f64, window_s: f64) -> FilteredChannel {
    let data: Vec<f64> = raw.iter().map(|&v| v as f64).collect();
    let win = ((window_s * fs).round() as usize).clamp(1, data.len().max(1));
    let baseline = moving_baseline(&data, win);
    let ac = data
        .iter()
        .zip(baseline.iter())
        .map(|(x, b)| x - b)
        .collect();
    FilteredChannel { ac, baseline }
}
