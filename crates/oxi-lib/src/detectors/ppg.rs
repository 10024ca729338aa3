use crate::signal::{Extremum, ExtremumKind, Pulse};

/// Find pulsatile extrema in a filtered (AC-only) channel.
///
/// A candidate peak is a local maximum at or above `mean + threshold_scale * std`
/// of the channel. The refractory gap between accepted peaks is the shortest
/// plausible interbeat interval at `max_bpm`; a taller candidate inside the gap
/// replaces the previous acceptance instead of double-counting it. Valleys are
/// the minima between consecutive accepted peaks, so the returned sequence is
/// ordered by index and strictly alternates peak/valley.
pub fn detect_extrema(ac: &[f64], fs: f64, threshold_scale: f64, max_bpm: f64) -> Vec<Extremum> {
    if ac.len() < 3 {
        return Vec::new();
    }
    let n = ac.len() as f64;
    let mean = ac.iter().sum::<f64>() / n;
    let std = (ac.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std == 0.0 {
        // no pulsatile content
        return Vec::new();
    }
    let threshold = mean + threshold_scale * std;
    let refractory = ((fs * 60.0 / max_bpm.max(1.0)).round() as usize).max(1);

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..ac.len() - 1 {
        if ac[i] > ac[i - 1] && ac[i] >= ac[i + 1] && ac[i] >= threshold {
            match peaks.last_mut() {
                Some(last) if i - *last < refractory => {
                    if ac[i] > ac[*last] {
                        *last = i;
                    }
                }
                _ => peaks.push(i),
            }
        }
    }

    let mut extrema = Vec::with_capacity(peaks.len() * 2);
    for (k, &peak) in peaks.iter().enumerate() {
        extrema.push(Extremum {
            index: peak,
            amplitude: ac[peak],
            kind: ExtremumKind::Peak,
        });
        if let Some(&next) = peaks.get(k + 1) {
            let valley = (peak + 1..next)
                .min_by(|&a, &b| ac[a].total_cmp(&ac[b]))
                .unwrap_or(peak);
            if valley > peak {
                extrema.push(Extremum {
                    index: valley,
                    amplitude: ac[valley],
                    kind: ExtremumKind::Valley,
                });
            }
        }
    }
    extrema
}

/// Pair each peak with the valley that follows it. Fewer than two peaks in
/// the window leaves nothing to pair; the empty list is the "insufficient
/// data" signal for the validity gate, never an error.
pub fn pair_pulses(extrema: &[Extremum]) -> Vec<Pulse> {
    let mut pulses = Vec::new();
    for pair in extrema.windows(2) {
        if pair[0].kind == ExtremumKind::Peak && pair[1].kind == ExtremumKind::Valley {
            pulses.push(Pulse {
                peak: pair[0].index,
                valley: pair[1].index,
            });
        }
    }
    pulses
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine_ac(fs: f64, f: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1000.0 * (2.0 * PI * f * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn finds_sine_peaks_with_alternating_valleys() {
        let ac = sine_ac(25.0, 1.2, 100);
        let extrema = detect_extrema(&ac, 25.0, 1.0, 240.0);
        let peaks = extrema
            .iter()
            .filter(|e| e.kind == ExtremumKind::Peak)
            .count();
        assert!((4..=6).contains(&peaks), "unexpected peak count {peaks}");
        for pair in extrema.windows(2) {
            assert!(pair[0].index < pair[1].index);
            assert_ne!(pair[0].kind, pair[1].kind, "kinds must alternate");
        }
    }

    #[test]
    fn flat_channel_has_no_extrema() {
        let ac = vec![0.0; 100];
        assert!(detect_extrema(&ac, 25.0, 1.0, 240.0).is_empty());
    }

    #[test]
    fn refractory_keeps_taller_of_close_candidates() {
        // two humps 3 samples apart, second taller; refractory at 240 bpm/25 Hz is 6
        let mut ac = vec![0.0; 50];
        ac[20] = 5.0;
        ac[23] = 8.0;
        let extrema = detect_extrema(&ac, 25.0, 1.0, 240.0);
        let peaks: Vec<_> = extrema
            .iter()
            .filter(|e| e.kind == ExtremumKind::Peak)
            .collect();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 23);
    }

    #[test]
    fn single_peak_yields_no_pulses() {
        let mut ac = vec![0.0; 100];
        ac[50] = 10.0;
        let extrema = detect_extrema(&ac, 25.0, 1.0, 240.0);
        assert_eq!(extrema.len(), 1);
        assert!(pair_pulses(&extrema).is_empty());
    }

    #[test]
    fn pulses_pair_each_peak_with_following_valley() {
        let ac = sine_ac(25.0, 1.2, 100);
        let extrema = detect_extrema(&ac, 25.0, 1.0, 240.0);
        let pulses = pair_pulses(&extrema);
        let peaks = extrema
            .iter()
            .filter(|e| e.kind == ExtremumKind::Peak)
            .count();
        assert_eq!(pulses.len(), peaks - 1);
        for p in &pulses {
            assert!(p.peak < p.valley);
        }
    }
}
