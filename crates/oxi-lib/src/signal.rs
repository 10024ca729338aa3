use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest window the estimator accepts. One second of samples at the
/// slowest supported front-end rate, enough for two pulse periods across
/// the plausible heart-rate band.
pub const MIN_WINDOW_LEN: usize = 25;

/// Contract violations at the window boundary. These are collaborator bugs,
/// not runtime conditions: a window that constructs is well formed for the
/// whole estimation cycle.
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("red and infrared channels differ in length ({red} vs {ir})")]
    LengthMismatch { red: usize, ir: usize },
    #[error("window of {len} samples is below the minimum of {min}")]
    TooShort { len: usize, min: usize },
    #[error("sample rate {fs} is not a positive finite frequency")]
    BadSampleRate { fs: f64 },
}

/// One completed acquisition window of paired red/infrared PPG samples.
///
/// Fields are private so the length and rate invariants checked in [`SampleWindow::new`]
/// hold for the lifetime of the value; the estimator never re-validates mid-cycle.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    fs: f64,
    red: Vec<u32>,
    ir: Vec<u32>,
}

impl SampleWindow {
    pub fn new(red: Vec<u32>, ir: Vec<u32>, fs: f64) -> Result<Self, WindowError> {
        if red.len() != ir.len() {
            return Err(WindowError::LengthMismatch {
                red: red.len(),
                ir: ir.len(),
            });
        }
        if red.len() < MIN_WINDOW_LEN {
            return Err(WindowError::TooShort {
                len: red.len(),
                min: MIN_WINDOW_LEN,
            });
        }
        if !fs.is_finite() || fs <= 0.0 {
            return Err(WindowError::BadSampleRate { fs });
        }
        Ok(Self { fs, red, ir })
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn len(&self) -> usize {
        self.ir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ir.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.ir.len() as f64 / self.fs
    }

    pub fn red(&self) -> &[u32] {
        &self.red
    }

    pub fn ir(&self) -> &[u32] {
        &self.ir
    }
}

/// AC/DC split of one raw channel, same length as its source.
#[derive(Debug, Clone)]
pub struct FilteredChannel {
    /// Pulsatile component after baseline removal.
    pub ac: Vec<f64>,
    /// Instantaneous DC baseline, kept for the SpO2 ratio denominators.
    pub baseline: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremumKind {
    Peak,
    Valley,
}

/// A detected pulsatile extremum in a filtered channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Extremum {
    pub index: usize,
    pub amplitude: f64,
    pub kind: ExtremumKind,
}

/// One AC excursion: an accepted peak and the valley that follows it.
/// Indices point into the originating window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pulse {
    pub peak: usize,
    pub valley: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_channels() {
        let err = SampleWindow::new(vec![0; 30], vec![0; 29], 25.0).unwrap_err();
        assert_eq!(err, WindowError::LengthMismatch { red: 30, ir: 29 });
    }

    #[test]
    fn rejects_short_window() {
        let err = SampleWindow::new(vec![0; 10], vec![0; 10], 25.0).unwrap_err();
        assert_eq!(
            err,
            WindowError::TooShort {
                len: 10,
                min: MIN_WINDOW_LEN
            }
        );
    }

    #[test]
    fn rejects_bad_sample_rate() {
        assert!(SampleWindow::new(vec![0; 30], vec![0; 30], 0.0).is_err());
        assert!(SampleWindow::new(vec![0; 30], vec![0; 30], f64::NAN).is_err());
    }

    #[test]
    fn accepts_minimum_window() {
        let w = SampleWindow::new(vec![1; MIN_WINDOW_LEN], vec![2; MIN_WINDOW_LEN], 25.0).unwrap();
        assert_eq!(w.len(), MIN_WINDOW_LEN);
        assert!((w.duration() - 1.0).abs() < 1e-9);
    }
}
