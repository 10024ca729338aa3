use crate::signal::{Extremum, ExtremumKind, FilteredChannel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Scatter(ScatterSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

/// AC waveform of a filtered channel plus markers at the detected extrema.
pub fn figure_from_detection(fs: f64, channel: &FilteredChannel, extrema: &[Extremum]) -> Figure {
    let dt = 1.0 / fs.max(1.0);
    let mut fig = Figure::new(Some("PPG pulsatile component".into()));
    fig.x.label = Some("time (s)".into());
    fig.y.label = Some("AC amplitude".into());
    let points: Vec<[f64; 2]> = channel
        .ac
        .iter()
        .enumerate()
        .map(|(i, v)| [i as f64 * dt, *v])
        .collect();
    fig.add_series(Series::Line(LineSeries {
        name: "infrared AC".into(),
        points: decimate_points(&points, 2048),
        style: Style {
            width: 1.4,
            color: Color(0x3366CC),
        },
    }));
    for (kind, color) in [
        (ExtremumKind::Peak, 0xCC3333),
        (ExtremumKind::Valley, 0x33AA55),
    ] {
        let marks: Vec<[f64; 2]> = extrema
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| [e.index as f64 * dt, e.amplitude])
            .collect();
        if !marks.is_empty() {
            fig.add_series(Series::Scatter(ScatterSeries {
                name: match kind {
                    ExtremumKind::Peak => "peaks".into(),
                    ExtremumKind::Valley => "valleys".into(),
                },
                points: marks,
                style: Style {
                    width: 3.0,
                    color: Color(color),
                },
            }));
        }
    }
    fig
}
