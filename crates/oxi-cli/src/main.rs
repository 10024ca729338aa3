use anyhow::Result;
use clap::{Parser, Subcommand};
use oxi_lib::{
    detectors::ppg::{detect_extrema, pair_pulses},
    estimator::{estimate_vitals, VitalsConfig, VitalsEstimate},
    filters::remove_baseline,
    io::text as text_io,
    metrics::quality::evaluate_quality,
    plot::{figure_from_detection, Figure, Series},
    signal::{Extremum, Pulse, SampleWindow},
};
use plotters::prelude::*;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "oxi",
    version,
    about = "Pulse-oximetry HR/SpO2 estimation tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate heart rate and SpO2 from a paired red,ir window
    Estimate {
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        baseline_window_s: f64,
        #[arg(long, default_value_t = 1.0)]
        threshold_scale: f64,
        #[arg(long, default_value_t = 40.0)]
        min_bpm: f64,
        #[arg(long, default_value_t = 240.0)]
        max_bpm: f64,
        #[arg(long, default_value_t = 0.3)]
        min_confidence: f64,
        /// Window file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        /// Emit the transport-style line with null for invalid readings
        #[arg(long)]
        report: bool,
    },
    /// Detect pulsatile extrema and peak/valley pulse pairs
    FindPulses {
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        baseline_window_s: f64,
        #[arg(long, default_value_t = 1.0)]
        threshold_scale: f64,
        #[arg(long, default_value_t = 240.0)]
        max_bpm: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Signal-quality indices for the infrared channel
    Quality {
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        baseline_window_s: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Render the filtered waveform and detected extrema to a PNG
    Plot {
        #[arg(long, default_value_t = 25.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        baseline_window_s: f64,
        #[arg(long, default_value_t = 1.0)]
        threshold_scale: f64,
        #[arg(long, default_value_t = 240.0)]
        max_bpm: f64,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Generate a synthetic window bundle from a TOML design
    Simulate {
        #[arg(long)]
        design: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Estimate {
            fs,
            baseline_window_s,
            threshold_scale,
            min_bpm,
            max_bpm,
            min_confidence,
            input,
            report,
        } => {
            let cfg = VitalsConfig {
                baseline_window_s,
                threshold_scale,
                min_bpm,
                max_bpm,
                min_confidence,
            };
            cmd_estimate(fs, &cfg, input.as_deref(), report)?
        }
        Commands::FindPulses {
            fs,
            baseline_window_s,
            threshold_scale,
            max_bpm,
            input,
        } => cmd_find_pulses(fs, baseline_window_s, threshold_scale, max_bpm, input.as_deref())?,
        Commands::Quality {
            fs,
            baseline_window_s,
            input,
        } => cmd_quality(fs, baseline_window_s, input.as_deref())?,
        Commands::Plot {
            fs,
            baseline_window_s,
            threshold_scale,
            max_bpm,
            input,
            out,
        } => cmd_plot(
            fs,
            baseline_window_s,
            threshold_scale,
            max_bpm,
            input.as_deref(),
            &out,
        )?,
        Commands::Simulate { design, out } => cmd_simulate(&design, &out)?,
    }
    Ok(())
}

/// Transport rendering of an estimate where invalid readings become null
/// fields, suitable for ingestion by downstream monitors.
#[derive(Serialize)]
struct WireReport {
    #[serde(rename = "HR")]
    hr: Option<i32>,
    #[serde(rename = "SpO2")]
    spo2: Option<i32>,
}

impl From<&VitalsEstimate> for WireReport {
    fn from(est: &VitalsEstimate) -> Self {
        Self {
            hr: est.heart_rate_valid.then_some(est.heart_rate_bpm),
            spo2: est.spo2_valid.then_some(est.spo2_percent),
        }
    }
}

fn read_window(input: Option<&Path>, fs: f64) -> Result<SampleWindow> {
    let (red, ir) = match input {
        Some(path) => text_io::read_pair_series(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_pair_series(&buf)?
        }
    };
    Ok(SampleWindow::new(red, ir, fs)?)
}

fn cmd_estimate(fs: f64, cfg: &VitalsConfig, input: Option<&Path>, report: bool) -> Result<()> {
    let window = read_window(input, fs)?;
    let est = estimate_vitals(&window, cfg);
    if report {
        println!("{}", serde_json::to_string(&WireReport::from(&est))?);
    } else {
        println!("{}", serde_json::to_string(&est)?);
    }
    Ok(())
}

#[derive(Serialize)]
struct PulseReport {
    fs: f64,
    sample_count: usize,
    extrema: Vec<Extremum>,
    pulses: Vec<Pulse>,
}

fn cmd_find_pulses(
    fs: f64,
    baseline_window_s: f64,
    threshold_scale: f64,
    max_bpm: f64,
    input: Option<&Path>,
) -> Result<()> {
    let window = read_window(input, fs)?;
    let ir = remove_baseline(window.ir(), window.fs(), baseline_window_s);
    let extrema = detect_extrema(&ir.ac, window.fs(), threshold_scale, max_bpm);
    let pulses = pair_pulses(&extrema);
    let report = PulseReport {
        fs: window.fs(),
        sample_count: window.len(),
        extrema,
        pulses,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_quality(fs: f64, baseline_window_s: f64, input: Option<&Path>) -> Result<()> {
    let window = read_window(input, fs)?;
    let quality = evaluate_quality(&window, baseline_window_s);
    println!("{}", serde_json::to_string(&quality)?);
    Ok(())
}

fn cmd_plot(
    fs: f64,
    baseline_window_s: f64,
    threshold_scale: f64,
    max_bpm: f64,
    input: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let window = read_window(input, fs)?;
    let ir = remove_baseline(window.ir(), window.fs(), baseline_window_s);
    let extrema = detect_extrema(&ir.ac, window.fs(), threshold_scale, max_bpm);
    let fig = figure_from_detection(window.fs(), &ir, &extrema);
    draw_plotters_figure(out, &fig)?;
    Ok(())
}

fn cmd_simulate(design: &Path, out: &Path) -> Result<()> {
    let design = oxi_run::read_design(design)?;
    let bundle = oxi_run::synthesize_window(&design)?;
    oxi_run::write_bundle(out, &bundle)?;
    println!("{}", serde_json::to_string(&bundle.manifest)?);
    Ok(())
}

fn series_points(series: &Series) -> &[[f64; 2]] {
    match series {
        Series::Line(line) => &line.points,
        Series::Scatter(scatter) => &scatter.points,
    }
}

fn rgb(color: u32) -> RGBColor {
    RGBColor(
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let xs: Vec<f64> = fig
        .series
        .iter()
        .flat_map(|s| series_points(s).iter().map(|p| p[0]))
        .collect();
    let ys: Vec<f64> = fig
        .series
        .iter()
        .flat_map(|s| series_points(s).iter().map(|p| p[1]))
        .collect();
    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(1.0);
    let y_min = ys.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let y_max = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(1.0);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart.configure_mesh().draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    &rgb(line.style.color.0),
                ))?;
            }
            Series::Scatter(scatter) => {
                let color = rgb(scatter.style.color.0);
                let radius = scatter.style.width.max(1.0) as i32;
                chart.draw_series(scatter.points.iter().map(|p| {
                    Circle::new((p[0], p[1]), radius, color.filled())
                }))?;
            }
        }
    }
    root.present()?;
    Ok(())
}
