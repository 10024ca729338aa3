use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use oxi_lib::metrics::spo2::ratio_for_spo2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// TOML description of one synthetic acquisition window.
#[derive(Debug, Deserialize, Clone)]
pub struct DesignSpec {
    pub name: String,
    #[serde(default = "default_fs")]
    pub fs: f64,
    #[serde(default = "default_window_len")]
    pub window_len: usize,
    pub hr_bpm: f64,
    pub spo2_percent: f64,
    #[serde(default = "default_ir_dc")]
    pub ir_dc: f64,
    #[serde(default = "default_ir_ac")]
    pub ir_ac: f64,
    #[serde(default = "default_red_dc")]
    pub red_dc: f64,
    /// Uniform noise amplitude added to both channels.
    #[serde(default)]
    pub noise_amp: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_fs() -> f64 {
    25.0
}
fn default_window_len() -> usize {
    100
}
fn default_ir_dc() -> f64 {
    5000.0
}
fn default_ir_ac() -> f64 {
    1000.0
}
fn default_red_dc() -> f64 {
    5000.0
}

/// What the design implies the estimator should read back, written next to
/// the samples so tests and demos can assert against it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WindowManifest {
    pub design: String,
    pub fs: f64,
    pub window_len: usize,
    pub hr_bpm: f64,
    pub spo2_percent: f64,
    pub ratio: f64,
    pub seed: Option<u64>,
}

pub struct WindowBundle {
    pub red: Vec<u32>,
    pub ir: Vec<u32>,
    pub manifest: WindowManifest,
}

pub fn read_design(path: &Path) -> Result<DesignSpec> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read design {}", path.display()))?;
    let design: DesignSpec =
        toml::from_str(&contents).with_context(|| format!("parsing design {}", path.display()))?;
    Ok(design)
}

/// Generate one paired window from a design. The red channel's AC amplitude
/// is derived from the target saturation through the inverse calibration
/// lookup, so running the estimator over the output recovers the design's
/// `hr_bpm` and `spo2_percent`. Seeded noise keeps generation reproducible.
pub fn synthesize_window(design: &DesignSpec) -> Result<WindowBundle> {
    if design.window_len == 0 || design.fs <= 0.0 {
        bail!("design {} has no samples to generate", design.name);
    }
    let ratio = match ratio_for_spo2(design.spo2_percent) {
        Some(r) => r,
        None => bail!(
            "design {}: spo2 {}% is outside the calibration domain",
            design.name,
            design.spo2_percent
        ),
    };
    let red_ac = ratio * design.ir_ac * design.red_dc / design.ir_dc;
    let f = design.hr_bpm / 60.0;
    let mut rng = StdRng::seed_from_u64(design.seed.unwrap_or(0));
    let mut red = Vec::with_capacity(design.window_len);
    let mut ir = Vec::with_capacity(design.window_len);
    for i in 0..design.window_len {
        let phase = 2.0 * std::f64::consts::PI * f * i as f64 / design.fs;
        let s = phase.sin();
        let (nr, ni) = if design.noise_amp > 0.0 {
            (
                rng.gen_range(-design.noise_amp..=design.noise_amp),
                rng.gen_range(-design.noise_amp..=design.noise_amp),
            )
        } else {
            (0.0, 0.0)
        };
        red.push((design.red_dc + red_ac * s + nr).round().max(0.0) as u32);
        ir.push((design.ir_dc + design.ir_ac * s + ni).round().max(0.0) as u32);
    }
    let manifest = WindowManifest {
        design: design.name.clone(),
        fs: design.fs,
        window_len: design.window_len,
        hr_bpm: design.hr_bpm,
        spo2_percent: design.spo2_percent,
        ratio,
        seed: design.seed,
    };
    Ok(WindowBundle { red, ir, manifest })
}

pub fn write_window_csv(path: &Path, red: &[u32], ir: &[u32]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("creating window {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(["red", "ir"])?;
    for (r, i) in red.iter().zip(ir.iter()) {
        writer.write_record([r.to_string(), i.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WindowRow {
    red: u32,
    ir: u32,
}

pub fn read_window_csv(path: &Path) -> Result<(Vec<u32>, Vec<u32>)> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening window {}", path.display()))?;
    let mut red = Vec::new();
    let mut ir = Vec::new();
    for (idx, row) in reader.deserialize::<WindowRow>().enumerate() {
        let row = row.with_context(|| format!("parsing sample row {}", idx + 1))?;
        red.push(row.red);
        ir.push(row.ir);
    }
    Ok((red, ir))
}

pub fn write_manifest(path: &Path, manifest: &WindowManifest) -> Result<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, manifest)?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<WindowManifest> {
    let file =
        fs::File::open(path).with_context(|| format!("opening manifest {}", path.display()))?;
    let manifest = serde_json::from_reader::<_, WindowManifest>(file)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    Ok(manifest)
}

/// Write a bundle as `window.csv` + `window.json` under `dir`.
pub fn write_bundle(dir: &Path, bundle: &WindowBundle) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_window_csv(&dir.join("window.csv"), &bundle.red, &bundle.ir)?;
    write_manifest(&dir.join("window.json"), &bundle.manifest)?;
    Ok(())
}
