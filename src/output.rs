use crate::statistics::{self, Histogram};
use crate::PpgAnalysis;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Outcome of analyzing one scenario or input file
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub target_hr_bpm: Option<f32>,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PpgAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioReport {
    pub fn success(name: &str, target_hr_bpm: Option<f32>, analysis: PpgAnalysis) -> Self {
        Self {
            name: name.to_string(),
            target_hr_bpm,
            generated_at: Utc::now(),
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failure(name: &str, target_hr_bpm: Option<f32>, error: &anyhow::Error) -> Self {
        Self {
            name: name.to_string(),
            target_hr_bpm,
            generated_at: Utc::now(),
            analysis: None,
            error: Some(format!("{:#}", error)),
        }
    }
}

/// "Rest - Clean" -> "rest_-_clean"
pub fn scenario_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

pub fn print_summary(name: &str, target_hr_bpm: Option<f32>, analysis: &PpgAnalysis) {
    let stats = &analysis.statistics;
    let measures = &analysis.measures;

    println!("\n{}", name);
    println!("{}", "-".repeat(name.len().max(40)));
    println!(
        "  Samples:      {} @ {} Hz ({:.1} s)",
        analysis.sample_count,
        analysis.sample_rate,
        analysis.sample_count as f32 / analysis.sample_rate as f32
    );
    println!("  Mean:         {:.4}", stats.mean);
    println!("  Std Dev:      {:.4}", stats.std);
    println!(
        "  Range:        {:.4} ({:.4} - {:.4})",
        stats.range, stats.min, stats.max
    );
    println!("  Peaks:        {}", measures.peak_count);

    match target_hr_bpm {
        Some(target) => println!(
            "  Est. HR:      {:.1} bpm (Target: {:.0} bpm)",
            measures.bpm, target
        ),
        None => println!("  Est. HR:      {:.1} bpm", measures.bpm),
    }

    if measures.has_estimate() {
        println!(
            "  IBI:          {:.0} ms (SDNN {:.1} ms, RMSSD {:.1} ms)",
            measures.ibi_ms, measures.sdnn_ms, measures.rmssd_ms
        );
    } else {
        println!("  IBI:          --");
    }

    match analysis.dominant_frequency_hz {
        Some(freq) => println!(
            "  Spectral peak: {:.2} Hz ({:.1} bpm)",
            freq,
            freq * 60.0
        ),
        None => println!("  Spectral peak: --"),
    }
}

fn output_path(base_path: &str, name: &str, kind: &str) -> Result<PathBuf> {
    let path = Path::new(base_path);
    let dir = path.parent().unwrap_or(Path::new("."));

    // Create directory if it doesn't exist
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ppg_analysis");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");

    let filename = format!("{}_{}_{}.{}", stem, scenario_slug(name), kind, ext);
    Ok(dir.join(filename))
}

/// Write the time series with peak markers, the band-limited spectrum and the
/// amplitude histogram as three CSV files next to `base_path`.
pub fn write_analysis_to_csv(
    base_path: &str,
    name: &str,
    samples: &[f32],
    analysis: &PpgAnalysis,
    histogram: &Histogram,
) -> Result<Vec<PathBuf>> {
    let signal_path = output_path(base_path, name, "signal")?;
    info!("Writing signal to {}", signal_path.display());
    let mut writer = csv::Writer::from_writer(File::create(&signal_path)?);
    writer.write_record(["time_s", "amplitude", "is_peak"])?;
    let times = statistics::time_axis(samples.len(), analysis.sample_rate);
    for (i, (t, x)) in times.iter().zip(samples.iter()).enumerate() {
        let is_peak = analysis.peaks.binary_search(&i).is_ok();
        writer.write_record(&[
            format!("{:.3}", t),
            x.to_string(),
            (is_peak as u8).to_string(),
        ])?;
    }
    writer.flush()?;

    let spectrum_path = output_path(base_path, name, "spectrum")?;
    info!("Writing spectrum to {}", spectrum_path.display());
    let mut writer = csv::Writer::from_writer(File::create(&spectrum_path)?);
    writer.write_record(["frequency_hz", "magnitude"])?;
    for (f, m) in analysis
        .spectrum
        .frequencies
        .iter()
        .zip(analysis.spectrum.magnitudes.iter())
    {
        writer.write_record(&[f.to_string(), m.to_string()])?;
    }
    writer.flush()?;

    let histogram_path = output_path(base_path, name, "histogram")?;
    info!("Writing histogram to {}", histogram_path.display());
    let mut writer = csv::Writer::from_writer(File::create(&histogram_path)?);
    writer.write_record(["bin_start", "bin_end", "count"])?;
    for (edge, count) in histogram.edges.windows(2).zip(histogram.counts.iter()) {
        writer.write_record(&[edge[0].to_string(), edge[1].to_string(), count.to_string()])?;
    }
    writer.flush()?;

    Ok(vec![signal_path, spectrum_path, histogram_path])
}

pub fn write_summary_json(path: &Path, reports: &[ScenarioReport]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary file {}", path.display()))?;
    serde_json::to_writer_pretty(file, reports)?;
    info!("Wrote summary of {} runs to {}", reports.len(), path.display());
    Ok(())
}
