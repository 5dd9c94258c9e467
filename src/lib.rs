pub mod config;
pub mod data_loading;
pub mod heart_analysis;
pub mod output;
pub mod simulator;
pub mod spectral;
pub mod statistics;

use heart_analysis::{HeartMeasures, PeakDetectionConfig};
use log::debug;
use serde::Serialize;
use spectral::{SpectralConfig, Spectrum};
use statistics::SignalStatistics;
use thiserror::Error;

/// Errors raised by the analysis core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid input: sample buffer is empty")]
    EmptyBuffer,

    #[error("invalid input: sample {index} is not finite ({value})")]
    NonFiniteSample { index: usize, value: f32 },

    #[error("invalid input: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Tunables for a full analysis run
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisConfig {
    pub peak: PeakDetectionConfig,
    pub spectral: SpectralConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PpgAnalysis {
    pub sample_rate: u32,
    pub sample_count: usize,
    pub statistics: SignalStatistics,
    pub peaks: Vec<usize>,
    pub measures: HeartMeasures,
    pub spectrum: Spectrum,
    pub dominant_frequency_hz: Option<f32>,
}

impl PpgAnalysis {
    /// Heart rate implied by the strongest in-band spectral component
    pub fn spectral_heart_rate(&self) -> Option<f32> {
        self.dominant_frequency_hz.map(|f| f * 60.0)
    }
}

/// Run statistics, peak detection and spectral characterization over one buffer.
///
/// The buffer is validated first, so empty input or non-finite samples are
/// rejected before any component sees them.
pub fn analyze_signal(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<PpgAnalysis> {
    statistics::validate_samples(samples, None)?;
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }

    let stats = statistics::calculate_stats(samples)?;
    debug!(
        "stats - mean: {:.4}, std: {:.4}, range: [{:.4}, {:.4}]",
        stats.mean, stats.std, stats.min, stats.max
    );

    let (peaks, measures) = heart_analysis::process(samples, sample_rate, &stats, &config.peak)?;
    let spectrum = spectral::compute_spectrum(samples, sample_rate, &config.spectral)?;
    let dominant_frequency_hz = spectrum.dominant_frequency();

    Ok(PpgAnalysis {
        sample_rate,
        sample_count: samples.len(),
        statistics: stats,
        peaks,
        measures,
        spectrum,
        dominant_frequency_hz,
    })
}
