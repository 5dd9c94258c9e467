use crate::heart_analysis::PeakDetectionConfig;
use crate::simulator::DEFAULT_SAMPLE_RATE;
use crate::spectral::SpectralConfig;
use crate::AnalysisConfig;
use clap::Parser;
use std::path::PathBuf;

/// Validate synthetic PPG waveforms: statistics, heart rate and spectrum
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Sample file or directory of sample files (one value per line).
    /// Without it the built-in simulator scenarios are analyzed.
    #[arg(help = "Sample file or directory; omit to run the simulator scenarios")]
    pub input_path: Option<PathBuf>,

    /// Sample rate of the buffers in Hz
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Duration of each simulated scenario in seconds
    #[arg(long, default_value = "20.0")]
    pub duration: f32,

    /// Seed for the simulator noise
    #[arg(long, env = "PPG_SEED", default_value = "42")]
    pub seed: u64,

    /// Peak threshold = mean + factor * std
    #[arg(long, default_value = "0.5")]
    pub threshold_std_factor: f32,

    /// Minimum peak distance = floor(sample_rate / divisor) samples
    #[arg(long, default_value = "3.0")]
    pub min_distance_divisor: f32,

    /// Upper edge of the reported spectrum in Hz
    #[arg(long, default_value = "5.0")]
    pub band_max_hz: f32,

    /// Number of bins in the amplitude histogram
    #[arg(long, default_value = "50")]
    pub histogram_bins: usize,

    /// CSV output file prefix (e.g. /path/to/output/prefix)
    #[arg(long)]
    pub csv_output: Option<String>,

    /// Write a JSON summary of every scenario to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,
}

impl Args {
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            peak: PeakDetectionConfig {
                threshold_std_factor: self.threshold_std_factor,
                min_distance_divisor: self.min_distance_divisor,
            },
            spectral: SpectralConfig {
                band_max_hz: self.band_max_hz,
                ..SpectralConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_heuristics() {
        let args = Args::parse_from(["ppg-analyzer"]);
        assert!(args.input_path.is_none());
        assert_eq!(args.sample_rate, 50);
        let config = args.analysis_config();
        assert_eq!(config.peak, PeakDetectionConfig::default());
        assert_eq!(config.spectral, SpectralConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "ppg-analyzer",
            "samples/",
            "--sample-rate",
            "100",
            "--min-distance-divisor",
            "4",
            "--band-max-hz",
            "8",
        ]);
        assert_eq!(args.input_path, Some(PathBuf::from("samples/")));
        let config = args.analysis_config();
        assert_eq!(config.peak.min_distance(args.sample_rate), 25);
        assert_eq!(config.spectral.band_max_hz, 8.0);
    }
}
