use crate::{AnalysisError, Result};
use log::debug;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

/// Frequency band kept in the reported spectrum, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralConfig {
    pub band_min_hz: f32,
    pub band_max_hz: f32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        // 0-5 Hz covers 0-300 bpm fundamentals plus low harmonics
        Self {
            band_min_hz: 0.0,
            band_max_hz: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f32>,
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of the strongest bin above DC
    pub fn dominant_frequency(&self) -> Option<f32> {
        self.frequencies
            .iter()
            .zip(self.magnitudes.iter())
            .filter(|(&f, _)| f > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&f, _)| f)
    }
}

/// Bin centre frequencies in standard FFT order: non-negative bins first,
/// then the negative half.
pub fn fft_frequencies(n: usize, sample_rate: u32) -> Vec<f32> {
    let fs = sample_rate as f32;
    let positive_bins = (n + 1) / 2;
    (0..n)
        .map(|k| {
            if k < positive_bins {
                k as f32 * fs / n as f32
            } else {
                -((n - k) as f32) * fs / n as f32
            }
        })
        .collect()
}

/// Magnitude spectrum of the whole buffer, restricted to the configured band
pub fn compute_spectrum(
    signal: &[f32],
    sample_rate: u32,
    config: &SpectralConfig,
) -> Result<Spectrum> {
    if signal.is_empty() {
        return Err(AnalysisError::EmptyBuffer);
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }
    if !(config.band_min_hz <= config.band_max_hz) {
        return Err(AnalysisError::InvalidConfig(format!(
            "band [{}, {}] Hz is empty",
            config.band_min_hz, config.band_max_hz
        )));
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(signal.len());

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft.process(&mut buffer);

    let freqs = fft_frequencies(signal.len(), sample_rate);
    let (frequencies, magnitudes): (Vec<f32>, Vec<f32>) = freqs
        .iter()
        .zip(buffer.iter())
        .filter(|(&f, _)| f >= config.band_min_hz && f <= config.band_max_hz)
        .map(|(&f, c)| (f, c.norm()))
        .unzip();

    debug!(
        "spectrum - {} bins, resolution {:.3} Hz, {} bins in [{}, {}] Hz",
        signal.len(),
        sample_rate as f32 / signal.len() as f32,
        frequencies.len(),
        config.band_min_hz,
        config.band_max_hz
    );

    Ok(Spectrum {
        frequencies,
        magnitudes,
    })
}
