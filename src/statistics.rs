use crate::{AnalysisError, Result};
use serde::Serialize;

#[derive(Debug, Serialize, Copy, Clone, PartialEq)]
pub struct SignalStatistics {
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
    pub range: f32,
}

/// Equal-width amplitude distribution over `[min, max]`
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f32>,
    pub counts: Vec<usize>,
}

/// Check a buffer at the boundary before any analysis runs on it
pub fn validate_samples(data: &[f32], expected_len: Option<usize>) -> Result<()> {
    if data.is_empty() {
        return Err(AnalysisError::EmptyBuffer);
    }

    if let Some(expected) = expected_len {
        if data.len() != expected {
            return Err(AnalysisError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
    }

    if let Some((index, &value)) = data.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        return Err(AnalysisError::NonFiniteSample { index, value });
    }

    Ok(())
}

/// Mean, population standard deviation and extrema of the whole buffer
pub fn calculate_stats(data: &[f32]) -> Result<SignalStatistics> {
    if data.is_empty() {
        return Err(AnalysisError::EmptyBuffer);
    }

    let n = data.len() as f64;
    let mean = data.iter().map(|&x| x as f64).sum::<f64>() / n;
    let variance = data
        .iter()
        .map(|&x| {
            let diff = x as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    let min = data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max = data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

    // Rounding can push the f32 mean a hair outside [min, max] on flat input
    let mean = mean as f32;
    let mean = if min <= max { mean.clamp(min, max) } else { mean };

    Ok(SignalStatistics {
        mean,
        std: variance.sqrt() as f32,
        min,
        max,
        range: max - min,
    })
}

/// Elapsed time in seconds for each sample index
pub fn time_axis(len: usize, sample_rate: u32) -> Vec<f32> {
    (0..len).map(|i| i as f32 / sample_rate as f32).collect()
}

pub fn amplitude_histogram(data: &[f32], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(AnalysisError::InvalidConfig(
            "histogram needs at least one bin".to_string(),
        ));
    }
    let stats = calculate_stats(data)?;
    let width = stats.range / bins as f32;

    let edges: Vec<f32> = (0..=bins)
        .map(|i| {
            if i == bins {
                stats.max
            } else {
                stats.min + width * i as f32
            }
        })
        .collect();

    let mut counts = vec![0usize; bins];
    for &x in data {
        let idx = if width > 0.0 {
            (((x - stats.min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}
