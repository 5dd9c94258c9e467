use crate::statistics::SignalStatistics;
use crate::{AnalysisError, Result};
use log::{debug, trace};
use serde::Serialize;

/// Heuristics for turning a PPG buffer into a beat list.
///
/// The defaults are tuned for a 50 Hz PPG-shaped waveform: peaks must rise
/// half a standard deviation above the mean, and two beats may not be closer
/// than a third of a second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetectionConfig {
    /// Multiple of the signal std added to the mean to form the height threshold
    pub threshold_std_factor: f32,
    /// `min_distance = floor(sample_rate / min_distance_divisor)`
    pub min_distance_divisor: f32,
}

impl Default for PeakDetectionConfig {
    fn default() -> Self {
        Self {
            threshold_std_factor: 0.5,
            min_distance_divisor: 3.0,
        }
    }
}

impl PeakDetectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_std_factor.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "threshold_std_factor must be finite, got {}",
                self.threshold_std_factor
            )));
        }
        if !(self.min_distance_divisor.is_finite() && self.min_distance_divisor > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_distance_divisor must be positive, got {}",
                self.min_distance_divisor
            )));
        }
        Ok(())
    }

    /// Amplitude a local maximum has to reach to count as a beat
    pub fn threshold(&self, stats: &SignalStatistics) -> f32 {
        stats.mean + self.threshold_std_factor * stats.std
    }

    /// Minimum number of samples between two accepted peaks (at least 1)
    pub fn min_distance(&self, sample_rate: u32) -> usize {
        ((sample_rate as f32 / self.min_distance_divisor).floor() as usize).max(1)
    }
}

/// Beat-level measures derived from the peak list
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct HeartMeasures {
    /// Estimated heart rate, 0 when fewer than two peaks were found
    pub bpm: f32,
    pub peak_count: usize,
    pub ibi_ms: f32,
    pub sdnn_ms: f32,
    pub rmssd_ms: f32,
}

impl HeartMeasures {
    pub fn has_estimate(&self) -> bool {
        self.bpm > 0.0
    }
}

/// Indices of strict local maxima. Flat tops report their middle sample;
/// the first and last samples are never maxima.
fn local_maxima(data: &[f32]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if data.len() < 3 {
        return maxima;
    }

    let i_max = data.len() - 1;
    let mut i = 1;
    while i < i_max {
        if data[i - 1] < data[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && data[i_ahead] == data[i] {
                i_ahead += 1;
            }
            if data[i_ahead] < data[i] {
                let left = i;
                let right = i_ahead - 1;
                maxima.push((left + right) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }

    maxima
}

/// Drop candidates that sit closer than `distance` samples to a higher one.
///
/// Candidates are visited from the highest amplitude down (lower index first
/// on ties), so within any exclusion window the tallest peak survives.
fn select_by_distance(data: &[f32], candidates: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || candidates.len() < 2 {
        return candidates.to_vec();
    }

    let mut keep = vec![true; candidates.len()];
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        data[candidates[b]]
            .total_cmp(&data[candidates[a]])
            .then(a.cmp(&b))
    });

    for &j in &order {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && candidates[j] - candidates[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }

        let mut k = j + 1;
        while k < candidates.len() && candidates[k] - candidates[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    candidates
        .iter()
        .zip(keep.iter())
        .filter(|(_, &kept)| kept)
        .map(|(&idx, _)| idx)
        .collect()
}

/// Detect beats: local maxima at or above `threshold`, at least
/// `min_distance` samples apart. Returns ascending sample indices.
pub fn detect_peaks(data: &[f32], threshold: f32, min_distance: usize) -> Vec<usize> {
    let maxima = local_maxima(data);
    let candidates: Vec<usize> = maxima
        .iter()
        .copied()
        .filter(|&i| data[i] >= threshold)
        .collect();

    trace!(
        "local maxima: {}, above threshold {:.4}: {}",
        maxima.len(),
        threshold,
        candidates.len()
    );

    let peaks = select_by_distance(data, &candidates, min_distance);

    debug!(
        "detect_peaks - threshold: {:.4}, min_distance: {} samples, candidates: {}, kept: {}",
        threshold,
        min_distance,
        candidates.len(),
        peaks.len()
    );

    peaks
}

/// Inter-peak intervals in milliseconds
pub fn calc_rr(peaklist: &[usize], sample_rate: u32) -> Vec<f32> {
    peaklist
        .windows(2)
        .map(|window| (window[1] - window[0]) as f32 * 1000.0 / sample_rate as f32)
        .collect()
}

/// Heart rate and interval measures from an RR list (ms)
fn calc_ts_measures(rr_list: &[f32], peak_count: usize) -> HeartMeasures {
    if rr_list.is_empty() {
        return HeartMeasures {
            bpm: 0.0,
            peak_count,
            ibi_ms: 0.0,
            sdnn_ms: 0.0,
            rmssd_ms: 0.0,
        };
    }

    let mean_rr = rr_list.iter().sum::<f32>() / rr_list.len() as f32;
    let sdnn = if rr_list.len() > 1 {
        (rr_list
            .iter()
            .map(|&x| {
                let diff = x - mean_rr;
                diff * diff
            })
            .sum::<f32>()
            / (rr_list.len() - 1) as f32)
            .sqrt()
    } else {
        0.0
    };

    let rr_sqdiff: Vec<f32> = rr_list
        .windows(2)
        .map(|w| (w[1] - w[0]) * (w[1] - w[0]))
        .collect();
    let rmssd = if !rr_sqdiff.is_empty() {
        (rr_sqdiff.iter().sum::<f32>() / rr_sqdiff.len() as f32).sqrt()
    } else {
        0.0
    };

    HeartMeasures {
        bpm: if mean_rr > 0.0 {
            60_000.0 / mean_rr
        } else {
            0.0
        },
        peak_count,
        ibi_ms: mean_rr,
        sdnn_ms: sdnn,
        rmssd_ms: rmssd,
    }
}

/// Find peaks and estimate heart rate for one buffer.
///
/// Fewer than two peaks is a normal outcome and yields `bpm == 0`.
pub fn process(
    signal: &[f32],
    sample_rate: u32,
    stats: &SignalStatistics,
    config: &PeakDetectionConfig,
) -> Result<(Vec<usize>, HeartMeasures)> {
    if signal.is_empty() {
        return Err(AnalysisError::EmptyBuffer);
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }
    config.validate()?;

    let threshold = config.threshold(stats);
    let min_distance = config.min_distance(sample_rate);
    let peaks = detect_peaks(signal, threshold, min_distance);

    if peaks.len() < 2 {
        debug!("process: not enough peaks found ({}), no estimate", peaks.len());
    }

    let rr_list = calc_rr(&peaks, sample_rate);
    let measures = calc_ts_measures(&rr_list, peaks.len());

    debug!(
        "process - peaks: {}, ibi: {:.0}ms, bpm: {:.1}",
        measures.peak_count, measures.ibi_ms, measures.bpm
    );

    Ok((peaks, measures))
}
