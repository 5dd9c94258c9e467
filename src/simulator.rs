use crate::{statistics, AnalysisError, Result};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;

pub const MIN_HEART_RATE_BPM: f32 = 40.0;
pub const MAX_HEART_RATE_BPM: f32 = 200.0;
pub const DEFAULT_SAMPLE_RATE: u32 = 50;

/// Anything that can hand over a finite buffer of PPG samples
pub trait SampleSource {
    fn sample_rate(&self) -> u32;

    /// Number of samples `generate` is supposed to return
    fn expected_len(&self) -> usize;

    fn generate(&mut self) -> Result<Vec<f32>>;
}

/// Pull one buffer from a source and check it before it reaches the analysis
pub fn acquire_buffer<S: SampleSource + ?Sized>(source: &mut S) -> Result<Vec<f32>> {
    let samples = source.generate()?;
    statistics::validate_samples(&samples, Some(source.expected_len()))?;
    Ok(samples)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PpgSimConfig {
    pub heart_rate_bpm: f32,
    /// 0.0 - 1.0
    pub noise_level: f32,
    /// 0.0 - 1.0
    pub motion_artifact_level: f32,
    pub sleep_mode: bool,
    pub breathing_rate_bpm: f32,
    pub duration_seconds: f32,
    pub sample_rate: u32,
    pub seed: u64,
}

impl Default for PpgSimConfig {
    fn default() -> Self {
        Self {
            heart_rate_bpm: 70.0,
            noise_level: 0.1,
            motion_artifact_level: 0.0,
            sleep_mode: false,
            breathing_rate_bpm: 16.0,
            duration_seconds: 30.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: 0,
        }
    }
}

impl PpgSimConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_HEART_RATE_BPM..=MAX_HEART_RATE_BPM).contains(&self.heart_rate_bpm) {
            return Err(AnalysisError::InvalidConfig(format!(
                "heart rate {} bpm outside {}-{} bpm",
                self.heart_rate_bpm, MIN_HEART_RATE_BPM, MAX_HEART_RATE_BPM
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            return Err(AnalysisError::InvalidConfig(format!(
                "noise level {} outside 0.0-1.0",
                self.noise_level
            )));
        }
        if !(0.0..=1.0).contains(&self.motion_artifact_level) {
            return Err(AnalysisError::InvalidConfig(format!(
                "motion artifact level {} outside 0.0-1.0",
                self.motion_artifact_level
            )));
        }
        if !(self.breathing_rate_bpm.is_finite() && self.breathing_rate_bpm >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "breathing rate {} bpm is invalid",
                self.breathing_rate_bpm
            )));
        }
        if !(self.duration_seconds.is_finite() && self.duration_seconds > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "duration {} s must be positive",
                self.duration_seconds
            )));
        }
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    pub fn total_samples(&self) -> usize {
        (self.duration_seconds * self.sample_rate as f32).round() as usize
    }
}

/// Synthetic PPG waveform: a systolic pulse with a dicrotic component and
/// low harmonics, breathing baseline modulation, white noise and optional
/// motion artifacts, clamped to `[0, 1]`.
pub struct PpgSimulator {
    config: PpgSimConfig,
    rng: StdRng,
}

impl PpgSimulator {
    pub fn new(config: PpgSimConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "PPG simulator initialized - HR: {:.1} bpm, noise: {:.2}, motion: {:.2}, sleep: {}",
            config.heart_rate_bpm, config.noise_level, config.motion_artifact_level, config.sleep_mode
        );
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &PpgSimConfig {
        &self.config
    }

    fn heartbeat(&self, t: f32) -> f32 {
        let hr_hz = self.config.heart_rate_bpm / 60.0;
        let phase = 2.0 * PI * hr_hz * t;

        let mut beat = 0.7 + 0.2 * phase.sin();
        // dicrotic notch
        beat += 0.05 * (phase + PI * 0.3).sin();
        beat += 0.02 * (2.0 * phase).sin();
        beat += 0.01 * (3.0 * phase).sin();

        if self.config.sleep_mode {
            beat *= 0.85;
        }
        beat
    }

    fn breathing_modulation(&self, t: f32) -> f32 {
        let breathing_hz = self.config.breathing_rate_bpm / 60.0;
        let modulation = 0.03 * (2.0 * PI * breathing_hz * t).sin();
        if self.config.sleep_mode {
            modulation * 1.5
        } else {
            modulation
        }
    }

    fn noise(&mut self) -> f32 {
        if self.config.noise_level <= 0.0 {
            return 0.0;
        }
        let white = (self.rng.gen::<f32>() - 0.5) * 2.0;
        white * self.config.noise_level * 0.1
    }

    fn motion_artifact(&mut self, t: f32) -> f32 {
        let level = self.config.motion_artifact_level;
        if level <= 0.0 {
            return 0.0;
        }

        // low-frequency interference somewhere in 0.5-2.5 Hz
        let motion_freq = 0.5 + self.rng.gen::<f32>() * 2.0;
        let mut artifact = level * 0.2 * (2.0 * PI * motion_freq * t).sin();

        // occasional spike, 0.5% of samples
        if self.rng.gen_range(0..1000) < 5 {
            artifact += level * 0.3 * (self.rng.gen::<f32>() - 0.5);
        }
        artifact
    }

    /// Next sample at time `t` seconds
    pub fn generate_sample(&mut self, t: f32) -> f32 {
        let base = self.heartbeat(t);
        let breathing = self.breathing_modulation(t);
        let noise = self.noise();
        let motion = self.motion_artifact(t);

        (base + breathing + noise + motion).clamp(0.0, 1.0)
    }
}

impl SampleSource for PpgSimulator {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn expected_len(&self) -> usize {
        self.config.total_samples()
    }

    fn generate(&mut self) -> Result<Vec<f32>> {
        let total = self.config.total_samples();
        let fs = self.config.sample_rate as f32;
        let samples: Vec<f32> = (0..total)
            .map(|i| self.generate_sample(i as f32 / fs))
            .collect();
        debug!("generated {} samples at {} Hz", samples.len(), fs);
        Ok(samples)
    }
}

/// A named generator configuration
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub config: PpgSimConfig,
}

/// Rest, exercise, sleep and noisy conditions, 20 seconds each at 50 Hz
pub fn default_scenarios(seed: u64) -> Vec<Scenario> {
    let make = |name: &str, hr: f32, noise: f32, motion: f32, sleep: bool| Scenario {
        name: name.to_string(),
        config: PpgSimConfig {
            heart_rate_bpm: hr,
            noise_level: noise,
            motion_artifact_level: motion,
            sleep_mode: sleep,
            duration_seconds: 20.0,
            seed,
            ..Default::default()
        },
    };

    vec![
        make("Rest - Clean", 70.0, 0.05, 0.0, false),
        make("Exercise", 140.0, 0.1, 0.3, false),
        make("Sleep", 55.0, 0.03, 0.0, true),
        make("Noisy", 75.0, 0.3, 0.1, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_length_and_range() {
        let config = PpgSimConfig {
            duration_seconds: 20.0,
            motion_artifact_level: 0.5,
            noise_level: 1.0,
            ..Default::default()
        };
        let mut sim = PpgSimulator::new(config).unwrap();
        let samples = acquire_buffer(&mut sim).unwrap();
        assert_eq!(samples.len(), 1000);
        assert!(samples.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_same_seed_same_signal() {
        let config = PpgSimConfig {
            noise_level: 0.3,
            motion_artifact_level: 0.2,
            seed: 7,
            duration_seconds: 5.0,
            ..Default::default()
        };
        let a = PpgSimulator::new(config.clone()).unwrap().generate().unwrap();
        let b = PpgSimulator::new(config.clone()).unwrap().generate().unwrap();
        assert_eq!(a, b);

        let c = PpgSimulator::new(PpgSimConfig { seed: 8, ..config })
            .unwrap()
            .generate()
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_noise_free_is_deterministic_waveform() {
        let config = PpgSimConfig {
            noise_level: 0.0,
            duration_seconds: 1.0,
            ..Default::default()
        };
        let mut sim = PpgSimulator::new(config).unwrap();
        // at t = 0: 0.7 + 0.05 * sin(0.3 pi)
        let expected = 0.7 + 0.05 * (0.3 * PI).sin();
        assert!((sim.generate_sample(0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_sleep_mode_lowers_amplitude() {
        let awake = PpgSimConfig {
            noise_level: 0.0,
            duration_seconds: 10.0,
            ..Default::default()
        };
        let asleep = PpgSimConfig {
            sleep_mode: true,
            ..awake.clone()
        };
        let max = |c: PpgSimConfig| {
            PpgSimulator::new(c)
                .unwrap()
                .generate()
                .unwrap()
                .into_iter()
                .fold(f32::NEG_INFINITY, f32::max)
        };
        assert!(max(asleep) < max(awake));
    }

    #[test]
    fn test_config_validation() {
        let bad_hr = PpgSimConfig {
            heart_rate_bpm: 250.0,
            ..Default::default()
        };
        assert!(matches!(
            PpgSimulator::new(bad_hr),
            Err(AnalysisError::InvalidConfig(_))
        ));

        let bad_noise = PpgSimConfig {
            noise_level: -0.1,
            ..Default::default()
        };
        assert!(bad_noise.validate().is_err());

        let bad_duration = PpgSimConfig {
            duration_seconds: 0.0,
            ..Default::default()
        };
        assert!(bad_duration.validate().is_err());

        let bad_rate = PpgSimConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert_eq!(bad_rate.validate(), Err(AnalysisError::InvalidSampleRate(0)));
    }

    struct ShortSource;

    impl SampleSource for ShortSource {
        fn sample_rate(&self) -> u32 {
            50
        }
        fn expected_len(&self) -> usize {
            10
        }
        fn generate(&mut self) -> Result<Vec<f32>> {
            Ok(vec![0.5; 9])
        }
    }

    struct NanSource;

    impl SampleSource for NanSource {
        fn sample_rate(&self) -> u32 {
            50
        }
        fn expected_len(&self) -> usize {
            3
        }
        fn generate(&mut self) -> Result<Vec<f32>> {
            Ok(vec![0.5, f32::NAN, 0.5])
        }
    }

    #[test]
    fn test_acquire_rejects_bad_sources() {
        assert_eq!(
            acquire_buffer(&mut ShortSource),
            Err(AnalysisError::LengthMismatch {
                expected: 10,
                actual: 9
            })
        );
        assert!(matches!(
            acquire_buffer(&mut NanSource),
            Err(AnalysisError::NonFiniteSample { index: 1, .. })
        ));
    }

    #[test]
    fn test_default_scenarios() {
        let scenarios = default_scenarios(1);
        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[0].name, "Rest - Clean");
        assert!(scenarios[2].config.sleep_mode);
        for s in &scenarios {
            assert!(s.config.validate().is_ok());
            assert_eq!(s.config.total_samples(), 1000);
        }
    }
}
