use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use ppg_analyzer::config::Args;
use ppg_analyzer::output::{self, ScenarioReport};
use ppg_analyzer::simulator::{self, PpgSimulator, SampleSource, Scenario};
use ppg_analyzer::{analyze_signal, data_loading, statistics, AnalysisConfig, PpgAnalysis};
use std::path::Path;

/// Estimated HR further than this from the simulator target is worth a warning
const HR_WARN_TOLERANCE_BPM: f32 = 5.0;

fn analyze_and_report(
    name: &str,
    samples: &[f32],
    sample_rate: u32,
    target_hr_bpm: Option<f32>,
    config: &AnalysisConfig,
    args: &Args,
) -> Result<PpgAnalysis> {
    let analysis = analyze_signal(samples, sample_rate, config)
        .with_context(|| format!("Analysis failed for {}", name))?;

    output::print_summary(name, target_hr_bpm, &analysis);

    if let Some(target) = target_hr_bpm {
        if (analysis.measures.bpm - target).abs() > HR_WARN_TOLERANCE_BPM {
            warn!(
                "{}: estimated {:.1} bpm, target {:.0} bpm",
                name, analysis.measures.bpm, target
            );
        }
    }

    if let Some(prefix) = &args.csv_output {
        let histogram = statistics::amplitude_histogram(samples, args.histogram_bins)?;
        output::write_analysis_to_csv(prefix, name, samples, &analysis, &histogram)?;
    }

    Ok(analysis)
}

fn run_scenario(scenario: &Scenario, config: &AnalysisConfig, args: &Args) -> Result<PpgAnalysis> {
    let mut sim = PpgSimulator::new(scenario.config.clone())?;
    let samples = simulator::acquire_buffer(&mut sim)?;
    analyze_and_report(
        &scenario.name,
        &samples,
        sim.sample_rate(),
        Some(scenario.config.heart_rate_bpm),
        config,
        args,
    )
}

fn run_file(path: &Path, config: &AnalysisConfig, args: &Args) -> Result<PpgAnalysis> {
    let samples = data_loading::read_sample_file(path)?;
    statistics::validate_samples(&samples, None)
        .with_context(|| format!("Rejected samples from {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("samples");
    analyze_and_report(name, &samples, args.sample_rate, None, config, args)
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let args = Args::parse();
    let config = args.analysis_config();
    let mut reports = Vec::new();

    println!("PPG Signal Analysis");
    println!("===================");

    match &args.input_path {
        Some(input) => {
            for path in data_loading::collect_input_files(input)? {
                let name = path.display().to_string();
                info!("Analyzing file: {}", name);
                match run_file(&path, &config, &args) {
                    Ok(analysis) => reports.push(ScenarioReport::success(&name, None, analysis)),
                    Err(e) => {
                        error!("{}: {:#}", name, e);
                        reports.push(ScenarioReport::failure(&name, None, &e));
                    }
                }
            }
        }
        None => {
            let mut scenarios = simulator::default_scenarios(args.seed);
            for scenario in &mut scenarios {
                scenario.config.duration_seconds = args.duration;
                scenario.config.sample_rate = args.sample_rate;
            }

            for scenario in &scenarios {
                info!("Analyzing scenario: {}", scenario.name);
                let target = Some(scenario.config.heart_rate_bpm);
                match run_scenario(scenario, &config, &args) {
                    Ok(analysis) => {
                        reports.push(ScenarioReport::success(&scenario.name, target, analysis))
                    }
                    Err(e) => {
                        error!("{}: {:#}", scenario.name, e);
                        reports.push(ScenarioReport::failure(&scenario.name, target, &e));
                    }
                }
            }
        }
    }

    if let Some(path) = &args.json_output {
        output::write_summary_json(path, &reports)?;
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    println!(
        "\nAnalysis complete: {} run(s), {} failed",
        reports.len(),
        failed
    );

    Ok(())
}
