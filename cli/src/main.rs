//! `trackeval` CLI: score tracker output against reference tracks, run
//! synthetic scenarios, sweep the matching gate.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use sim::scenarios::{Scenario, ScenarioKind};
use sim::track_io::{load_track_set, save_track_set};
use std::path::{Path, PathBuf};
use trackeval_core::{classify, DistanceType, MatcherConfig, TrackGroup, TrackingScores};
use tracing::info;

#[derive(Parser)]
#[command(name = "trackeval", about = "Track-to-track matching and tracker scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct MatchArgs {
    /// Maximum detection distance for two tracks to match at a frame
    #[arg(long, default_value_t = 5.0)]
    gate: f64,
    /// Track distance cost model
    #[arg(long, value_enum, default_value_t = DistanceType::Euclidean)]
    distance: DistanceType,
}

impl MatchArgs {
    fn config(self) -> MatcherConfig {
        MatcherConfig::new(self.gate, self.distance)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score a candidate track set against a reference track set.
    Evaluate {
        /// Reference (ground-truth) track set JSON
        reference: PathBuf,
        /// Candidate (tracker output) track set JSON
        candidate: PathBuf,
        #[command(flatten)]
        matching: MatchArgs,
        /// Output scores to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate a named scenario, emulate a tracker on it and score the result.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[command(flatten)]
        matching: MatchArgs,
        /// Save the ground-truth track set
        #[arg(long)]
        save_reference: Option<PathBuf>,
        /// Save the emulated tracker output
        #[arg(long)]
        save_candidate: Option<PathBuf>,
        /// Output scores to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score the same track sets under several gates.
    Sweep {
        reference: PathBuf,
        candidate: PathBuf,
        /// Comma-separated gate values
        #[arg(long, value_delimiter = ',', required = true)]
        gates: Vec<f64>,
        #[arg(long, value_enum, default_value_t = DistanceType::Euclidean)]
        distance: DistanceType,
        /// Output scores to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Report {
    config: MatcherConfig,
    scores: TrackingScores,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            reference,
            candidate,
            matching,
            output,
        } => {
            let refs = load_track_set(&reference)?;
            let cands = load_track_set(&candidate)?;
            let report = score(&refs, &cands, matching.config())?;
            print_summary(&report);
            write_json(&report, output.as_deref())?;
        }
        Commands::RunScenario {
            scenario,
            seed,
            matching,
            save_reference,
            save_candidate,
            output,
        } => {
            run_scenario(
                scenario,
                seed,
                matching.config(),
                save_reference.as_deref(),
                save_candidate.as_deref(),
                output.as_deref(),
            )?;
        }
        Commands::Sweep {
            reference,
            candidate,
            gates,
            distance,
            output,
        } => {
            let refs = load_track_set(&reference)?;
            let cands = load_track_set(&candidate)?;
            run_sweep(&refs, &cands, &gates, distance, output.as_deref())?;
        }
    }

    Ok(())
}

fn score(
    references: &TrackGroup,
    candidates: &TrackGroup,
    config: MatcherConfig,
) -> Result<Report> {
    let classification = classify(references.segments(), candidates.segments(), &config)
        .with_context(|| format!("matching tracks with gate {}", config.gate))?;
    let scores = TrackingScores::compute(
        references.segments(),
        candidates.segments(),
        &classification,
        &config,
    );
    Ok(Report { config, scores })
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config: MatcherConfig,
    reference_path: Option<&Path>,
    candidate_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    println!(
        "Running scenario '{}' (seed={}, {} particles, {} frames)...",
        scenario.name,
        seed,
        scenario.particles.len(),
        scenario.n_frames
    );

    let start = std::time::Instant::now();
    let (ground_truth, candidates) = scenario
        .generate()
        .context("generating scenario tracks")?;
    info!(
        scenario = %scenario.name,
        seed,
        references = ground_truth.len(),
        candidates = candidates.len(),
        "generated scenario tracks"
    );
    let report = score(&ground_truth, &candidates, config)?;
    let elapsed = start.elapsed();

    println!(
        "Done: {} reference tracks, {} candidate tracks, elapsed={:.3}s",
        ground_truth.len(),
        candidates.len(),
        elapsed.as_secs_f64()
    );
    print_summary(&report);

    if let Some(path) = reference_path {
        save_track_set(&ground_truth, path)?;
        println!("Reference tracks saved to {}", path.display());
    }
    if let Some(path) = candidate_path {
        save_track_set(&candidates, path)?;
        println!("Candidate tracks saved to {}", path.display());
    }
    write_json(&report, output_path)
}

fn run_sweep(
    references: &TrackGroup,
    candidates: &TrackGroup,
    gates: &[f64],
    distance: DistanceType,
    output_path: Option<&Path>,
) -> Result<()> {
    // Each gate is an independent matching call.
    let reports = gates
        .par_iter()
        .map(|&gate| {
            let report = score(references, candidates, MatcherConfig::new(gate, distance))?;
            info!(
                gate,
                alpha = report.scores.alpha,
                missed = report.scores.n_missed_tracks,
                "scored gate"
            );
            Ok(report)
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{:>8} {:>8} {:>8} {:>8} {:>8}", "gate", "alpha", "beta", "JSC", "JSCθ");
    for r in &reports {
        println!(
            "{:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3}",
            r.config.gate,
            r.scores.alpha,
            r.scores.beta,
            r.scores.detection_jaccard,
            r.scores.track_jaccard
        );
    }
    write_json(&reports, output_path)
}

fn print_summary(report: &Report) {
    let s = &report.scores;
    println!(
        "Tracks: {} paired, {} missed, {} spurious (gate={}, distance={})",
        s.n_paired_tracks,
        s.n_missed_tracks,
        s.n_spurious_tracks,
        report.config.gate,
        report.config.distance_type
    );
    println!(
        "alpha={:.3} beta={:.3} JSC={:.3} JSCθ={:.3} RMSE={:.3}",
        s.alpha, s.beta, s.detection_jaccard, s.track_jaccard, s.rmse
    );
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        std::fs::write(path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Scores saved to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackeval_core::{DetectionPoint, TrackSegment};

    fn group(xs: &[f64]) -> TrackGroup {
        let segments = xs
            .iter()
            .map(|&x| {
                TrackSegment::from_detections((0..4).map(|t| DetectionPoint::new(x, 0.0, 0.0, t)))
                    .unwrap()
            })
            .collect();
        TrackGroup::from_segments("test", segments)
    }

    #[test]
    fn sweep_writes_one_report_per_gate() {
        let refs = group(&[0.0, 10.0]);
        let cands = group(&[0.5, 30.0]);
        let path = std::env::temp_dir().join(format!("sweep_{}.json", std::process::id()));
        run_sweep(&refs, &cands, &[0.1, 1.0, 5.0], DistanceType::Euclidean, Some(&path)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        let reports = json.as_array().unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0]["config"]["gate"], 0.1);
        assert_eq!(reports[1]["scores"]["n_paired_tracks"], 1);
    }

    #[test]
    fn scenario_run_saves_reference_tracks() {
        let path = std::env::temp_dir().join(format!("scenario_ref_{}.json", std::process::id()));
        run_scenario(ScenarioKind::Simple, 7, MatcherConfig::default(), Some(&path), None, None)
            .unwrap();
        let loaded = load_track_set(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(!loaded.is_empty());
    }
}
