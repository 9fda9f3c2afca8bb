use neocortex::experiments::replay::{learn_and_replay, ReplayOptions};
use neocortex::experiments::sequences;
use neocortex::prelude::*;

use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct RunArgs {
    sequence: String,
    layers: usize,
    width: usize,
    threshold: Strength,
    passes: usize,
    seed: u64,
    parallel: bool,
    json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            sequence: "line".to_string(),
            layers: 1,
            width: 16,
            // Single-exposure learning for the canned sequences.
            threshold: 1,
            passes: 1,
            seed: 1,
            parallel: false,
            json: false,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().is_some_and(|a| a == "--help" || a == "-h" || a == "help") {
        print_help();
        return;
    }

    let run = match parse(&args) {
        Ok(run) => run,
        Err(msg) => {
            eprintln!("{msg}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = execute(&run) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn parse(args: &[String]) -> Result<RunArgs, String> {
    let mut run = RunArgs::default();
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        let mut value = |name: &str| {
            it.next()
                .ok_or_else(|| format!("{name} needs a value"))
                .cloned()
        };
        match arg.as_str() {
            "--layers" => run.layers = number(&value("--layers")?)?,
            "--width" => run.width = number(&value("--width")?)?,
            "--threshold" => run.threshold = number(&value("--threshold")?)?,
            "--passes" => run.passes = number(&value("--passes")?)?,
            "--seed" => run.seed = number(&value("--seed")?)?,
            "--parallel" => run.parallel = true,
            "--json" => run.json = true,
            s if !s.starts_with('-') => run.sequence = s.to_string(),
            s => return Err(format!("unknown option: {s}")),
        }
    }
    Ok(run)
}

fn number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("not a number: {s}"))
}

fn execute(run: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let frames = sequences::by_name(&run.sequence, run.width)
        .ok_or_else(|| format!("unknown sequence: {}", run.sequence))?;

    let cfg = BrainConfig::with_size(run.layers, run.width * run.width)
        .with_predictive_threshold(run.threshold)
        .with_seed(run.seed);
    let mut brain = Brain::new(cfg)?;
    if run.parallel {
        brain.set_execution_tier(ExecutionTier::Parallel);
    }

    let report = learn_and_replay(
        &mut brain,
        &frames,
        ReplayOptions {
            passes: run.passes,
            record: run.json,
        },
    )?;

    if run.json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let diag = brain.diagnostics();
    println!(
        "sequence={} frames={} layers={} width={} tier={:?}",
        run.sequence,
        frames.len(),
        run.layers,
        run.width,
        brain.effective_execution_tier()
    );
    println!(
        "neurons={} edges={} connections={} predictive={}",
        diag.neuron_count, diag.edge_count, diag.connection_count, diag.predictive_connection_count
    );
    println!(
        "accuracy={:.3} ({} of {} forecasts matched)",
        report.accuracy(),
        report.compared - report.mismatched.len(),
        report.compared
    );
    for &i in report.mismatched.iter().take(3) {
        println!("frame {i}: expected\n{}predicted\n{}", frames[i], report.predicted[i - 1]);
    }
    Ok(())
}

fn print_help() {
    println!("neocortex (hierarchical predictive network)");
    println!("usage:");
    println!("  neocortex [line|bounce|bounce-then-line] [options]");
    println!("options:");
    println!("  --layers N      hierarchy depth (default 1)");
    println!("  --width W       leaf layer side length (default 16)");
    println!("  --threshold T   predictive connection threshold (default 1)");
    println!("  --passes P      learning passes before replay (default 1)");
    println!("  --seed S        reinforcement lottery seed (default 1)");
    println!("  --parallel      run layer phases on rayon when compiled in");
    println!("  --json          print the replay report with per-tick snapshots as JSON");
}
