//! `wander` -- batch front door for the trace generator.
//!
//! Two subcommands: `run` simulates scenes and writes their I/O trace
//! segments; `multiply` scales up already generated traces. Scenes are
//! independent, so both commands fan out over a bounded worker pool; a
//! failing scene is reported and does not abort the batch.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use wander_sim::multiply::{multiply_scene_with_progress, scene_length_minutes, MultiplyOptions};
use wander_sim::scene::{RunOptions, Scene};
use wander_world::config::SimConfig;
use wander_world::world::World;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "wander",
    version,
    about = "Synthesize storage I/O traces from avatar-activity scenes"
)]
struct Cli {
    /// JSON config file; missing fields use built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run scenes and generate their I/O traces.
    Run(RunArgs),
    /// Multiply generated traces to raise the per-second I/O rate.
    Multiply(MultiplyArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Scene numbers to run.
    #[arg(value_name = "SCENE", required = true)]
    scenes: Vec<u32>,

    /// Output folder.
    #[arg(short, long, default_value = "IOs", value_name = "PATH")]
    output: PathBuf,

    /// Folder holding scene<N>.csv files.
    #[arg(long, default_value = "Scenes", value_name = "PATH")]
    scenes_dir: PathBuf,

    /// Folder holding the map data.
    #[arg(long, default_value = "Maps", value_name = "PATH")]
    maps_dir: PathBuf,

    /// Worker threads for parallel scenes.
    #[arg(short, long, default_value_t = 1)]
    procs: usize,

    /// Seed for every scene (default: each scene seeds with its number).
    #[arg(short, long)]
    seed: Option<u64>,

    /// Time limit per scene, in minutes.
    #[arg(short = 'l', long, value_name = "MINUTES")]
    limit: Option<i64>,

    /// Gzip level; the bare flag means 5, no flag means plain text.
    #[arg(short, long, value_name = "0-9", num_args = 0..=1, default_missing_value = "5")]
    compress: Option<u32>,

    /// Keep files already present in the scene output folders.
    #[arg(short, long)]
    keep: bool,
}

#[derive(Args)]
struct MultiplyArgs {
    /// Scene numbers to multiply.
    #[arg(value_name = "SCENE", required = true)]
    scenes: Vec<u32>,

    /// Multiply each record by this factor.
    #[arg(short, long, required = true)]
    factor: u32,

    /// Avatar ids to keep (default: all devices).
    #[arg(short, long, value_name = "AVATAR", num_args = 1..)]
    avatars: Option<Vec<String>>,

    /// Seed for the timestamp jitter.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Folder holding the generated Scene<N> trace folders.
    #[arg(short, long, default_value = "IOs", value_name = "PATH")]
    input: PathBuf,

    /// Output folder (default: the input folder).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Gzip level; the bare flag means 5, no flag means plain text.
    #[arg(short, long, value_name = "0-9", num_args = 0..=1, default_missing_value = "5")]
    compress: Option<u32>,

    /// Worker threads for parallel scenes.
    #[arg(short, long, default_value_t = 1)]
    procs: usize,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_config = match &cli.config {
        Some(path) => match SimConfig::from_json_file(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("{err:#}");
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    let outcome = match cli.command {
        Command::Run(args) => run_batch(base_config, args),
        Command::Multiply(args) => multiply_batch(base_config, args),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Keep first occurrences, preserving order.
fn dedupe(scenes: Vec<u32>) -> Vec<u32> {
    let mut seen = HashSet::new();
    scenes.into_iter().filter(|s| seen.insert(*s)).collect()
}

fn worker_pool(procs: usize, jobs: usize) -> anyhow::Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(procs.max(1).min(jobs.max(1)))
        .build()
        .context("failed to build the scene worker pool")
}

fn progress_bar(multi: &MultiProgress, len: u64, label: String) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(len));
    bar.set_style(
        ProgressStyle::with_template("{msg:12} [{bar:40}] {pos}/{len}m")
            .expect("static progress template is valid")
            .progress_chars("=> "),
    );
    bar.set_message(label);
    bar
}

/// Report per-scene outcomes; returns whether every scene succeeded.
fn summarize(command: &str, results: &[(u32, anyhow::Result<()>)]) -> bool {
    let mut all_ok = true;
    for (scene, result) in results {
        match result {
            Ok(()) => tracing::info!(scene = *scene, "{command} completed"),
            Err(err) => {
                all_ok = false;
                tracing::error!(scene = *scene, "{command} failed: {err:#}");
            }
        }
    }
    all_ok
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn run_batch(base_config: SimConfig, args: RunArgs) -> anyhow::Result<bool> {
    // fail fast on missing inputs, before spinning up workers
    for scene in &args.scenes {
        let path = args.scenes_dir.join(format!("scene{scene}.csv"));
        if !path.is_file() {
            bail!("{} does not exist", path.display());
        }
    }
    let cities = args.maps_dir.join("cities.csv");
    if !cities.is_file() {
        bail!("{} does not exist", cities.display());
    }

    let mut config = base_config;
    config.seed = args.seed.or(config.seed);
    config.minutes_limit = args.limit.or(config.minutes_limit);
    config.compression = args.compress.or(config.compression);

    let scenes = dedupe(args.scenes.clone());
    let pool = worker_pool(args.procs, scenes.len())?;
    let multi = MultiProgress::new();
    let options = RunOptions {
        output_dir: args.output.clone(),
        keep_output: args.keep,
    };

    let results: Vec<(u32, anyhow::Result<()>)> = pool.install(|| {
        scenes
            .par_iter()
            .map(|&number| {
                (
                    number,
                    run_scene(number, &args, &config, &options, &multi),
                )
            })
            .collect()
    });
    Ok(summarize("run", &results))
}

fn run_scene(
    number: u32,
    args: &RunArgs,
    config: &SimConfig,
    options: &RunOptions,
    multi: &MultiProgress,
) -> anyhow::Result<()> {
    let world = World::load(&args.maps_dir, config.clone())
        .with_context(|| format!("loading the world for scene {number}"))?;
    let mut scene = Scene::load(&args.scenes_dir, number, world)
        .with_context(|| format!("loading scene {number}"))?;

    let bar = progress_bar(multi, scene.minutes() as u64, format!("Scene {number}"));
    scene.run_with_progress(options, |minutes| bar.inc(minutes as u64))?;
    bar.finish();
    Ok(())
}

// ---------------------------------------------------------------------------
// multiply
// ---------------------------------------------------------------------------

fn multiply_batch(base_config: SimConfig, args: MultiplyArgs) -> anyhow::Result<bool> {
    for scene in &args.scenes {
        let path = args.input.join(format!("Scene{scene}"));
        if !path.is_dir() {
            bail!("{} does not exist, run the scene first", path.display());
        }
    }

    let scenes = dedupe(args.scenes);
    let pool = worker_pool(args.procs, scenes.len())?;
    let multi = MultiProgress::new();
    let options = MultiplyOptions {
        input_dir: args.input.clone(),
        output_dir: args.output.clone().unwrap_or_else(|| args.input.clone()),
        factor: args.factor,
        seed: args.seed,
        compression: args.compress.or(base_config.compression),
        avatars: args.avatars.clone(),
    };

    let results: Vec<(u32, anyhow::Result<()>)> = pool.install(|| {
        scenes
            .par_iter()
            .map(|&number| {
                let result = (|| -> anyhow::Result<()> {
                    let minutes = scene_length_minutes(&options.input_dir, number)?;
                    let bar = progress_bar(
                        &multi,
                        minutes as u64,
                        format!("Scene {number} x{}", options.factor),
                    );
                    multiply_scene_with_progress(number, &options, |minutes| {
                        bar.inc(minutes as u64)
                    })?;
                    bar.finish();
                    Ok(())
                })();
                (number, result)
            })
            .collect()
    });
    Ok(summarize("multiply", &results))
}
