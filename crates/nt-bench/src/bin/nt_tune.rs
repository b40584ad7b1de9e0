use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nt_bench::{CsvRecorder, IotoolsEvaluator};
use nt_optimizer::Walker;
use nt_types::{Configuration, RunConfig, Settings};

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .context("usage: nt-tune <run-config.json>")?;
    let run: RunConfig = serde_json::from_reader(
        File::open(&config_path).with_context(|| format!("cannot open {config_path}"))?,
    )?;

    let iotools_dir = env_path("NT_IOTOOLS_DIR", ".");
    let reference_dir = env_path("NT_REFERENCE_DIR", "./reference_files");
    let scratch_dir = env_path("NT_SCRATCH_DIR", "./generated_files");
    let results_dir = env_path("NT_RESULTS_DIR", "./results");
    std::fs::create_dir_all(&scratch_dir)?;

    let configuration = Configuration::from_settings(&run.start, run.compression_types.as_deref())?;
    let mut walker = Walker::new(&run, configuration)?;
    let mut evaluator = IotoolsEvaluator::new(
        run.benchmark.clone(),
        iotools_dir,
        reference_dir,
        scratch_dir,
    )
    .with_rdf(run.use_rdf);
    let mut recorder = CsvRecorder::create(&results_dir, &run.benchmark, walker.policy_name())?;

    info!(
        run_id = %run.id,
        benchmark = %run.benchmark,
        policy = walker.policy_name(),
        iterations = run.iterations,
        history = %recorder.path().display(),
        "starting optimization run"
    );

    let seed = run.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    walker.evolve(&Settings::default(), &mut evaluator, &mut recorder, &mut rng)?;

    info!(performance = walker.performance(), "run finished");
    Ok(())
}
