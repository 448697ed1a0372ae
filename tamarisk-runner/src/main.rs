// Runs the invasive species experiment against an rl_glue server. The agent and the environment
// are expected to be connected to the same server already.

use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use tamarisk_api::builders::experiment::{
    CostLearning, DEFAULT_BATCH_SIZE, DEFAULT_BUDGET, DEFAULT_COST_EPISODE_STEPS,
    DEFAULT_EVAL_STEPS, DEFAULT_HABITAT_SIZE, DEFAULT_LOG_FILE, DEFAULT_MODEL_STEPS,
    DEFAULT_REACHES, DEFAULT_SEED, ExperimentBuilder,
};
use tamarisk_core::network::{DEFAULT_HOST, DEFAULT_PORT, GlueEndpoint, TcpGlue};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, env = "RLGLUE_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "RLGLUE_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Give up on rl_glue after this many seconds without an answer.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout_secs: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_REACHES)]
    reaches: usize,

    #[arg(long, default_value_t = DEFAULT_HABITAT_SIZE)]
    habitat_size: usize,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Episodes per evaluation batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_EVAL_STEPS)]
    eval_steps: u32,

    #[arg(long, default_value_t = DEFAULT_MODEL_STEPS)]
    model_steps: u32,

    /// Budget written into the log header.
    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    budget: u32,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Learn the cost parameters for this many episodes before learning the model.
    #[arg(long)]
    cost_episodes: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_COST_EPISODE_STEPS)]
    cost_episode_steps: u32,
}

impl Args {
    fn builder(&self) -> ExperimentBuilder {
        ExperimentBuilder {
            reaches: self.reaches,
            habitat_size: self.habitat_size,
            seed: self.seed,
            batch_size: self.batch_size,
            eval_steps: self.eval_steps,
            model_steps: self.model_steps,
            budget: self.budget,
            log_file: self.log_file.clone(),
            cost_learning: self.cost_episodes.map(|episodes| CostLearning {
                episodes,
                episode_steps: self.cost_episode_steps,
            }),
        }
    }

    fn endpoint(&self) -> GlueEndpoint {
        GlueEndpoint {
            host: self.host.clone(),
            port: self.port,
            read_timeout: self.read_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    // bad configuration should not cost a connection
    let experiment = args
        .builder()
        .build()
        .context("invalid experiment configuration")?;
    let endpoint = args.endpoint();
    let glue = TcpGlue::connect(&endpoint)
        .with_context(|| format!("could not reach rl_glue at {}", endpoint.addr()))?;
    let report = experiment.run(glue).context("experiment failed")?;
    info!(
        learned_mean = report.learned.summary.mean,
        learned_std = report.learned.summary.std,
        heuristic_mean = report.heuristic.summary.mean,
        heuristic_std = report.heuristic.summary.std,
        log_file = %experiment.log_file().display(),
        "results appended"
    );
    Ok(())
}
