use crate::error::ExperimentError;
use tamarisk_core::{
    error::ConfigError,
    glue::{EpisodeExit, Glue},
    rng::StartStateSampler,
    utils::return_stats::{ReturnStats, Summary},
};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub returns: Vec<f64>,
    pub terminated: usize,
    pub summary: Summary,
}

/// Runs a fixed number of equally seeded episodes against whatever policy the agent follows.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    batch_size: usize,
    episode_steps: u32,
}

impl Evaluator {
    pub fn new(batch_size: usize, episode_steps: u32) -> Result<Self, ConfigError> {
        if batch_size < 2 {
            return Err(ConfigError::BatchTooSmall(batch_size));
        }
        if episode_steps == 0 {
            return Err(ConfigError::ZeroEpisodeLength("evaluation"));
        }
        Ok(Self {
            batch_size,
            episode_steps,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn episode_steps(&self) -> u32 {
        self.episode_steps
    }

    pub fn evaluate<G: Glue>(
        &self,
        glue: &mut G,
        sampler: &mut StartStateSampler,
    ) -> Result<BatchResult, ExperimentError> {
        // every batch sees the same start states
        sampler.reseed();
        let mut stats = ReturnStats::default();
        let mut returns = Vec::with_capacity(self.batch_size);
        let mut terminated = 0;
        for episode in 0..self.batch_size {
            let start_state = sampler.next_state();
            glue.env_message(&start_state.to_command())?;
            let exit = glue.episode(self.episode_steps)?;
            if exit == EpisodeExit::Terminated {
                terminated += 1;
            }
            let episode_return = glue.return_value()?;
            debug!(episode, ?exit, "episode finished");
            info!(
                "The return after {} steps is: {episode_return}",
                self.episode_steps
            );
            stats.push(episode_return);
            returns.push(episode_return);
        }
        let summary = stats.summary()?;
        info!(
            terminated,
            "mean: {:?}, std: {:?} over {} episodes", summary.mean, summary.std, summary.n
        );
        Ok(BatchResult {
            returns,
            terminated,
            summary,
        })
    }
}
