use crate::{experiment::Experiment, utils::evaluator::Evaluator};
use std::path::PathBuf;
use tamarisk_core::{error::ConfigError, rng::RiverShape};

pub const DEFAULT_REACHES: usize = 7;
pub const DEFAULT_HABITAT_SIZE: usize = 4;
pub const DEFAULT_SEED: u64 = 5;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_EVAL_STEPS: u32 = 100;
pub const DEFAULT_MODEL_STEPS: u32 = 3000;
pub const DEFAULT_BUDGET: u32 = 20;
pub const DEFAULT_LOG_FILE: &str = "experiments.txt";
pub const DEFAULT_COST_EPISODE_STEPS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostLearning {
    pub episodes: usize,
    pub episode_steps: u32,
}

#[derive(Debug, Clone)]
pub struct ExperimentBuilder {
    pub reaches: usize,
    pub habitat_size: usize,
    pub seed: u64,
    pub batch_size: usize,
    pub eval_steps: u32,
    pub model_steps: u32,
    // only labels the log block, the environment owns the real budget
    pub budget: u32,
    pub log_file: PathBuf,
    pub cost_learning: Option<CostLearning>,
}

impl Default for ExperimentBuilder {
    fn default() -> Self {
        Self {
            reaches: DEFAULT_REACHES,
            habitat_size: DEFAULT_HABITAT_SIZE,
            seed: DEFAULT_SEED,
            batch_size: DEFAULT_BATCH_SIZE,
            eval_steps: DEFAULT_EVAL_STEPS,
            model_steps: DEFAULT_MODEL_STEPS,
            budget: DEFAULT_BUDGET,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            cost_learning: None,
        }
    }
}

impl ExperimentBuilder {
    pub fn build(self) -> Result<Experiment, ConfigError> {
        let shape = RiverShape::new(self.reaches, self.habitat_size)?;
        let evaluator = Evaluator::new(self.batch_size, self.eval_steps)?;
        if self.model_steps == 0 {
            return Err(ConfigError::ZeroEpisodeLength("model learning"));
        }
        if let Some(cost_learning) = &self.cost_learning {
            if cost_learning.episode_steps == 0 {
                return Err(ConfigError::ZeroEpisodeLength("cost learning"));
            }
        }
        Ok(Experiment {
            shape,
            seed: self.seed,
            evaluator,
            model_steps: self.model_steps,
            budget: self.budget,
            log_file: self.log_file,
            cost_learning: self.cost_learning,
        })
    }

    pub fn set_log_file(&mut self, log_file: impl Into<PathBuf>) {
        self.log_file = log_file.into();
    }

    pub fn enable_cost_learning(&mut self, episodes: usize) {
        self.cost_learning = Some(CostLearning {
            episodes,
            episode_steps: DEFAULT_COST_EPISODE_STEPS,
        });
    }
}

#[cfg(test)]
mod test {
    use super::ExperimentBuilder;
    use tamarisk_core::error::ConfigError;

    #[test]
    fn defaults_build() {
        let experiment = ExperimentBuilder::default().build().unwrap();
        assert_eq!(experiment.shape().habitats(), 28);
        assert_eq!(experiment.evaluator().batch_size(), 10);
        assert_eq!(experiment.evaluator().episode_steps(), 100);
        assert!(experiment.cost_learning().is_none());
    }

    #[test]
    fn single_episode_batches_are_rejected() {
        let builder = ExperimentBuilder {
            batch_size: 1,
            ..Default::default()
        };
        assert_eq!(builder.build().err(), Some(ConfigError::BatchTooSmall(1)));
    }

    #[test]
    fn empty_river_is_rejected() {
        let builder = ExperimentBuilder {
            reaches: 0,
            ..Default::default()
        };
        assert_eq!(builder.build().err(), Some(ConfigError::NoReaches));
    }

    #[test]
    fn oversized_river_is_rejected() {
        let builder = ExperimentBuilder {
            reaches: 1 << 33,
            habitat_size: 1 << 33,
            ..Default::default()
        };
        assert_eq!(
            builder.build().err(),
            Some(ConfigError::RiverTooLarge {
                reaches: 1 << 33,
                habitat_size: 1 << 33
            })
        );
    }

    #[test]
    fn zero_step_phases_are_rejected() {
        let builder = ExperimentBuilder {
            model_steps: 0,
            ..Default::default()
        };
        assert_eq!(
            builder.build().err(),
            Some(ConfigError::ZeroEpisodeLength("model learning"))
        );
        let mut builder = ExperimentBuilder::default();
        builder.enable_cost_learning(1000);
        builder.cost_learning.as_mut().unwrap().episode_steps = 0;
        assert_eq!(
            builder.build().err(),
            Some(ConfigError::ZeroEpisodeLength("cost learning"))
        );
    }
}
