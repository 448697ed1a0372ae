use crate::{
    builders::experiment::CostLearning,
    commands::AgentCommand,
    error::ExperimentError,
    utils::{
        evaluator::{BatchResult, Evaluator},
        experiment_log::{ExperimentLog, PolicyLabel},
    },
};
use std::path::{Path, PathBuf};
use tamarisk_core::{
    glue::{Glue, SessionGuard},
    rng::{RiverShape, StartStateSampler},
    task_spec::TaskSpec,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub learned: BatchResult,
    pub heuristic: BatchResult,
}

/// A validated experiment, built through `ExperimentBuilder`.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub(crate) shape: RiverShape,
    pub(crate) seed: u64,
    pub(crate) evaluator: Evaluator,
    pub(crate) model_steps: u32,
    pub(crate) budget: u32,
    pub(crate) log_file: PathBuf,
    pub(crate) cost_learning: Option<CostLearning>,
}

impl Experiment {
    pub fn shape(&self) -> RiverShape {
        self.shape
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn cost_learning(&self) -> Option<&CostLearning> {
        self.cost_learning.as_ref()
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Runs the whole experiment. The session is cleaned up and the log closed on every path,
    /// including errors half way through.
    pub fn run<G: Glue>(&self, glue: G) -> Result<ExperimentReport, ExperimentError> {
        let (mut session, task_spec) = SessionGuard::init(glue)?;
        self.check_task_spec(&task_spec)?;

        let mut sampler = StartStateSampler::new(self.shape, self.seed);
        session.env_message(&sampler.next_state().to_command())?;

        let mut log = ExperimentLog::open(&self.log_file)?;
        info!(log_file = %log.path().display(), "appending results");
        log.begin_run(self.budget)?;

        if let Some(cost_learning) = &self.cost_learning {
            info!(
                episodes = cost_learning.episodes,
                "learning the cost parameters"
            );
            session.agent_message(AgentCommand::LearnCostParameters.as_str())?;
            for _ in 0..cost_learning.episodes {
                session.episode(cost_learning.episode_steps)?;
            }
        }

        info!("learning the model");
        session.agent_message(AgentCommand::LearnModel.as_str())?;
        session.episode(self.model_steps)?;

        info!("planning on the learned model");
        session.agent_message(AgentCommand::Plan.as_str())?;

        info!("Evaluating the AA policy");
        session.agent_message(AgentCommand::Evaluate.as_str())?;
        let learned = self.evaluator.evaluate(&mut *session, &mut sampler)?;
        log.record(PolicyLabel::Invasive, &learned.summary)?;

        info!("Evaluating the simple heuristic agent");
        session.agent_message(AgentCommand::FollowHeuristics.as_str())?;
        let heuristic = self.evaluator.evaluate(&mut *session, &mut sampler)?;
        log.record(PolicyLabel::Heuristic, &heuristic.summary)?;

        log.close()?;
        session.finish()?;
        info!("Program complete.");
        Ok(ExperimentReport {
            learned,
            heuristic,
        })
    }

    fn check_task_spec(&self, task_spec: &str) -> Result<(), ExperimentError> {
        let spec = match TaskSpec::parse(task_spec) {
            Ok(spec) => spec,
            Err(err) => {
                warn!("could not parse the task spec, skipping shape checks: {err}");
                return Ok(());
            }
        };
        spec.check_shape(&self.shape)?;
        let edges = spec.river_edges();
        if !edges.is_empty() && edges.len() + 1 != self.shape.reaches() {
            warn!(
                edges = edges.len(),
                reaches = self.shape.reaches(),
                "river network does not connect the configured reaches"
            );
        }
        if let Some(budget) = spec.budget() {
            if budget != f64::from(self.budget) {
                warn!(
                    "environment budget is {budget}, the log will be labeled {}",
                    self.budget
                );
            }
        }
        Ok(())
    }
}
