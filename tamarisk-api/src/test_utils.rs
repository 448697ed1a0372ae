use tamarisk_core::{
    error::GlueError,
    glue::{EpisodeExit, Glue},
};

#[derive(Debug, Clone, PartialEq)]
pub enum GlueCall {
    Init,
    AgentMessage(String),
    EnvMessage(String),
    Episode(u32),
    Return,
    Cleanup,
}

/// A `Glue` double that records every call and replays canned returns.
#[derive(Debug, Default)]
pub struct ScriptedGlue {
    pub task_spec: String,
    pub returns: Vec<f64>,
    /// Fail the n-th `RL_episode` call (zero based).
    pub fail_on_episode: Option<usize>,
    pub calls: Vec<GlueCall>,
    pub next_return: usize,
    pub episodes: usize,
}

impl ScriptedGlue {
    pub fn with_returns(returns: Vec<f64>) -> Self {
        Self {
            returns,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> &[GlueCall] {
        &self.calls
    }

    pub fn agent_messages(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GlueCall::AgentMessage(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn env_messages(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GlueCall::EnvMessage(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn cleanups(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == GlueCall::Cleanup)
            .count()
    }
}

impl Glue for ScriptedGlue {
    fn init(&mut self) -> Result<String, GlueError> {
        self.calls.push(GlueCall::Init);
        Ok(self.task_spec.clone())
    }

    fn agent_message(&mut self, message: &str) -> Result<String, GlueError> {
        self.calls.push(GlueCall::AgentMessage(message.to_owned()));
        Ok(String::new())
    }

    fn env_message(&mut self, message: &str) -> Result<String, GlueError> {
        self.calls.push(GlueCall::EnvMessage(message.to_owned()));
        Ok(String::new())
    }

    fn episode(&mut self, max_steps: u32) -> Result<EpisodeExit, GlueError> {
        self.calls.push(GlueCall::Episode(max_steps));
        let episode = self.episodes;
        self.episodes += 1;
        if self.fail_on_episode == Some(episode) {
            return Err(GlueError::Closed);
        }
        Ok(EpisodeExit::StepLimit)
    }

    fn return_value(&mut self) -> Result<f64, GlueError> {
        self.calls.push(GlueCall::Return);
        let value = match self.returns.len() {
            0 => 0.,
            len => self.returns[self.next_return % len],
        };
        self.next_return += 1;
        Ok(value)
    }

    fn cleanup(&mut self) -> Result<(), GlueError> {
        self.calls.push(GlueCall::Cleanup);
        Ok(())
    }
}
