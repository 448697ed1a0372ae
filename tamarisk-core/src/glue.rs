use crate::error::GlueError;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// RL-Glue's untyped observation/action payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractType {
    pub ints: Vec<i32>,
    pub doubles: Vec<f64>,
    pub chars: Vec<u8>,
}

pub type Observation = AbstractType;
pub type Action = AbstractType;

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationAction {
    pub observation: Observation,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub reward: f64,
    pub observation: Observation,
    pub action: Action,
    pub terminal: bool,
}

/// How an `RL_episode` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeExit {
    StepLimit,
    Terminated,
}

impl From<i32> for EpisodeExit {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Terminated,
            _ => Self::StepLimit,
        }
    }
}

/// The experiment side of an RL-Glue session.
pub trait Glue {
    /// Starts the session and returns the environment's task spec.
    fn init(&mut self) -> Result<String, GlueError>;
    fn agent_message(&mut self, message: &str) -> Result<String, GlueError>;
    fn env_message(&mut self, message: &str) -> Result<String, GlueError>;
    fn episode(&mut self, max_steps: u32) -> Result<EpisodeExit, GlueError>;
    /// Return of the most recent episode.
    fn return_value(&mut self) -> Result<f64, GlueError>;
    fn cleanup(&mut self) -> Result<(), GlueError>;
}

impl<G: Glue + ?Sized> Glue for &mut G {
    fn init(&mut self) -> Result<String, GlueError> {
        (**self).init()
    }

    fn agent_message(&mut self, message: &str) -> Result<String, GlueError> {
        (**self).agent_message(message)
    }

    fn env_message(&mut self, message: &str) -> Result<String, GlueError> {
        (**self).env_message(message)
    }

    fn episode(&mut self, max_steps: u32) -> Result<EpisodeExit, GlueError> {
        (**self).episode(max_steps)
    }

    fn return_value(&mut self) -> Result<f64, GlueError> {
        (**self).return_value()
    }

    fn cleanup(&mut self) -> Result<(), GlueError> {
        (**self).cleanup()
    }
}

/// An initialized session that sends `RL_cleanup` when it goes out of scope.
pub struct SessionGuard<G: Glue> {
    glue: G,
    cleaned_up: bool,
}

impl<G: Glue> SessionGuard<G> {
    pub fn init(mut glue: G) -> Result<(Self, String), GlueError> {
        let task_spec = glue.init()?;
        debug!(task_spec = %task_spec, "rl_glue session initialized");
        let guard = Self {
            glue,
            cleaned_up: false,
        };
        Ok((guard, task_spec))
    }

    /// Cleans up explicitly so the caller sees the error, if any.
    pub fn finish(mut self) -> Result<(), GlueError> {
        self.cleaned_up = true;
        self.glue.cleanup()
    }
}

impl<G: Glue> Deref for SessionGuard<G> {
    type Target = G;

    fn deref(&self) -> &Self::Target {
        &self.glue
    }
}

impl<G: Glue> DerefMut for SessionGuard<G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.glue
    }
}

impl<G: Glue> Drop for SessionGuard<G> {
    fn drop(&mut self) {
        if self.cleaned_up {
            return;
        }
        if let Err(err) = self.glue.cleanup() {
            warn!("rl_glue cleanup after failure did not complete: {err}");
        }
    }
}

#[cfg(test)]
mod test {
    use super::{EpisodeExit, Glue, SessionGuard};
    use crate::error::GlueError;

    #[derive(Default)]
    struct CountingGlue {
        cleanups: usize,
    }

    impl Glue for CountingGlue {
        fn init(&mut self) -> Result<String, GlueError> {
            Ok(String::new())
        }

        fn agent_message(&mut self, _message: &str) -> Result<String, GlueError> {
            Err(GlueError::Closed)
        }

        fn env_message(&mut self, _message: &str) -> Result<String, GlueError> {
            Ok(String::new())
        }

        fn episode(&mut self, _max_steps: u32) -> Result<EpisodeExit, GlueError> {
            Ok(EpisodeExit::StepLimit)
        }

        fn return_value(&mut self) -> Result<f64, GlueError> {
            Ok(0.)
        }

        fn cleanup(&mut self) -> Result<(), GlueError> {
            self.cleanups += 1;
            Ok(())
        }
    }

    #[test]
    fn guard_cleans_up_on_early_exit() {
        let mut glue = CountingGlue::default();
        let run = |glue: &mut CountingGlue| -> Result<(), GlueError> {
            let (mut session, _) = SessionGuard::init(glue)?;
            session.agent_message("plan")?;
            session.finish()
        };
        assert!(run(&mut glue).is_err());
        assert_eq!(glue.cleanups, 1);
    }

    #[test]
    fn finish_cleans_up_once() {
        let mut glue = CountingGlue::default();
        let (session, _) = SessionGuard::init(&mut glue).unwrap();
        session.finish().unwrap();
        assert_eq!(glue.cleanups, 1);
    }

    #[test]
    fn exit_status_from_wire() {
        assert_eq!(EpisodeExit::from(1), EpisodeExit::Terminated);
        assert_eq!(EpisodeExit::from(0), EpisodeExit::StepLimit);
    }
}
