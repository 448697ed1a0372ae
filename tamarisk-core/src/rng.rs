// Start states have to be reproducible: every evaluation batch replays the same draws so the
// learned and heuristic agents are compared on identical rivers.

use crate::error::ConfigError;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fmt;

pub const SET_START_STATE: &str = "set-start-state";

/// Content of a single habitat slot, using the environment's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Habitat {
    Invaded = 1,
    Native = 2,
    Empty = 3,
}

impl Habitat {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Dimensions of the river: number of reaches times habitats per reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiverShape {
    reaches: usize,
    habitat_size: usize,
    habitats: usize,
}

impl RiverShape {
    pub fn new(reaches: usize, habitat_size: usize) -> Result<Self, ConfigError> {
        if reaches == 0 {
            return Err(ConfigError::NoReaches);
        }
        if habitat_size == 0 {
            return Err(ConfigError::NoHabitats);
        }
        // the habitat count travels as an i32 in the task spec and the observation
        let habitats = reaches
            .checked_mul(habitat_size)
            .filter(|habitats| i32::try_from(*habitats).is_ok())
            .ok_or(ConfigError::RiverTooLarge {
                reaches,
                habitat_size,
            })?;
        Ok(Self {
            reaches,
            habitat_size,
            habitats,
        })
    }

    pub fn reaches(&self) -> usize {
        self.reaches
    }

    pub fn habitat_size(&self) -> usize {
        self.habitat_size
    }

    pub fn habitats(&self) -> usize {
        self.habitats
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartState(Vec<Habitat>);

impl StartState {
    pub fn new(habitats: Vec<Habitat>) -> Self {
        Self(habitats)
    }

    pub fn habitats(&self) -> &[Habitat] {
        &self.0
    }

    /// Environment message that installs this state.
    pub fn to_command(&self) -> String {
        format!("{SET_START_STATE} {self}")
    }
}

impl fmt::Display for StartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, habitat) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", habitat.value())?;
        }
        Ok(())
    }
}

pub struct StartStateSampler {
    shape: RiverShape,
    seed: u64,
    rng: StdRng,
}

impl StartStateSampler {
    pub fn new(shape: RiverShape, seed: u64) -> Self {
        Self {
            shape,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Rewinds to the first draw of the seed.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn next_state(&mut self) -> StartState {
        let habitats = (0..self.shape.habitats())
            .map(|_| match self.rng.random_range(1..=3u8) {
                1 => Habitat::Invaded,
                2 => Habitat::Native,
                _ => Habitat::Empty,
            })
            .collect();
        StartState(habitats)
    }
}
