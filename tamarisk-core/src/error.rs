use std::io;

#[derive(Debug, thiserror::Error)]
pub enum GlueError {
    #[error("could not reach rl_glue at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("rl_glue connection failed: {0}")]
    Io(#[from] io::Error),

    #[error("not synched with rl_glue: expected state {expected}, got {got}")]
    Desync { expected: i32, got: i32 },

    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("could not encode packet: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("could not decode packet: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("step limit {0} does not fit the wire format")]
    StepLimit(u32),

    #[error("read timeout must be positive, leave it unset to block")]
    ZeroReadTimeout,

    #[error("rl_glue session is closed")]
    Closed,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("river must have at least one reach")]
    NoReaches,

    #[error("reaches must have at least one habitat")]
    NoHabitats,

    #[error("a river of {reaches} reaches with {habitat_size} habitats each is too large")]
    RiverTooLarge { reaches: usize, habitat_size: usize },

    #[error("batch size must be at least 2 to estimate a variance, got {0}")]
    BatchTooSmall(usize),

    #[error("{0} episode length must be positive")]
    ZeroEpisodeLength(&'static str),

    #[error("environment observes {observed} habitats but the start state has {configured}")]
    HabitatCountMismatch { observed: usize, configured: usize },

    #[error("environment acts on {observed} reaches but {configured} are configured")]
    ReachCountMismatch { observed: usize, configured: usize },
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("sample variance needs at least 2 returns, got {0}")]
    TooFewSamples(usize),

    #[error("episode return {0} is not finite")]
    NonFiniteReturn(f64),
}
