use std::{io, path::PathBuf};
use tamarisk_core::error::{ConfigError, GlueError, StatsError};

#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Glue(#[from] GlueError),

    #[error("invalid experiment configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("could not write experiment log {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
