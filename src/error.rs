//! Error types for channel setup and configuration

use thiserror::Error;

use crate::registry::ParticleId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No minimizer backend available (requested: {requested:?})")]
    NoMinimizerAvailable { requested: Vec<String> },

    #[error("Unknown particle handle {0:?}")]
    UnknownParticle(ParticleId),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Invalid mass distribution: {0}")]
    InvalidDistribution(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
