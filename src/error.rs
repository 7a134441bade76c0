use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LakeError>;

#[derive(Error, Debug)]
pub enum LakeError {
    /// Hyperparameters rejected before training starts.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// The environment returned something the Q-table update can't use.
    #[error("environment contract violated at episode {episode}, step {step}: {message}")]
    EnvironmentContract {
        episode: usize,
        step: usize,
        message: String,
    },

    /// Path can't be laid out as a rows x cols grid.
    #[error("cannot reshape path of length {len} into {rows}x{cols}")]
    ReshapeMismatch { len: usize, rows: usize, cols: usize },

    #[error("unable to read configuration file: {0}")]
    ConfigFile(#[from] config_file::ConfigFileError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LakeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        LakeError::Configuration { message: message.into() }
    }

    pub fn contract(episode: usize, step: usize, message: impl Into<String>) -> Self {
        LakeError::EnvironmentContract {
            episode,
            step,
            message: message.into(),
        }
    }

    /// Mark a contract violation as seen during greedy evaluation.
    pub fn in_evaluation(self) -> Self {
        match self {
            LakeError::EnvironmentContract { episode, step, message } => {
                LakeError::EnvironmentContract {
                    episode,
                    step,
                    message: format!("during greedy evaluation: {}", message),
                }
            }
            other => other,
        }
    }
}
