use std::path::Path;

use config_file::FromConfigFile;
use serde::Deserialize;
use tracing::info;

use crate::error::{LakeError, Result};

/// Hold information read from the TOML configuration file.
///
/// Missing keys fall back to the values of the reference FrozenLake run.
/// Unknown keys are rejected.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Step size alpha of the Bellman update, in (0, 1].
    pub learning_rate: f64,
    /// Discount factor, in [0, 1].
    pub gamma: f64,
    /// Number of training episodes.
    pub num_episodes: usize,
    /// Upper bound on episode length.
    pub max_steps_per_episode: usize,
    /// Seed for exploration noise and lake slips. Entropy when absent.
    pub seed: Option<u64>,
    /// Whether the lake surface is slippery.
    pub slippery: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.8,
            gamma: 0.95,
            num_episodes: 2000,
            max_steps_per_episode: 99,
            seed: None,
            slippery: true,
        }
    }
}

impl TrainConfig {
    /// Read and validate a configuration file.
    pub fn from_path(config_path: &Path) -> Result<TrainConfig> {
        info!(path = %config_path.display(), "Reading config file");
        let config = TrainConfig::from_config_file(config_path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_episodes == 0 {
            return Err(LakeError::configuration("num_episodes must be positive"));
        }
        if self.max_steps_per_episode == 0 {
            return Err(LakeError::configuration(
                "max_steps_per_episode must be positive",
            ));
        }
        if !self.learning_rate.is_finite()
            || self.learning_rate <= 0.0
            || self.learning_rate > 1.0
        {
            return Err(LakeError::configuration(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        // gamma = 1 is fine, episodes are capped by the step limit.
        if !self.gamma.is_finite() || !(0.0..=1.0).contains(&self.gamma) {
            return Err(LakeError::configuration(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn default_config_is_valid() {
        let config = TrainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_episodes, 2000);
        assert_eq!(config.max_steps_per_episode, 99);
    }

    #[test_case(0.0, 0.95, 10, 10; "Zero learning rate")]
    #[test_case(1.5, 0.95, 10, 10; "Learning rate above one")]
    #[test_case(f64::NAN, 0.95, 10, 10; "NaN learning rate")]
    #[test_case(0.5, -0.1, 10, 10; "Negative gamma")]
    #[test_case(0.5, 1.1, 10, 10; "Gamma above one")]
    #[test_case(0.5, f64::INFINITY, 10, 10; "Infinite gamma")]
    #[test_case(0.5, 0.9, 0, 10; "Zero episodes")]
    #[test_case(0.5, 0.9, 10, 0; "Zero step limit")]
    fn rejects_invalid_config(lr: f64, gamma: f64, episodes: usize, steps: usize) {
        let config = TrainConfig {
            learning_rate: lr,
            gamma,
            num_episodes: episodes,
            max_steps_per_episode: steps,
            ..TrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LakeError::Configuration { .. })
        ));
    }

    #[test]
    fn reads_partial_toml_file() {
        // Arrange
        let path = std::env::temp_dir()
            .join(format!("rustlake-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "learning_rate = 0.5").unwrap();
        writeln!(file, "num_episodes = 10").unwrap();
        writeln!(file, "seed = 7").unwrap();
        drop(file);
        // Act
        let config = TrainConfig::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        // Assert
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.num_episodes, 10);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.gamma, 0.95);
        assert!(config.slippery);
    }

    #[test]
    fn misspelled_key_is_rejected() {
        let path = std::env::temp_dir()
            .join(format!("rustlake-typo-config-{}.toml", std::process::id()));
        std::fs::write(&path, "learning_rat = 0.1\n").unwrap();
        let result = TrainConfig::from_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(LakeError::ConfigFile(_))));
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let path = std::env::temp_dir()
            .join(format!("rustlake-bad-config-{}.toml", std::process::id()));
        std::fs::write(&path, "num_episodes = 0\n").unwrap();
        let result = TrainConfig::from_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(LakeError::Configuration { .. })));
    }
}
