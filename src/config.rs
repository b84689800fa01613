use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters of the `Simulator` itself.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub dimension: usize,
    pub population_size: usize,
    pub mutation_rate: f64,
    pub elite_size: usize,
    /// Seed of the random source, OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Global multiplier of the force field used during fitness evaluation
    #[serde(default = "default_field_strength")]
    pub field_strength: f64,
}

/// Parameters of a single evolutionary run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub generations: usize,
    #[serde(default)]
    pub verbose: bool,
    pub virtue_names: Vec<String>,
    /// Basins per template, every name when absent
    #[serde(default)]
    pub n_virtues: Option<usize>,
    /// Where the winning template is exported, nothing is written when absent
    #[serde(default)]
    pub output_file: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub simulator: SimulatorConfig,
    pub run: RunConfig,
}

fn default_field_strength() -> f64 {
    1.0
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Checks the values a run cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulator;
        if sim.dimension == 0 {
            return Err(ConfigError::Invalid("dimension must be at least 1".into()));
        }
        if sim.population_size == 0 {
            return Err(ConfigError::Invalid(
                "population_size must be at least 1".into(),
            ));
        }
        if sim.elite_size > sim.population_size {
            return Err(ConfigError::Invalid(format!(
                "elite_size ({}) cannot exceed population_size ({})",
                sim.elite_size, sim.population_size
            )));
        }
        if !(0.0..=1.0).contains(&sim.mutation_rate) {
            return Err(ConfigError::Invalid(format!(
                "mutation_rate must lie in [0, 1], got {}",
                sim.mutation_rate
            )));
        }
        if self.run.virtue_names.is_empty() {
            return Err(ConfigError::Invalid("virtue_names cannot be empty".into()));
        }
        if self.run.n_virtues == Some(0) {
            return Err(ConfigError::Invalid("n_virtues must be at least 1".into()));
        }
        Ok(())
    }
}
