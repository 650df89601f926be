//! Engine configuration.
//!
//! [`EngineConfig`] carries the solver settings, the numerical slack used by
//! the economic operations, and an optional seed community. Every field has a
//! default, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! budget_epsilon = 1e-12
//! decomposition_floor = 1e-12
//!
//! [solver]
//! max_iterations = 500
//! tolerance = 1e-9
//!
//! [seed]
//! names = ["Ann", "Bob"]
//! matrix = [[0.6, 0.4], [0.3, 0.7]]
//! ```
//!
//! Parsing (`from_toml_str`, `load`) requires the `config` feature.

use crate::economy::{Tolerances, DEFAULT_BUDGET_EPSILON, DEFAULT_DECOMPOSITION_FLOOR};
use crate::error::PicsyError;
use crate::solver::ContributionSolver;

/// Solver settings as they appear in configuration.
pub type SolverConfig = ContributionSolver;

/// Errors raised while loading or applying a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[cfg(feature = "config")]
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: std::path::PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`EngineConfig`].
    #[cfg(feature = "config")]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The seed community was rejected.
    #[error("invalid seed community: {0}")]
    Seed(#[from] PicsyError),
}

/// Initial community description.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedConfig {
    /// Member names, one per row. Missing or mismatched → auto-named.
    #[cfg_attr(feature = "serde", serde(default))]
    pub names: Option<Vec<String>>,
    /// Square evaluation matrix; rows are normalized on load.
    pub matrix: Vec<Vec<f64>>,
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Power-iteration settings.
    pub solver: SolverConfig,
    /// A spend may exceed the available budget by at most this much.
    pub budget_epsilon: f64,
    /// Floor for `1 − E[x][x]` during company decomposition.
    pub decomposition_floor: f64,
    /// Starting community. `None` → members A, B, C over the built-in seed matrix.
    pub seed: Option<SeedConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            budget_epsilon: DEFAULT_BUDGET_EPSILON,
            decomposition_floor: DEFAULT_DECOMPOSITION_FLOOR,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Tolerances derived from this configuration.
    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            budget_epsilon: self.budget_epsilon,
            decomposition_floor: self.decomposition_floor,
        }
    }

    /// Check numeric settings. The seed matrix is checked when it is applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("solver: {err}")))?;
        self.tolerances()
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    #[cfg(feature = "config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "failed to read config");
            ConfigError::Io { path: path.to_path_buf(), source }
        })?;
        Self::from_toml_str(&text).map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "rejected config");
            err
        })
    }
}
