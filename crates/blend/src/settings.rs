use std::path::{Path, PathBuf};

use mixwise_solvers::optimization::sqp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Solver settings, usually read from a TOML file.
///
/// Every field is optional in the file:
///
/// ```toml
/// max_iters = 500
/// ftol = 1e-10
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub max_iters: usize,
    pub ftol: f64,
    pub feasibility_tol: f64,
    pub step_tol: f64,
    pub max_backtracks: usize,
}

/// Errors that can occur when loading or applying settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid solver settings: {0}")]
    Invalid(#[from] sqp::ConfigError),
}

impl Default for Settings {
    fn default() -> Self {
        let config = sqp::Config::default();
        Self {
            max_iters: config.max_iters(),
            ftol: config.ftol(),
            feasibility_tol: config.feasibility_tol(),
            step_tol: config.step_tol(),
            max_backtracks: config.max_backtracks(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Builds a validated solver config.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn solver_config(&self) -> Result<sqp::Config, SettingsError> {
        Ok(sqp::Config::new(self.max_iters, self.ftol)?
            .with_feasibility_tol(self.feasibility_tol)?
            .with_step_tol(self.step_tol)?
            .with_max_backtracks(self.max_backtracks)?)
    }
}
