use thiserror::Error;

/// Configuration for the SQP solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_iters: usize,
    ftol: f64,
    feasibility_tol: f64,
    step_tol: f64,
    max_backtracks: usize,
}

/// Errors that can occur when validating an SQP solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_iters must be positive")]
    MaxIters,

    #[error("ftol must be finite and non-negative")]
    Ftol,

    #[error("feasibility_tol must be finite and non-negative")]
    FeasibilityTol,

    #[error("step_tol must be finite and non-negative")]
    StepTol,

    #[error("max_backtracks must be positive")]
    MaxBacktracks,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            ftol: 1e-9,
            feasibility_tol: 1e-8,
            step_tol: 1e-12,
            max_backtracks: 40,
        }
    }
}

impl Config {
    /// Creates a config with the given iteration limit and objective
    /// tolerance, and default values for everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero or `ftol` is negative or
    /// non-finite.
    pub fn new(max_iters: usize, ftol: f64) -> Result<Self, ConfigError> {
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if !is_tolerance(ftol) {
            return Err(ConfigError::Ftol);
        }

        Ok(Self {
            max_iters,
            ftol,
            ..Self::default()
        })
    }

    /// Sets the largest constraint violation that still counts as feasible.
    ///
    /// # Errors
    ///
    /// Returns an error if `tol` is negative or non-finite.
    pub fn with_feasibility_tol(self, tol: f64) -> Result<Self, ConfigError> {
        if !is_tolerance(tol) {
            return Err(ConfigError::FeasibilityTol);
        }
        Ok(Self {
            feasibility_tol: tol,
            ..self
        })
    }

    /// Sets the search direction norm below which a feasible iterate is
    /// accepted as optimal.
    ///
    /// # Errors
    ///
    /// Returns an error if `tol` is negative or non-finite.
    pub fn with_step_tol(self, tol: f64) -> Result<Self, ConfigError> {
        if !is_tolerance(tol) {
            return Err(ConfigError::StepTol);
        }
        Ok(Self {
            step_tol: tol,
            ..self
        })
    }

    /// Sets how many times the line search may halve the step.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_backtracks` is zero.
    pub fn with_max_backtracks(self, max_backtracks: usize) -> Result<Self, ConfigError> {
        if max_backtracks == 0 {
            return Err(ConfigError::MaxBacktracks);
        }
        Ok(Self {
            max_backtracks,
            ..self
        })
    }

    /// Returns the maximum number of major iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the objective change tolerance.
    #[must_use]
    pub fn ftol(&self) -> f64 {
        self.ftol
    }

    #[must_use]
    pub fn feasibility_tol(&self) -> f64 {
        self.feasibility_tol
    }

    #[must_use]
    pub fn step_tol(&self) -> f64 {
        self.step_tol
    }

    #[must_use]
    pub fn max_backtracks(&self) -> usize {
        self.max_backtracks
    }
}

fn is_tolerance(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.max_iters(), 1000);
        assert_eq!(config.ftol(), 1e-9);
        assert_eq!(config.max_backtracks(), 40);
    }

    #[test]
    fn new_keeps_other_defaults() {
        let config = Config::new(50, 1e-6).unwrap();

        assert_eq!(config.max_iters(), 50);
        assert_eq!(config.ftol(), 1e-6);
        assert_eq!(config.feasibility_tol(), Config::default().feasibility_tol());
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(Config::new(0, 1e-9), Err(ConfigError::MaxIters));
        assert_eq!(Config::new(10, f64::NAN), Err(ConfigError::Ftol));
        assert_eq!(Config::new(10, -1.0), Err(ConfigError::Ftol));

        let config = Config::default();
        assert_eq!(
            config.with_feasibility_tol(f64::INFINITY),
            Err(ConfigError::FeasibilityTol)
        );
        assert_eq!(config.with_step_tol(-1e-3), Err(ConfigError::StepTol));
        assert_eq!(
            config.with_max_backtracks(0),
            Err(ConfigError::MaxBacktracks)
        );
    }
}
