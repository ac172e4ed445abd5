//! Forecast configuration builder.

use crate::config::{ForecastConfig, ForecastMethod, SmoothingParam, TunerStrategy};

/// Builder for a [`ForecastConfig`].
#[derive(Debug, Clone, Default)]
pub struct ForecastConfigBuilder {
    config: ForecastConfig,
}

impl ForecastConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one loaded from JSON.
    pub fn from_config(config: ForecastConfig) -> Self {
        Self { config }
    }

    // ========== Method Selection ==========

    /// Set forecasting method.
    pub fn method(mut self, method: ForecastMethod) -> Self {
        self.config.method = method;
        self
    }

    /// Use the linear trend forecaster.
    pub fn linear(self) -> Self {
        self.method(ForecastMethod::Linear)
    }

    /// Use the Holt forecaster.
    pub fn holt(self) -> Self {
        self.method(ForecastMethod::Holt)
    }

    /// Set number of months to forecast.
    pub fn horizon(mut self, months: usize) -> Self {
        self.config.horizon = months;
        self
    }

    // ========== Holt Parameters ==========

    /// Set level smoothing.
    pub fn alpha(mut self, alpha: impl Into<SmoothingParam>) -> Self {
        self.config.holt.alpha = alpha.into();
        self
    }

    /// Set trend smoothing.
    pub fn beta(mut self, beta: impl Into<SmoothingParam>) -> Self {
        self.config.holt.beta = beta.into();
        self
    }

    /// Tune both parameters with the given strategy.
    pub fn auto_tune(mut self, strategy: TunerStrategy) -> Self {
        self.config.holt.alpha = SmoothingParam::Auto;
        self.config.holt.beta = SmoothingParam::Auto;
        self.config.holt.tuner = strategy;
        self
    }

    /// Set tuner strategy without touching the parameters.
    pub fn tuner(mut self, strategy: TunerStrategy) -> Self {
        self.config.holt.tuner = strategy;
        self
    }

    // ========== Bootstrap ==========

    /// Enable bootstrap bands with the given number of trials.
    pub fn bootstrap(mut self, samples: usize) -> Self {
        self.config.holt.bootstrap = true;
        self.config.holt.bootstrap_samples = samples;
        self
    }

    /// Run the bootstrap as a cancelable background computation.
    pub fn bootstrap_async(mut self, enabled: bool) -> Self {
        self.config.holt.bootstrap_async = enabled;
        self
    }

    /// Seed bootstrap resampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.holt.seed = Some(seed);
        self
    }

    /// Include in-sample residuals in the result.
    pub fn return_residuals(mut self, enabled: bool) -> Self {
        self.config.holt.return_residuals = enabled;
        self
    }

    // ========== Build ==========

    /// Get configuration.
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn build(self) -> ForecastConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ForecastConfigBuilder::new().build();
        assert_eq!(config, ForecastConfig::default());
    }

    #[test]
    fn test_builder_holt_bootstrap() {
        let config = ForecastConfigBuilder::new()
            .holt()
            .horizon(6)
            .alpha(0.6)
            .beta(0.2)
            .bootstrap(500)
            .bootstrap_async(true)
            .seed(7)
            .build();

        assert_eq!(config.method, ForecastMethod::Holt);
        assert_eq!(config.horizon, 6);
        assert_eq!(config.holt.fixed_params(), Some((0.6, 0.2)));
        assert!(config.holt.bootstrap);
        assert_eq!(config.holt.bootstrap_samples, 500);
        assert!(config.holt.runs_async());
        assert_eq!(config.holt.seed, Some(7));
    }

    #[test]
    fn test_builder_auto_tune_resets_params() {
        let config = ForecastConfigBuilder::new()
            .alpha(0.3)
            .auto_tune(TunerStrategy::Advanced)
            .build();

        assert!(config.holt.alpha.is_auto());
        assert!(config.holt.beta.is_auto());
        assert_eq!(config.holt.tuner, TunerStrategy::Advanced);
    }
}
