use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
#[cfg(feature = "clap")]
pub mod overrides;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_logging;
#[cfg(feature = "clap")]
pub use overrides::SimulationOverrides;
pub use settings::{
    BacktestSettings, Config, FactorParams, LoggingSettings, MacdParams, MetricsSettings, MomentumParams,
    PortfolioSettings, RsiParams, SmaCrossoverParams, TargetWeight, VolatilityParams,
};

/// Base name of the optional configuration file in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quantsim";

/// Prefix for environment overrides, e.g. `QUANTSIM_BACKTEST__COMMISSION_RATE`.
pub const ENV_PREFIX: &str = "QUANTSIM";

/// Loads the application configuration from `quantsim.toml`, if present,
/// layered with `QUANTSIM_*` environment variables.
pub fn load_config() -> Result<Config, ConfigError> {
    let source = config::File::with_name(DEFAULT_CONFIG_FILE).required(false);
    build(source)
}

/// Loads the configuration from an explicit file, which must exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let source = config::File::from(path.as_ref()).required(true);
    build(source)
}

fn build<T>(file: T) -> Result<Config, ConfigError>
where
    T: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::RebalanceFrequency;
    use std::io::Write;

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[backtest]
commission_rate = 0.001

[portfolio]
rebalance_frequency = "QE"
weights = [
    {{ symbol = "SPY", weight = 0.6 }},
    {{ symbol = "BND", weight = 0.4 }},
]

[factors.rsi]
period = 7
"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.backtest.commission_rate, 0.001);
        assert_eq!(config.backtest.max_position, 1.0);
        assert_eq!(config.portfolio.rebalance_frequency, RebalanceFrequency::Quarterly);
        let weights = config.portfolio.weights.as_ref().unwrap();
        assert_eq!(weights[0].symbol, "SPY");
        assert_eq!(weights[0].weight, 0.6);
        assert_eq!(config.factors.rsi.period, 7);
        assert_eq!(config.factors.macd.slow, 26);
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[backtest]\nmax_position = -2.0").unwrap();
        assert!(matches!(
            load_config_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load_config_from("/definitely/not/here/quantsim.toml").is_err());
    }
}
