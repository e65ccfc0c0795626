use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, DcaDefaults, DipDefaults, MacroFallbacks, ProviderSettings, ServerSettings,
};

/// Loads the application configuration from the `config.toml` file.
///
/// The file is optional: every setting carries a default, so a missing file
/// yields the stock configuration rather than an error.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`
        .add_source(config::File::with_name("config.toml").required(false))
        // Optionally, one could add environment variables here as well.
        // .add_source(config::Environment::with_prefix("STACKER"));
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_documented_levels() {
        let config = Config::default();
        assert_eq!(config.providers.request_timeout_secs, 8);
        assert_eq!(config.fallbacks.currency_index, dec!(104.0));
        assert_eq!(config.fallbacks.long_yield, dec!(4.2));
        assert_eq!(config.fallbacks.rate_futures, dec!(95.38));
        assert_eq!(config.dip.extreme_fear_threshold, 20);
        assert_eq!(config.dip.fear_threshold, 40);
    }
}
