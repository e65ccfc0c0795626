use core_types::Frequency;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub providers: ProviderSettings,
    pub fallbacks: MacroFallbacks,
    pub dca: DcaDefaults,
    pub dip: DipDefaults,
}

/// Bind address for the JSON API server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Settings shared by all live data-provider clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// How long a provider call may run before its fallback is substituted.
    pub request_timeout_secs: u64,
    /// Time-to-live for cached spot quotes.
    pub spot_cache_ttl_secs: u64,
    /// Time-to-live for cached historical series.
    pub history_cache_ttl_secs: u64,
    /// Optional CoinGecko demo API key, sent as a request header when set.
    pub coingecko_api_key: Option<String>,
    /// Whether the retail search-interest indicator is fetched at all.
    pub search_interest_enabled: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 8,
            spot_cache_ttl_secs: 30,
            history_cache_ttl_secs: 300,
            coingecko_api_key: None,
            search_interest_enabled: false,
        }
    }
}

/// Documented fallback levels substituted when a macro quote cannot be
/// fetched. A quote pinned exactly at its fallback with zero change is
/// reported as unavailable by the macro advisor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MacroFallbacks {
    pub currency_index: Decimal,
    pub long_yield: Decimal,
    pub rate_futures: Decimal,
}

impl Default for MacroFallbacks {
    fn default() -> Self {
        Self {
            currency_index: dec!(104.0),
            long_yield: dec!(4.2),
            // 95.38 implies a 4.62% short rate.
            rate_futures: dec!(95.38),
        }
    }
}

/// Stock accumulation-plan parameters used when a request omits them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DcaDefaults {
    pub frequency: Frequency,
    pub amount: Decimal,
    pub fear_threshold: u8,
    pub greed_threshold: u8,
    pub fear_multiplier: Decimal,
    pub greed_multiplier: Decimal,
}

impl Default for DcaDefaults {
    fn default() -> Self {
        Self {
            frequency: Frequency::Weekly,
            amount: dec!(100),
            fear_threshold: 25,
            greed_threshold: 75,
            fear_multiplier: dec!(2.0),
            greed_multiplier: dec!(0.5),
        }
    }
}

/// Sentiment thresholds for the dip-sizing ladder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DipDefaults {
    pub extreme_fear_threshold: u8,
    pub fear_threshold: u8,
}

impl Default for DipDefaults {
    fn default() -> Self {
        Self {
            extreme_fear_threshold: 20,
            fear_threshold: 40,
        }
    }
}
