//! Shop settings loaded from `config.toml`.
//!
//! The file is optional: a missing file yields the defaults below, while a
//! file that exists but cannot be parsed is an error.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::Path;

/// Allowed `shop.history_budget` values. The upper bound is the longest
/// message Discord accepts.
pub const HISTORY_BUDGET_RANGE: RangeInclusive<usize> = 100..=2000;

/// Cities offered when `config.toml` does not list any.
pub const DEFAULT_CITIES: [&str; 10] = [
    "Moscow",
    "Saint Petersburg",
    "Novosibirsk",
    "Yekaterinburg",
    "Kazan",
    "Nizhny Novgorod",
    "Chelyabinsk",
    "Samara",
    "Omsk",
    "Rostov-on-Don",
];

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform user ids allowed into the admin panel
    pub admins: Vec<u64>,
    /// Cities a user can pick, in display order
    pub cities: Vec<String>,
    /// Storefront wording
    pub shop: ShopSettings,
}

/// Storefront wording and limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopSettings {
    /// Symbol appended to every amount
    pub currency: String,
    /// Payment instructions shown after checkout
    pub payment_details: String,
    /// Longest chat-history message before it is split
    pub history_budget: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            cities: DEFAULT_CITIES.iter().map(ToString::to_string).collect(),
            shop: ShopSettings::default(),
        }
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            currency: "₽".to_string(),
            payment_details: "Transfer the total to the card given by the operator, \
                then press \"I've paid\"."
                .to_string(),
            history_budget: 1900,
        }
    }
}

/// Loads shop configuration from a TOML file
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("{} not found, using default shop settings", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses the contents of a config file.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if !HISTORY_BUDGET_RANGE.contains(&config.shop.history_budget) {
        return Err(Error::Config {
            message: format!(
                "shop.history_budget must be between {} and {} characters",
                HISTORY_BUDGET_RANGE.start(),
                HISTORY_BUDGET_RANGE.end()
            ),
        });
    }
    Ok(config)
}

/// Loads configuration from `SHOP_CONFIG`, or `./config.toml` when unset.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("SHOP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
