//! Service settings loading from config.toml
//!
//! The TOML file tunes the retention sweeper, the low-stock threshold and the
//! negative-stock policy, and lists a seed catalog of products that is inserted on
//! startup when missing. Every key is optional; an absent file yields the defaults.

use crate::core::ledger::NegativeStockPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Resolved requests older than this many days are purged.
pub const DEFAULT_RETENTION_DAYS: i64 = 60;
/// Products below this stock level are flagged.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
/// How often the retention sweeper re-runs after startup.
pub const DEFAULT_SWEEP_INTERVAL_HOURS: u64 = 24;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Age in days after which approved/rejected requests are deleted
    pub retention_days: i64,
    /// Hours between retention sweeps
    pub sweep_interval_hours: u64,
    /// Stock level below which a product counts as low
    pub low_stock_threshold: i64,
    /// What approval does when a stock-out exceeds the stock on hand
    pub negative_stock_policy: NegativeStockPolicy,
    /// Discord channel that receives low-stock alerts; alerts are only logged when unset
    pub low_stock_channel_id: Option<u64>,
    /// Catalog entries to create on startup if no product with that name exists
    pub products: Vec<ProductSeed>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            sweep_interval_hours: DEFAULT_SWEEP_INTERVAL_HOURS,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            negative_stock_policy: NegativeStockPolicy::default(),
            low_stock_channel_id: None,
            products: Vec::new(),
        }
    }
}

/// A single seed catalog entry
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProductSeed {
    /// Product name
    pub name: String,
    /// Optional size descriptor
    #[serde(default)]
    pub size: Option<String>,
    /// Initial stock, defaults to zero
    #[serde(default)]
    pub stock: i64,
}

impl Settings {
    fn validate(self) -> Result<Self> {
        if self.retention_days <= 0 {
            return Err(Error::Config {
                message: format!("retention_days must be positive, got {}", self.retention_days),
            });
        }
        if self.sweep_interval_hours == 0 {
            return Err(Error::Config {
                message: "sweep_interval_hours must be at least 1".to_string(),
            });
        }
        if self.low_stock_threshold < 0 {
            return Err(Error::Config {
                message: format!(
                    "low_stock_threshold cannot be negative, got {}",
                    self.low_stock_threshold
                ),
            });
        }
        if self.low_stock_channel_id == Some(0) {
            return Err(Error::Config {
                message: "low_stock_channel_id cannot be 0".to_string(),
            });
        }
        if let Some(seed) = self.products.iter().find(|p| p.stock < 0) {
            return Err(Error::Config {
                message: format!("seed product '{}' has negative stock", seed.name),
            });
        }
        Ok(self)
    }
}

/// Parses settings from a TOML string.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value is out of range.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str::<Settings>(contents)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?
        .validate()
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `CONFIG_PATH` (default `./config.toml`), falling back to the
/// defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!(%path, "No config file found, using default settings");
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            retention_days = 30
            sweep_interval_hours = 6
            low_stock_threshold = 3
            negative_stock_policy = "floor_at_zero"
            low_stock_channel_id = 123456789012345678

            [[products]]
            name = "Polo Shirt"
            size = "XL"
            stock = 12

            [[products]]
            name = "Cap"
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.retention_days, 30);
        assert_eq!(settings.sweep_interval_hours, 6);
        assert_eq!(settings.low_stock_threshold, 3);
        assert_eq!(
            settings.negative_stock_policy,
            NegativeStockPolicy::FloorAtZero
        );
        assert_eq!(settings.low_stock_channel_id, Some(123_456_789_012_345_678));
        assert_eq!(settings.products.len(), 2);
        assert_eq!(settings.products[0].size.as_deref(), Some("XL"));
        assert_eq!(settings.products[1].stock, 0);
        assert!(settings.products[1].size.is_none());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retention_days, 60);
        assert_eq!(settings.negative_stock_policy, NegativeStockPolicy::Reject);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(matches!(
            parse_settings("retention_days = 0"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_settings("low_stock_threshold = -1"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_settings("[[products]]\nname = \"X\"\nstock = -4"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_settings("low_stock_channel_id = 0"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_settings("negative_stock_policy = \"sometimes\""),
            Err(Error::Config { .. })
        ));
    }
}
