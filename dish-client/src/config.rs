//! Client configuration

use rust_decimal::Decimal;
use std::str::FromStr;

/// Client configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DISH_LOCK_CHANNEL_CAPACITY | 16 | lock notification buffer |
/// | DISH_DELIVERY_FEE | 2.99 | flat delivery fee |
/// | DISH_SERVICE_FEE | 0.99 | flat service fee |
/// | DISH_ETA_MINUTES | 35 | ETA stamped on new orders |
/// | DISH_LOG_LEVEL | info | logger level |
/// | DISH_LOG_JSON | false | JSON log output |
///
/// Values that fail to parse fall back to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Broadcast buffer of the lock notification channel
    pub lock_channel_capacity: usize,
    /// Flat delivery fee applied at checkout
    pub delivery_fee: Decimal,
    /// Flat service fee applied at checkout
    pub service_fee: Decimal,
    /// ETA estimate stamped on new orders
    pub eta_minutes: u32,
    /// Logger level (e.g. "info", "debug")
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            lock_channel_capacity: 16,
            delivery_fee: Decimal::new(299, 2),
            service_fee: Decimal::new(99, 2),
            eta_minutes: 35,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            lock_channel_capacity: parse_or(
                lookup("DISH_LOCK_CHANNEL_CAPACITY"),
                defaults.lock_channel_capacity,
            )
            .max(1),
            delivery_fee: parse_or(lookup("DISH_DELIVERY_FEE"), defaults.delivery_fee),
            service_fee: parse_or(lookup("DISH_SERVICE_FEE"), defaults.service_fee),
            eta_minutes: parse_or(lookup("DISH_ETA_MINUTES"), defaults.eta_minutes),
            log_level: lookup("DISH_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: parse_or(lookup("DISH_LOG_JSON"), defaults.log_json),
        }
    }

    /// Set the lock channel capacity
    pub fn with_lock_channel_capacity(mut self, capacity: usize) -> Self {
        self.lock_channel_capacity = capacity.max(1);
        self
    }

    /// Set the flat delivery and service fees
    pub fn with_fees(mut self, delivery_fee: Decimal, service_fee: Decimal) -> Self {
        self.delivery_fee = delivery_fee;
        self.service_fee = service_fee;
        self
    }

    /// Set the ETA estimate
    pub fn with_eta_minutes(mut self, minutes: u32) -> Self {
        self.eta_minutes = minutes;
        self
    }

    /// Set the logger level and format
    pub fn with_logging(mut self, level: impl Into<String>, json: bool) -> Self {
        self.log_level = level.into();
        self.log_json = json;
        self
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.lock_channel_capacity, 16);
        assert_eq!(config.delivery_fee, Decimal::new(299, 2));
        assert_eq!(config.eta_minutes, 35);
        assert!(!config.log_json);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DISH_DELIVERY_FEE", "4.50"),
            ("DISH_ETA_MINUTES", "20"),
            ("DISH_LOG_JSON", "true"),
            ("DISH_LOCK_CHANNEL_CAPACITY", "0"),
        ]);
        let config = ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.delivery_fee, Decimal::new(450, 2));
        assert_eq!(config.eta_minutes, 20);
        assert!(config.log_json);
        // Zero capacity would make the broadcast channel panic
        assert_eq!(config.lock_channel_capacity, 1);
        assert_eq!(config.service_fee, Decimal::new(99, 2));
    }

    #[test]
    fn test_config_invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(|k| match k {
            "DISH_ETA_MINUTES" => Some("soon".to_string()),
            "DISH_SERVICE_FEE" => Some("free".to_string()),
            _ => None,
        });
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_fees(Decimal::ZERO, Decimal::ONE)
            .with_eta_minutes(10)
            .with_logging("debug", true);
        assert_eq!(config.delivery_fee, Decimal::ZERO);
        assert_eq!(config.service_fee, Decimal::ONE);
        assert_eq!(config.eta_minutes, 10);
        assert_eq!(config.log_level, "debug");
    }
}
