use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use pawmart_cart::TotalsConfig;
use pawmart_core::identity::OtpConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_tax_rate")]
    pub tax_rate_percent: f64,
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold_cents: i64,
    #[serde(default = "default_shipping_fee")]
    pub shipping_fee_cents: i64,
    /// Simulated payment processing time at checkout
    #[serde(default = "default_checkout_processing")]
    pub checkout_processing_ms: u64,
    #[serde(default = "default_max_line_quantity")]
    pub max_line_quantity: u32,
}

fn default_tax_rate() -> f64 { 8.0 }
fn default_free_shipping_threshold() -> i64 { 4900 }
fn default_shipping_fee() -> i64 { 599 }
fn default_checkout_processing() -> u64 { 1500 }
fn default_max_line_quantity() -> u32 { 10 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            tax_rate_percent: default_tax_rate(),
            free_shipping_threshold_cents: default_free_shipping_threshold(),
            shipping_fee_cents: default_shipping_fee(),
            checkout_processing_ms: default_checkout_processing(),
            max_line_quantity: default_max_line_quantity(),
        }
    }
}

impl BusinessRules {
    pub fn totals(&self) -> TotalsConfig {
        TotalsConfig {
            tax_rate_percent: self.tax_rate_percent,
            free_shipping_threshold_cents: self.free_shipping_threshold_cents,
            shipping_fee_cents: self.shipping_fee_cents,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_seconds: u64,
}

fn default_jwt_secret() -> String { "pawmart-dev-secret-change-me".to_string() }
fn default_jwt_expiration() -> u64 { 86_400 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_seconds: default_jwt_expiration(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 { 8080 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// Local persistence; without a path the store lives in memory only
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FulfillmentConfig {
    /// Seconds between automatic order advances; 0 disables the worker
    #[serde(default)]
    pub auto_advance_seconds: u64,
}

/// Housekeeping for OTP challenges and guest sessions
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Seconds between sweeps; 0 disables them
    #[serde(default = "default_sweep_seconds")]
    pub sweep_seconds: u64,
    #[serde(default = "default_guest_idle_minutes")]
    pub guest_idle_minutes: i64,
}

fn default_sweep_seconds() -> u64 { 60 }
fn default_guest_idle_minutes() -> i64 { 24 * 60 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sweep_seconds: default_sweep_seconds(),
            guest_idle_minutes: default_guest_idle_minutes(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `PAWMART_BUSINESS_RULES__TAX_RATE_PERCENT=7.5`
            .add_source(config::Environment::with_prefix("PAWMART").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = serde_json::from_str(r#"{"server":{"port":9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.business_rules.max_line_quantity, 10);
        assert_eq!(config.business_rules.totals().shipping_fee_cents, 599);
        assert_eq!(config.otp.code_length, 6);
        assert!(config.storage.snapshot_path.is_none());
        assert_eq!(config.fulfillment.auto_advance_seconds, 0);
        assert_eq!(config.sessions.sweep_seconds, 60);
        assert_eq!(config.sessions.guest_idle_minutes, 1440);
    }
}
