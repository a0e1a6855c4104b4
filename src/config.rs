//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use crate::domain::{AccountNumberGenerator, DomainError};

/// Bank-level configuration: the fixed identifier prefix used when
/// generating account numbers, and the default account currency.
#[derive(Debug, Clone)]
pub struct Config {
    /// 2-letter country code for generated account numbers
    pub country_code: String,

    /// Fixed bank code of the institution
    pub bank_code: String,

    /// Fixed branch code of the institution
    pub branch_code: String,

    /// Default currency for new accounts
    pub default_currency: String,
}

impl Config {
    /// Load configuration, picking up a `.env` file if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let country_code = env::var("BANK_COUNTRY_CODE").unwrap_or_else(|_| "FR".to_string());
        let bank_code = env::var("BANK_CODE").unwrap_or_else(|_| "30004".to_string());
        let branch_code = env::var("BANK_BRANCH_CODE").unwrap_or_else(|_| "00827".to_string());
        let default_currency = env::var("BANK_DEFAULT_CURRENCY").unwrap_or_else(|_| "EUR".to_string());

        let config = Self {
            country_code,
            bank_code,
            branch_code,
            default_currency,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the account-number generator for this bank's prefix.
    pub fn account_number_generator(&self) -> Result<AccountNumberGenerator, ConfigError> {
        AccountNumberGenerator::new(&self.country_code, &self.bank_code, &self.branch_code)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // The generator constructor validates the prefix shape
        AccountNumberGenerator::new(&self.country_code, &self.bank_code, &self.branch_code)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        crate::domain::Money::new(rust_decimal::Decimal::ZERO, &self.default_currency)
            .map_err(|e: DomainError| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country_code: "FR".to_string(),
            bank_code: "30004".to_string(),
            branch_code: "00827".to_string(),
            default_currency: "EUR".to_string(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}
