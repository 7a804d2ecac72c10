use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fraud::EvaluationConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub fraud: EvaluationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let flags = FeatureFlags::from_env(environment)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            fraud: EvaluationConfig::with_flags(flags),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Operational kill-switches read by the fraud pipeline.
///
/// Every evaluator receives these through [`EvaluationConfig`] instead of reading the
/// environment, so a test can flip a switch for one call without touching process state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub beneficiary_validation_after_fraud_checks: bool,
    pub pause_jouve_subscription: bool,
    pub enable_idcheck_fraud_controls: bool,
    pub enable_ine_whitelist_filter: bool,
    pub disable_name_validation: bool,
    pub allow_empty_user_profiling: bool,
    pub credit_v3_cutover: Option<NaiveDate>,
    pub dms_foreign_id_procedure: Option<u64>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            beneficiary_validation_after_fraud_checks: true,
            pause_jouve_subscription: false,
            enable_idcheck_fraud_controls: false,
            enable_ine_whitelist_filter: false,
            disable_name_validation: false,
            allow_empty_user_profiling: true,
            credit_v3_cutover: None,
            dms_foreign_id_procedure: None,
        }
    }
}

impl FeatureFlags {
    pub fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // name validation can only be switched off outside production
        let disable_name_validation = !environment.is_production()
            && bool_var(
                "FRAUD_DISABLE_NAME_VALIDATION",
                defaults.disable_name_validation,
            )?;

        let credit_v3_cutover = match optional_var("FRAUD_CREDIT_V3_CUTOVER") {
            Some(raw) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(
                |_| ConfigError::InvalidValue {
                    variable: "FRAUD_CREDIT_V3_CUTOVER",
                    value: raw.clone(),
                },
            )?),
            None => None,
        };

        let dms_foreign_id_procedure = match optional_var("FRAUD_DMS_FOREIGN_ID_PROCEDURE") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue {
                    variable: "FRAUD_DMS_FOREIGN_ID_PROCEDURE",
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            beneficiary_validation_after_fraud_checks: bool_var(
                "FRAUD_BENEFICIARY_VALIDATION_AFTER_FRAUD_CHECKS",
                defaults.beneficiary_validation_after_fraud_checks,
            )?,
            pause_jouve_subscription: bool_var(
                "FRAUD_PAUSE_JOUVE_SUBSCRIPTION",
                defaults.pause_jouve_subscription,
            )?,
            enable_idcheck_fraud_controls: bool_var(
                "FRAUD_ENABLE_IDCHECK_FRAUD_CONTROLS",
                defaults.enable_idcheck_fraud_controls,
            )?,
            enable_ine_whitelist_filter: bool_var(
                "FRAUD_ENABLE_INE_WHITELIST_FILTER",
                defaults.enable_ine_whitelist_filter,
            )?,
            disable_name_validation,
            allow_empty_user_profiling: bool_var(
                "FRAUD_ALLOW_EMPTY_USER_PROFILING",
                defaults.allow_empty_user_profiling,
            )?,
            credit_v3_cutover,
            dms_foreign_id_procedure,
        })
    }
}

fn optional_var(variable: &'static str) -> Option<String> {
    env::var(variable)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn bool_var(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = optional_var(variable) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            variable,
            value: raw,
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
