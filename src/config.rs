//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Passwords are referenced by env-var name in the config and resolved
//! at startup via `std::env::var`.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracing::info;

use crate::auth::{Authenticator, CredentialTable, Plan, SharedPassword};
use crate::types::PricingParams;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSection,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
    pub currency: String,
}

/// Defaults and bounds for the pricing parameters the shell accepts.
#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    pub default_target_margin_percent: f64,
    pub default_fixed_costs: f64,
    pub default_include_fixed_costs: bool,
    pub max_target_margin_percent: f64,
    pub max_fixed_costs: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_target_margin_percent: 30.0,
            default_fixed_costs: 0.0,
            default_include_fixed_costs: false,
            max_target_margin_percent: 99.0,
            max_fixed_costs: 100_000.0,
        }
    }
}

impl PricingConfig {
    /// Reject bounds that would make clamping meaningless.
    pub fn validate(&self) -> Result<()> {
        let max_margin = self.max_target_margin_percent;
        if !(max_margin.is_finite() && (0.0..100.0).contains(&max_margin)) {
            bail!("pricing.max_target_margin_percent must be in [0, 100), got {max_margin}");
        }
        let max_fixed = self.max_fixed_costs;
        if !(max_fixed.is_finite() && max_fixed >= 0.0) {
            bail!("pricing.max_fixed_costs must be a non-negative number, got {max_fixed}");
        }
        Ok(())
    }

    /// Build engine parameters from optional request values: missing or
    /// non-finite values take the defaults, the rest are clamped to range.
    pub fn params(
        &self,
        target_margin_percent: Option<f64>,
        fixed_costs: Option<f64>,
        include_fixed_costs: Option<bool>,
    ) -> PricingParams {
        let target = target_margin_percent
            .filter(|v| v.is_finite())
            .unwrap_or(self.default_target_margin_percent)
            .clamp(0.0, self.max_target_margin_percent);
        let fixed = fixed_costs
            .filter(|v| v.is_finite())
            .unwrap_or(self.default_fixed_costs)
            .clamp(0.0, self.max_fixed_costs);

        PricingParams {
            target_margin_percent: target,
            fixed_costs: fixed,
            include_fixed_costs: include_fixed_costs.unwrap_or(self.default_include_fixed_costs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    SharedPassword,
    Credentials,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// Env var holding the shared password (mode = "shared_password").
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub name: String,
    pub password_env: String,
    pub plan: Plan,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.pricing.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name).with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Build the authenticator selected by `[auth]`, resolving passwords
    /// from the environment.
    pub fn build_authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        match self.auth.mode {
            AuthMode::SharedPassword => {
                let Some(env) = self.auth.password_env.as_deref() else {
                    bail!("auth.password_env is required when auth.mode = \"shared_password\"");
                };
                let password = Self::resolve_env(env)?;
                info!(env, "Using shared password authentication");
                Ok(Arc::new(SharedPassword::new(SecretString::new(password))))
            }
            AuthMode::Credentials => {
                if self.auth.users.is_empty() {
                    bail!("auth.users must list at least one user when auth.mode = \"credentials\"");
                }
                let mut table = CredentialTable::new();
                for user in &self.auth.users {
                    let password = Self::resolve_env(&user.password_env)
                        .with_context(|| format!("Password for user {}", user.name))?;
                    table.insert(user.name.clone(), SecretString::new(password), user.plan);
                }
                info!(users = table.len(), "Using credential table authentication");
                Ok(Arc::new(table))
            }
        }
    }
}
