// src/common/dev_mode.rs
//! Development mode configuration and utilities
//! Allows bypassing Google sign-in when running locally

use std::env;
use tracing::{info, warn};

use crate::auth::identity::VerifiedIdentity;

/// Provider subject id reserved for the dev user
pub const DEV_SUBJECT: &str = "dev-mode-user";

#[derive(Debug, Clone)]
pub struct DevModeConfig {
    pub enabled: bool,
    pub user_email: String,
    pub user_name: String,
}

impl Default for DevModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_email: "dev@test.com".to_string(),
            user_name: "Dev User".to_string(),
        }
    }
}

impl DevModeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        Self {
            enabled,
            user_email: env::var("DEV_USER_EMAIL").unwrap_or(defaults.user_email),
            user_name: env::var("DEV_USER_NAME").unwrap_or(defaults.user_name),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Identity upserted at startup so dev requests have a real user row to charge
    pub fn dev_identity(&self) -> VerifiedIdentity {
        VerifiedIdentity {
            subject: DEV_SUBJECT.to_string(),
            email: self.user_email.clone(),
            name: self.user_name.clone(),
            picture: None,
        }
    }
}

/// Log dev mode status on startup
pub fn log_dev_mode_status(config: &DevModeConfig) {
    if config.enabled {
        warn!(
            user = %config.user_name,
            email = %config.user_email,
            "⚠️  DEV MODE ENABLED - authentication bypassed, DO NOT USE IN PRODUCTION"
        );
    } else {
        info!("🔒 Production mode - Authentication required");
    }
}

/// Dev mode flag from CLI arguments, if one was given
pub fn parse_dev_mode_args<I>(args: I) -> Option<bool>
where
    I: IntoIterator<Item = String>,
{
    let mut result = None;
    for arg in args {
        match arg.as_str() {
            "--dev" | "--dev-mode" => result = Some(true),
            "--no-dev" | "--prod" | "--production" => result = Some(false),
            _ => {}
        }
    }
    result
}

/// Override dev mode from CLI args
pub fn apply_cli_override(mut config: DevModeConfig) -> DevModeConfig {
    if let Some(cli_dev_mode) = parse_dev_mode_args(env::args()) {
        info!(dev_mode = cli_dev_mode, "🔧 CLI override: DEV_MODE");
        config.enabled = cli_dev_mode;
    }

    config
}
