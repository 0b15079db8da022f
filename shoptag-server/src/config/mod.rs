//! Configuration module for shoptag-server.
//!
//! Secrets and the shop domain are read from the environment (or the
//! matching CLI flags); non-secret tuning comes from an optional TOML file.
//! Everything is validated once at startup and turned into an immutable
//! [`AppConfig`].

pub mod file;

use crate::config::file::FileConfig;
use clap::Parser;
use shoptag_core::config::{AdminApiConfig, AppConfig, TaggingConfig, WebhookConfig};
use shoptag_sdk::objects::WebhookTopic;
use shoptag_sdk::signature::WebhookSecrets;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Port used when neither `PORT`, `--listen` nor `[server] listen` is given.
pub const DEFAULT_PORT: u16 = 10000;

/// shoptag - tag new Shopify customers from authenticated webhooks
#[derive(Parser, Debug, Clone)]
#[command(name = "shoptag-server")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "SHOPTAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Port to listen on (all interfaces)
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// App API secret used to sign webhooks
    #[arg(long, env = "SHOPIFY_API_SECRET", hide_env_values = true)]
    pub api_secret: String,

    /// Previous API secret, still accepted while a rotation is in progress
    #[arg(long, env = "SHOPIFY_API_SECRET_PREVIOUS", hide_env_values = true)]
    pub api_secret_previous: Option<String>,

    /// Admin API access token
    #[arg(long, env = "SHOPIFY_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: String,

    /// The shop's myshopify.com domain
    #[arg(long, env = "SHOPIFY_STORE_DOMAIN")]
    pub store_domain: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "SHOPTAG_LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Server-only settings that never reach the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub app: AppConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    args: Args,
}

impl ConfigLoader {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if one was given
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = match &self.args.config {
            Some(path) => {
                let config_content = std::fs::read_to_string(path)?;
                toml::from_str(&config_content)?
            }
            None => FileConfig::default(),
        };
        self.build(file_config)
    }

    fn build(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let args = &self.args;
        self.validate(&file_config)?;

        let listen = args
            .listen
            .or(file_config.server.listen)
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port)));

        let shop_domain = normalize_shop_domain(&args.store_domain);

        let mut secrets = WebhookSecrets::new(args.api_secret.as_bytes().to_vec());
        if let Some(previous) = args.api_secret_previous.as_deref().filter(|s| !s.is_empty()) {
            secrets = secrets.with_previous(previous.as_bytes().to_vec());
        }

        let mut admin_api = AdminApiConfig::new(shop_domain.clone(), args.admin_token.trim());
        admin_api.api_version = file_config.admin_api.api_version;
        admin_api.timeout = Duration::from_secs(file_config.admin_api.timeout_secs);

        Ok(LoadedConfig {
            server: ServerConfig { listen },
            app: AppConfig {
                webhook: WebhookConfig::new(secrets).with_expected_shop_domain(shop_domain),
                admin_api,
                tagging: TaggingConfig {
                    tag: file_config.tagging.tag.trim().to_owned(),
                    topic: WebhookTopic::new(file_config.tagging.topic.trim()),
                    ack_mode: file_config.tagging.ack_mode,
                },
            },
        })
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_owned()));

        if self.args.api_secret.is_empty() {
            return invalid("SHOPIFY_API_SECRET is empty");
        }
        if self.args.admin_token.trim().is_empty() {
            return invalid("SHOPIFY_ADMIN_TOKEN is empty");
        }
        if normalize_shop_domain(&self.args.store_domain).is_empty() {
            return invalid("SHOPIFY_STORE_DOMAIN is empty");
        }

        let tag = config.tagging.tag.trim();
        if tag.is_empty() {
            return invalid("tagging.tag is empty");
        }
        if tag.contains(',') {
            return invalid("tagging.tag must not contain a comma");
        }
        if config.tagging.topic.trim().is_empty() {
            return invalid("tagging.topic is empty");
        }
        if config.admin_api.api_version.trim().is_empty() {
            return invalid("admin_api.api_version is empty");
        }
        if config.admin_api.timeout_secs == 0 {
            return invalid("admin_api.timeout_secs must be positive");
        }
        Ok(())
    }
}

/// Accept `shop.myshopify.com`, with or without scheme or trailing slash.
fn normalize_shop_domain(raw: &str) -> String {
    let domain = raw.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    domain.trim_end_matches('/').to_ascii_lowercase()
}
