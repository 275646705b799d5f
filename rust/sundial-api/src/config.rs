//! Configuration management for Sundial.
//!
//! Configuration loads from defaults, an optional `config/sundial` file,
//! and `SUNDIAL__`-prefixed environment variables, with direct overrides
//! for the secrets that conventionally live in plain env vars.

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity verification configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Trigger service configuration.
    #[serde(default)]
    pub trigger: TriggerConfig,
    /// Generation backend configuration.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Mail relay configuration.
    #[serde(default)]
    pub mailer: MailerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment and config files.
    ///
    /// Sources, in order: defaults, `config/sundial.*` if present,
    /// `SUNDIAL__`-prefixed environment variables, then the well-known
    /// secret variables (`GENERATION_API_KEY`, `JWT_SECRET`,
    /// `MAILER_ENDPOINT`, `MAILER_API_KEY`, `MAILER_FROM`).
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/sundial").required(false))
            .add_source(
                config::Environment::with_prefix("SUNDIAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize().unwrap_or_default();

        // Generation backend API key (GROQ_API_KEY kept as an alias for
        // deployments pointed at Groq)
        if let Ok(key) = std::env::var("GENERATION_API_KEY") {
            app_config.generation.api_key = Some(key);
        } else if let Ok(key) = std::env::var("GROQ_API_KEY") {
            app_config.generation.api_key = Some(key);
        }

        // Gateway secrets
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            app_config.gateway.jwt_secret = Some(secret);
        }

        // Mail relay
        if let Ok(endpoint) = std::env::var("MAILER_ENDPOINT") {
            app_config.mailer.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("MAILER_API_KEY") {
            app_config.mailer.api_key = Some(key);
        }
        if let Ok(from) = std::env::var("MAILER_FROM") {
            app_config.mailer.from_address = Some(from);
        }

        Ok(app_config)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_request_timeout(),
        }
    }
}

/// Identity verification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HS256 secret for verifying identity tokens.
    pub jwt_secret: Option<String>,
}

/// Trigger service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Fixed timezone every cadence expression is evaluated in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key for the generation backend.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API (including version path).
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    /// Model to use.
    #[serde(default = "default_generation_model")]
    pub model: String,
    /// System prompt prepended to every scheduled prompt.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Temperature for sampling.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_generation_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_system_prompt() -> String {
    "You are Sundial, an assistant that writes scheduled reports. \
     Be concise, professional, and actionable in your responses."
        .to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_generation_base_url(),
            model: default_generation_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// Mail relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// HTTP endpoint of the mail relay.
    pub endpoint: Option<String>,
    /// API key for the relay.
    pub api_key: Option<String>,
    /// Sender address.
    pub from_address: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_mailer_timeout")]
    pub timeout_secs: u64,
}

fn default_mailer_timeout() -> u64 {
    30
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            from_address: None,
            timeout_secs: default_mailer_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to emit JSON log lines.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_any_environment() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.trigger.timezone, "UTC");
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
        assert!(config.gateway.jwt_secret.is_none());
        assert!(config.mailer.endpoint.is_none());
    }
}
