//! Application configuration

use std::env;

use crate::error::{Error, Result};

const DEFAULT_VERIFY_TOKEN: &str = "verify_token_example";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GRAPH_API_BASE_URL: &str = "https://graph.facebook.com/v17.0";

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Main application configuration
///
/// Read once at startup and shared read-only with every component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page access token used as bearer auth on the Graph API
    pub page_access_token: Option<String>,
    /// App secret used to verify `X-Hub-Signature-256`
    pub app_secret: Option<String>,
    /// Numeric Instagram business account id
    pub ig_user_id: Option<String>,
    /// Token expected in the subscription handshake
    pub verify_token: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout_secs: u64,
    pub graph_api_base_url: String,
    /// Reject deliveries whose signature check would otherwise be skipped
    pub require_signature: bool,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values are treated the same as unset ones
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            page_access_token: get("META_PAGE_ACCESS_TOKEN"),
            app_secret: get("META_APP_SECRET"),
            ig_user_id: get("IG_USER_ID"),
            verify_token: get("WEBHOOK_VERIFY_TOKEN")
                .unwrap_or_else(|| DEFAULT_VERIFY_TOKEN.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_timeout_secs: parse_or("OPENAI_TIMEOUT_SECS", get("OPENAI_TIMEOUT_SECS"), 30)?,
            graph_api_base_url: get("GRAPH_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_API_BASE_URL.to_string()),
            require_signature: parse_bool(
                "REQUIRE_WEBHOOK_SIGNATURE",
                get("REQUIRE_WEBHOOK_SIGNATURE"),
            )?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 5000)?,
            log_format: match get("LOG_FORMAT").as_deref() {
                None | Some("pretty") => LogFormat::Pretty,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(Error::Config(format!(
                        "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                        other
                    )))
                }
            },
        })
    }

    /// Whether outbound Graph API calls can be made at all
    pub fn messaging_configured(&self) -> bool {
        self.page_access_token.is_some() && self.ig_user_id.is_some()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, v))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::Config(format!("{} must be a boolean, got '{}'", key, v))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.verify_token, "verify_token_example");
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.graph_api_base_url, "https://graph.facebook.com/v17.0");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.app_secret.is_none());
        assert!(!config.require_signature);
        assert!(!config.messaging_configured());
    }

    #[test]
    fn test_empty_values_are_absent() {
        let config = config_from(&[("META_APP_SECRET", ""), ("OPENAI_API_KEY", "  ")]).unwrap();

        assert!(config.app_secret.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_reads_credentials() {
        let config = config_from(&[
            ("META_PAGE_ACCESS_TOKEN", "token"),
            ("IG_USER_ID", "17841400000000000"),
            ("PORT", "8080"),
            ("REQUIRE_WEBHOOK_SIGNATURE", "true"),
            ("GRAPH_API_BASE_URL", "http://localhost:9000/"),
        ])
        .unwrap();

        assert!(config.messaging_configured());
        assert_eq!(config.port, 8080);
        assert!(config.require_signature);
        assert_eq!(config.graph_api_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_bool_is_an_error() {
        assert!(config_from(&[("REQUIRE_WEBHOOK_SIGNATURE", "maybe")]).is_err());
    }

    #[test]
    fn test_json_log_format() {
        let config = config_from(&[("LOG_FORMAT", "json")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
