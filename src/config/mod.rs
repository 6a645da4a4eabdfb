use anyhow::{bail, Context};
use axum::http::StatusCode;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::models::Validity;
use crate::shortcode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// Prefix of every short link handed out, without trailing slash
    pub base_url: String,
    pub short_code: ShortCodeConfig,
    /// Validity applied when a create request carries none
    pub default_validity_minutes: f64,
    pub redirect_status: RedirectMode,
    pub analytics: AnalyticsConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortCodeConfig {
    /// Length of generated codes
    pub length: usize,
    /// Candidates tried before giving up on generation
    pub max_attempts: usize,
}

impl Default for ShortCodeConfig {
    fn default() -> Self {
        Self {
            length: shortcode::DEFAULT_LENGTH,
            max_attempts: 10,
        }
    }
}

/// Status code used for redirects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// 302
    #[default]
    Found,
    /// 307
    Temporary,
    /// 308
    Permanent,
}

impl RedirectMode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectMode::Permanent => StatusCode::PERMANENT_REDIRECT,
        }
    }
}

/// How much to trust forwarding headers when picking the client address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Use the socket peer address only
    #[default]
    None,
    /// Forwarded / X-Forwarded-For
    Standard,
    /// CF-Connecting-IP
    Cloudflare,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub trusted_proxy_mode: TrustedProxyMode,
    /// Proxy networks skipped when walking X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<IpNet>,
    /// Fixed number of proxy hops in front of the service
    #[serde(default)]
    pub num_trusted_proxies: Option<usize>,
    /// Record client addresses truncated to /24 (IPv4) or /48 (IPv6)
    #[serde(default)]
    pub ip_anonymization: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "TelemetryConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "TelemetryConfig::default_buffer_size")]
    pub buffer_size: usize,
}

impl TelemetryConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }

    const fn default_buffer_size() -> usize {
        1024
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            token: None,
            timeout_secs: Self::default_timeout_secs(),
            buffer_size: Self::default_buffer_size(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let base_url = lookup("BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let mut short_code = ShortCodeConfig::default();
        if let Some(length) = lookup("SHORT_CODE_LENGTH") {
            short_code.length = length
                .parse()
                .context("SHORT_CODE_LENGTH must be a number")?;
        }
        if !(shortcode::MIN_LENGTH..=shortcode::MAX_LENGTH).contains(&short_code.length) {
            bail!(
                "SHORT_CODE_LENGTH must be between {} and {}",
                shortcode::MIN_LENGTH,
                shortcode::MAX_LENGTH
            );
        }
        if let Some(attempts) = lookup("SHORT_CODE_MAX_ATTEMPTS") {
            short_code.max_attempts = attempts
                .parse()
                .context("SHORT_CODE_MAX_ATTEMPTS must be a number")?;
        }
        if short_code.max_attempts == 0 {
            bail!("SHORT_CODE_MAX_ATTEMPTS must be at least 1");
        }

        let default_validity_minutes = match lookup("DEFAULT_VALIDITY_MINUTES") {
            Some(v) => v
                .parse::<f64>()
                .context("DEFAULT_VALIDITY_MINUTES must be a number")?,
            None => 30.0,
        };
        if Validity::from_minutes(default_validity_minutes).is_none() {
            bail!("DEFAULT_VALIDITY_MINUTES must be a positive number of minutes");
        }

        let redirect_status = match lookup("REDIRECT_STATUS").as_deref() {
            None | Some("302") => RedirectMode::Found,
            Some("307") => RedirectMode::Temporary,
            Some("308") => RedirectMode::Permanent,
            Some(other) => {
                tracing::warn!(
                    "Unknown REDIRECT_STATUS '{other}', falling back to 302. Supported values: 302, 307, 308"
                );
                RedirectMode::Found
            }
        };

        let trusted_proxy_mode = match lookup("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|| "none".to_string())
            .to_lowercase()
            .as_str()
        {
            "none" => TrustedProxyMode::None,
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'none'. Supported values: none, standard, cloudflare"
                );
                TrustedProxyMode::None
            }
        };

        let trusted_proxies = lookup("TRUSTED_PROXIES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<IpNet>()
                            .with_context(|| format!("Invalid CIDR in TRUSTED_PROXIES: {s}"))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let num_trusted_proxies = lookup("NUM_TRUSTED_PROXIES")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("NUM_TRUSTED_PROXIES must be a number")?;

        let ip_anonymization = lookup("IP_ANONYMIZATION")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let telemetry_enabled = lookup("TELEMETRY_ENABLED")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let telemetry = if telemetry_enabled {
            let endpoint = lookup("TELEMETRY_ENDPOINT")
                .context("TELEMETRY_ENDPOINT must be set when TELEMETRY_ENABLED=true")?;

            TelemetryConfig {
                enabled: true,
                endpoint: Some(endpoint),
                token: lookup("TELEMETRY_TOKEN"),
                timeout_secs: lookup("TELEMETRY_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or_else(TelemetryConfig::default_timeout_secs),
                buffer_size: lookup("TELEMETRY_BUFFER_SIZE")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or_else(TelemetryConfig::default_buffer_size),
            }
        } else {
            TelemetryConfig::default()
        };

        Ok(Config {
            server: ServerConfig { host, port },
            base_url,
            short_code,
            default_validity_minutes,
            redirect_status,
            analytics: AnalyticsConfig {
                trusted_proxy_mode,
                trusted_proxies,
                num_trusted_proxies,
                ip_anonymization,
            },
            telemetry,
        })
    }
}
