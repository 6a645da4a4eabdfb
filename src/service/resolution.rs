//! Create, resolve and statistics operations over a [`Storage`]
//!
//! The service owns the business rules (URL and validity checks, custom code
//! conflicts, collision retry for generated codes) and reports what it does
//! through [`Telemetry`]. The store stays free of telemetry.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use url::Url;

use super::{ServiceError, ServiceResult};
use crate::config::{Config, ShortCodeConfig};
use crate::models::{ClickInfo, StatsView, UrlRecord, Validity};
use crate::shortcode;
use crate::storage::{Storage, StorageError};
use crate::telemetry::{Level, Package, Telemetry};

const DEFAULT_VALIDITY_MINUTES: f64 = 30.0;

/// Input of [`ResolutionService::create_short_url`]
#[derive(Debug, Clone, Default)]
pub struct CreateShortUrl {
    pub url: String,
    /// Minutes; `None` applies the service default
    pub validity_minutes: Option<f64>,
    /// Caller-chosen code; empty counts as absent
    pub custom_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedShortUrl {
    pub shortcode: String,
    pub short_link: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ResolutionService {
    storage: Arc<dyn Storage>,
    telemetry: Telemetry,
    base_url: String,
    short_code: ShortCodeConfig,
    default_validity_minutes: f64,
}

impl ResolutionService {
    pub fn new(storage: Arc<dyn Storage>, telemetry: Telemetry, base_url: &str) -> Self {
        Self {
            storage,
            telemetry,
            base_url: base_url.trim_end_matches('/').to_string(),
            short_code: ShortCodeConfig::default(),
            default_validity_minutes: DEFAULT_VALIDITY_MINUTES,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, telemetry: Telemetry, config: &Config) -> Self {
        Self::new(storage, telemetry, &config.base_url)
            .with_short_code(config.short_code.clone())
            .with_default_validity(config.default_validity_minutes)
    }

    pub fn with_short_code(mut self, short_code: ShortCodeConfig) -> Self {
        self.short_code = short_code;
        self
    }

    pub fn with_default_validity(mut self, minutes: f64) -> Self {
        self.default_validity_minutes = minutes;
        self
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn short_link(&self, shortcode: &str) -> String {
        format!("{}/{}", self.base_url, shortcode)
    }

    /// Validate the request and store a new record under a custom or
    /// generated code.
    pub async fn create_short_url(&self, request: CreateShortUrl) -> ServiceResult<CreatedShortUrl> {
        // Stored in serialized form so it is always a valid Location header
        let Some(original_url) = parse_http_url(&request.url) else {
            self.telemetry.error(
                Package::Handler,
                format!("Invalid URL format: {}", request.url.escape_debug()),
            );
            return Err(ServiceError::InvalidUrl);
        };

        let minutes = request
            .validity_minutes
            .unwrap_or(self.default_validity_minutes);
        let Some(validity) = Validity::from_minutes(minutes) else {
            self.telemetry.error(
                Package::Handler,
                format!("Invalid validity period: {minutes}"),
            );
            return Err(ServiceError::InvalidValidity);
        };

        let custom_code = request.custom_code.filter(|code| !code.is_empty());

        let record = match custom_code {
            Some(code) => {
                self.create_with_custom_code(&code, original_url.as_str(), validity)
                    .await?
            }
            None => {
                self.create_with_generated_code(original_url.as_str(), validity)
                    .await?
            }
        };

        self.telemetry.info(
            Package::Db,
            format!("URL record created for shortcode: {}", record.shortcode),
        );

        Ok(CreatedShortUrl {
            short_link: self.short_link(&record.shortcode),
            shortcode: record.shortcode,
            expires_at: record.expires_at,
        })
    }

    async fn create_with_custom_code(
        &self,
        code: &str,
        url: &str,
        validity: Validity,
    ) -> ServiceResult<UrlRecord> {
        if !shortcode::is_valid_format(code) {
            self.telemetry.error(
                Package::Handler,
                format!("Invalid custom shortcode format: {code}"),
            );
            return Err(ServiceError::InvalidShortcodeFormat);
        }

        match self.storage.create_with_code(code, url, validity).await {
            Ok(record) => {
                self.telemetry
                    .info(Package::Service, format!("Using custom shortcode: {code}"));
                Ok(record)
            }
            Err(StorageError::Conflict) => {
                self.telemetry
                    .error(Package::Handler, format!("Shortcode collision: {code}"));
                Err(ServiceError::ShortcodeConflict)
            }
        }
    }

    async fn create_with_generated_code(
        &self,
        url: &str,
        validity: Validity,
    ) -> ServiceResult<UrlRecord> {
        let attempts = self.short_code.max_attempts;

        for attempt in 1..=attempts {
            let candidate = shortcode::generate(self.short_code.length);
            match self.storage.create_with_code(&candidate, url, validity).await {
                Ok(record) => {
                    self.telemetry.info(
                        Package::Service,
                        format!("Generated unique shortcode: {candidate}"),
                    );
                    return Ok(record);
                }
                Err(StorageError::Conflict) => {
                    self.telemetry.log(
                        Level::Debug,
                        Package::Service,
                        format!("Generated shortcode {candidate} already taken (attempt {attempt}/{attempts})"),
                    );
                }
            }
        }

        self.telemetry.error(
            Package::Service,
            format!("Failed to generate a unique shortcode after {attempts} attempts"),
        );
        Err(ServiceError::GenerationExhausted { attempts })
    }

    /// Look up the original URL and record the click.
    pub async fn resolve(&self, shortcode: &str, info: ClickInfo) -> ServiceResult<String> {
        let Some(record) = self.storage.get(shortcode).await else {
            self.telemetry.warn(
                Package::Handler,
                format!("Redirect failed - shortcode not found: {shortcode}"),
            );
            return Err(ServiceError::NotFound);
        };

        // The record may expire between lookup and click; the redirect still goes out
        if !self.storage.record_click(shortcode, info).await {
            self.telemetry.log(
                Level::Debug,
                Package::Service,
                format!("Click not recorded, shortcode expired after lookup: {shortcode}"),
            );
        }

        self.telemetry.info(
            Package::Service,
            format!("Redirecting to: {}", record.original_url),
        );

        Ok(record.original_url)
    }

    pub async fn get_statistics(&self, shortcode: &str) -> ServiceResult<StatsView> {
        let Some(record) = self.storage.get(shortcode).await else {
            self.telemetry.warn(
                Package::Handler,
                format!("Shortcode not found or expired: {shortcode}"),
            );
            return Err(ServiceError::NotFound);
        };

        self.telemetry.info(
            Package::Service,
            format!("Retrieving statistics for shortcode: {shortcode}"),
        );

        Ok(StatsView::from(record))
    }
}

/// Absolute URL with an `http` or `https` scheme
fn parse_http_url(candidate: &str) -> Option<Url> {
    Url::parse(candidate)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
