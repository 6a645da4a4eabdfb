use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "unknown";
const DIRECT: &str = "direct";

/// Upper bound on a validity period (100 years)
const MAX_VALIDITY_MINUTES: f64 = 100.0 * 365.0 * 24.0 * 60.0;

/// Strictly positive validity period, millisecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity(Duration);

impl Validity {
    /// Convert a (possibly fractional) number of minutes.
    ///
    /// Returns `None` for non-finite or non-positive input, for input that
    /// rounds to zero milliseconds, and for periods over 100 years.
    pub fn from_minutes(minutes: f64) -> Option<Self> {
        if !minutes.is_finite() || minutes <= 0.0 || minutes > MAX_VALIDITY_MINUTES {
            return None;
        }

        let millis = (minutes * 60_000.0).round() as i64;
        if millis <= 0 {
            return None;
        }

        Some(Self(Duration::milliseconds(millis)))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

/// A single successful redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub referrer: String,
    pub location: String,
}

impl ClickEvent {
    /// Build an event from request metadata, filling in defaults for
    /// anything missing or empty.
    pub fn from_info(timestamp: DateTime<Utc>, info: ClickInfo) -> Self {
        fn or_default(value: Option<String>, default: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }

        Self {
            timestamp,
            source: or_default(info.source, UNKNOWN),
            referrer: or_default(info.referrer, DIRECT),
            location: or_default(info.location, UNKNOWN),
        }
    }
}

/// Request metadata captured on redirect
#[derive(Debug, Clone, Default)]
pub struct ClickInfo {
    /// User agent
    pub source: Option<String>,
    pub referrer: Option<String>,
    /// Client address
    pub location: Option<String>,
}

/// One shortened URL and its click history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub shortcode: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub click_count: u64,
    pub click_log: Vec<ClickEvent>,
}

impl UrlRecord {
    pub fn new(
        shortcode: &str,
        original_url: &str,
        created_at: DateTime<Utc>,
        validity: Validity,
    ) -> Self {
        Self {
            shortcode: shortcode.to_string(),
            original_url: original_url.to_string(),
            created_at,
            expires_at: created_at + validity.duration(),
            click_count: 0,
            click_log: Vec::new(),
        }
    }

    /// A record stays visible up to and including its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Append a click, keeping the count and the log in step
    pub fn push_click(&mut self, event: ClickEvent) {
        self.click_log.push(event);
        self.click_count += 1;
    }
}

/// Create request body.
///
/// Fields are kept as raw JSON so a wrongly typed value is reported by the
/// check it fails rather than as a malformed body.
#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: Option<serde_json::Value>,
    /// Minutes. `Some(Value::Null)` when sent as `null`, `None` when absent
    #[serde(default, deserialize_with = "deserialize_present")]
    pub validity: Option<serde_json::Value>,
    pub shortcode: Option<serde_json::Value>,
}

/// Keeps an explicit `null` distinct from a missing field
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlResponse {
    pub short_link: String,
    pub expiry: DateTime<Utc>,
}

/// Read-only view of a record for the statistics endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub shortcode: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub total_clicks: u64,
    pub click_details: Vec<ClickEvent>,
}

impl From<UrlRecord> for StatsView {
    fn from(record: UrlRecord) -> Self {
        Self {
            shortcode: record.shortcode,
            original_url: record.original_url,
            created_at: record.created_at,
            expiry: record.expires_at,
            total_clicks: record.click_count,
            click_details: record.click_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_from_minutes() {
        assert_eq!(
            Validity::from_minutes(30.0).unwrap().duration(),
            Duration::minutes(30)
        );
        assert_eq!(
            Validity::from_minutes(0.5).unwrap().duration(),
            Duration::seconds(30)
        );
    }

    #[test]
    fn test_validity_rejects_non_positive_and_non_finite() {
        assert!(Validity::from_minutes(0.0).is_none());
        assert!(Validity::from_minutes(-1.0).is_none());
        assert!(Validity::from_minutes(f64::NAN).is_none());
        assert!(Validity::from_minutes(f64::INFINITY).is_none());
        // Rounds to zero milliseconds
        assert!(Validity::from_minutes(1e-9).is_none());
        assert!(Validity::from_minutes(1e12).is_none());
    }

    #[test]
    fn test_record_expiry_is_inclusive() {
        let now = Utc::now();
        let record = UrlRecord::new("abc", "https://example.com", now, Validity::from_minutes(1.0).unwrap());

        assert_eq!(record.expires_at, now + Duration::minutes(1));
        assert!(!record.is_expired_at(now));
        assert!(!record.is_expired_at(record.expires_at));
        assert!(record.is_expired_at(record.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_click_event_defaults() {
        let now = Utc::now();
        let event = ClickEvent::from_info(now, ClickInfo::default());
        assert_eq!(event.source, "unknown");
        assert_eq!(event.referrer, "direct");
        assert_eq!(event.location, "unknown");

        let event = ClickEvent::from_info(
            now,
            ClickInfo {
                source: Some(String::new()),
                referrer: Some("https://news.example".to_string()),
                location: Some("203.0.113.7".to_string()),
            },
        );
        assert_eq!(event.source, "unknown");
        assert_eq!(event.referrer, "https://news.example");
        assert_eq!(event.location, "203.0.113.7");
    }

    #[test]
    fn test_create_request_keeps_null_validity() {
        let absent: CreateUrlRequest = serde_json::from_str(r#"{"url": "https://a.example"}"#).unwrap();
        assert_eq!(absent.validity, None);

        let null: CreateUrlRequest =
            serde_json::from_str(r#"{"url": "https://a.example", "validity": null}"#).unwrap();
        assert_eq!(null.validity, Some(serde_json::Value::Null));

        let typed: CreateUrlRequest =
            serde_json::from_str(r#"{"url": 123, "shortcode": 4567}"#).unwrap();
        assert_eq!(typed.url, Some(serde_json::json!(123)));
        assert_eq!(typed.shortcode, Some(serde_json::json!(4567)));
    }

    #[test]
    fn test_stats_view_serializes_camel_case() {
        let now = Utc::now();
        let record = UrlRecord::new("abc", "https://example.com", now, Validity::from_minutes(1.0).unwrap());
        let json = serde_json::to_value(StatsView::from(record)).unwrap();

        assert_eq!(json["shortcode"], "abc");
        assert_eq!(json["originalUrl"], "https://example.com");
        assert_eq!(json["totalClicks"], 0);
        assert!(json["clickDetails"].as_array().unwrap().is_empty());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("expiry").is_some());
    }
}
