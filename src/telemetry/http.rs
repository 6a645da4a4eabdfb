//! Telemetry sink that ships entries to a remote log collector
//!
//! `emit` pushes onto a bounded channel and returns. A background actor
//! drains the channel and POSTs each entry as JSON. Delivery failures are
//! logged locally and replaced with a fallback log ID; nothing is retried.

use anyhow::{Context, Result};
use rand::RngExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{LogEntry, TelemetrySink};
use crate::config::TelemetryConfig;

const FALLBACK_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Deserialize)]
struct LogResponse {
    #[serde(rename = "logID")]
    log_id: String,
}

/// Posts entries to the collector endpoint
#[derive(Clone)]
pub struct Shipper {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl Shipper {
    pub fn new(endpoint: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build telemetry HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token: token.map(str::to_string),
        })
    }

    /// Deliver one entry, returning the collector's log ID or a fallback ID
    pub async fn deliver(&self, entry: &LogEntry) -> String {
        match self.try_deliver(entry).await {
            Ok(log_id) => {
                debug!(log_id = %log_id, "telemetry entry delivered");
                log_id
            }
            Err(e) => {
                let fallback = fallback_log_id();
                warn!(error = %e, log_id = %fallback, "telemetry delivery failed, using fallback log ID");
                fallback
            }
        }
    }

    async fn try_deliver(&self, entry: &LogEntry) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(entry);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("No response from telemetry collector")?
            .error_for_status()
            .context("Telemetry collector rejected entry")?;

        let body: LogResponse = response
            .json()
            .await
            .context("Unexpected telemetry collector response")?;

        Ok(body.log_id)
    }
}

/// `fallback-<unix millis>-<9 random base36 chars>`
pub fn fallback_log_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| FALLBACK_ALPHABET[rng.random_range(0..FALLBACK_ALPHABET.len())] as char)
        .collect();

    format!("fallback-{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

struct TelemetryActor {
    receiver: mpsc::Receiver<LogEntry>,
    shipper: Shipper,
}

impl TelemetryActor {
    async fn run(mut self) {
        while let Some(entry) = self.receiver.recv().await {
            self.shipper.deliver(&entry).await;
        }
        info!("Telemetry channel closed, actor exiting");
    }
}

/// Channel-fed remote sink. Must be created inside a tokio runtime.
pub struct HttpTelemetry {
    actor_tx: mpsc::Sender<LogEntry>,
}

impl HttpTelemetry {
    pub fn spawn(config: &TelemetryConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .context("TELEMETRY_ENDPOINT must be set when telemetry is enabled")?;

        let shipper = Shipper::new(
            endpoint,
            config.token.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?;

        let (actor_tx, receiver) = mpsc::channel(config.buffer_size.max(1));
        let actor = TelemetryActor { receiver, shipper };

        tokio::spawn(async move {
            actor.run().await;
        });

        Ok(Self { actor_tx })
    }
}

impl TelemetrySink for HttpTelemetry {
    fn emit(&self, entry: LogEntry) {
        if self.actor_tx.try_send(entry).is_err() {
            warn!("Telemetry buffer full, dropping entry");
        }
    }
}
