//! Fire-and-forget telemetry
//!
//! Request handling reports what it does through [`Telemetry`]. Every entry
//! is written to the local `tracing` subscriber and handed to a
//! [`TelemetrySink`], which must never block or fail the caller.

pub mod http;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub use http::HttpTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Component an entry originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Route,
    Handler,
    Service,
    Db,
}

impl Package {
    pub fn as_str(&self) -> &'static str {
        match self {
            Package::Route => "route",
            Package::Handler => "handler",
            Package::Service => "service",
            Package::Db => "db",
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of one telemetry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub stack: Stack,
    pub level: Level,
    pub package: Package,
    pub message: String,
}

/// Destination for telemetry entries.
///
/// `emit` is called on the request path: implementations hand the entry off
/// and return immediately, swallowing any failure.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, entry: LogEntry);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn emit(&self, _entry: LogEntry) {}
}

/// Cheap-to-clone handle over a sink
#[derive(Clone)]
pub struct Telemetry {
    sink: Arc<dyn TelemetrySink>,
}

impl Telemetry {
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    /// Local logging only
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopTelemetry))
    }

    pub fn log(&self, level: Level, package: Package, message: impl Into<String>) {
        let message = message.into();

        match level {
            Level::Debug => debug!(package = %package, "{}", message),
            Level::Info => info!(package = %package, "{}", message),
            Level::Warn => warn!(package = %package, "{}", message),
            Level::Error | Level::Fatal => error!(package = %package, "{}", message),
        }

        self.sink.emit(LogEntry {
            stack: Stack::Backend,
            level,
            package,
            message,
        });
    }

    pub fn info(&self, package: Package, message: impl Into<String>) {
        self.log(Level::Info, package, message);
    }

    pub fn warn(&self, package: Package, message: impl Into<String>) {
        self.log(Level::Warn, package, message);
    }

    pub fn error(&self, package: Package, message: impl Into<String>) {
        self.log(Level::Error, package, message);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_log_entry_serializes_lowercase() {
        let entry = LogEntry {
            stack: Stack::Backend,
            level: Level::Warn,
            package: Package::Db,
            message: "Record created".to_string(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "stack": "backend",
                "level": "warn",
                "package": "db",
                "message": "Record created",
            })
        );
    }

    #[test]
    fn test_fatal_entry_serializes() {
        let sink = Arc::new(RecordingSink::default());
        Telemetry::new(sink.clone()).log(Level::Fatal, Package::Service, "server stopped");

        let json = serde_json::to_value(&sink.entries()[0]).unwrap();
        assert_eq!(json["level"], "fatal");
        assert_eq!(json["package"], "service");
    }

    #[test]
    fn test_telemetry_forwards_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let telemetry = Telemetry::new(sink.clone());

        telemetry.info(Package::Route, "GET /abc");
        telemetry.error(Package::Handler, "boom");

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, Level::Info);
        assert_eq!(entries[0].package, Package::Route);
        assert_eq!(entries[1].message, "boom");
    }
}
