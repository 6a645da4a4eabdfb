use crate::models::{ClickInfo, UrlRecord, Validity};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Store of short code records.
///
/// Every method is atomic with respect to the others. Calls do not compose:
/// two calls in a row may observe different states.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a fresh record, replacing whatever the key held before
    async fn create(&self, shortcode: &str, original_url: &str, validity: Validity) -> UrlRecord;

    /// Insert a fresh record only if the key is free.
    ///
    /// A key holding an expired record counts as free; the expired record is
    /// evicted. Fails with [`StorageError::Conflict`] if a live record holds it.
    async fn create_with_code(
        &self,
        shortcode: &str,
        original_url: &str,
        validity: Validity,
    ) -> StorageResult<UrlRecord>;

    /// Get a live record by short code, evicting it if it has expired
    async fn get(&self, shortcode: &str) -> Option<UrlRecord>;

    /// Append a click to a live record.
    ///
    /// Returns `false` without touching anything if the record is missing
    /// or expired.
    async fn record_click(&self, shortcode: &str, info: ClickInfo) -> bool;

    /// Whether the key is held at all, expired or not
    async fn exists(&self, shortcode: &str) -> bool;

    /// Number of held entries, including expired ones not yet evicted
    async fn count(&self) -> usize;
}
