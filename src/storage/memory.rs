use crate::clock::{Clock, SystemClock};
use crate::models::{ClickEvent, ClickInfo, UrlRecord, Validity};
use crate::storage::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// In-memory record store.
///
/// A single mutex guards the whole map and is held for the full duration of
/// each call. Expired records are removed lazily when a call observes them.
pub struct MemoryStorage {
    records: Mutex<HashMap<String, UrlRecord>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create(&self, shortcode: &str, original_url: &str, validity: Validity) -> UrlRecord {
        let mut records = self.records.lock();
        let record = UrlRecord::new(shortcode, original_url, self.clock.now(), validity);
        records.insert(shortcode.to_string(), record.clone());
        record
    }

    async fn create_with_code(
        &self,
        shortcode: &str,
        original_url: &str,
        validity: Validity,
    ) -> StorageResult<UrlRecord> {
        let mut records = self.records.lock();
        let now = self.clock.now();
        let record = UrlRecord::new(shortcode, original_url, now, validity);

        match records.entry(shortcode.to_string()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_expired_at(now) {
                    return Err(StorageError::Conflict);
                }
                debug!(short_code = %shortcode, "replacing expired record");
                entry.insert(record.clone());
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
        }

        Ok(record)
    }

    async fn get(&self, shortcode: &str) -> Option<UrlRecord> {
        let mut records = self.records.lock();
        let now = self.clock.now();

        let expired = records.get(shortcode)?.is_expired_at(now);
        if expired {
            records.remove(shortcode);
            debug!(short_code = %shortcode, "evicted expired record");
            return None;
        }

        records.get(shortcode).cloned()
    }

    async fn record_click(&self, shortcode: &str, info: ClickInfo) -> bool {
        let mut records = self.records.lock();
        let now = self.clock.now();

        match records.get_mut(shortcode) {
            Some(record) if !record.is_expired_at(now) => {
                record.push_click(ClickEvent::from_info(now, info));
                true
            }
            _ => false,
        }
    }

    async fn exists(&self, shortcode: &str) -> bool {
        self.records.lock().contains_key(shortcode)
    }

    async fn count(&self) -> usize {
        self.records.lock().len()
    }
}
