use std::future::Future;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::InferenceRequest;

/// Sends a fully built request to the external inference service and
/// returns the raw structured document it produced.
///
/// Implementations must treat "call succeeded but body is empty" as a
/// failure; the normalizer never sees an absent document.
pub trait Analyzer: Send + Sync + Clone {
    fn analyze(
        &self,
        request: &InferenceRequest,
    ) -> impl Future<Output = Result<serde_json::Value, AppError>> + Send;
}

/// Source of locally generated identity and time.
///
/// Injected into the normalizer and the stores so ids and timestamps can
/// be pinned in tests. Result identity always comes from here, never from
/// the inference response.
pub trait Stamper: Send + Sync + Clone {
    fn new_id(&self) -> String;
    fn now_millis(&self) -> i64;
}

/// Production stamper: UUIDv4 ids and wall-clock milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStamper;

impl Stamper for SystemStamper {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Random multiplier source for value-history synthesis.
pub trait Jitter {
    /// Draw the next multiplier from [0.6, 1.4).
    fn factor(&mut self) -> f64;
}

/// Production jitter over the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadJitter;

impl Jitter for ThreadJitter {
    fn factor(&mut self) -> f64 {
        rand::rng().random_range(0.6..1.4)
    }
}

/// Durable key-value persistence boundary for the stores.
///
/// Values are serialized text. A stored value that no longer deserializes
/// is the store's problem, not the backend's: backends report only real
/// I/O failures.
pub trait KvBackend: Send + Sync + Clone {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A no-op backend for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullBackend;

impl KvBackend for NullBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_stamper_produces_distinct_ids() {
        let stamper = SystemStamper;
        assert_ne!(stamper.new_id(), stamper.new_id());
        assert!(!stamper.new_id().is_empty());
    }

    #[test]
    fn test_thread_jitter_stays_in_range() {
        let mut jitter = ThreadJitter;
        for _ in 0..1000 {
            let f = jitter.factor();
            assert!((0.6..1.4).contains(&f));
        }
    }
}
