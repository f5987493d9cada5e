//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests. Mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls and shared state across clones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{AnalysisResult, InferenceRequest, RarityTier, RetailerPrice};
use crate::traits::{Analyzer, Jitter, KvBackend, Stamper};

// ---------------------------------------------------------------------------
// MockAnalyzer
// ---------------------------------------------------------------------------

/// Mock analyzer that returns configurable JSON documents and records the
/// requests it received.
#[derive(Clone)]
pub struct MockAnalyzer {
    /// Queue of responses. Each call pops the first element; an empty
    /// queue returns a minimal default document.
    responses: Arc<Mutex<Vec<Result<serde_json::Value, AppError>>>>,
    pub requests: Arc<Mutex<Vec<InferenceRequest>>>,
}

impl MockAnalyzer {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(data)])),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Analyzer for MockAnalyzer {
    async fn analyze(&self, request: &InferenceRequest) -> Result<serde_json::Value, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(serde_json::json!({"productName": "default"}))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// In-memory key-value backend. Clones share the same map, so a reloaded
/// store sees what an earlier instance persisted.
#[derive(Clone)]
pub struct MemoryBackend {
    map: Arc<Mutex<HashMap<String, String>>>,
    put_error: Arc<Mutex<Option<AppError>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            map: Arc::new(Mutex::new(HashMap::new())),
            put_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Backend whose next put fails with the given error.
    pub fn with_put_error(error: AppError) -> Self {
        Self {
            map: Arc::new(Mutex::new(HashMap::new())),
            put_error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut err = self.put_error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FixedStamper
// ---------------------------------------------------------------------------

/// Deterministic stamper: ids are "id-1", "id-2", … and every clock read
/// advances the time by one second from the given base.
#[derive(Clone)]
pub struct FixedStamper {
    ids: Arc<Mutex<u64>>,
    clock: Arc<Mutex<i64>>,
}

impl FixedStamper {
    pub fn new(base_millis: i64) -> Self {
        Self {
            ids: Arc::new(Mutex::new(0)),
            clock: Arc::new(Mutex::new(base_millis)),
        }
    }
}

impl Stamper for FixedStamper {
    fn new_id(&self) -> String {
        let mut ids = self.ids.lock().unwrap();
        *ids += 1;
        format!("id-{ids}")
    }

    fn now_millis(&self) -> i64 {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1_000;
        *clock
    }
}

// ---------------------------------------------------------------------------
// SeqJitter
// ---------------------------------------------------------------------------

/// Deterministic jitter: pops factors from a queue, falling back to a
/// constant when the queue is empty.
pub struct SeqJitter {
    factors: Vec<f64>,
    fallback: f64,
}

impl SeqJitter {
    pub fn new(factors: Vec<f64>) -> Self {
        Self {
            factors,
            fallback: 1.0,
        }
    }

    /// Jitter that always returns the same factor.
    pub fn constant(factor: f64) -> Self {
        Self {
            factors: Vec::new(),
            fallback: factor,
        }
    }
}

impl Jitter for SeqJitter {
    fn factor(&mut self) -> f64 {
        if self.factors.is_empty() {
            self.fallback
        } else {
            self.factors.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// Test data helpers
// ---------------------------------------------------------------------------

/// A raw inference document shaped like a real service response.
pub fn sample_raw_response() -> serde_json::Value {
    serde_json::json!({
        "productName": "Sony WH-1000XM4",
        "category": "Electronics",
        "description": "Wireless over-ear noise cancelling headphones.",
        "confidenceScore": 92,
        "isRare": false,
        "rarityTier": "Uncommon",
        "estimatedValueRange": "£180 - £220",
        "buyingTip": "Wait for seasonal sales; frequently discounted.",
        "specs": {
            "manufacturer": "Sony",
            "releaseYear": "2020",
            "connectivity": "Bluetooth 5.0"
        },
        "pros": ["Class-leading ANC", "30h battery", "Comfortable"],
        "cons": ["No water resistance", "Touch controls are fiddly"],
        "retailers": [
            {
                "retailer": "Amazon",
                "price": "£219.00",
                "currency": "GBP",
                "inStock": true,
                "url": "https://www.amazon.co.uk/s?k=Sony+WH-1000XM4"
            },
            {
                "retailer": "CEX",
                "price": "£155.00",
                "currency": "GBP",
                "inStock": true,
                "url": "https://uk.webuy.com/search?stext=WH-1000XM4",
                "comparison": "vs Bose: £240"
            },
            {
                "retailer": "Argos",
                "price": "£229.99",
                "currency": "GBP",
                "inStock": false,
                "url": "https://www.argos.co.uk/search/sony-wh-1000xm4"
            }
        ],
        "relatedProducts": [
            {
                "name": "Sony WH-1000XM5",
                "reason": "Current-generation successor",
                "estimatedPrice": "£279"
            }
        ]
    })
}

/// Create a minimal saved result for store tests.
pub fn make_test_result(id: &str) -> AnalysisResult {
    AnalysisResult {
        id: id.to_string(),
        timestamp: 1_700_000_000_000,
        product_name: format!("Product {id}"),
        category: "Electronics".to_string(),
        description: "A test product.".to_string(),
        confidence_score: 75.0,
        is_rare: false,
        rarity_tier: RarityTier::Common,
        estimated_value_range: "£10 - £20".to_string(),
        buying_tip: "Shop around.".to_string(),
        specs: Vec::new(),
        pros: Vec::new(),
        cons: Vec::new(),
        retailers: vec![make_offer(
            "Amazon",
            "£15.00",
            "https://www.amazon.co.uk/s?k=test",
        )],
        related_products: Vec::new(),
    }
}

/// Create an offer with the fields ranking actually looks at.
pub fn make_offer(retailer: &str, price: &str, url: &str) -> RetailerPrice {
    RetailerPrice {
        retailer: retailer.to_string(),
        price: price.to_string(),
        currency: "GBP".to_string(),
        in_stock: true,
        url: url.to_string(),
        product_image: None,
        comparison: None,
    }
}
