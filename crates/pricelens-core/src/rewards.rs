use crate::error::AppError;
use crate::traits::KvBackend;

/// Storage key for the accumulated reward-point counter.
pub const POINTS_KEY: &str = "pricelens_points_v1";

/// Points awarded for an image scan.
pub const SCAN_AWARD: u64 = 50;
/// Points awarded for a text search.
pub const SEARCH_AWARD: u64 = 30;
/// Points awarded for saving a result to the inventory.
pub const SAVE_AWARD: u64 = 20;

/// Durable reward-point counter.
pub struct RewardLedger<B: KvBackend> {
    backend: B,
    points: u64,
}

impl<B: KvBackend> RewardLedger<B> {
    /// Load the counter. A missing, unreadable, or corrupt stored value
    /// starts the ledger at zero (logged, never an error).
    pub async fn load(backend: B) -> Self {
        let raw = match backend.get(POINTS_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read reward points; starting at zero");
                None
            }
        };

        let points = raw
            .and_then(|text| match text.trim().parse() {
                Ok(points) => Some(points),
                Err(_) => {
                    tracing::warn!("Stored reward points are corrupt; starting at zero");
                    None
                }
            })
            .unwrap_or(0);

        Self { backend, points }
    }

    /// Add points and persist. Returns the new total.
    pub async fn add(&mut self, amount: u64) -> Result<u64, AppError> {
        self.points = self.points.saturating_add(amount);
        self.backend
            .put(POINTS_KEY, &self.points.to_string())
            .await?;
        Ok(self.points)
    }

    pub fn total(&self) -> u64 {
        self.points
    }
}
