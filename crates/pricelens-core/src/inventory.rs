use crate::error::AppError;
use crate::models::AnalysisResult;
use crate::traits::KvBackend;

/// Storage key for the saved-item collection.
pub const INVENTORY_KEY: &str = "pricelens_inventory_v1";

/// Durable collection of saved analysis results, keyed by result id and
/// kept most-recently-saved first.
///
/// Every mutation is read-modify-persist on `&mut self`; cross-process
/// interleaving is out of scope (last writer wins).
pub struct InventoryStore<B: KvBackend> {
    backend: B,
    items: Vec<AnalysisResult>,
}

impl<B: KvBackend> InventoryStore<B> {
    /// Load the inventory from the backend.
    ///
    /// Missing, unreadable, or corrupt stored data yields an empty
    /// inventory (logged, never an error).
    pub async fn load(backend: B) -> Self {
        let raw = match backend.get(INVENTORY_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read inventory; starting empty");
                None
            }
        };

        let items = match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored inventory is corrupt; starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self { backend, items }
    }

    /// Save an item. A no-op when an item with the same id is already
    /// present. Returns whether the collection changed.
    pub async fn save(&mut self, item: AnalysisResult) -> Result<bool, AppError> {
        if self.items.iter().any(|existing| existing.id == item.id) {
            return Ok(false);
        }
        self.items.insert(0, item);
        self.persist().await?;
        Ok(true)
    }

    /// Delete the item with the given id, if present. Deleting an unknown
    /// id is a no-op. Returns whether the collection changed.
    pub async fn delete(&mut self, id: &str) -> Result<bool, AppError> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Remove every saved item.
    pub async fn clear(&mut self) -> Result<(), AppError> {
        self.items.clear();
        self.persist().await
    }

    /// Current collection in stored order: most recent first by
    /// construction, never re-sorted.
    pub fn list(&self) -> &[AnalysisResult] {
        &self.items
    }

    async fn persist(&self) -> Result<(), AppError> {
        let serialized = serde_json::to_string(&self.items)?;
        self.backend.put(INVENTORY_KEY, &serialized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MemoryBackend, make_test_result};

    #[tokio::test]
    async fn save_is_idempotent_by_id() {
        let mut store = InventoryStore::load(MemoryBackend::new()).await;

        assert!(store.save(make_test_result("r1")).await.unwrap());
        assert!(!store.save(make_test_result("r1")).await.unwrap());
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn newest_save_comes_first() {
        let mut store = InventoryStore::load(MemoryBackend::new()).await;
        store.save(make_test_result("r1")).await.unwrap();
        store.save(make_test_result("r2")).await.unwrap();

        let ids: Vec<&str> = store.list().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one() {
        let mut store = InventoryStore::load(MemoryBackend::new()).await;
        store.save(make_test_result("r1")).await.unwrap();
        store.save(make_test_result("r2")).await.unwrap();
        store.save(make_test_result("r3")).await.unwrap();

        assert!(store.delete("r2").await.unwrap());
        let ids: Vec<&str> = store.list().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r3", "r1"]);

        assert!(!store.delete("missing").await.unwrap());
        assert_eq!(store.list().len(), 2);
    }

    #[tokio::test]
    async fn clear_empties_the_collection() {
        let mut store = InventoryStore::load(MemoryBackend::new()).await;
        store.save(make_test_result("r1")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn round_trip_through_the_backend() {
        let backend = MemoryBackend::new();

        let mut store = InventoryStore::load(backend.clone()).await;
        store.save(make_test_result("r1")).await.unwrap();
        store.save(make_test_result("r2")).await.unwrap();
        store.save(make_test_result("r3")).await.unwrap();
        let saved: Vec<AnalysisResult> = store.list().to_vec();

        let reloaded = InventoryStore::load(backend).await;
        assert_eq!(reloaded.list(), saved.as_slice());
    }

    #[tokio::test]
    async fn corrupt_stored_data_loads_as_empty() {
        let backend = MemoryBackend::new();
        backend.put(INVENTORY_KEY, "{not json").await.unwrap();

        let store = InventoryStore::load(backend).await;
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn persist_failure_surfaces_from_save() {
        let backend = MemoryBackend::with_put_error(AppError::StorageError("disk full".into()));
        let mut store = InventoryStore::load(backend).await;

        let err = store.save(make_test_result("r1")).await.unwrap_err();
        assert!(matches!(err, AppError::StorageError(_)));
    }
}
