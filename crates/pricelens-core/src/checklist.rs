use crate::error::AppError;
use crate::models::{ItemStatus, ShoppingItem};
use crate::traits::{KvBackend, Stamper};

/// Storage key for the shopping checklist.
pub const CHECKLIST_KEY: &str = "pricelens_shopping_list_v1";

/// Durable shopping list with a three-state item lifecycle.
///
/// `Active` is the only initial state. Allowed transitions: active →
/// bought, active → cancelled, bought/cancelled → active. An item leaves
/// the list only through explicit deletion (non-active items) or the bulk
/// history purge. Every transition stamps the item with the transition
/// time, which is the sort key for both read projections.
pub struct ChecklistStore<B: KvBackend, S: Stamper> {
    backend: B,
    stamper: S,
    items: Vec<ShoppingItem>,
}

impl<B: KvBackend, S: Stamper> ChecklistStore<B, S> {
    /// Load the checklist from the backend.
    ///
    /// A stored plain-string array (the pre-lifecycle format) is upgraded
    /// in place: each string becomes an active item with a fresh id and a
    /// load-time timestamp. Corrupt data yields an empty list (logged,
    /// never an error).
    pub async fn load(backend: B, stamper: S) -> Self {
        let raw = match backend.get(CHECKLIST_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read checklist; starting empty");
                None
            }
        };

        let (items, migrated) = match raw.as_deref() {
            Some(text) => Self::parse_stored(text, &stamper),
            None => (Vec::new(), false),
        };

        let store = Self {
            backend,
            stamper,
            items,
        };

        if migrated {
            tracing::info!(count = store.items.len(), "Upgraded legacy checklist format");
            if let Err(e) = store.persist().await {
                tracing::warn!(error = %e, "Failed to persist upgraded checklist");
            }
        }

        store
    }

    /// Returns the parsed items and whether a legacy migration happened.
    fn parse_stored(text: &str, stamper: &S) -> (Vec<ShoppingItem>, bool) {
        if let Ok(items) = serde_json::from_str::<Vec<ShoppingItem>>(text) {
            return (items, false);
        }
        if let Ok(legacy) = serde_json::from_str::<Vec<String>>(text) {
            let upgraded = legacy
                .into_iter()
                .map(|text| ShoppingItem {
                    id: stamper.new_id(),
                    text,
                    status: ItemStatus::Active,
                    timestamp: stamper.now_millis(),
                })
                .collect();
            return (upgraded, true);
        }
        tracing::warn!("Stored checklist is corrupt; starting empty");
        (Vec::new(), false)
    }

    /// Add a new active item. Blank text (after trimming) is ignored,
    /// mirroring the entry-form behavior, and yields `None`.
    pub async fn add(&mut self, text: &str) -> Result<Option<ShoppingItem>, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let item = ShoppingItem {
            id: self.stamper.new_id(),
            text: text.to_string(),
            status: ItemStatus::Active,
            timestamp: self.stamper.now_millis(),
        };
        self.items.insert(0, item.clone());
        self.persist().await?;
        Ok(Some(item))
    }

    /// active → bought. Returns whether a transition happened.
    pub async fn mark_bought(&mut self, id: &str) -> Result<bool, AppError> {
        self.transition(id, &[ItemStatus::Active], ItemStatus::Bought)
            .await
    }

    /// active → cancelled.
    pub async fn cancel(&mut self, id: &str) -> Result<bool, AppError> {
        self.transition(id, &[ItemStatus::Active], ItemStatus::Cancelled)
            .await
    }

    /// bought/cancelled → active.
    pub async fn restore(&mut self, id: &str) -> Result<bool, AppError> {
        self.transition(
            id,
            &[ItemStatus::Bought, ItemStatus::Cancelled],
            ItemStatus::Active,
        )
        .await
    }

    /// Permanently remove a bought or cancelled item. Active items have no
    /// delete edge; asking for one is a no-op.
    pub async fn delete(&mut self, id: &str) -> Result<bool, AppError> {
        let before = self.items.len();
        self.items
            .retain(|item| item.id != id || item.status == ItemStatus::Active);
        if self.items.len() == before {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Remove every non-active item. Returns how many were purged.
    pub async fn clear_history(&mut self) -> Result<usize, AppError> {
        let before = self.items.len();
        self.items.retain(|item| item.status == ItemStatus::Active);
        let removed = before - self.items.len();
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Active items, newest status change first.
    pub fn active_items(&self) -> Vec<&ShoppingItem> {
        self.projection(|status| status == ItemStatus::Active)
    }

    /// Bought and cancelled items, newest status change first. A read-time
    /// projection over the same store, not a separate collection.
    pub fn history_items(&self) -> Vec<&ShoppingItem> {
        self.projection(|status| status != ItemStatus::Active)
    }

    fn projection(&self, keep: impl Fn(ItemStatus) -> bool) -> Vec<&ShoppingItem> {
        let mut selected: Vec<&ShoppingItem> = self
            .items
            .iter()
            .filter(|item| keep(item.status))
            .collect();
        selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        selected
    }

    async fn transition(
        &mut self,
        id: &str,
        allowed_from: &[ItemStatus],
        to: ItemStatus,
    ) -> Result<bool, AppError> {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.id == id && allowed_from.contains(&item.status))
        else {
            return Ok(false);
        };
        item.status = to;
        item.timestamp = self.stamper.now_millis();
        self.persist().await?;
        Ok(true)
    }

    async fn persist(&self) -> Result<(), AppError> {
        let serialized = serde_json::to_string(&self.items)?;
        self.backend.put(CHECKLIST_KEY, &serialized).await
    }
}
