pub mod checklist;
pub mod error;
pub mod inventory;
pub mod models;
pub mod normalize;
pub mod ranking;
pub mod rewards;
pub mod testutil;
pub mod traits;

pub use error::AppError;
pub use models::{
    AnalysisResult, HistoryPoint, ItemStatus, RarityTier, RelatedProduct, RetailerPrice,
    ShoppingItem, SpecEntry,
};
pub use normalize::normalize;
pub use traits::{Analyzer, Jitter, KvBackend, Stamper, SystemStamper, ThreadJitter};
