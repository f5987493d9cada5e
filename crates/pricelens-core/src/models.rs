use serde::{Deserialize, Serialize};

/// Gamified rarity tier assigned by the model.
///
/// A closed set: anything the service returns outside it maps to `Common`
/// during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RarityTier {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl RarityTier {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "Uncommon" => RarityTier::Uncommon,
            "Rare" => RarityTier::Rare,
            "Epic" => RarityTier::Epic,
            "Legendary" => RarityTier::Legendary,
            _ => RarityTier::Common,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RarityTier::Common => "Common",
            RarityTier::Uncommon => "Uncommon",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Legendary => "Legendary",
        }
    }
}

/// One retailer's price estimate for the identified product.
///
/// `price` is free-form text ("£45.00", "£45 - £60"); the ranking engine
/// parses it on demand. `product_image` and `comparison` are tolerated as
/// arbitrary strings, matching the source service's behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetailerPrice {
    pub retailer: String,
    pub price: String,
    pub currency: String,
    pub in_stock: bool,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,
}

/// A similar or alternative product suggested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedProduct {
    pub name: String,
    pub reason: String,
    pub estimated_price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One technical-specification attribute.
///
/// Keys are whatever the model produced, in its insertion order. A missing
/// value means "omit from display", not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The canonical unit of value: one completed product identification.
///
/// Created only by the normalizer; read-only afterwards apart from its
/// membership in the inventory. `id` and `timestamp` are always assigned
/// locally and never taken from the inference response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    /// Milliseconds since epoch at normalization time; the sole recency key.
    pub timestamp: i64,
    pub product_name: String,
    pub category: String,
    pub description: String,
    /// Confidence in [0, 100]; out-of-range input is clamped.
    pub confidence_score: f64,
    pub is_rare: bool,
    pub rarity_tier: RarityTier,
    /// Verbatim value-range text; a parenthetical qualifier like
    /// "(per kg)" is split off by the display layer, not here.
    pub estimated_value_range: String,
    pub buying_tip: String,
    pub specs: Vec<SpecEntry>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub retailers: Vec<RetailerPrice>,
    pub related_products: Vec<RelatedProduct>,
}

/// Shopping-list item lifecycle state.
///
/// `Active` is the only initial state. Transitions: active → bought,
/// active → cancelled, bought/cancelled → active (restore). Removal only
/// by explicit deletion of a non-active item or by bulk history purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Bought,
    Cancelled,
}

/// A user-entered shopping-list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: String,
    pub text: String,
    pub status: ItemStatus,
    /// Last status-change time, used for sorting.
    pub timestamp: i64,
}

/// One point of the synthetic long-run value-history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub year: i32,
    pub price: f64,
}

/// Inline image payload for an inference request: base64 bytes plus MIME
/// type, no data-URL prefix.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub data: String,
    pub mime_type: String,
}

/// One fully built request to the inference service: the instruction text,
/// an optional inline image, and the response schema the service must
/// conform to.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub prompt: String,
    pub image: Option<ImagePart>,
    pub schema: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_from_raw() {
        assert_eq!(RarityTier::from_raw("Legendary"), RarityTier::Legendary);
        assert_eq!(RarityTier::from_raw("Epic"), RarityTier::Epic);
        assert_eq!(RarityTier::from_raw("Mythic"), RarityTier::Common);
        assert_eq!(RarityTier::from_raw(""), RarityTier::Common);
    }

    #[test]
    fn test_item_status_wire_format() {
        let json = serde_json::to_string(&ItemStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let back: ItemStatus = serde_json::from_str("\"bought\"").unwrap();
        assert_eq!(back, ItemStatus::Bought);
    }

    #[test]
    fn test_retailer_optional_fields_roundtrip() {
        let offer = RetailerPrice {
            retailer: "Argos".into(),
            price: "£45.00".into(),
            currency: "GBP".into(),
            in_stock: true,
            url: "https://www.argos.co.uk/search/widget".into(),
            product_image: None,
            comparison: Some("vs Sony: £60".into()),
        };
        let json = serde_json::to_string(&offer).unwrap();
        assert!(!json.contains("productImage"));
        let back: RetailerPrice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, offer);
    }
}
