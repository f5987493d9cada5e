//! The single coercion boundary between the loosely-typed inference
//! response and the strongly-typed canonical result.
//!
//! Nothing past this module ever sees the raw document shape.

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{
    AnalysisResult, RarityTier, RelatedProduct, RetailerPrice, SpecEntry,
};
use crate::traits::Stamper;

/// Convert a raw inference document into the canonical [`AnalysisResult`].
///
/// No field of the document is trusted: wrong types become defaults,
/// missing arrays become empty, unknown rarity tiers become `Common`, and
/// confidence is clamped to [0, 100]. Identity and timestamp come from the
/// injected `stamper`, even if the document carries its own.
///
/// Fails only when `raw` is not a JSON object at all; field-level defects
/// are coerced silently, never escalated.
pub fn normalize(raw: &Value, stamper: &impl Stamper) -> Result<AnalysisResult, AppError> {
    let obj = raw.as_object().ok_or_else(|| AppError::InferenceError {
        message: "Inference response is not a JSON object".into(),
        status_code: 200,
        retryable: false,
    })?;

    Ok(AnalysisResult {
        id: stamper.new_id(),
        timestamp: stamper.now_millis(),
        product_name: string_field(obj, "productName"),
        category: string_field(obj, "category"),
        description: string_field(obj, "description"),
        confidence_score: confidence_field(obj),
        is_rare: obj.get("isRare").and_then(Value::as_bool).unwrap_or(false),
        rarity_tier: obj
            .get("rarityTier")
            .and_then(Value::as_str)
            .map(RarityTier::from_raw)
            .unwrap_or_default(),
        estimated_value_range: string_field(obj, "estimatedValueRange"),
        buying_tip: string_field(obj, "buyingTip"),
        specs: specs_field(obj.get("specs")),
        pros: string_list(obj.get("pros")),
        cons: string_list(obj.get("cons")),
        retailers: retailers_field(obj.get("retailers")),
        related_products: related_field(obj.get("relatedProducts")),
    })
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn confidence_field(obj: &Map<String, Value>) -> f64 {
    obj.get("confidenceScore")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
}

/// Spec attributes keep the document's insertion order. Non-string values
/// become "no value" rather than errors: the display layer omits them.
fn specs_field(raw: Option<&Value>) -> Vec<SpecEntry> {
    let Some(map) = raw.and_then(Value::as_object) else {
        return Vec::new();
    };
    map.iter()
        .map(|(name, value)| SpecEntry {
            name: name.clone(),
            value: value.as_str().filter(|s| !s.is_empty()).map(str::to_string),
        })
        .collect()
}

fn string_list(raw: Option<&Value>) -> Vec<String> {
    let Some(arr) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Offers without a retailer name are dropped: there is nothing to display
/// or rank them under. Source order is preserved for the rest, though
/// ranking never relies on it.
fn retailers_field(raw: Option<&Value>) -> Vec<RetailerPrice> {
    let Some(arr) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let retailer = string_field(entry, "retailer");
            if retailer.is_empty() {
                return None;
            }
            Some(RetailerPrice {
                retailer,
                price: string_field(entry, "price"),
                currency: string_field(entry, "currency"),
                in_stock: entry.get("inStock").and_then(Value::as_bool).unwrap_or(false),
                url: string_field(entry, "url"),
                product_image: opt_string(entry, "productImage"),
                comparison: opt_string(entry, "comparison"),
            })
        })
        .collect()
}

fn related_field(raw: Option<&Value>) -> Vec<RelatedProduct> {
    let Some(arr) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(Value::as_object)
        .map(|entry| RelatedProduct {
            name: string_field(entry, "name"),
            reason: string_field(entry, "reason"),
            estimated_price: string_field(entry, "estimatedPrice"),
            image_url: opt_string(entry, "imageUrl"),
            url: opt_string(entry, "url"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FixedStamper, sample_raw_response};

    #[test]
    fn happy_path_keeps_all_fields() {
        let stamper = FixedStamper::new(1_700_000_000_000);
        let result = normalize(&sample_raw_response(), &stamper).unwrap();

        assert_eq!(result.product_name, "Sony WH-1000XM4");
        assert_eq!(result.category, "Electronics");
        assert_eq!(result.rarity_tier, RarityTier::Uncommon);
        assert_eq!(result.confidence_score, 92.0);
        assert_eq!(result.retailers.len(), 3);
        assert_eq!(result.related_products.len(), 1);
        assert_eq!(result.pros.len(), 3);
    }

    #[test]
    fn identity_and_timestamp_come_from_the_stamper() {
        let stamper = FixedStamper::new(1_700_000_000_000);
        let raw = serde_json::json!({
            "id": "spoofed-id",
            "timestamp": 1,
            "productName": "Widget"
        });
        let result = normalize(&raw, &stamper).unwrap();

        assert_eq!(result.id, "id-1");
        assert_ne!(result.id, "spoofed-id");
        assert_eq!(result.timestamp, 1_700_000_001_000);
    }

    #[test]
    fn missing_score_and_unknown_tier_are_coerced() {
        let stamper = FixedStamper::new(0);
        let raw = serde_json::json!({
            "productName": "Mystery Item",
            "rarityTier": "Mythic"
        });
        let result = normalize(&raw, &stamper).unwrap();

        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(result.rarity_tier, RarityTier::Common);
        assert!(!result.id.is_empty());
    }

    #[test]
    fn out_of_range_score_is_clamped() {
        let stamper = FixedStamper::new(0);
        let over = serde_json::json!({"confidenceScore": 250});
        let under = serde_json::json!({"confidenceScore": -3.5});

        assert_eq!(normalize(&over, &stamper).unwrap().confidence_score, 100.0);
        assert_eq!(normalize(&under, &stamper).unwrap().confidence_score, 0.0);
    }

    #[test]
    fn wrong_types_become_defaults() {
        let stamper = FixedStamper::new(0);
        let raw = serde_json::json!({
            "productName": 42,
            "confidenceScore": "very confident",
            "isRare": "yes",
            "pros": "not a list",
            "retailers": {"not": "a list"}
        });
        let result = normalize(&raw, &stamper).unwrap();

        assert_eq!(result.product_name, "");
        assert_eq!(result.confidence_score, 0.0);
        assert!(!result.is_rare);
        assert!(result.pros.is_empty());
        assert!(result.retailers.is_empty());
    }

    #[test]
    fn specs_preserve_insertion_order_and_tolerate_nulls() {
        let stamper = FixedStamper::new(0);
        let raw: Value = serde_json::from_str(
            r#"{"specs": {"manufacturer": "Sony", "weight": null, "releaseYear": "2020"}}"#,
        )
        .unwrap();
        let result = normalize(&raw, &stamper).unwrap();

        let names: Vec<&str> = result.specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["manufacturer", "weight", "releaseYear"]);
        assert_eq!(result.specs[0].value.as_deref(), Some("Sony"));
        assert_eq!(result.specs[1].value, None);
    }

    #[test]
    fn nameless_offers_are_dropped() {
        let stamper = FixedStamper::new(0);
        let raw = serde_json::json!({
            "retailers": [
                {"retailer": "Amazon", "price": "£10", "url": "https://a.example/x"},
                {"price": "£5", "url": "https://b.example/y"},
                "not an object"
            ]
        });
        let result = normalize(&raw, &stamper).unwrap();

        assert_eq!(result.retailers.len(), 1);
        assert_eq!(result.retailers[0].retailer, "Amazon");
    }

    #[test]
    fn non_object_document_is_an_inference_error() {
        let stamper = FixedStamper::new(0);
        let err = normalize(&serde_json::json!(["a", "list"]), &stamper).unwrap_err();
        assert!(matches!(err, AppError::InferenceError { .. }));
    }
}
