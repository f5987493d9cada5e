//! Request orchestrator: builds the mode-appropriate instruction set and
//! response schema, invokes the inference service, and normalizes the raw
//! document into the canonical result.

use pricelens_core::AppError;
use pricelens_core::models::{AnalysisResult, ImagePart, InferenceRequest};
use pricelens_core::normalize::normalize;
use pricelens_core::traits::{Analyzer, Stamper};

/// Orchestrates one identification: build request → invoke → normalize.
///
/// Generic over the analyzer and the identity/time source, enabling
/// dependency injection and testability without real network calls. No
/// retries happen here; a single failure surfaces to the caller, which is
/// expected to offer a manual retry.
pub struct IdentifyService<A, S>
where
    A: Analyzer,
    S: Stamper,
{
    analyzer: A,
    stamper: S,
}

impl<A, S> IdentifyService<A, S>
where
    A: Analyzer,
    S: Stamper,
{
    pub fn new(analyzer: A, stamper: S) -> Self {
        Self { analyzer, stamper }
    }

    /// Identify the product in an encoded image.
    ///
    /// With `barcode_mode`, the instruction emphasis shifts to decoding
    /// the barcode first and identifying the exact associated product.
    pub async fn identify_image(
        &self,
        data: &str,
        mime_type: &str,
        barcode_mode: bool,
    ) -> Result<AnalysisResult, AppError> {
        let request = InferenceRequest {
            prompt: image_prompt(barcode_mode).to_string(),
            image: Some(ImagePart {
                data: data.to_string(),
                mime_type: mime_type.to_string(),
            }),
            schema: analysis_schema(),
        };

        tracing::info!(barcode_mode, mime_type, "Identifying product from image");
        let raw = self.analyzer.analyze(&request).await?;
        normalize(&raw, &self.stamper)
    }

    /// Identify a product from a free-text query.
    pub async fn identify_text(&self, query: &str) -> Result<AnalysisResult, AppError> {
        let request = InferenceRequest {
            prompt: text_prompt(query),
            image: None,
            schema: analysis_schema(),
        };

        tracing::info!(query, "Identifying product from text");
        let raw = self.analyzer.analyze(&request).await?;
        normalize(&raw, &self.stamper)
    }
}

fn image_prompt(barcode_mode: bool) -> &'static str {
    if barcode_mode {
        "You are a barcode scanner and product expert.\n\
         1. Read the barcode in the image if present.\n\
         2. Identify the EXACT product associated with this barcode or the product in the image.\n\
         3. Provide details for a UK-based CONSUMER (not wholesale).\n\
         - Assign a rarity tier.\n\
         - Prices in GBP (£) from major UK retailers AND local shops (CEX, Cash Converters).\n\
         - IMPORTANT: for the 'url' field, provide a SEARCH URL \
           (e.g., 'https://www.amazon.co.uk/s?k=Product+Name') so the link always works.\n\
         - Provide a quick buying tip.\n\
         - Provide FULL specs (attributes) where possible."
    } else {
        "Identify this EXACT item for a UK-based shopper.\n\
         1. Assign a rarity tier.\n\
         2. Identify the exact model and year.\n\
         3. Prices in GBP (£) from MAJOR UK RETAILERS (Amazon, eBay, Argos) AND local high \
            street shops (CEX, Cash Converters, local tech shops).\n\
         4. Include local shop prices to compare with big retailers.\n\
         5. IMPORTANT: for the 'url' field, use SEARCH QUERY URLs (e.g. Amazon search) so \
            links are never broken.\n\
         6. Provide 3 pros and 3 cons.\n\
         7. Provide a quick buying tip.\n\
         8. Provide COMPREHENSIVE specs (fill as many attributes as relevant).\n\
         9. In retailer offers, include a minimal comparison price for a main competitor brand."
    }
}

fn text_prompt(query: &str) -> String {
    format!(
        "Identify the product from query: \"{query}\" for a UK shopper.\n\
         1. Assign a rarity tier.\n\
         2. Prices in GBP (£) from MAJOR UK RETAILERS (Amazon, eBay, Argos) AND local shops \
            (CEX, Cash Converters).\n\
         3. Include local shop prices.\n\
         4. IMPORTANT: for the 'url' field, provide SEARCH URLs \
            (e.g. 'https://www.amazon.co.uk/s?k=...') to guarantee working links.\n\
         5. Provide a quick buying tip.\n\
         6. Fill all technical specs."
    )
}

/// The fixed structural schema every inference response must conform to.
pub fn analysis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "productName": {
                "type": "string",
                "description": "The specific name of the product identified."
            },
            "category": {
                "type": "string",
                "description": "Broad category (e.g., Electronics, Footwear)."
            },
            "description": {
                "type": "string",
                "description": "A detailed 2-3 sentence description of the product, its use, and key appeal."
            },
            "confidenceScore": {
                "type": "number",
                "description": "Confidence score between 0 and 100."
            },
            "isRare": {
                "type": "boolean",
                "description": "True if the item is considered a collectible, vintage, or limited edition."
            },
            "rarityTier": {
                "type": "string",
                "enum": ["Common", "Uncommon", "Rare", "Epic", "Legendary"],
                "description": "Rarity tier based on how hard the item is to find. Common = widely available, Legendary = highly sought after/vintage/limited."
            },
            "estimatedValueRange": {
                "type": "string",
                "description": "Estimated market value range in GBP (e.g., '£50 - £80')."
            },
            "buyingTip": {
                "type": "string",
                "description": "A short, one-sentence suggestion for the buyer."
            },
            "specs": {
                "type": "object",
                "description": "Technical specifications as string attributes. Include ANY available details: manufacturer, model, year, material, dimensions, weight, color, connectivity.",
                "additionalProperties": {"type": "string"}
            },
            "pros": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of 3-4 key advantages."
            },
            "cons": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of 2-3 potential drawbacks."
            },
            "retailers": {
                "type": "array",
                "description": "4-5 estimated prices from major UK retailers and local high street shops. Avoid wholesale.",
                "items": {
                    "type": "object",
                    "properties": {
                        "retailer": {"type": "string", "description": "Name of the retailer."},
                        "price": {"type": "string"},
                        "currency": {"type": "string", "description": "Must be 'GBP' or '£'."},
                        "inStock": {"type": "boolean"},
                        "url": {
                            "type": "string",
                            "description": "A functional SEARCH URL for this product at the retailer. Do NOT guess specific product IDs."
                        },
                        "productImage": {
                            "type": "string",
                            "description": "A direct URL to an image of the product. If unknown, leave empty."
                        },
                        "comparison": {
                            "type": "string",
                            "description": "One major competitor brand and price for context, e.g. 'vs Sony: £150'."
                        }
                    }
                }
            },
            "relatedProducts": {
                "type": "array",
                "description": "4 similar or alternative products available in the UK.",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "reason": {"type": "string"},
                        "estimatedPrice": {"type": "string"}
                    }
                }
            }
        },
        "required": [
            "productName", "description", "retailers", "relatedProducts",
            "specs", "rarityTier", "buyingTip"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelens_core::RarityTier;
    use pricelens_core::testutil::{FixedStamper, MockAnalyzer, sample_raw_response};

    fn service(analyzer: MockAnalyzer) -> IdentifyService<MockAnalyzer, FixedStamper> {
        IdentifyService::new(analyzer, FixedStamper::new(1_700_000_000_000))
    }

    #[tokio::test]
    async fn image_identification_normalizes_the_raw_document() {
        let analyzer = MockAnalyzer::new(sample_raw_response());
        let svc = service(analyzer.clone());

        let result = svc.identify_image("QUJD", "image/jpeg", false).await.unwrap();

        assert_eq!(result.product_name, "Sony WH-1000XM4");
        assert_eq!(result.rarity_tier, RarityTier::Uncommon);
        assert_eq!(result.id, "id-1");
        assert_eq!(result.timestamp, 1_700_000_001_000);

        let requests = analyzer.requests.lock().unwrap();
        let image = requests[0].image.as_ref().unwrap();
        assert_eq!(image.data, "QUJD");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn barcode_mode_changes_the_instruction_emphasis() {
        let analyzer = MockAnalyzer::new(sample_raw_response());
        let svc = service(analyzer.clone());

        svc.identify_image("QUJD", "image/png", true).await.unwrap();

        let requests = analyzer.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("barcode"));
    }

    #[tokio::test]
    async fn text_identification_embeds_the_query() {
        let analyzer = MockAnalyzer::new(sample_raw_response());
        let svc = service(analyzer.clone());

        svc.identify_text("sony headphones").await.unwrap();

        let requests = analyzer.requests.lock().unwrap();
        assert!(requests[0].image.is_none());
        assert!(requests[0].prompt.contains("sony headphones"));
    }

    #[tokio::test]
    async fn each_request_gets_a_fresh_identity() {
        let analyzer = MockAnalyzer::new(sample_raw_response());
        let svc = service(analyzer);

        let first = svc.identify_text("query one").await.unwrap();
        let second = svc.identify_text("query two").await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn analyzer_errors_propagate_unchanged() {
        let analyzer = MockAnalyzer::with_error(AppError::InferenceError {
            message: "quota exceeded".into(),
            status_code: 429,
            retryable: true,
        });
        let svc = service(analyzer);

        let err = svc.identify_text("anything").await.unwrap_err();
        assert!(matches!(err, AppError::InferenceError { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn schema_requires_the_fixed_field_set() {
        let schema = analysis_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();

        for field in [
            "productName",
            "description",
            "retailers",
            "relatedProducts",
            "specs",
            "rarityTier",
            "buyingTip",
        ] {
            assert!(required.contains(&field), "missing required field {field}");
        }
        assert_eq!(
            schema["properties"]["rarityTier"]["enum"].as_array().unwrap().len(),
            5
        );
    }
}
