//! Client-side integration: image encoding, the OpenAI-compatible inference
//! client, and the identification orchestrator.

pub mod encoder;
pub mod identify;
pub mod llm;

pub use encoder::{EncodedImage, encode_image};
pub use identify::IdentifyService;
pub use llm::OpenAiAnalyzer;
