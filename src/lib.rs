//! Waste classification service.
//!
//! Uploaded images are sent to a multimodal completion provider together
//! with a fixed waste-segregation prompt. The reply is read as a
//! [`model::ClassificationResult`]; when the provider cannot be reached a
//! record from the mock corpus is served instead, tagged as such.

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod error;
pub mod interpreter;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod routes;

pub use classifier::Classifier;
pub use config::Config;
pub use corpus::MockCorpus;
pub use error::{ClassifyError, FallbackError, ProviderError};
pub use model::{
    Classification, ClassificationResult, HighlightColor, ImagePayload, ParseFailure, Source,
    WasteCategory,
};
pub use provider::{InferenceClient, OpenAiClient};
pub use routes::{router, AppState};
