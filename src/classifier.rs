//! Classification flow with graceful degradation.
//!
//! One linear attempt per request: the provider is consulted once; a reply
//! it produced is always interpreted (and a bad reply surfaced as a
//! [`Classification::ParseFailure`]), while a provider that could not answer
//! is replaced by a random mock record. Only a missing credential or a
//! failure of both paths is an error.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, instrument, warn};

use crate::corpus::MockCorpus;
use crate::error::{ClassifyError, ProviderError};
use crate::interpreter::interpret;
use crate::model::{Classification, ClassificationResult, ImagePayload, ParseFailure};
use crate::prompt::PromptTemplate;
use crate::provider::InferenceClient;

pub struct Classifier {
    client: Arc<dyn InferenceClient>,
    corpus: Arc<MockCorpus>,
    prompt: PromptTemplate,
    rng: Mutex<StdRng>,
}

impl Classifier {
    pub fn new(client: Arc<dyn InferenceClient>, corpus: Arc<MockCorpus>) -> Self {
        Self::with_rng(client, corpus, StdRng::from_os_rng())
    }

    /// Uses `rng` for fallback selection; seed it for reproducible picks.
    pub fn with_rng(client: Arc<dyn InferenceClient>, corpus: Arc<MockCorpus>, rng: StdRng) -> Self {
        Self {
            client,
            corpus,
            prompt: PromptTemplate::waste_segregation(),
            rng: Mutex::new(rng),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    #[instrument(skip_all, fields(content_type = %image.content_type(), bytes = image.bytes().len()))]
    pub async fn classify(&self, image: &ImagePayload) -> Result<Classification, ClassifyError> {
        if !self.client.is_configured() {
            return Err(ClassifyError::Configuration(
                "OpenAI API key not set. Please set the OPENAI_API_KEY environment variable."
                    .into(),
            ));
        }

        match self.client.complete(image, &self.prompt).await {
            Ok(raw) => Ok(match interpret(&raw) {
                Ok(result) => Classification::Live(result),
                Err(ParseFailure { reason, raw }) => {
                    warn!(%reason, raw = %raw, "Provider reply could not be interpreted");
                    Classification::ParseFailure(ParseFailure { reason, raw })
                }
            }),
            Err(ProviderError::MissingCredentials) => Err(ClassifyError::Configuration(
                ProviderError::MissingCredentials.to_string(),
            )),
            Err(provider) => self.fall_back(provider).map(Classification::Fallback),
        }
    }

    fn fall_back(&self, provider: ProviderError) -> Result<ClassificationResult, ClassifyError> {
        debug_assert!(provider.is_recoverable());
        warn!(error = %provider, "Provider failed, falling back to mock data");

        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.corpus.pick(&mut *rng)
        };

        picked.map_err(|fallback| {
            error!(provider = %provider, fallback = %fallback, "Provider and mock corpus both failed");
            ClassifyError::FallbackExhausted { provider, fallback }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Bytes;

    use super::*;
    use crate::error::FallbackError;
    use crate::model::{HighlightColor, Source, WasteCategory};

    const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00";

    enum Reply {
        Text(String),
        Unavailable,
        Status(u16),
        MissingCredentials,
    }

    struct StubClient {
        configured: bool,
        reply: Reply,
        calls: AtomicUsize,
    }

    impl StubClient {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                configured: true,
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn unconfigured() -> Arc<Self> {
            Arc::new(Self {
                configured: false,
                reply: Reply::Text("{}".into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceClient for StubClient {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(
            &self,
            _image: &ImagePayload,
            _prompt: &PromptTemplate,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Unavailable => Err(ProviderError::Unavailable("connection refused".into())),
                Reply::Status(status) => Err(ProviderError::Status {
                    status: *status,
                    body: "quota exceeded".into(),
                }),
                Reply::MissingCredentials => Err(ProviderError::MissingCredentials),
            }
        }
    }

    fn corpus() -> Arc<MockCorpus> {
        Arc::new(MockCorpus::Loaded(vec![
            ClassificationResult::new(
                "Banana peel",
                WasteCategory::Wet,
                "Green",
                "Compost it.",
                Source::Mock,
            ),
            ClassificationResult::new(
                "Glass jar",
                WasteCategory::Recyclable,
                "Blue",
                "Remove the lid.",
                Source::Mock,
            ),
            ClassificationResult::new(
                "Chip packet",
                WasteCategory::Dry,
                "Blue",
                "Empty it first.",
                Source::Mock,
            ),
        ]))
    }

    fn classifier(client: Arc<StubClient>, corpus: Arc<MockCorpus>) -> Classifier {
        Classifier::with_rng(client, corpus, StdRng::seed_from_u64(3))
    }

    fn image() -> ImagePayload {
        ImagePayload::new(Bytes::from_static(JPEG_MAGIC), Some("image/jpeg")).unwrap()
    }

    const LIVE_REPLY: &str = r#"{"object": "Apple core", "category": "Wet Waste", "highlight_color": "Green", "bin": "Green", "tip": "Compost it.", "points": 10}"#;

    #[tokio::test]
    async fn live_reply_is_returned_with_consistent_colour() {
        let client = StubClient::new(Reply::Text(LIVE_REPLY.into()));
        let outcome = classifier(client.clone(), corpus()).classify(&image()).await.unwrap();

        match outcome {
            Classification::Live(result) => {
                assert_eq!(result.object(), "Apple core");
                assert_eq!(result.category(), WasteCategory::Wet);
                assert_eq!(result.highlight_color(), HighlightColor::Green);
                assert_eq!(result.source(), Source::Live);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn live_reply_with_wrong_colour_is_corrected() {
        let client = StubClient::new(Reply::Text(
            r#"{"object": "Cardboard", "category": "Recyclable Waste", "highlight_color": "Green", "bin": "Blue", "tip": "Flatten it."}"#
                .into(),
        ));
        let outcome = classifier(client, corpus()).classify(&image()).await.unwrap();
        let Classification::Live(result) = outcome else {
            panic!("expected live result");
        };
        assert_eq!(result.highlight_color(), HighlightColor::Yellow);
    }

    #[tokio::test]
    async fn live_colour_always_follows_category() {
        let cases = [
            ("Wet Waste", "Green", WasteCategory::Wet),
            ("wet", "Yellow", WasteCategory::Wet),
            ("Dry Waste", "Blue", WasteCategory::Dry),
            ("DRY_WASTE", "Green", WasteCategory::Dry),
            ("Recyclable Waste", "Yellow", WasteCategory::Recyclable),
            ("recycle", "Blue", WasteCategory::Recyclable),
        ];

        for (label, color, expected) in cases {
            let reply = format!(
                r#"{{"object": "Item", "category": "{}", "highlight_color": "{}", "bin": "Any", "tip": "Sort it.", "points": 10}}"#,
                label, color
            );
            let outcome = classifier(StubClient::new(Reply::Text(reply)), corpus())
                .classify(&image())
                .await
                .unwrap();
            let Classification::Live(result) = outcome else {
                panic!("expected live result for {}", label);
            };
            assert_eq!(result.category(), expected, "category for {}", label);
            assert_eq!(
                result.highlight_color(),
                result.category().highlight_color(),
                "colour for {} reported as {}",
                label,
                color
            );
        }
    }

    #[tokio::test]
    async fn unavailable_provider_falls_back_to_corpus_member() {
        let corpus = corpus();
        let classifier = classifier(StubClient::new(Reply::Unavailable), corpus.clone());

        for _ in 0..10 {
            match classifier.classify(&image()).await.unwrap() {
                Classification::Fallback(result) => {
                    assert!(corpus.records().contains(&result));
                    assert_eq!(result.source(), Source::Mock);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn error_status_falls_back() {
        let outcome = classifier(StubClient::new(Reply::Status(429)), corpus())
            .classify(&image())
            .await
            .unwrap();
        assert!(matches!(outcome, Classification::Fallback(_)));
    }

    #[tokio::test]
    async fn missing_credentials_fails_without_calling_provider() {
        let client = StubClient::unconfigured();
        let err = classifier(client.clone(), corpus())
            .classify(&image())
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Configuration(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn credentials_rejected_by_client_do_not_fall_back() {
        let err = classifier(StubClient::new(Reply::MissingCredentials), corpus())
            .classify(&image())
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Configuration(_)));
    }

    #[tokio::test]
    async fn unparseable_reply_is_surfaced_with_raw_text() {
        let outcome = classifier(StubClient::new(Reply::Text("not json".into())), corpus())
            .classify(&image())
            .await
            .unwrap();
        match outcome {
            Classification::ParseFailure(failure) => assert_eq!(failure.raw, "not json"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn dual_failure_names_both_causes() {
        let empty = Arc::new(MockCorpus::Loaded(Vec::new()));
        let err = classifier(StubClient::new(Reply::Unavailable), empty)
            .classify(&image())
            .await
            .unwrap_err();

        match &err {
            ClassifyError::FallbackExhausted { provider, fallback } => {
                assert!(matches!(provider, ProviderError::Unavailable(_)));
                assert_eq!(fallback, &FallbackError::Empty);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("connection refused"));
        assert!(message.contains("mock corpus is empty"));
    }

    #[tokio::test]
    async fn unreadable_corpus_is_reported_in_dual_failure() {
        let broken = Arc::new(MockCorpus::Unavailable("waste_mock_data.json: not found".into()));
        let err = classifier(StubClient::new(Reply::Status(503)), broken)
            .classify(&image())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("waste_mock_data.json: not found"));
    }

    #[tokio::test]
    async fn same_reply_gives_identical_results() {
        let classifier = classifier(StubClient::new(Reply::Text(LIVE_REPLY.into())), corpus());
        let first = classifier.classify(&image()).await.unwrap();
        let second = classifier.classify(&image()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn seeded_fallback_is_reproducible() {
        let pick = |seed: u64| async move {
            Classifier::with_rng(
                StubClient::new(Reply::Unavailable),
                corpus(),
                StdRng::seed_from_u64(seed),
            )
            .classify(&image())
            .await
            .unwrap()
        };
        assert_eq!(pick(11).await, pick(11).await);
    }
}
