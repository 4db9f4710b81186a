use std::path::Path;

use rand::{seq::IndexedRandom, Rng};
use tracing::{info, warn};

use crate::error::FallbackError;
use crate::model::{ClassificationRecord, ClassificationResult, Source};

/// Pre-baked classifications served when the provider cannot be used.
#[derive(Debug, Clone)]
pub enum MockCorpus {
    Loaded(Vec<ClassificationResult>),
    /// Loading failed at startup; the reason is reported on every fallback.
    Unavailable(String),
}

impl MockCorpus {
    /// Reads the corpus file once. A failure does not abort startup; it
    /// leaves the corpus [`MockCorpus::Unavailable`].
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(records) => {
                info!(path = %path.display(), records = records.len(), "Loaded mock corpus");
                MockCorpus::Loaded(records)
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Mock corpus unavailable");
                MockCorpus::Unavailable(reason)
            }
        }
    }

    fn read(path: &Path) -> Result<Vec<ClassificationResult>, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let records: Vec<ClassificationRecord> =
            serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?;

        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                ClassificationResult::from_record(record, Source::Mock)
                    .map_err(|e| format!("{}: entry {}: {}", path.display(), i, e))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        match self {
            MockCorpus::Loaded(records) => records.len(),
            MockCorpus::Unavailable(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> &[ClassificationResult] {
        match self {
            MockCorpus::Loaded(records) => records,
            MockCorpus::Unavailable(_) => &[],
        }
    }

    /// Picks one record uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ClassificationResult, FallbackError> {
        match self {
            MockCorpus::Loaded(records) => records.choose(rng).cloned().ok_or(FallbackError::Empty),
            MockCorpus::Unavailable(reason) => Err(FallbackError::Unavailable(reason.clone())),
        }
    }
}
