use tracing::debug;

use crate::model::{ClassificationRecord, ClassificationResult, ParseFailure, Source};

/// Reads the model's reply as a live [`ClassificationResult`].
///
/// Never errors: unusable text comes back as a [`ParseFailure`] carrying the
/// original reply so provider drift stays visible.
pub fn interpret(raw: &str) -> Result<ClassificationResult, ParseFailure> {
    let body = strip_code_fence(raw);

    let record: ClassificationRecord = serde_json::from_str(body).map_err(|e| ParseFailure {
        reason: e.to_string(),
        raw: raw.to_string(),
    })?;

    let result = ClassificationResult::from_record(record, Source::Live).map_err(|reason| {
        ParseFailure {
            reason,
            raw: raw.to_string(),
        }
    })?;

    debug!(object = %result.object(), category = %result.category(), "Interpreted provider reply");
    Ok(result)
}

// Some models wrap JSON in ```json ... ``` even when told not to.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim(),
    }
}
