use std::fmt;
use std::str::FromStr;

use axum::body::Bytes;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ClassifyError;

/// Reward granted for every classified item.
pub const POINTS_AWARD: u32 = 10;

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// Disposal category of a waste item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WasteCategory {
    #[serde(rename = "Wet Waste")]
    Wet,
    #[serde(rename = "Dry Waste")]
    Dry,
    #[serde(rename = "Recyclable Waste")]
    Recyclable,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 3] = [
        WasteCategory::Wet,
        WasteCategory::Dry,
        WasteCategory::Recyclable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WasteCategory::Wet => "Wet Waste",
            WasteCategory::Dry => "Dry Waste",
            WasteCategory::Recyclable => "Recyclable Waste",
        }
    }

    /// The only colour a result of this category may be highlighted with.
    pub fn highlight_color(self) -> HighlightColor {
        match self {
            WasteCategory::Wet => HighlightColor::Green,
            WasteCategory::Dry => HighlightColor::Blue,
            WasteCategory::Recyclable => HighlightColor::Yellow,
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WasteCategory {
    type Err = String;

    // Models are sloppy with casing and spacing: "Wet Waste", "wet", "RECYCLABLE_WASTE".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let stem = normalized.strip_suffix("waste").unwrap_or(&normalized);

        match stem {
            "wet" | "organic" => Ok(WasteCategory::Wet),
            "dry" => Ok(WasteCategory::Dry),
            "recyclable" | "recycle" | "recycling" => Ok(WasteCategory::Recyclable),
            _ => Err(format!("unknown waste category '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HighlightColor {
    Green,
    Blue,
    Yellow,
}

impl FromStr for HighlightColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(HighlightColor::Green),
            "blue" => Ok(HighlightColor::Blue),
            "yellow" => Ok(HighlightColor::Yellow),
            other => Err(format!("unknown highlight colour '{}'", other)),
        }
    }
}

/// Where a [`ClassificationResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Mock,
}

/// Loosely-typed record as written by the model or stored in the mock corpus.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationRecord {
    pub object: String,
    pub category: String,
    /// Derived from the category; any JSON value is tolerated here.
    #[serde(default, alias = "highlightColor")]
    pub highlight_color: Option<Value>,
    pub bin: String,
    pub tip: String,
    /// Fixed award; models emit `10`, `10.0` or `"10"` alike.
    #[serde(default)]
    pub points: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    object: String,
    category: WasteCategory,
    highlight_color: HighlightColor,
    bin: String,
    tip: String,
    points: u32,
    source: Source,
}

impl ClassificationResult {
    pub fn new(
        object: impl Into<String>,
        category: WasteCategory,
        bin: impl Into<String>,
        tip: impl Into<String>,
        source: Source,
    ) -> Self {
        Self {
            object: object.into(),
            category,
            highlight_color: category.highlight_color(),
            bin: bin.into(),
            tip: tip.into(),
            points: POINTS_AWARD,
            source,
        }
    }

    /// Validates a raw record and builds the canonical result from it.
    ///
    /// The highlight colour and point award are derived, not trusted: a record
    /// that disagrees is corrected and the discrepancy logged.
    pub fn from_record(record: ClassificationRecord, source: Source) -> Result<Self, String> {
        let object = record.object.trim();
        if object.is_empty() {
            return Err("empty object label".to_string());
        }
        let category: WasteCategory = record.category.parse()?;

        if let Some(color) = record.highlight_color.as_ref() {
            let reported = color.as_str().and_then(|c| c.parse::<HighlightColor>().ok());
            if reported != Some(category.highlight_color()) {
                warn!(
                    category = %category,
                    reported = %color,
                    expected = ?category.highlight_color(),
                    "Highlight colour does not match category, correcting"
                );
            }
        }
        if let Some(points) = record.points.as_ref() {
            if numeric(points) != Some(f64::from(POINTS_AWARD)) {
                warn!(reported = %points, "Unexpected point award, using fixed value");
            }
        }

        Ok(Self::new(object, category, record.bin, record.tip, source))
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn category(&self) -> WasteCategory {
        self.category
    }

    pub fn highlight_color(&self) -> HighlightColor {
        self.highlight_color
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    pub fn tip(&self) -> &str {
        &self.tip
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn source(&self) -> Source {
        self.source
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Model output that could not be read as a [`ClassificationResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub reason: String,
    pub raw: String,
}

/// Outcome of one classification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Live(ClassificationResult),
    Fallback(ClassificationResult),
    ParseFailure(ParseFailure),
}

/// An uploaded image, held only for the duration of one request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Bytes,
    content_type: String,
}

impl ImagePayload {
    /// Accepts any non-empty upload that is not declared as text.
    ///
    /// A declared `image/*` type wins; otherwise the format is sniffed from
    /// the leading bytes, and anything unrecognised is sent as JPEG.
    pub fn new(bytes: Bytes, declared: Option<&str>) -> Result<Self, ClassifyError> {
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidInput("uploaded image is empty".into()));
        }

        let content_type = match declared.map(str::trim) {
            Some(ct) if ct.starts_with("image/") => ct.to_string(),
            Some(ct) if ct.starts_with("text/") => {
                return Err(ClassifyError::InvalidInput(format!(
                    "unsupported upload type '{}'",
                    ct
                )))
            }
            _ => image::guess_format(&bytes)
                .map(mime_for)
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string(),
        };

        Ok(Self {
            bytes,
            content_type,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => FALLBACK_CONTENT_TYPE,
    }
}
