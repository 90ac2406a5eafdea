//! Positioned text fragments, the input unit of layout analysis.
//!
//! Fragments are supplied by an external extractor. The records it emits
//! are loosely typed, so ingestion applies the defaults of the extractor
//! contract and drops records that cannot be placed on a page.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_FONT_SIZE;
use crate::error::Result;
use crate::geometry::BBox;

/// Page number as reported by the extractor (1-indexed by convention).
pub type PageId = u32;

/// Index of a fragment in the slice handed to the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentRef(pub usize);

impl FragmentRef {
    /// Position of the fragment in the analyzed slice.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FragmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One positioned piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Page the fragment belongs to
    pub page: PageId,
    /// Text content
    pub text: String,
    /// Location on the page
    pub bbox: BBox,
    /// Font size in points
    pub font_size: f64,
}

impl Fragment {
    /// Create a new fragment.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::fragment::Fragment;
    /// use layout_oxide::geometry::BBox;
    ///
    /// let fragment = Fragment::new(1, "Title", BBox::new(0.0, 0.0, 100.0, 20.0), 24.0);
    /// assert_eq!(fragment.page, 1);
    /// assert!(fragment.has_text());
    /// ```
    pub fn new(page: PageId, text: impl Into<String>, bbox: BBox, font_size: f64) -> Self {
        Self {
            page,
            text: text.into(),
            bbox,
            font_size,
        }
    }

    /// Whether the fragment has any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Whether the fragment can take part in spatial analysis.
    pub fn is_usable(&self) -> bool {
        self.bbox.is_valid() && self.has_text()
    }
}

/// A fragment borrowed from the analyzed slice together with its index.
#[derive(Debug, Clone, Copy)]
pub struct FragmentView<'a> {
    /// Index in the analyzed slice
    pub id: FragmentRef,
    /// The fragment itself
    pub fragment: &'a Fragment,
}

impl<'a> FragmentView<'a> {
    /// Pair a fragment with its index.
    pub fn new(id: FragmentRef, fragment: &'a Fragment) -> Self {
        Self { id, fragment }
    }

    /// Bounding box of the fragment.
    pub fn bbox(&self) -> &'a BBox {
        &self.fragment.bbox
    }

    /// Text with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &'a str {
        self.fragment.text.trim()
    }
}

/// Bounding box as written by extractors: an object or a 4-element array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawBBox {
    Object { x0: f64, y0: f64, x1: f64, y1: f64 },
    Array([f64; 4]),
}

impl From<RawBBox> for BBox {
    fn from(raw: RawBBox) -> Self {
        match raw {
            RawBBox::Object { x0, y0, x1, y1 } => BBox::new(x0, y0, x1, y1),
            RawBBox::Array([x0, y0, x1, y1]) => BBox::new(x0, y0, x1, y1),
        }
    }
}

/// A fragment record before defaults are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFragment {
    #[serde(default)]
    page: Option<PageId>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    bbox: Option<RawBBox>,
    #[serde(default)]
    font_size: Option<f64>,
}

impl RawFragment {
    /// Apply the extractor defaults; `None` when the record has no bbox.
    pub fn into_fragment(self) -> Option<Fragment> {
        let bbox = self.bbox?;
        Some(Fragment {
            page: self.page.unwrap_or(1),
            text: self.text.unwrap_or_default(),
            bbox: bbox.into(),
            font_size: self.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        })
    }
}

/// Result of ingesting extractor output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    /// Fragments ready for analysis, in input order
    pub fragments: Vec<Fragment>,
    /// Number of records dropped for a missing or malformed bbox
    pub dropped: usize,
}

/// Parse extractor output from a JSON string.
///
/// Accepts either a top-level array of records or an object with a
/// `fragments` array. Records that cannot be placed are dropped and
/// counted; only structurally invalid JSON is an error.
///
/// # Examples
///
/// ```
/// use layout_oxide::fragment::fragments_from_json;
///
/// let json = r#"[
///     {"page": 2, "text": "Hello", "bbox": {"x0": 0, "y0": 0, "x1": 40, "y1": 12}},
///     {"text": "no box"}
/// ]"#;
/// let ingested = fragments_from_json(json)?;
/// assert_eq!(ingested.fragments.len(), 1);
/// assert_eq!(ingested.fragments[0].font_size, 11.0);
/// assert_eq!(ingested.dropped, 1);
/// # Ok::<(), layout_oxide::Error>(())
/// ```
pub fn fragments_from_json(json: &str) -> Result<Ingested> {
    let value: Value = serde_json::from_str(json)?;
    Ok(ingest_value(value))
}

/// Parse extractor output from a reader.
pub fn fragments_from_reader<R: Read>(reader: R) -> Result<Ingested> {
    let value: Value = serde_json::from_reader(reader)?;
    Ok(ingest_value(value))
}

/// Parse extractor output from a JSON file.
pub fn fragments_from_path<P: AsRef<Path>>(path: P) -> Result<Ingested> {
    let file = std::fs::File::open(path)?;
    fragments_from_reader(std::io::BufReader::new(file))
}

fn ingest_value(value: Value) -> Ingested {
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("fragments") {
            Some(Value::Array(records)) => records,
            _ => {
                log::warn!("Extractor output has no `fragments` array");
                Vec::new()
            },
        },
        other => {
            log::warn!("Unexpected extractor output: {}", other);
            Vec::new()
        },
    };

    let mut ingested = Ingested::default();
    for (i, record) in records.into_iter().enumerate() {
        match RawFragment::deserialize(record) {
            Ok(raw) => match raw.into_fragment() {
                Some(fragment) => ingested.fragments.push(fragment),
                None => {
                    log::debug!("Record {} has no bbox, dropping", i);
                    ingested.dropped += 1;
                },
            },
            Err(e) => {
                log::warn!("Record {} is malformed, dropping: {}", i, e);
                ingested.dropped += 1;
            },
        }
    }

    log::debug!(
        "Ingested {} fragments ({} dropped)",
        ingested.fragments.len(),
        ingested.dropped
    );
    ingested
}
