//! Document-level layout aggregation.
//!
//! The analyzer groups fragments by page, runs every per-page stage
//! (classification, column partitioning, table detection, spatial
//! relationships, reading order) and folds the page results into a
//! [`DocumentLayout`] with global statistics.
//!
//! ## Failure handling
//!
//! Analysis is total. Unusable fragments are skipped, pages without usable
//! fragments get an empty layout, and a page whose analysis fails is
//! degraded to an empty layout. Each of these is recorded as a
//! [`Diagnostic`] and logged; none of them affects sibling pages.
//!
//! ## Parallelism
//!
//! Pages are independent. With [`LayoutConfig::parallel`] set they are
//! analyzed on the rayon thread pool; results are keyed by page number and
//! folded in page order, so the output is identical to a sequential run.
//!
//! ## Example
//!
//! ```
//! use layout_oxide::fragment::Fragment;
//! use layout_oxide::geometry::BBox;
//! use layout_oxide::layout::{LayoutAnalyzer, DocumentType};
//!
//! let fragments = vec![
//!     Fragment::new(1, "Title", BBox::new(0.0, 0.0, 100.0, 20.0), 24.0),
//!     Fragment::new(1, "Body text here", BBox::new(0.0, 30.0, 300.0, 45.0), 11.0),
//! ];
//!
//! let layout = LayoutAnalyzer::new().analyze(&fragments);
//! assert_eq!(layout.pages.len(), 1);
//! assert_eq!(layout.reading_order.len(), 2);
//! assert_eq!(layout.global.document_type, DocumentType::SimpleDocument);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, DEFAULT_FONT_SIZE};
use crate::error::{Error, Result};
use crate::fragment::{Fragment, FragmentRef, FragmentView, PageId};
use crate::geometry::BBox;
use crate::layout::classifier::{classify_elements, Header, TextBlock};
use crate::layout::column_detector::{partition_columns, Column};
use crate::layout::reading_order::{determine_reading_order, ReadingEntry};
use crate::layout::spatial::{build_relationships, Relationship};
use crate::layout::table_detector::{detect_tables, Table};

/// Overall classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// One column per page
    SingleColumn,
    /// Pages average more than one column
    MultiColumn,
    /// Single column with more than five headers
    StructuredDocument,
    /// Anything else
    #[default]
    SimpleDocument,
}

/// Statistics derived from all analyzed pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStructure {
    /// Pages average more than one column
    pub has_columns: bool,
    /// Mean column count per page, rounded
    pub column_count: u32,
    /// Mean font size over analyzed fragments
    pub main_font_size: f64,
    /// Every header level seen, ascending
    pub header_levels: BTreeSet<u8>,
    /// Document classification
    pub document_type: DocumentType,
}

impl Default for GlobalStructure {
    fn default() -> Self {
        Self {
            has_columns: false,
            column_count: 0,
            main_font_size: DEFAULT_FONT_SIZE,
            header_levels: BTreeSet::new(),
            document_type: DocumentType::default(),
        }
    }
}

/// Layout of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Column bands, left to right
    pub columns: Vec<Column>,
    /// Detected headers
    pub headers: Vec<Header>,
    /// Typed text blocks
    pub text_blocks: Vec<TextBlock>,
    /// Tables found on the page
    pub tables: Vec<Table>,
    /// Pairwise relationships between fragments
    pub relationships: Vec<Relationship>,
    /// Extent of the page content
    pub bounds: BBox,
    /// Mean font size used for header detection
    pub avg_font_size: f64,
}

impl PageLayout {
    /// An empty layout for a page that could not be analyzed.
    pub fn empty(bounds: BBox) -> Self {
        Self {
            columns: Vec::new(),
            headers: Vec::new(),
            text_blocks: Vec::new(),
            tables: Vec::new(),
            relationships: Vec::new(),
            bounds,
            avg_font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Whether nothing was found on the page.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.text_blocks.is_empty()
    }
}

/// Kind of a recorded degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Fragment bbox is non-finite or inverted
    MalformedFragment,
    /// Fragment has only whitespace
    EmptyText,
    /// Page has no usable fragments
    DegeneratePage,
    /// Page analysis failed and the page was degraded
    PageFailure,
}

/// A degradation recorded during analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Page concerned, if any
    pub page: Option<PageId>,
    /// What happened
    pub kind: DiagnosticKind,
    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    fn new(page: PageId, kind: DiagnosticKind, message: String) -> Self {
        match kind {
            DiagnosticKind::EmptyText => log::debug!("Page {}: {}", page, message),
            _ => log::warn!("Page {}: {}", page, message),
        }
        Self {
            page: Some(page),
            kind,
            message,
        }
    }
}

/// Reconstructed layout of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Per-page layouts keyed by page number
    pub pages: BTreeMap<PageId, PageLayout>,
    /// Document-wide statistics
    pub global: GlobalStructure,
    /// All tables, in page order
    pub tables: Vec<Table>,
    /// Reading sequence of every page, in page order
    pub reading_order: Vec<ReadingEntry>,
    /// Degradations recorded during analysis
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentLayout {
    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reading sequence of one page.
    pub fn page_reading_order(&self, page: PageId) -> impl Iterator<Item = &ReadingEntry> + '_ {
        self.reading_order.iter().filter(move |e| e.page == page)
    }
}

/// Result of analyzing one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAnalysis {
    /// Page structure
    pub layout: PageLayout,
    /// Reading sequence of the page
    pub reading_order: Vec<ReadingEntry>,
}

/// Fragments of one page, split into usable views and diagnostics.
struct PageInput<'a> {
    views: Vec<FragmentView<'a>>,
    diagnostics: Vec<Diagnostic>,
}

/// Per-page output ready to be folded into the document.
struct PageOutcome {
    layout: PageLayout,
    reading_order: Vec<ReadingEntry>,
    diagnostics: Vec<Diagnostic>,
    font_size_sum: f64,
    font_size_count: usize,
}

/// Layout analyzer.
///
/// Holds a validated configuration and runs the full pipeline.
#[derive(Debug, Clone, Default)]
pub struct LayoutAnalyzer {
    config: LayoutConfig,
}

impl LayoutAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom configuration.
    ///
    /// Fails with [`Error::InvalidConfig`] if a value is out of range.
    pub fn with_config(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Analyze a set of fragments.
    ///
    /// [`FragmentRef`]s in the result index into `fragments`. This never
    /// fails; see the module docs for how problems are reported.
    pub fn analyze(&self, fragments: &[Fragment]) -> DocumentLayout {
        if fragments.is_empty() {
            log::debug!("No fragments, returning empty layout");
            return DocumentLayout::default();
        }

        let inputs: Vec<(PageId, PageInput<'_>)> = group_by_page(fragments).into_iter().collect();
        log::debug!(
            "Analyzing {} fragments on {} pages ({})",
            fragments.len(),
            inputs.len(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let outcomes: Vec<(PageId, PageOutcome)> = if self.config.parallel {
            inputs
                .into_par_iter()
                .map(|(page, input)| (page, self.run_page(page, input)))
                .collect()
        } else {
            inputs
                .into_iter()
                .map(|(page, input)| (page, self.run_page(page, input)))
                .collect()
        };

        fold_outcomes(outcomes)
    }

    /// Analyze the usable fragments of one page.
    ///
    /// `fragments` should contain only fragments for which
    /// [`Fragment::is_usable`] holds, ordered by index.
    pub fn analyze_page(&self, page: PageId, fragments: &[FragmentView<'_>]) -> Result<PageAnalysis> {
        if let Some(limit) = self.config.max_fragments_per_page {
            if fragments.len() > limit {
                return Err(Error::PageTooLarge {
                    page,
                    count: fragments.len(),
                    limit,
                });
            }
        }

        let bounds = BBox::enclosing(fragments.iter().map(|v| v.bbox()))
            .unwrap_or(self.config.default_page_bounds);

        let classification = classify_elements(fragments, &self.config);
        let columns = partition_columns(fragments, &bounds, &self.config);
        let tables = detect_tables(page, fragments, &self.config)?;
        let relationships = build_relationships(fragments, self.config.relationship_tolerance);
        let reading_order = determine_reading_order(page, &columns, fragments);

        if reading_order.len() != fragments.len() {
            return Err(Error::InvariantViolation(format!(
                "reading order of page {} has {} entries for {} fragments",
                page,
                reading_order.len(),
                fragments.len()
            )));
        }

        log::debug!(
            "Page {}: {} columns, {} headers, {} tables, {} relationships",
            page,
            columns.len(),
            classification.headers.len(),
            tables.len(),
            relationships.len()
        );

        Ok(PageAnalysis {
            layout: PageLayout {
                columns,
                headers: classification.headers,
                text_blocks: classification.text_blocks,
                tables,
                relationships,
                bounds,
                avg_font_size: classification.avg_font_size,
            },
            reading_order,
        })
    }

    fn run_page(&self, page: PageId, input: PageInput<'_>) -> PageOutcome {
        let PageInput {
            views,
            mut diagnostics,
        } = input;

        let degraded = |diagnostics: Vec<Diagnostic>| PageOutcome {
            layout: PageLayout::empty(self.config.default_page_bounds),
            reading_order: Vec::new(),
            diagnostics,
            font_size_sum: 0.0,
            font_size_count: 0,
        };

        if views.is_empty() {
            diagnostics.push(Diagnostic::new(
                page,
                DiagnosticKind::DegeneratePage,
                "no usable fragments, using default page bounds".to_string(),
            ));
            return degraded(diagnostics);
        }

        match self.analyze_page(page, &views) {
            Ok(analysis) => {
                let (font_size_sum, font_size_count) = views
                    .iter()
                    .map(|v| v.fragment.font_size)
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .fold((0.0, 0usize), |(sum, count), s| (sum + s, count + 1));

                PageOutcome {
                    layout: analysis.layout,
                    reading_order: analysis.reading_order,
                    diagnostics,
                    font_size_sum,
                    font_size_count,
                }
            },
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    page,
                    DiagnosticKind::PageFailure,
                    format!("analysis failed, page degraded: {}", e),
                ));
                degraded(diagnostics)
            },
        }
    }
}

/// Analyze fragments with the default configuration.
///
/// # Examples
///
/// ```
/// let layout = layout_oxide::analyze(&[]);
/// assert!(layout.pages.is_empty());
/// assert!(layout.reading_order.is_empty());
/// ```
pub fn analyze(fragments: &[Fragment]) -> DocumentLayout {
    LayoutAnalyzer::new().analyze(fragments)
}

/// Split fragments into per-page inputs, keeping input order.
fn group_by_page(fragments: &[Fragment]) -> BTreeMap<PageId, PageInput<'_>> {
    let mut pages: BTreeMap<PageId, PageInput<'_>> = BTreeMap::new();

    for (i, fragment) in fragments.iter().enumerate() {
        let id = FragmentRef(i);
        let page = fragment.page;
        let input = pages.entry(page).or_insert_with(|| PageInput {
            views: Vec::new(),
            diagnostics: Vec::new(),
        });

        if !fragment.bbox.is_valid() {
            input.diagnostics.push(Diagnostic::new(
                page,
                DiagnosticKind::MalformedFragment,
                format!("fragment {} has an unusable bbox {:?}", id, fragment.bbox),
            ));
        } else if !fragment.has_text() {
            input.diagnostics.push(Diagnostic::new(
                page,
                DiagnosticKind::EmptyText,
                format!("fragment {} has no text", id),
            ));
        } else {
            input.views.push(FragmentView::new(id, fragment));
        }
    }

    pages
}

/// Fold page outcomes, already in page order, into the document layout.
fn fold_outcomes(outcomes: Vec<(PageId, PageOutcome)>) -> DocumentLayout {
    let mut layout = DocumentLayout::default();

    let mut column_counts = Vec::new();
    let mut total_headers = 0usize;
    let mut font_size_sum = 0.0;
    let mut font_size_count = 0usize;

    for (page, outcome) in outcomes {
        // Degraded pages count with zero columns
        column_counts.push(outcome.layout.columns.len());
        font_size_sum += outcome.font_size_sum;
        font_size_count += outcome.font_size_count;

        total_headers += outcome.layout.headers.len();
        layout
            .global
            .header_levels
            .extend(outcome.layout.headers.iter().map(|h| h.level));
        layout.tables.extend(outcome.layout.tables.iter().cloned());
        layout.reading_order.extend(outcome.reading_order);
        layout.diagnostics.extend(outcome.diagnostics);
        layout.pages.insert(page, outcome.layout);
    }

    let mean_columns = if column_counts.is_empty() {
        0.0
    } else {
        column_counts.iter().sum::<usize>() as f64 / column_counts.len() as f64
    };

    let global = &mut layout.global;
    global.has_columns = mean_columns > 1.0;
    global.column_count = mean_columns.round() as u32;
    if font_size_count > 0 {
        global.main_font_size = font_size_sum / font_size_count as f64;
    }
    global.document_type = if global.has_columns {
        DocumentType::MultiColumn
    } else if total_headers > 5 {
        DocumentType::StructuredDocument
    } else {
        DocumentType::SimpleDocument
    };

    log::debug!(
        "Document: {} pages, {} tables, type {:?}, {} diagnostics",
        layout.pages.len(),
        layout.tables.len(),
        layout.global.document_type,
        layout.diagnostics.len()
    );

    layout
}
