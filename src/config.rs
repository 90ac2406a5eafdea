//! Configuration for layout reconstruction.
//!
//! Every threshold used by the analysis lives here. The defaults are the
//! empirical constants the heuristics were tuned with; they are kept as
//! named fields so each one can be traced and overridden.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::BBox;

/// Font size assumed for fragments (and pages) that carry none.
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Layout analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Font size used when a page has no usable font sizes.
    pub default_font_size: f64,

    /// A fragment is a header when `font_size > avg * header_ratio`.
    pub header_ratio: f64,

    /// Headers must be shorter than this many characters.
    pub max_header_len: usize,

    /// Absolute font size above which a block is typed `header`.
    pub header_block_font_size: f64,

    /// Upper/title-case text shorter than this is typed `title`.
    pub title_max_len: usize,

    /// Text longer than this is typed `paragraph`.
    pub paragraph_min_len: usize,

    /// Maximum number of column bands per page.
    pub max_columns: usize,

    /// Iteration cap for the column partition.
    pub max_cluster_iterations: usize,

    /// Adjacent column bands closer than this are merged.
    pub min_column_gap: f64,

    /// Quantization step for grouping fragments into candidate rows.
    pub row_bucket_size: f64,

    /// A gap is regular when within this fraction of the mean gap.
    pub spacing_tolerance: f64,

    /// Fraction of regular gaps required for an aligned row.
    pub regular_gap_ratio: f64,

    /// Rows further apart than this (in quantized y) start a new table.
    pub max_row_gap: f64,

    /// Horizontal slack when matching x positions between rows.
    pub alignment_tolerance: f64,

    /// Fraction of positions that must match for two rows to align.
    pub min_alignment_ratio: f64,

    /// Cells longer than this many characters span the following slot.
    pub merged_cell_len: usize,

    /// Center tolerance for spatial relationships.
    pub relationship_tolerance: f64,

    /// Bounds assumed for a page without usable fragments.
    pub default_page_bounds: BBox,

    /// Pages with more usable fragments than this are degraded.
    pub max_fragments_per_page: Option<usize>,

    /// Analyze pages on the rayon thread pool.
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE,
            header_ratio: 1.2,
            max_header_len: 100,
            header_block_font_size: 14.0,
            title_max_len: 50,
            paragraph_min_len: 200,
            max_columns: 3,
            max_cluster_iterations: 50,
            min_column_gap: 50.0,
            row_bucket_size: 5.0,
            spacing_tolerance: 0.5,
            regular_gap_ratio: 0.6,
            max_row_gap: 30.0,
            alignment_tolerance: 20.0,
            min_alignment_ratio: 0.5,
            merged_cell_len: 50,
            relationship_tolerance: 5.0,
            // US Letter in points
            default_page_bounds: BBox::new(0.0, 0.0, 612.0, 792.0),
            max_fragments_per_page: None,
            parallel: true,
        }
    }

    /// Enable or disable parallel page analysis.
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Disable parallel page analysis.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the maximum number of column bands.
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    /// Set the minimum gap between column bands.
    pub fn with_min_column_gap(mut self, gap: f64) -> Self {
        self.min_column_gap = gap;
        self
    }

    /// Set the center tolerance for spatial relationships.
    pub fn with_relationship_tolerance(mut self, tolerance: f64) -> Self {
        self.relationship_tolerance = tolerance;
        self
    }

    /// Set the horizontal tolerance for table column alignment.
    pub fn with_alignment_tolerance(mut self, tolerance: f64) -> Self {
        self.alignment_tolerance = tolerance;
        self
    }

    /// Set the bounds assumed for pages without usable fragments.
    pub fn with_default_page_bounds(mut self, bounds: BBox) -> Self {
        self.default_page_bounds = bounds;
        self
    }

    /// Limit the number of fragments analyzed per page.
    pub fn with_max_fragments_per_page(mut self, limit: usize) -> Self {
        self.max_fragments_per_page = Some(limit);
        self
    }

    /// Check that every value is usable by the analysis.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("default_font_size", self.default_font_size),
            ("header_block_font_size", self.header_block_font_size),
            ("min_column_gap", self.min_column_gap),
            ("max_row_gap", self.max_row_gap),
            ("alignment_tolerance", self.alignment_tolerance),
            ("relationship_tolerance", self.relationship_tolerance),
            ("spacing_tolerance", self.spacing_tolerance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let ratios = [
            ("regular_gap_ratio", self.regular_gap_ratio),
            ("min_alignment_ratio", self.min_alignment_ratio),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(self.header_ratio.is_finite() && self.header_ratio >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "header_ratio must be at least 1.0, got {}",
                self.header_ratio
            )));
        }
        if !(self.row_bucket_size.is_finite() && self.row_bucket_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "row_bucket_size must be positive, got {}",
                self.row_bucket_size
            )));
        }
        if self.max_columns == 0 {
            return Err(Error::InvalidConfig("max_columns must be positive".into()));
        }
        if self.max_cluster_iterations == 0 {
            return Err(Error::InvalidConfig(
                "max_cluster_iterations must be positive".into(),
            ));
        }
        if !self.default_page_bounds.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "default_page_bounds is degenerate: {:?}",
                self.default_page_bounds
            )));
        }

        Ok(())
    }
}
