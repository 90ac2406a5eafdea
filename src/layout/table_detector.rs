//! Table detection using alignment analysis.
//!
//! Fragments sharing a quantized vertical position form candidate rows.
//! Rows whose cells are regularly spaced are chained into tables while
//! consecutive rows stay close, keep a similar cell count, and line up with
//! the first row of the table. Each table is materialized into a
//! rectangular text grid with a heuristic confidence score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::fragment::{FragmentRef, FragmentView, PageId};
use crate::geometry::BBox;

// Confidence scoring weights. These are empirical tuning values.
const BASE_CONFIDENCE: f64 = 0.5;
const THREE_ROWS_BONUS: f64 = 0.1;
const FIVE_ROWS_BONUS: f64 = 0.1;
const CONSISTENT_COLUMNS_BONUS: f64 = 0.2;
const ALIGNED_ROWS_BONUS: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

/// How a table was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Aligned runs of text without ruling lines
    AlignedText,
}

/// A detected table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Page the table was found on
    pub page: PageId,
    /// Cell texts, `rows` × `cols`
    pub grid: Vec<Vec<String>>,
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Bounding box of every fragment in the table
    pub bbox: BBox,
    /// Heuristic confidence in `[0, 0.95]`
    pub confidence: f64,
    /// Detection method
    pub kind: TableKind,
    /// `(row, col)` of cells that also cover the slot to their right
    pub merged_cells: Vec<(usize, usize)>,
    /// Fragments that make up the table, row by row
    pub fragments: Vec<FragmentRef>,
}

impl Table {
    /// Whether every row has exactly `cols` cells.
    pub fn is_rectangular(&self) -> bool {
        self.grid.len() == self.rows && self.grid.iter().all(|row| row.len() == self.cols)
    }
}

/// Fragments sharing a quantized vertical position.
#[derive(Debug, Clone)]
pub struct CandidateRow<'a> {
    /// Quantization bucket index
    pub y_bucket: i64,
    /// Quantized vertical position (`y_bucket * bucket_size`)
    pub y: f64,
    /// Members sorted by `x0`
    pub members: Vec<FragmentView<'a>>,
    /// `x0` of each member, in the same order
    pub x_positions: Vec<f64>,
}

impl CandidateRow<'_> {
    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Detect tables among the fragments of one page.
///
/// Returns an error only if a materialized grid breaks rectangularity,
/// which indicates a defect in the grid builder.
pub fn detect_tables(
    page: PageId,
    fragments: &[FragmentView<'_>],
    config: &LayoutConfig,
) -> Result<Vec<Table>> {
    let rows = group_into_rows(fragments, config.row_bucket_size);
    let candidate_count = rows.len();

    let aligned: Vec<CandidateRow<'_>> = rows
        .into_iter()
        .filter(|row| has_regular_spacing(&row.x_positions, config))
        .collect();

    log::debug!(
        "TableDetector: {} candidate rows, {} regularly spaced",
        candidate_count,
        aligned.len()
    );

    let mut tables = Vec::new();
    for table_rows in merge_rows(aligned, config) {
        let table = build_table(page, &table_rows, config);

        debug_assert!(
            table.is_rectangular(),
            "table grid is not rectangular: {:?}",
            table.grid
        );
        if !table.is_rectangular() {
            return Err(Error::InvariantViolation(format!(
                "table on page {} has ragged rows",
                page
            )));
        }

        log::debug!(
            "TableDetector: table {}x{} at ({:.1}, {:.1}), confidence {:.2}",
            table.rows,
            table.cols,
            table.bbox.x0,
            table.bbox.y0,
            table.confidence
        );
        tables.push(table);
    }

    Ok(tables)
}

/// Group fragments into rows by quantized `y0`.
///
/// Only buckets with at least two fragments become rows. Rows are ordered
/// top to bottom and their members left to right.
pub fn group_into_rows<'a>(fragments: &[FragmentView<'a>], bucket_size: f64) -> Vec<CandidateRow<'a>> {
    let mut buckets: BTreeMap<i64, Vec<FragmentView<'a>>> = BTreeMap::new();
    for view in fragments {
        let bucket = (view.bbox().y0 / bucket_size).round() as i64;
        buckets.entry(bucket).or_default().push(*view);
    }

    buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(y_bucket, mut members)| {
            members.sort_by(|a, b| {
                a.bbox()
                    .x0
                    .total_cmp(&b.bbox().x0)
                    .then_with(|| a.id.cmp(&b.id))
            });
            let x_positions = members.iter().map(|v| v.bbox().x0).collect();
            CandidateRow {
                y_bucket,
                y: y_bucket as f64 * bucket_size,
                members,
                x_positions,
            }
        })
        .collect()
}

/// Whether the gaps between consecutive start positions are regular.
///
/// Rows with fewer than two gaps never qualify.
///
/// # Examples
///
/// ```
/// use layout_oxide::config::LayoutConfig;
/// use layout_oxide::layout::table_detector::has_regular_spacing;
///
/// let config = LayoutConfig::default();
/// assert!(has_regular_spacing(&[0.0, 100.0, 200.0], &config));
/// assert!(!has_regular_spacing(&[0.0, 100.0], &config));
/// assert!(!has_regular_spacing(&[0.0, 10.0, 300.0], &config));
/// ```
pub fn has_regular_spacing(x_positions: &[f64], config: &LayoutConfig) -> bool {
    if x_positions.len() < 3 {
        return false;
    }

    let gaps: Vec<f64> = x_positions.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= 0.0 {
        return false;
    }

    let regular = gaps
        .iter()
        .filter(|&&gap| (gap - mean).abs() <= config.spacing_tolerance * mean)
        .count();

    regular as f64 >= config.regular_gap_ratio * gaps.len() as f64
}

/// Whether enough positions of `current` have a match in `reference`.
///
/// A position matches when some reference position lies within
/// `tolerance`; at least `ratio × min(len)` positions must match.
pub fn column_alignment(current: &[f64], reference: &[f64], tolerance: f64, ratio: f64) -> bool {
    let matched = current
        .iter()
        .filter(|&&x| reference.iter().any(|&r| (x - r).abs() <= tolerance))
        .count();

    matched as f64 >= ratio * current.len().min(reference.len()) as f64
}

/// Chain aligned rows into tables of at least two rows.
fn merge_rows<'a>(rows: Vec<CandidateRow<'a>>, config: &LayoutConfig) -> Vec<Vec<CandidateRow<'a>>> {
    let mut tables = Vec::new();
    let mut rows = rows.into_iter();

    let Some(first) = rows.next() else {
        return tables;
    };
    let mut reference = first.x_positions.clone();
    let mut expected_cols = first.len();
    let mut current = vec![first];

    for row in rows {
        let accepted = match current.last() {
            Some(prev) => {
                (row.y - prev.y).abs() < config.max_row_gap
                    && row.len().abs_diff(expected_cols) <= 1
                    && column_alignment(
                        &row.x_positions,
                        &reference,
                        config.alignment_tolerance,
                        config.min_alignment_ratio,
                    )
            },
            None => false,
        };

        if accepted {
            expected_cols = expected_cols.max(row.len());
            current.push(row);
        } else {
            if current.len() >= 2 {
                tables.push(std::mem::take(&mut current));
            } else {
                log::debug!("TableDetector: discarding single-row run at y={:.1}", current[0].y);
            }
            reference = row.x_positions.clone();
            expected_cols = row.len();
            current = vec![row];
        }
    }

    if current.len() >= 2 {
        tables.push(current);
    }

    tables
}

fn build_table(page: PageId, rows: &[CandidateRow<'_>], config: &LayoutConfig) -> Table {
    let cols = rows.iter().map(CandidateRow::len).max().unwrap_or(0);
    let (grid, merged_cells) = build_grid(rows, cols, config);

    let bbox = BBox::enclosing(rows.iter().flat_map(|r| r.members.iter().map(|v| v.bbox())))
        .unwrap_or_else(|| BBox::new(0.0, 0.0, 0.0, 0.0));

    Table {
        page,
        rows: grid.len(),
        cols,
        grid,
        bbox,
        confidence: confidence(rows, config),
        kind: TableKind::AlignedText,
        merged_cells,
        fragments: rows
            .iter()
            .flat_map(|r| r.members.iter().map(|v| v.id))
            .collect(),
    }
}

/// Lay out each row into exactly `cols` cells.
///
/// A cell whose text is longer than `merged_cell_len` (and is not the last
/// in its row) also covers the next slot, which stays empty; the following
/// cells shift right. Text that runs past the last slot is appended to it.
fn build_grid(
    rows: &[CandidateRow<'_>],
    cols: usize,
    config: &LayoutConfig,
) -> (Vec<Vec<String>>, Vec<(usize, usize)>) {
    let mut grid = Vec::with_capacity(rows.len());
    let mut merged_cells = Vec::new();

    for (r, row) in rows.iter().enumerate() {
        let mut cells = vec![String::new(); cols];
        let mut slot = 0;

        for (i, view) in row.members.iter().enumerate() {
            let text = view.trimmed_text();

            if slot >= cols {
                if let Some(last) = cells.last_mut() {
                    if !last.is_empty() {
                        last.push(' ');
                    }
                    last.push_str(text);
                }
                continue;
            }

            cells[slot] = text.to_string();

            let is_last = i + 1 == row.members.len();
            if text.chars().count() > config.merged_cell_len && !is_last && slot + 1 < cols {
                merged_cells.push((r, slot));
                slot += 2;
            } else {
                slot += 1;
            }
        }

        grid.push(cells);
    }

    (grid, merged_cells)
}

fn confidence(rows: &[CandidateRow<'_>], config: &LayoutConfig) -> f64 {
    let mut score = BASE_CONFIDENCE;

    if rows.len() >= 3 {
        score += THREE_ROWS_BONUS;
    }
    if rows.len() >= 5 {
        score += FIVE_ROWS_BONUS;
    }

    if let Some(first) = rows.first() {
        if rows.iter().all(|r| r.len() == first.len()) {
            score += CONSISTENT_COLUMNS_BONUS;
        }

        let aligned = rows.iter().skip(1).all(|r| {
            column_alignment(
                &r.x_positions,
                &first.x_positions,
                config.alignment_tolerance,
                config.min_alignment_ratio,
            )
        });
        if aligned {
            score += ALIGNED_ROWS_BONUS;
        }
    }

    score.min(MAX_CONFIDENCE)
}
