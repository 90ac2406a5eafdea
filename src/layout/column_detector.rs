//! Column detection by deterministic 1-D partitioning of start positions.
//!
//! The distinct left edges (`x0`) of a page's fragments are split into at
//! most `max_columns` contiguous groups with a k-means iteration whose
//! centroids are seeded at evenly spaced quantiles. No randomness is
//! involved, so the same page always yields the same columns.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::fragment::{FragmentRef, FragmentView};
use crate::geometry::BBox;

/// A vertical reading column on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Left edge of the band
    pub x_start: f64,
    /// Right edge of the band
    pub x_end: f64,
    /// Fragments assigned to the column, in input order
    pub members: Vec<FragmentRef>,
}

/// Partition a page's fragments into column bands.
///
/// Columns are returned left to right and are never empty. A page whose
/// fragments share a single start position yields one column spanning
/// `page_bounds`; an empty page yields no columns.
///
/// # Examples
///
/// ```
/// use layout_oxide::config::LayoutConfig;
/// use layout_oxide::fragment::{Fragment, FragmentRef, FragmentView};
/// use layout_oxide::geometry::BBox;
/// use layout_oxide::layout::column_detector::partition_columns;
///
/// let fragments = vec![
///     Fragment::new(1, "left", BBox::new(0.0, 0.0, 200.0, 10.0), 11.0),
///     Fragment::new(1, "right", BBox::new(400.0, 0.0, 600.0, 10.0), 11.0),
/// ];
/// let views: Vec<_> = fragments
///     .iter()
///     .enumerate()
///     .map(|(i, f)| FragmentView::new(FragmentRef(i), f))
///     .collect();
///
/// let bounds = BBox::new(0.0, 0.0, 600.0, 10.0);
/// let columns = partition_columns(&views, &bounds, &LayoutConfig::default());
/// assert_eq!(columns.len(), 2);
/// assert_eq!(columns[1].members, vec![FragmentRef(1)]);
/// ```
pub fn partition_columns(
    fragments: &[FragmentView<'_>],
    page_bounds: &BBox,
    config: &LayoutConfig,
) -> Vec<Column> {
    if fragments.is_empty() {
        return vec![];
    }

    // Adding 0.0 turns -0.0 into 0.0 so both land on one start position
    let mut starts: Vec<(f64, &FragmentView<'_>)> =
        fragments.iter().map(|v| (v.bbox().x0 + 0.0, v)).collect();
    starts.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    // Index into `distinct` of each entry of `starts`
    let mut distinct: Vec<f64> = Vec::new();
    let mut slots: Vec<usize> = Vec::with_capacity(starts.len());
    for &(x0, _) in &starts {
        if distinct.last().map_or(true, |last| last.total_cmp(&x0).is_ne()) {
            distinct.push(x0);
        }
        slots.push(distinct.len() - 1);
    }

    if distinct.len() < 2 {
        log::debug!("Columns: single start position, using one full-width column");
        return vec![Column {
            x_start: page_bounds.x0,
            x_end: page_bounds.x1,
            members: fragments.iter().map(|v| v.id).collect(),
        }];
    }

    let k = config.max_columns.min(distinct.len()).max(1);
    let labels = quantile_kmeans(&distinct, k, config.max_cluster_iterations);
    let labels = merge_close_groups(&distinct, &labels, config.min_column_gap);
    let group_count = labels.last().map_or(0, |&l| l + 1);

    let mut groups: Vec<Vec<&FragmentView<'_>>> = vec![Vec::new(); group_count];
    for (&(_, view), &slot) in starts.iter().zip(&slots) {
        groups[labels[slot]].push(view);
    }

    let mut columns: Vec<Column> = groups
        .into_iter()
        .filter(|members| !members.is_empty())
        .map(|mut members| {
            members.sort_by_key(|v| v.id);
            members
        })
        .map(|members| Column {
            x_start: members
                .iter()
                .map(|v| v.bbox().x0)
                .fold(f64::INFINITY, f64::min),
            x_end: members
                .iter()
                .map(|v| v.bbox().x1)
                .fold(f64::NEG_INFINITY, f64::max),
            members: members.iter().map(|v| v.id).collect(),
        })
        .collect();

    columns.sort_by(|a, b| a.x_start.total_cmp(&b.x_start));

    log::debug!(
        "Columns: {} distinct starts, k={}, {} columns",
        distinct.len(),
        k,
        columns.len()
    );
    for (i, col) in columns.iter().enumerate() {
        log::debug!(
            "  Column {}: x=[{:.1}, {:.1}], {} members",
            i,
            col.x_start,
            col.x_end,
            col.members.len()
        );
    }

    columns
}

/// Cluster sorted distinct values into at most `k` contiguous groups.
///
/// Returns one dense group label per value; labels are non-decreasing
/// along `values` and groups left empty by the iteration are dropped.
fn quantile_kmeans(values: &[f64], k: usize, max_iterations: usize) -> Vec<usize> {
    let n = values.len();
    if n == 0 || k == 0 {
        return vec![0; n];
    }

    let mut centroids: Vec<f64> = if k == 1 {
        vec![values[(n - 1) / 2]]
    } else {
        (0..k).map(|i| values[i * (n - 1) / (k - 1)]).collect()
    };

    let mut labels: Vec<usize> = Vec::new();
    for iteration in 0..max_iterations {
        let assignment: Vec<usize> = values.iter().map(|&v| nearest(&centroids, v)).collect();
        if assignment == labels {
            log::debug!("Column partition converged after {} iterations", iteration);
            break;
        }
        labels = assignment;

        for (g, centroid) in centroids.iter_mut().enumerate() {
            let (sum, count) = values
                .iter()
                .zip(&labels)
                .filter(|(_, &l)| l == g)
                .fold((0.0, 0usize), |(s, c), (&v, _)| (s + v, c + 1));
            if count > 0 {
                *centroid = sum / count as f64;
            }
        }
    }

    compact_labels(&labels)
}

/// Index of the closest centroid; ties go to the lower index.
fn nearest(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let dist = (value - c).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Renumber labels densely in order of first appearance.
fn compact_labels(labels: &[usize]) -> Vec<usize> {
    let mut mapping: Vec<(usize, usize)> = Vec::new();
    labels
        .iter()
        .map(|&label| match mapping.iter().find(|(old, _)| *old == label) {
            Some(&(_, new)) => new,
            None => {
                let new = mapping.len();
                mapping.push((label, new));
                new
            },
        })
        .collect()
}

/// Merge neighbouring groups whose start positions are closer than `min_gap`.
fn merge_close_groups(values: &[f64], labels: &[usize], min_gap: f64) -> Vec<usize> {
    let mut merged = Vec::with_capacity(labels.len());
    let mut current = 0;

    for i in 0..labels.len() {
        if i > 0 && labels[i] != labels[i - 1] {
            // values[i - 1] is the last start of the previous group
            if values[i] - values[i - 1] >= min_gap {
                current += 1;
            } else {
                log::debug!(
                    "Columns: merging bands split at x={:.1} (gap {:.1} < {:.1})",
                    values[i],
                    values[i] - values[i - 1],
                    min_gap
                );
            }
        }
        merged.push(current);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn mock_fragment(x0: f64, y0: f64) -> Fragment {
        Fragment::new(1, "text", BBox::new(x0, y0, x0 + 80.0, y0 + 10.0), 11.0)
    }

    fn views(fragments: &[Fragment]) -> Vec<FragmentView<'_>> {
        fragments
            .iter()
            .enumerate()
            .map(|(i, f)| FragmentView::new(FragmentRef(i), f))
            .collect()
    }

    fn page() -> BBox {
        BBox::new(0.0, 0.0, 612.0, 792.0)
    }

    #[test]
    fn test_empty_page_has_no_columns() {
        let columns = partition_columns(&[], &page(), &LayoutConfig::default());
        assert!(columns.is_empty());
    }

    #[test]
    fn test_single_start_spans_page() {
        let fragments = vec![mock_fragment(50.0, 0.0), mock_fragment(50.0, 20.0)];
        let columns = partition_columns(&views(&fragments), &page(), &LayoutConfig::default());

        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].x_start, 0.0);
        assert_eq!(columns[0].x_end, 612.0);
        assert_eq!(columns[0].members, vec![FragmentRef(0), FragmentRef(1)]);
    }

    #[test]
    fn test_two_clusters() {
        let fragments = vec![
            mock_fragment(0.0, 0.0),
            mock_fragment(400.0, 0.0),
            mock_fragment(2.0, 20.0),
            mock_fragment(402.0, 20.0),
            mock_fragment(0.0, 40.0),
        ];
        let columns = partition_columns(&views(&fragments), &page(), &LayoutConfig::default());

        assert_eq!(columns.len(), 2);
        assert_eq!(
            columns[0].members,
            vec![FragmentRef(0), FragmentRef(2), FragmentRef(4)]
        );
        assert_eq!(columns[1].members, vec![FragmentRef(1), FragmentRef(3)]);
        assert_eq!(columns[0].x_start, 0.0);
        assert_eq!(columns[0].x_end, 82.0);
        assert_eq!(columns[1].x_start, 400.0);
        assert_eq!(columns[1].x_end, 482.0);
    }

    #[test]
    fn test_three_columns_max() {
        let fragments: Vec<Fragment> = [0.0, 100.0, 200.0, 300.0, 400.0]
            .iter()
            .map(|&x| mock_fragment(x, 0.0))
            .collect();
        let columns = partition_columns(&views(&fragments), &page(), &LayoutConfig::default());

        assert_eq!(columns.len(), 3);
        let total: usize = columns.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, 5);
        assert!(columns.windows(2).all(|w| w[0].x_start < w[1].x_start));
        assert!(columns.iter().all(|c| !c.members.is_empty()));
    }

    #[test]
    fn test_close_starts_merge() {
        // Indented paragraphs within one column
        let fragments = vec![
            mock_fragment(72.0, 0.0),
            mock_fragment(90.0, 20.0),
            mock_fragment(72.0, 40.0),
            mock_fragment(100.0, 60.0),
        ];
        let columns = partition_columns(&views(&fragments), &page(), &LayoutConfig::default());
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].members.len(), 4);
    }

    #[test]
    fn test_signed_zero_starts_share_a_column() {
        let fragments = vec![
            mock_fragment(-0.0, 0.0),
            mock_fragment(0.0, 20.0),
            mock_fragment(400.0, 0.0),
            mock_fragment(400.0, 20.0),
        ];
        let columns = partition_columns(&views(&fragments), &page(), &LayoutConfig::default());

        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].members, vec![FragmentRef(0), FragmentRef(1)]);
        assert_eq!(columns[0].x_end, 80.0);
        assert_eq!(columns[1].members, vec![FragmentRef(2), FragmentRef(3)]);
        assert_eq!(columns[1].x_start, 400.0);
    }

    #[test]
    fn test_members_in_input_order() {
        let fragments = vec![
            mock_fragment(30.0, 0.0),
            mock_fragment(400.0, 0.0),
            mock_fragment(0.0, 20.0),
            mock_fragment(10.0, 40.0),
        ];
        let columns = partition_columns(&views(&fragments), &page(), &LayoutConfig::default());

        assert_eq!(columns.len(), 2);
        assert_eq!(
            columns[0].members,
            vec![FragmentRef(0), FragmentRef(2), FragmentRef(3)]
        );
    }

    #[test]
    fn test_deterministic() {
        let fragments: Vec<Fragment> = (0..30)
            .map(|i| mock_fragment((i * 37 % 500) as f64, i as f64 * 12.0))
            .collect();
        let v = views(&fragments);
        let first = partition_columns(&v, &page(), &LayoutConfig::default());
        let second = partition_columns(&v, &page(), &LayoutConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_quantile_kmeans_seeds() {
        let labels = quantile_kmeans(&[0.0, 2.0, 400.0, 402.0], 3, 50);
        assert_eq!(labels, vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_quantile_kmeans_single_group() {
        let labels = quantile_kmeans(&[1.0, 5.0, 9.0], 1, 50);
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_compact_labels() {
        assert_eq!(compact_labels(&[0, 0, 2, 2, 3]), vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn test_merge_close_groups() {
        let values = [0.0, 2.0, 400.0, 402.0];
        assert_eq!(merge_close_groups(&values, &[0, 1, 2, 2], 50.0), vec![0, 0, 1, 1]);
        assert_eq!(merge_close_groups(&values, &[0, 1, 2, 2], 1.0), vec![0, 1, 2, 2]);
    }
}
