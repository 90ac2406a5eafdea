//! Reading order determination for layout analysis.
//!
//! A page with at most one column is read top to bottom. A multi-column
//! page is read column by column, left to right, each column top to bottom,
//! with one running order index across the whole page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fragment::{FragmentRef, FragmentView, PageId};
use crate::layout::column_detector::Column;

/// How an entry was ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMode {
    /// Single-column page, ordered top to bottom
    Sequential,
    /// Multi-column page, ordered column by column
    Columnar,
}

/// One position in a page's reading sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingEntry {
    /// Page of the fragment
    pub page: PageId,
    /// Position in the page's reading sequence, starting at 0
    pub order: usize,
    /// Fragment being read
    pub fragment: FragmentRef,
    /// Ordering mode of the page
    pub mode: ReadingMode,
}

/// Determine the reading order of a page from its columns.
///
/// Column members that are not among `fragments` are ignored. Ties in `y0`
/// are broken by fragment index so the order is fully deterministic.
///
/// # Examples
///
/// ```
/// use layout_oxide::fragment::{Fragment, FragmentRef, FragmentView};
/// use layout_oxide::geometry::BBox;
/// use layout_oxide::layout::column_detector::Column;
/// use layout_oxide::layout::reading_order::{determine_reading_order, ReadingMode};
///
/// let body = Fragment::new(1, "Body", BBox::new(0.0, 30.0, 300.0, 45.0), 11.0);
/// let title = Fragment::new(1, "Title", BBox::new(0.0, 0.0, 100.0, 20.0), 24.0);
/// let views = [
///     FragmentView::new(FragmentRef(0), &body),
///     FragmentView::new(FragmentRef(1), &title),
/// ];
/// let columns = vec![Column {
///     x_start: 0.0,
///     x_end: 300.0,
///     members: vec![FragmentRef(0), FragmentRef(1)],
/// }];
///
/// let order = determine_reading_order(1, &columns, &views);
/// assert_eq!(order[0].fragment, FragmentRef(1));
/// assert_eq!(order[1].order, 1);
/// assert_eq!(order[1].mode, ReadingMode::Sequential);
/// ```
pub fn determine_reading_order(
    page: PageId,
    columns: &[Column],
    fragments: &[FragmentView<'_>],
) -> Vec<ReadingEntry> {
    let tops: HashMap<FragmentRef, f64> = fragments.iter().map(|v| (v.id, v.bbox().y0)).collect();

    let sort_top_down = |members: &mut Vec<(FragmentRef, f64)>| {
        members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    };
    let resolve = |column: &Column| -> Vec<(FragmentRef, f64)> {
        column
            .members
            .iter()
            .filter_map(|id| tops.get(id).map(|&y0| (*id, y0)))
            .collect()
    };

    if columns.len() <= 1 {
        let mut members: Vec<(FragmentRef, f64)> = columns.iter().flat_map(resolve).collect();
        sort_top_down(&mut members);

        return members
            .into_iter()
            .enumerate()
            .map(|(order, (fragment, _))| ReadingEntry {
                page,
                order,
                fragment,
                mode: ReadingMode::Sequential,
            })
            .collect();
    }

    let mut entries = Vec::with_capacity(fragments.len());
    for column in columns {
        let mut members = resolve(column);
        sort_top_down(&mut members);

        for (fragment, _) in members {
            entries.push(ReadingEntry {
                page,
                order: entries.len(),
                fragment,
                mode: ReadingMode::Columnar,
            });
        }
    }

    log::debug!(
        "Reading order: page {} has {} entries across {} columns",
        page,
        entries.len(),
        columns.len()
    );

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;
    use crate::geometry::BBox;

    fn mock_fragment(x: f64, y: f64) -> Fragment {
        Fragment::new(1, "text", BBox::new(x, y, x + 50.0, y + 10.0), 11.0)
    }

    fn views(fragments: &[Fragment]) -> Vec<FragmentView<'_>> {
        fragments
            .iter()
            .enumerate()
            .map(|(i, f)| FragmentView::new(FragmentRef(i), f))
            .collect()
    }

    fn column(x_start: f64, members: &[usize]) -> Column {
        Column {
            x_start,
            x_end: x_start + 50.0,
            members: members.iter().map(|&i| FragmentRef(i)).collect(),
        }
    }

    fn order_of(entries: &[ReadingEntry]) -> Vec<usize> {
        entries.iter().map(|e| e.fragment.index()).collect()
    }

    #[test]
    fn test_single_column_top_down() {
        let fragments = vec![
            mock_fragment(0.0, 200.0),
            mock_fragment(0.0, 10.0),
            mock_fragment(0.0, 100.0),
        ];
        let entries = determine_reading_order(1, &[column(0.0, &[0, 1, 2])], &views(&fragments));

        assert_eq!(order_of(&entries), vec![1, 2, 0]);
        assert!(entries.iter().all(|e| e.mode == ReadingMode::Sequential));
        assert_eq!(
            entries.iter().map(|e| e.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_ties_broken_by_index() {
        let fragments = vec![mock_fragment(100.0, 10.0), mock_fragment(0.0, 10.0)];
        let entries = determine_reading_order(1, &[column(0.0, &[1, 0])], &views(&fragments));
        assert_eq!(order_of(&entries), vec![0, 1]);
    }

    #[test]
    fn test_columns_left_to_right() {
        let fragments = vec![
            mock_fragment(0.0, 0.0),
            mock_fragment(400.0, 0.0),
            mock_fragment(0.0, 20.0),
            mock_fragment(400.0, 20.0),
        ];
        let columns = vec![column(0.0, &[0, 2]), column(400.0, &[1, 3])];
        let entries = determine_reading_order(2, &columns, &views(&fragments));

        assert_eq!(order_of(&entries), vec![0, 2, 1, 3]);
        assert!(entries.iter().all(|e| e.mode == ReadingMode::Columnar));
        assert!(entries.iter().all(|e| e.page == 2));
        assert_eq!(entries[3].order, 3);
    }

    #[test]
    fn test_no_columns() {
        assert!(determine_reading_order(1, &[], &[]).is_empty());
    }

    #[test]
    fn test_unknown_members_ignored() {
        let fragments = vec![mock_fragment(0.0, 0.0)];
        let entries = determine_reading_order(1, &[column(0.0, &[0, 7])], &views(&fragments));
        assert_eq!(order_of(&entries), vec![0]);
    }
}
