//! Pairwise spatial relationships between fragments on a page.
//!
//! Every unordered pair is compared by the centers of its bounding boxes.
//! Alignment on one axis wins over a relative position, and a vertical
//! relation wins over a horizontal one.

use serde::{Deserialize, Serialize};

use crate::fragment::{FragmentRef, FragmentView};
use crate::geometry::{distance, BBox};

/// How two fragments are placed relative to each other.
///
/// The relation reads from `a` to `b`: `Above` means `a` sits above `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Centers on the same horizontal line
    HAligned,
    /// Centers on the same vertical line
    VAligned,
    /// `a` is higher on the page
    Above,
    /// `a` is lower on the page
    Below,
    /// Same height, `a` further left
    LeftOf,
    /// Same height, `a` further right
    RightOf,
}

/// A classified pair of fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Lower-indexed fragment
    pub a: FragmentRef,
    /// Higher-indexed fragment
    pub b: FragmentRef,
    /// Relation from `a` to `b`
    pub kind: RelationshipKind,
    /// Distance between the two centers
    pub distance: f64,
}

/// Classify the relation of `a` to `b` from their centers.
///
/// Returns `None` when the centers are within `tolerance` on both axes.
///
/// # Examples
///
/// ```
/// use layout_oxide::geometry::BBox;
/// use layout_oxide::layout::spatial::{classify_pair, RelationshipKind};
///
/// let a = BBox::new(0.0, 0.0, 10.0, 10.0);
/// let b = BBox::new(50.0, 2.0, 60.0, 12.0);
/// assert_eq!(classify_pair(&a, &b, 5.0), Some(RelationshipKind::HAligned));
/// ```
pub fn classify_pair(a: &BBox, b: &BBox, tolerance: f64) -> Option<RelationshipKind> {
    let ca = a.center();
    let cb = b.center();
    let dx = (cb.x - ca.x).abs();
    let dy = (cb.y - ca.y).abs();

    if dx < tolerance && dy < tolerance {
        None
    } else if dy < tolerance {
        Some(RelationshipKind::HAligned)
    } else if dx < tolerance {
        Some(RelationshipKind::VAligned)
    } else if ca.y < cb.y {
        Some(RelationshipKind::Above)
    } else if ca.y > cb.y {
        Some(RelationshipKind::Below)
    } else if ca.x < cb.x {
        Some(RelationshipKind::LeftOf)
    } else if ca.x > cb.x {
        Some(RelationshipKind::RightOf)
    } else {
        // Coincident centers with a zero tolerance
        None
    }
}

/// Classify every unordered pair of fragments.
///
/// Each pair appears at most once with `a < b`. The output is ordered by
/// `(a, b)` when the input is ordered by fragment index.
pub fn build_relationships(fragments: &[FragmentView<'_>], tolerance: f64) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for (i, first) in fragments.iter().enumerate() {
        for second in &fragments[i + 1..] {
            let (a, b) = if first.id <= second.id {
                (first, second)
            } else {
                (second, first)
            };
            if a.id == b.id {
                continue;
            }

            if let Some(kind) = classify_pair(a.bbox(), b.bbox(), tolerance) {
                relationships.push(Relationship {
                    a: a.id,
                    b: b.id,
                    kind,
                    distance: distance(a.bbox(), b.bbox()),
                });
            }
        }
    }

    log::debug!(
        "Spatial: {} relationships among {} fragments",
        relationships.len(),
        fragments.len()
    );

    relationships
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn mock_fragment(cx: f64, cy: f64) -> Fragment {
        Fragment::new(1, "t", BBox::new(cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0), 11.0)
    }

    fn views(fragments: &[Fragment]) -> Vec<FragmentView<'_>> {
        fragments
            .iter()
            .enumerate()
            .map(|(i, f)| FragmentView::new(FragmentRef(i), f))
            .collect()
    }

    #[test]
    fn test_horizontal_alignment_wins() {
        let a = mock_fragment(0.0, 0.0);
        let b = mock_fragment(50.0, 2.0);
        assert_eq!(
            classify_pair(&a.bbox, &b.bbox, 5.0),
            Some(RelationshipKind::HAligned)
        );
    }

    #[test]
    fn test_vertical_alignment() {
        let a = mock_fragment(100.0, 0.0);
        let b = mock_fragment(103.0, 80.0);
        assert_eq!(
            classify_pair(&a.bbox, &b.bbox, 5.0),
            Some(RelationshipKind::VAligned)
        );
    }

    #[test]
    fn test_vertical_relation_precedes_horizontal() {
        let a = mock_fragment(0.0, 0.0);
        let b = mock_fragment(300.0, 40.0);
        assert_eq!(classify_pair(&a.bbox, &b.bbox, 5.0), Some(RelationshipKind::Above));
        assert_eq!(classify_pair(&b.bbox, &a.bbox, 5.0), Some(RelationshipKind::Below));
    }

    #[test]
    fn test_left_right_with_zero_tolerance() {
        let a = mock_fragment(0.0, 10.0);
        let b = mock_fragment(30.0, 10.0);
        assert_eq!(classify_pair(&a.bbox, &b.bbox, 0.0), Some(RelationshipKind::LeftOf));
        assert_eq!(classify_pair(&b.bbox, &a.bbox, 0.0), Some(RelationshipKind::RightOf));
        assert_eq!(classify_pair(&a.bbox, &a.bbox, 0.0), None);
    }

    #[test]
    fn test_overlapping_centers_unrelated() {
        let a = mock_fragment(10.0, 10.0);
        let b = mock_fragment(12.0, 13.0);
        assert_eq!(classify_pair(&a.bbox, &b.bbox, 5.0), None);
    }

    #[test]
    fn test_build_relationships() {
        let fragments = vec![
            mock_fragment(0.0, 0.0),
            mock_fragment(50.0, 2.0),
            mock_fragment(1.0, 1.0),
            mock_fragment(0.0, 100.0),
        ];
        let relationships = build_relationships(&views(&fragments), 5.0);

        // (0, 2) overlap on both axes
        assert_eq!(relationships.len(), 5);
        assert!(relationships.iter().all(|r| r.a < r.b));

        let first = &relationships[0];
        assert_eq!((first.a, first.b), (FragmentRef(0), FragmentRef(1)));
        assert_eq!(first.kind, RelationshipKind::HAligned);
        assert!((first.distance - (50.0f64.powi(2) + 4.0).sqrt()).abs() < 1e-9);

        let vertical = relationships
            .iter()
            .find(|r| r.a == FragmentRef(0) && r.b == FragmentRef(3))
            .unwrap();
        assert_eq!(vertical.kind, RelationshipKind::VAligned);
        assert_eq!(vertical.distance, 100.0);
    }

    #[test]
    fn test_pairs_normalized_by_index() {
        let fragments = vec![mock_fragment(0.0, 0.0), mock_fragment(0.0, 50.0)];
        let mut v = views(&fragments);
        v.reverse();

        let relationships = build_relationships(&v, 5.0);
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].a, FragmentRef(0));
        assert_eq!(relationships[0].b, FragmentRef(1));
        assert_eq!(relationships[0].kind, RelationshipKind::VAligned);
    }

    #[test]
    fn test_fewer_than_two_fragments() {
        assert!(build_relationships(&[], 5.0).is_empty());
        let single = vec![mock_fragment(0.0, 0.0)];
        assert!(build_relationships(&views(&single), 5.0).is_empty());
    }
}
