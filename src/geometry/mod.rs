//! Geometric primitives for layout analysis.
//!
//! This module provides the bounding-box type and the center/distance
//! computations used throughout the layout reconstruction algorithms.
//!
//! Coordinates follow the extractor convention: the origin is the top-left
//! corner of the page and `y` grows downward, so a smaller `y0` is higher
//! on the page.

use serde::{Deserialize, Serialize};

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub y0: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub y1: f64,
}

impl BBox {
    /// Create a bounding box from its corner coordinates.
    ///
    /// No normalisation is applied; use [`BBox::is_valid`] to check the
    /// `x1 >= x0 && y1 >= y0` invariant.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::BBox;
    ///
    /// let bbox = BBox::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(bbox.width(), 100.0);
    /// assert_eq!(bbox.height(), 50.0);
    /// ```
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whether every coordinate is finite and the corners are ordered.
    ///
    /// Degenerate boxes are skipped by the analysis rather than rejected.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 >= self.x0
            && self.y1 >= self.y0
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Get the center point of the box.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::BBox;
    ///
    /// let center = BBox::new(0.0, 0.0, 100.0, 50.0).center();
    /// assert_eq!(center.x, 50.0);
    /// assert_eq!(center.y, 25.0);
    /// ```
    pub fn center(&self) -> Point {
        Point {
            x: (self.x0 + self.x1) / 2.0,
            y: (self.y0 + self.y1) / 2.0,
        }
    }

    /// Compute the union of this box with another.
    ///
    /// Returns the smallest box that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::BBox;
    ///
    /// let a = BBox::new(0.0, 0.0, 50.0, 50.0);
    /// let b = BBox::new(25.0, 25.0, 75.0, 75.0);
    /// assert_eq!(a.union(&b), BBox::new(0.0, 0.0, 75.0, 75.0));
    /// ```
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Smallest box enclosing every box in the iterator, or `None` when empty.
    pub fn enclosing<'a, I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BBox>, b| match acc {
                Some(a) => Some(a.union(b)),
                None => Some(*b),
            })
    }
}

/// Center of a bounding box as an `(cx, cy)` pair.
pub fn center(bbox: &BBox) -> (f64, f64) {
    let c = bbox.center();
    (c.x, c.y)
}

/// Euclidean distance between the centers of two bounding boxes.
///
/// # Examples
///
/// ```
/// use layout_oxide::geometry::{distance, BBox};
///
/// let a = BBox::new(0.0, 0.0, 2.0, 2.0);
/// let b = BBox::new(3.0, 4.0, 5.0, 6.0);
/// assert_eq!(distance(&a, &b), 5.0);
/// ```
pub fn distance(a: &BBox, b: &BBox) -> f64 {
    euclidean_distance(&a.center(), &b.center())
}

/// Compute the Euclidean distance between two points.
pub fn euclidean_distance(p1: &Point, p2: &Point) -> f64 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}
