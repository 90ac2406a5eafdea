#![warn(missing_docs)]

//! # Layout Oxide
//!
//! Layout reconstruction for paginated documents. Given the positioned text
//! fragments an extractor pulls out of a page, it rebuilds the structure a
//! renderer needs to reproduce the original reading experience.
//!
//! ## Core Features
//!
//! - **Headers**: font-size statistics classify headers (levels 1-4) and type
//!   every block as header, title, list item, paragraph, or text
//! - **Columns**: deterministic quantile-seeded partitioning of left edges
//! - **Tables**: aligned rows chained into rectangular grids with a
//!   confidence score
//! - **Spatial relationships**: every fragment pair classified by center
//!   alignment and relative position
//! - **Reading order**: top-down for single-column pages, column by column
//!   otherwise
//! - **Parallel pages**: pages are analyzed on the rayon thread pool with
//!   output identical to a sequential run
//!
//! Analysis is total: malformed fragments, empty pages, and failing pages
//! are degraded and recorded as diagnostics instead of aborting the call.
//!
//! ## Quick Start
//!
//! ```
//! use layout_oxide::fragment::fragments_from_json;
//!
//! let json = r#"[
//!     {"page": 1, "text": "Title", "bbox": {"x0": 0, "y0": 0, "x1": 100, "y1": 20}, "font_size": 24},
//!     {"page": 1, "text": "Body text here", "bbox": {"x0": 0, "y0": 30, "x1": 300, "y1": 45}}
//! ]"#;
//!
//! let ingested = fragments_from_json(json)?;
//! let layout = layout_oxide::analyze(&ingested.fragments);
//!
//! assert_eq!(layout.pages[&1].headers[0].text, "Title");
//! assert_eq!(layout.reading_order.len(), 2);
//! println!("{}", layout.to_json_pretty()?);
//! # Ok::<(), layout_oxide::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod layout;

pub use config::LayoutConfig;
pub use error::{Error, Result};
pub use fragment::{Fragment, FragmentRef, PageId};
pub use geometry::BBox;
pub use layout::{analyze, DocumentLayout, LayoutAnalyzer, PageLayout};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
