//! Header detection and text-block typing from font-size statistics.
//!
//! Every fragment on a page is compared with the page's average font size.
//! Noticeably larger, short fragments become headers with a level derived
//! from the size ratio, and every fragment receives a block type.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::fragment::{FragmentRef, FragmentView};
use crate::geometry::BBox;

/// Glyphs that mark a list item when they start a fragment.
const BULLET_GLYPHS: [char; 3] = ['•', '-', '*'];

/// A fragment classified as a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Source fragment
    pub fragment: FragmentRef,
    /// Trimmed header text
    pub text: String,
    /// Font size of the fragment
    pub font_size: f64,
    /// Derived level, 1 (largest) to 4
    pub level: u8,
    /// Location on the page
    pub bbox: BBox,
}

/// Typographic role of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Large text (above the absolute header size)
    Header,
    /// Short upper-case or title-case text
    Title,
    /// Text starting with a bullet glyph
    ListItem,
    /// Long running text
    Paragraph,
    /// Anything else
    Text,
}

/// A typed text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Source fragment
    pub fragment: FragmentRef,
    /// Trimmed block text
    pub text: String,
    /// Block type
    pub block_type: BlockType,
    /// Font size of the fragment
    pub font_size: f64,
    /// Location on the page
    pub bbox: BBox,
}

/// Classifier output for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Mean font size used as the header baseline
    pub avg_font_size: f64,
    /// Detected headers, in fragment order
    pub headers: Vec<Header>,
    /// One block per non-empty fragment, in fragment order
    pub text_blocks: Vec<TextBlock>,
}

/// Classify the fragments of one page.
///
/// # Examples
///
/// ```
/// use layout_oxide::config::LayoutConfig;
/// use layout_oxide::fragment::{Fragment, FragmentRef, FragmentView};
/// use layout_oxide::geometry::BBox;
/// use layout_oxide::layout::classifier::classify_elements;
///
/// let title = Fragment::new(1, "Title", BBox::new(0.0, 0.0, 100.0, 20.0), 24.0);
/// let body = Fragment::new(1, "Body text here", BBox::new(0.0, 30.0, 300.0, 45.0), 11.0);
/// let views = [
///     FragmentView::new(FragmentRef(0), &title),
///     FragmentView::new(FragmentRef(1), &body),
/// ];
///
/// let result = classify_elements(&views, &LayoutConfig::default());
/// assert_eq!(result.avg_font_size, 17.5);
/// assert_eq!(result.headers.len(), 1);
/// assert_eq!(result.headers[0].level, 3);
/// ```
pub fn classify_elements(fragments: &[FragmentView<'_>], config: &LayoutConfig) -> Classification {
    let avg_font_size = average_font_size(fragments, config.default_font_size);

    let mut headers = Vec::new();
    let mut text_blocks = Vec::with_capacity(fragments.len());

    for view in fragments {
        let text = view.trimmed_text();
        if text.is_empty() {
            continue;
        }
        let font_size = view.fragment.font_size;

        if is_header(text, font_size, avg_font_size, config) {
            headers.push(Header {
                fragment: view.id,
                text: text.to_string(),
                font_size,
                level: header_level(font_size, avg_font_size),
                bbox: *view.bbox(),
            });
        }

        text_blocks.push(TextBlock {
            fragment: view.id,
            text: text.to_string(),
            block_type: block_type(text, font_size, config),
            font_size,
            bbox: *view.bbox(),
        });
    }

    log::debug!(
        "Classifier: avg font {:.2}, {} headers, {} blocks",
        avg_font_size,
        headers.len(),
        text_blocks.len()
    );

    Classification {
        avg_font_size,
        headers,
        text_blocks,
    }
}

/// Mean font size over fragments that carry a usable size.
pub fn average_font_size(fragments: &[FragmentView<'_>], default: f64) -> f64 {
    let sizes: Vec<f64> = fragments
        .iter()
        .map(|v| v.fragment.font_size)
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();

    if sizes.is_empty() {
        default
    } else {
        sizes.iter().sum::<f64>() / sizes.len() as f64
    }
}

fn is_header(text: &str, font_size: f64, avg_font_size: f64, config: &LayoutConfig) -> bool {
    font_size > avg_font_size * config.header_ratio
        && !text.is_empty()
        && text.chars().count() < config.max_header_len
}

/// Header level from the ratio of a font size to the page average.
///
/// Larger ratios map to smaller (more important) levels.
///
/// # Examples
///
/// ```
/// use layout_oxide::layout::classifier::header_level;
///
/// assert_eq!(header_level(30.0, 10.0), 1);
/// assert_eq!(header_level(16.0, 10.0), 2);
/// assert_eq!(header_level(13.0, 10.0), 3);
/// assert_eq!(header_level(10.0, 10.0), 4);
/// ```
pub fn header_level(font_size: f64, avg_font_size: f64) -> u8 {
    let ratio = font_size / avg_font_size;
    if ratio > 2.0 {
        1
    } else if ratio > 1.5 {
        2
    } else if ratio > 1.2 {
        3
    } else {
        4
    }
}

/// Block type of a trimmed, non-empty text.
pub fn block_type(text: &str, font_size: f64, config: &LayoutConfig) -> BlockType {
    let len = text.chars().count();

    if font_size > config.header_block_font_size {
        BlockType::Header
    } else if len < config.title_max_len && (is_upper(text) || is_title_case(text)) {
        BlockType::Title
    } else if text.starts_with(&BULLET_GLYPHS[..]) {
        BlockType::ListItem
    } else if len > config.paragraph_min_len {
        BlockType::Paragraph
    } else {
        BlockType::Text
    }
}

/// At least one cased character and no lower-case ones.
fn is_upper(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

/// Every word starts upper-case and continues lower-case.
///
/// Upper-case letters may only follow uncased characters and lower-case
/// letters may only follow cased ones.
fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut previous_is_cased = false;

    for c in text.chars() {
        if c.is_uppercase() {
            if previous_is_cased {
                return false;
            }
            previous_is_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_is_cased {
                return false;
            }
            previous_is_cased = true;
            cased = true;
        } else {
            previous_is_cased = false;
        }
    }

    cased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn mock_fragment(text: &str, size: f64) -> Fragment {
        Fragment::new(1, text, BBox::new(0.0, 0.0, 100.0, size), size)
    }

    fn views(fragments: &[Fragment]) -> Vec<FragmentView<'_>> {
        fragments
            .iter()
            .enumerate()
            .map(|(i, f)| FragmentView::new(FragmentRef(i), f))
            .collect()
    }

    #[test]
    fn test_average_font_size() {
        let fragments = vec![mock_fragment("a", 10.0), mock_fragment("b", 14.0)];
        assert_eq!(average_font_size(&views(&fragments), 11.0), 12.0);
    }

    #[test]
    fn test_average_font_size_default() {
        assert_eq!(average_font_size(&[], 11.0), 11.0);

        let fragments = vec![mock_fragment("a", 0.0), mock_fragment("b", f64::NAN)];
        assert_eq!(average_font_size(&views(&fragments), 11.0), 11.0);
    }

    #[test]
    fn test_header_detection() {
        let fragments = vec![
            mock_fragment("Main Title", 30.0),
            mock_fragment("body", 10.0),
            mock_fragment("body", 10.0),
            mock_fragment("body", 10.0),
        ];
        let result = classify_elements(&views(&fragments), &LayoutConfig::default());

        assert_eq!(result.avg_font_size, 15.0);
        assert_eq!(result.headers.len(), 1);
        assert_eq!(result.headers[0].fragment, FragmentRef(0));
        assert_eq!(result.headers[0].text, "Main Title");
        assert_eq!(result.headers[0].level, 2);
    }

    #[test]
    fn test_long_text_not_header() {
        let long = "x".repeat(100);
        let fragments = vec![mock_fragment(&long, 30.0), mock_fragment("body", 10.0)];
        let result = classify_elements(&views(&fragments), &LayoutConfig::default());
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_uniform_sizes_have_no_headers() {
        let fragments = vec![mock_fragment("one", 12.0), mock_fragment("two", 12.0)];
        let result = classify_elements(&views(&fragments), &LayoutConfig::default());
        assert!(result.headers.is_empty());
        assert_eq!(result.text_blocks.len(), 2);
    }

    #[test]
    fn test_empty_text_skipped() {
        let fragments = vec![mock_fragment("   ", 40.0), mock_fragment("body", 10.0)];
        let result = classify_elements(&views(&fragments), &LayoutConfig::default());
        assert!(result.headers.is_empty());
        assert_eq!(result.text_blocks.len(), 1);
        assert_eq!(result.text_blocks[0].fragment, FragmentRef(1));
    }

    #[test]
    fn test_header_levels() {
        assert_eq!(header_level(22.1, 11.0), 1);
        assert_eq!(header_level(22.0, 11.0), 2);
        assert_eq!(header_level(16.6, 11.0), 2);
        assert_eq!(header_level(16.5, 11.0), 3);
        assert_eq!(header_level(13.3, 11.0), 3);
        assert_eq!(header_level(13.0, 11.0), 4);
    }

    #[test]
    fn test_block_types() {
        let config = LayoutConfig::default();
        assert_eq!(block_type("Anything", 16.0, &config), BlockType::Header);
        assert_eq!(block_type("INTRODUCTION", 11.0, &config), BlockType::Title);
        assert_eq!(block_type("Related Work", 11.0, &config), BlockType::Title);
        assert_eq!(block_type("• first point", 11.0, &config), BlockType::ListItem);
        assert_eq!(block_type("- second point", 11.0, &config), BlockType::ListItem);
        assert_eq!(block_type("* third point", 11.0, &config), BlockType::ListItem);
        assert_eq!(block_type(&"word ".repeat(50), 11.0, &config), BlockType::Paragraph);
        assert_eq!(block_type("just some text", 11.0, &config), BlockType::Text);
    }

    #[test]
    fn test_title_requires_short_text() {
        let config = LayoutConfig::default();
        let long_title = "Word ".repeat(12);
        assert_eq!(block_type(long_title.trim(), 11.0, &config), BlockType::Text);
    }

    #[test]
    fn test_case_predicates() {
        assert!(is_upper("ABC 123"));
        assert!(!is_upper("123"));
        assert!(!is_upper("ABc"));

        assert!(is_title_case("Hello World"));
        assert!(is_title_case("Chapter 1: The Start"));
        assert!(!is_title_case("Hello world"));
        assert!(!is_title_case("HeLLo"));
        assert!(!is_title_case("42"));
    }
}
