//! Greedy line breaking and pagination of text blocks.
//!
//! Units are whatever the caller measures in (points for PDF, pixels for the
//! raster). Coordinates are top-down: `top` is the distance from the top edge
//! of the page to the top of the line box.

use crate::layout::blocks::{Block, BlockKind};
use crate::layout::font_metrics::FontFace;

/// Typography applied to every line of one block kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub face: FontFace,
    pub size: f32,
    /// Line box height.
    pub leading: f32,
    /// Extra space above the block, dropped at the top of a page.
    pub space_before: f32,
    /// Horizontal offset of the text from the left margin.
    pub indent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    /// `None` lays everything out on one unbounded page.
    pub height: Option<f32>,
    pub margin_x: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.margin_x).max(0.0)
    }
}

/// One laid-out line, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub kind: BlockKind,
    pub text: String,
    pub face: FontFace,
    pub size: f32,
    pub x: f32,
    pub top: f32,
    /// First line of a bullet: the renderer draws the marker left of `x`.
    pub marker: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidPage {
    pub lines: Vec<PlacedLine>,
    /// Bottom edge of the last line box on the page.
    pub used_height: f32,
}

/// Greedy word wrap at `max_width`. Words wider than a whole line are split
/// between characters. An empty string yields no lines.
pub fn wrap(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let metrics = face.metrics();
    let space_w = metrics.space_width * size;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_w = metrics.measure_at(word, size);

        if word_w > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            for c in word.chars() {
                let c_w = metrics.char_width(c) * size;
                if !current.is_empty() && current_width + c_w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                current.push(c);
                current_width += c_w;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lays `blocks` out top to bottom, starting a new page whenever a line box
/// would cross the bottom margin.
pub fn flow<F>(blocks: &[Block], geometry: &PageGeometry, style_for: F) -> Vec<LaidPage>
where
    F: Fn(BlockKind) -> BlockStyle,
{
    let mut pages = vec![LaidPage::default()];
    let mut y = geometry.margin_top;
    let content_width = geometry.content_width();

    for block in blocks {
        let style = style_for(block.kind);
        let available = (content_width - style.indent).max(style.size);
        let lines = wrap(&block.text, style.face, style.size, available);

        let at_page_top = pages.last().map_or(true, |p| p.lines.is_empty());
        if !at_page_top {
            y += style.space_before;
        }

        for (i, text) in lines.into_iter().enumerate() {
            if let Some(height) = geometry.height {
                let page_has_lines = pages.last().is_some_and(|p| !p.lines.is_empty());
                if page_has_lines && y + style.leading > height - geometry.margin_bottom {
                    pages.push(LaidPage::default());
                    y = geometry.margin_top;
                }
            }

            let x = geometry.margin_x + style.indent;

            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    kind: block.kind,
                    text,
                    face: style.face,
                    size: style.size,
                    x,
                    top: y,
                    marker: block.kind == BlockKind::Bullet && i == 0,
                });
                y += style.leading;
                page.used_height = y;
            }
        }
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_style(_: BlockKind) -> BlockStyle {
        BlockStyle {
            face: FontFace::Bitmap,
            size: 10.0,
            leading: 12.0,
            space_before: 6.0,
            indent: 0.0,
        }
    }

    fn geometry(height: Option<f32>) -> PageGeometry {
        PageGeometry {
            width: 120.0,
            height,
            margin_x: 10.0,
            margin_top: 10.0,
            margin_bottom: 10.0,
        }
    }

    fn para(text: &str) -> Block {
        Block {
            kind: BlockKind::Paragraph,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_wrap_empty_returns_no_lines() {
        assert!(wrap("   ", FontFace::Bitmap, 10.0, 100.0).is_empty());
    }

    #[test]
    fn test_wrap_greedy() {
        // 10 units per char, 100 wide: "aaaa bbbb" is 90, adding " cc" overflows
        let lines = wrap("aaaa bbbb cc", FontFace::Bitmap, 10.0, 100.0);
        assert_eq!(lines, vec!["aaaa bbbb", "cc"]);
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let lines = wrap("abcdefghijkl", FontFace::Bitmap, 10.0, 50.0);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_flow_unbounded_is_single_page() {
        let blocks: Vec<Block> = (0..50).map(|i| para(&format!("line {i}"))).collect();
        let pages = flow(&blocks, &geometry(None), body_style);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines.len(), 50);
    }

    #[test]
    fn test_flow_paginates_at_bottom_margin() {
        // 100 tall page, 80 usable: 12 leading + 6 space_before per block
        let blocks: Vec<Block> = (0..10).map(|i| para(&format!("p{i}"))).collect();
        let pages = flow(&blocks, &geometry(Some(100.0)), body_style);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.used_height <= 90.0 + f32::EPSILON);
            assert_eq!(page.lines[0].top, 10.0);
        }
        let total: usize = pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_bullet_marker_only_on_first_line() {
        let blocks = vec![Block {
            kind: BlockKind::Bullet,
            text: "aaaa bbbb cccc dddd".to_string(),
        }];
        let pages = flow(&blocks, &geometry(None), body_style);
        let markers: Vec<bool> = pages[0].lines.iter().map(|l| l.marker).collect();
        assert_eq!(markers, vec![true, false]);
    }

    #[test]
    fn test_lines_start_at_margin_plus_indent() {
        let indented = |kind| BlockStyle {
            indent: 8.0,
            ..body_style(kind)
        };
        let pages = flow(&[para("short"), para("aaaa bbbb cccc")], &geometry(None), indented);
        assert!(pages[0].lines.iter().all(|l| l.x == 18.0));
    }
}
