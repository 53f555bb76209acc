// Document layout shared by the PDF and image renderers:
// XHTML projection -> blocks -> wrapped, paginated lines.
// Pure CPU work; callers run it inside tokio::task::spawn_blocking.

pub mod blocks;
pub mod flow;
pub mod font_metrics;

pub use blocks::{parse_blocks, Block, BlockKind};
pub use flow::{flow, wrap, BlockStyle, LaidPage, PageGeometry, PlacedLine};
pub use font_metrics::FontFace;
