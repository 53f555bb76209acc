//! PDF output: HTML projection -> blocks -> paginated lines -> printpdf.
//!
//! Everything printpdf-specific (builtin fonts, millimetre conversion,
//! bottom-up coordinates, text encoding) stays in this module.

use std::sync::Arc;

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, Pt, Rgb};
use tracing::debug;

use crate::layout::{flow, parse_blocks, BlockKind, BlockStyle, FontFace, LaidPage, PageGeometry};
use crate::render::html::HtmlRenderer;
use crate::render::theme::{Palette, Rgb8, ThemeAssets};
use crate::render::{LimitExceeded, OutputFormat, RenderFailure, Renderer};
use crate::resume::ResumeRecord;

// US Letter, points
pub const PAGE_WIDTH_PT: f32 = 612.0;
pub const PAGE_HEIGHT_PT: f32 = 792.0;
pub const MARGIN_X_PT: f32 = 54.0;
pub const MARGIN_Y_PT: f32 = 50.0;

pub const MAX_PAGES: usize = 8;

/// Distance from the top of a line box to the baseline, in ems.
const ASCENT: f32 = 0.8;
const BULLET_INDENT_PT: f32 = 12.0;

const GEOMETRY: PageGeometry = PageGeometry {
    width: PAGE_WIDTH_PT,
    height: Some(PAGE_HEIGHT_PT),
    margin_x: MARGIN_X_PT,
    margin_top: MARGIN_Y_PT,
    margin_bottom: MARGIN_Y_PT,
};

fn block_style(body: FontFace, kind: BlockKind) -> BlockStyle {
    let style = |face: FontFace, size: f32, leading: f32, space_before: f32| BlockStyle {
        face,
        size,
        leading,
        space_before,
        indent: 0.0,
    };
    match kind {
        BlockKind::Title => style(body.bold(), 22.0, 28.0, 0.0),
        BlockKind::Role => style(body, 13.0, 18.0, 0.0),
        BlockKind::Contact => style(body, 9.5, 13.0, 2.0),
        BlockKind::Heading => style(body.bold(), 12.0, 17.0, 12.0),
        BlockKind::Paragraph => style(body, 10.5, 14.0, 2.0),
        BlockKind::Bullet => BlockStyle {
            indent: BULLET_INDENT_PT,
            ..style(body, 10.5, 14.0, 1.0)
        },
    }
}

fn color_for(palette: &Palette, kind: BlockKind) -> Rgb8 {
    match kind {
        BlockKind::Role | BlockKind::Heading => palette.accent,
        BlockKind::Contact => palette.muted,
        _ => palette.ink,
    }
}

fn fill(color: Rgb8) -> Color {
    let (r, g, b) = color.unit();
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// The builtin fonts only cover Latin-1; anything else is drawn as `?`.
fn encodable(text: &str) -> String {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c,
            _ => '?',
        })
        .collect()
}

fn builtin(face: FontFace) -> BuiltinFont {
    match face {
        FontFace::Times => BuiltinFont::TimesRoman,
        FontFace::TimesBold => BuiltinFont::TimesBold,
        FontFace::HelveticaBold => BuiltinFont::HelveticaBold,
        FontFace::Helvetica | FontFace::Bitmap => BuiltinFont::Helvetica,
    }
}

pub struct PdfRenderer {
    html: Arc<HtmlRenderer>,
    themes: Arc<ThemeAssets>,
}

impl PdfRenderer {
    pub fn new(html: Arc<HtmlRenderer>, themes: Arc<ThemeAssets>) -> Self {
        Self { html, themes }
    }

    /// Paginated lines for `record`, before any PDF objects are created.
    pub fn layout(&self, record: &ResumeRecord) -> Result<Vec<LaidPage>, RenderFailure> {
        let html = self.html.render_html(record);
        let blocks =
            parse_blocks(&html).map_err(|e| RenderFailure::from_engine(OutputFormat::Pdf, e))?;
        let body = self.themes.palette(record.theme()).body_face();
        let pages = flow(&blocks, &GEOMETRY, |kind| block_style(body, kind));

        if pages.len() > MAX_PAGES {
            return Err(RenderFailure::from_engine(
                OutputFormat::Pdf,
                LimitExceeded {
                    what: "page",
                    actual: pages.len(),
                    limit: MAX_PAGES,
                },
            ));
        }
        Ok(pages)
    }

    pub fn render_pdf(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        let pages = self.layout(record)?;
        let palette = self.themes.palette(record.theme());
        let engine = |e: printpdf::Error| RenderFailure::from_engine(OutputFormat::Pdf, e);

        let (doc, first_page, first_layer) = PdfDocument::new(
            record.name(),
            Mm::from(Pt(PAGE_WIDTH_PT)),
            Mm::from(Pt(PAGE_HEIGHT_PT)),
            "Page 1",
        );

        let regular_face = palette.body_face();
        let regular = doc.add_builtin_font(builtin(regular_face)).map_err(engine)?;
        let bold = doc
            .add_builtin_font(builtin(regular_face.bold()))
            .map_err(engine)?;

        for (i, page) in pages.iter().enumerate() {
            let (page_index, layer_index) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(
                    Mm::from(Pt(PAGE_WIDTH_PT)),
                    Mm::from(Pt(PAGE_HEIGHT_PT)),
                    format!("Page {}", i + 1),
                )
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);

            for line in &page.lines {
                let font: &IndirectFontRef = if line.face.is_bold() { &bold } else { &regular };
                let baseline = PAGE_HEIGHT_PT - line.top - line.size * ASCENT;
                layer.set_fill_color(fill(color_for(&palette, line.kind)));
                layer.use_text(
                    encodable(&line.text),
                    line.size,
                    Mm::from(Pt(line.x)),
                    Mm::from(Pt(baseline)),
                    font,
                );
                if line.marker {
                    layer.set_fill_color(fill(palette.accent));
                    layer.use_text(
                        "-",
                        line.size,
                        Mm::from(Pt(line.x - BULLET_INDENT_PT + 2.0)),
                        Mm::from(Pt(baseline)),
                        font,
                    );
                }
            }
        }

        let bytes = doc.save_to_bytes().map_err(engine)?;
        debug!(pages = pages.len(), bytes = bytes.len(), "PDF rendered");
        Ok(bytes)
    }
}

impl Renderer for PdfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        self.render_pdf(record)
    }
}
