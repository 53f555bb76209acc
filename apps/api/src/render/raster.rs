//! JPEG output: HTML projection -> blocks -> one tall page of lines drawn with
//! the 8x8 bitmap font -> PNG -> RGB -> JPEG.

use std::io::Cursor;
use std::sync::Arc;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use jpeg_encoder::{ColorType, Encoder};
use tracing::debug;

use crate::layout::{flow, parse_blocks, BlockKind, BlockStyle, FontFace, LaidPage, PageGeometry};
use crate::render::html::HtmlRenderer;
use crate::render::theme::{Palette, Rgb8, ThemeAssets};
use crate::render::{LimitExceeded, OutputFormat, RenderFailure, Renderer};
use crate::resume::ResumeRecord;

pub const WIDTH_PX: u32 = 816;
/// Letter aspect ratio at `WIDTH_PX`; shorter content is padded to this.
pub const MIN_HEIGHT_PX: u32 = 1056;
pub const MAX_HEIGHT_PX: u32 = 6000;
pub const MARGIN_PX: f32 = 48.0;
pub const JPEG_QUALITY: u8 = 92;

const GLYPH_PX: f32 = 8.0;
const BULLET_INDENT_PX: f32 = 24.0;

const GEOMETRY: PageGeometry = PageGeometry {
    width: WIDTH_PX as f32,
    height: None,
    margin_x: MARGIN_PX,
    margin_top: MARGIN_PX,
    margin_bottom: MARGIN_PX,
};

fn block_style(kind: BlockKind) -> BlockStyle {
    let style = |size: f32, leading: f32, space_before: f32| BlockStyle {
        face: FontFace::Bitmap,
        size,
        leading,
        space_before,
        indent: 0.0,
    };
    match kind {
        BlockKind::Title => style(32.0, 44.0, 0.0),
        BlockKind::Role => style(16.0, 26.0, 0.0),
        BlockKind::Contact => style(16.0, 22.0, 4.0),
        BlockKind::Heading => style(16.0, 28.0, 18.0),
        BlockKind::Paragraph => style(16.0, 22.0, 4.0),
        BlockKind::Bullet => BlockStyle {
            indent: BULLET_INDENT_PX,
            ..style(16.0, 22.0, 2.0)
        },
    }
}

fn is_bold(kind: BlockKind) -> bool {
    matches!(kind, BlockKind::Title | BlockKind::Heading)
}

fn color_for(palette: &Palette, kind: BlockKind) -> Rgba<u8> {
    let Rgb8(r, g, b) = match kind {
        BlockKind::Role | BlockKind::Heading => palette.accent,
        BlockKind::Contact => palette.muted,
        _ => palette.ink,
    };
    Rgba([r, g, b, 255])
}

/// Glyph rows, least significant bit leftmost. Unknown characters draw as `?`.
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_glyph(img: &mut RgbaImage, rows: [u8; 8], x0: u32, y0: u32, scale: u32, color: Rgba<u8>) {
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..8u32 {
            if bits & (1 << col) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = x0 + col * scale + dx;
                    let y = y0 + row as u32 * scale + dy;
                    if x < img.width() && y < img.height() {
                        img.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

fn draw_text(img: &mut RgbaImage, text: &str, x: u32, y: u32, scale: u32, color: Rgba<u8>, bold: bool) {
    let advance = 8 * scale;
    for (i, c) in text.chars().enumerate() {
        let gx = x + i as u32 * advance;
        let rows = glyph(c);
        draw_glyph(img, rows, gx, y, scale, color);
        if bold {
            draw_glyph(img, rows, gx + 1, y, scale, color);
        }
    }
}

pub struct ImageRenderer {
    html: Arc<HtmlRenderer>,
    themes: Arc<ThemeAssets>,
}

impl ImageRenderer {
    pub fn new(html: Arc<HtmlRenderer>, themes: Arc<ThemeAssets>) -> Self {
        Self { html, themes }
    }

    /// The single unbounded page of lines and the canvas height it needs.
    pub fn layout(&self, record: &ResumeRecord) -> Result<(LaidPage, u32), RenderFailure> {
        let html = self.html.render_html(record);
        let blocks =
            parse_blocks(&html).map_err(|e| RenderFailure::from_engine(OutputFormat::Jpg, e))?;
        let page = flow(&blocks, &GEOMETRY, block_style)
            .into_iter()
            .next()
            .unwrap_or_default();

        let content = (page.used_height + MARGIN_PX).ceil() as u32;
        if content > MAX_HEIGHT_PX {
            return Err(RenderFailure::from_engine(
                OutputFormat::Jpg,
                LimitExceeded {
                    what: "image height",
                    actual: content as usize,
                    limit: MAX_HEIGHT_PX as usize,
                },
            ));
        }
        Ok((page, content.max(MIN_HEIGHT_PX)))
    }

    /// Lossless RGBA raster of the record.
    pub fn rasterize(&self, record: &ResumeRecord) -> Result<RgbaImage, RenderFailure> {
        let (page, height) = self.layout(record)?;
        let palette = self.themes.palette(record.theme());
        let mut img = RgbaImage::from_pixel(WIDTH_PX, height, Rgba([255, 255, 255, 255]));

        for line in &page.lines {
            let scale = (line.size / GLYPH_PX).round().max(1.0) as u32;
            let color = color_for(&palette, line.kind);
            let x = line.x.round() as u32;
            let y = line.top.round() as u32;
            draw_text(&mut img, &line.text, x, y, scale, color, is_bold(line.kind));
            if line.marker {
                let marker_x = (line.x - BULLET_INDENT_PX + 4.0).round() as u32;
                draw_text(&mut img, "-", marker_x, y, scale, color_for(&palette, BlockKind::Heading), false);
            }
        }
        Ok(img)
    }

    pub fn render_image(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        let engine = |e: image::ImageError| RenderFailure::from_engine(OutputFormat::Jpg, e);
        let raster = self.rasterize(record)?;

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(raster)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(engine)?;

        let rgb = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(engine)?
            .to_rgb8();

        let dimension = |px: u32| {
            u16::try_from(px).map_err(|e| RenderFailure::from_engine(OutputFormat::Jpg, e))
        };
        let (width, height) = (dimension(rgb.width())?, dimension(rgb.height())?);

        let mut jpeg = Vec::new();
        let mut encoder = Encoder::new(&mut jpeg, JPEG_QUALITY);
        encoder.set_optimized_huffman_tables(true);
        encoder
            .encode(rgb.as_raw(), width, height, ColorType::Rgb)
            .map_err(|e| RenderFailure::from_engine(OutputFormat::Jpg, e))?;

        debug!(
            width = rgb.width(),
            height = rgb.height(),
            png_bytes = png.len(),
            jpeg_bytes = jpeg.len(),
            "Image rendered"
        );
        Ok(jpeg)
    }
}

impl Renderer for ImageRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpg
    }

    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        self.render_image(record)
    }
}
