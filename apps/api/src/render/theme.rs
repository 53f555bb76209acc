//! Theme palettes and on-disk stylesheets.
//!
//! Each theme has a built-in palette. A stylesheet at `{THEME_DIR}/{theme}.css`
//! is optional: when present it is appended to the HTML `<style>` block and
//! its `--accent`, `--ink` and `--muted` custom properties recolour the PDF
//! and image output. A missing or unreadable file is never an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::layout::FontFace;
use crate::models::choices::{Choice, Theme};

/// Stylesheets larger than this are ignored.
pub const MAX_STYLESHEET_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

impl Rgb8 {
    /// Parses `#rrggbb` (case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb8(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Channels scaled to 0.0..=1.0.
    pub fn unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Rgb8,
    pub ink: Rgb8,
    pub muted: Rgb8,
    pub serif: bool,
}

impl Palette {
    pub fn builtin(theme: Theme) -> Self {
        match theme {
            Theme::Emerald => Palette {
                accent: Rgb8(0x04, 0x78, 0x57),
                ink: Rgb8(0x11, 0x18, 0x27),
                muted: Rgb8(0x4b, 0x55, 0x63),
                serif: false,
            },
            Theme::Sapphire => Palette {
                accent: Rgb8(0x1d, 0x4e, 0xd8),
                ink: Rgb8(0x0f, 0x17, 0x2a),
                muted: Rgb8(0x47, 0x55, 0x69),
                serif: false,
            },
            Theme::Slate => Palette {
                accent: Rgb8(0x33, 0x41, 0x55),
                ink: Rgb8(0x02, 0x06, 0x17),
                muted: Rgb8(0x64, 0x74, 0x8b),
                serif: true,
            },
            Theme::Rose => Palette {
                accent: Rgb8(0xbe, 0x12, 0x3c),
                ink: Rgb8(0x1c, 0x19, 0x17),
                muted: Rgb8(0x57, 0x53, 0x4e),
                serif: true,
            },
        }
    }

    /// Regular body face for the PDF renderer.
    pub fn body_face(&self) -> FontFace {
        if self.serif {
            FontFace::Times
        } else {
            FontFace::Helvetica
        }
    }

    fn font_stack(&self) -> &'static str {
        if self.serif {
            "Georgia, Times New Roman, serif"
        } else {
            "Helvetica Neue, Helvetica, Arial, sans-serif"
        }
    }

    /// Inline stylesheet for the HTML projection.
    pub fn base_css(&self) -> String {
        format!(
            ":root {{ --accent: {accent}; --ink: {ink}; --muted: {muted}; }}\n\
             body {{ margin: 0; background: #ffffff; color: var(--ink); font-family: {font}; font-size: 15px; line-height: 1.45; }}\n\
             .resume {{ max-width: 760px; margin: 0 auto; padding: 40px 48px; }}\n\
             header {{ border-bottom: 2px solid var(--accent); padding-bottom: 12px; margin-bottom: 8px; }}\n\
             h1 {{ margin: 0; font-size: 30px; letter-spacing: 0.01em; }}\n\
             .role {{ margin: 4px 0 0; font-size: 17px; color: var(--accent); }}\n\
             .contact {{ margin: 6px 0 0; font-size: 13px; color: var(--muted); }}\n\
             .contact a {{ color: inherit; text-decoration: none; }}\n\
             h2 {{ margin: 20px 0 6px; font-size: 15px; text-transform: uppercase; letter-spacing: 0.08em; color: var(--accent); }}\n\
             section p {{ margin: 0; }}\n\
             section ul {{ margin: 0; padding-left: 18px; }}\n",
            accent = self.accent.hex(),
            ink = self.ink.hex(),
            muted = self.muted.hex(),
            font = self.font_stack(),
        )
    }

    fn with_overrides(mut self, css: &str) -> Self {
        for caps in custom_property().captures_iter(css) {
            let Some(color) = Rgb8::from_hex(&caps[2]) else {
                continue;
            };
            match &caps[1] {
                "accent" => self.accent = color,
                "ink" => self.ink = color,
                "muted" => self.muted = color,
                _ => {}
            }
        }
        self
    }
}

fn custom_property() -> &'static Regex {
    static PROPERTY: OnceLock<Regex> = OnceLock::new();
    PROPERTY.get_or_init(|| {
        Regex::new(r"--(accent|ink|muted)\s*:\s*(#[0-9A-Fa-f]{6})\b")
            .expect("static property pattern compiles")
    })
}

/// A stylesheet is embedded verbatim inside `<style>`, so it must not be able
/// to close the element or break the XHTML reader.
fn is_embeddable(css: &str) -> bool {
    !css.contains('<') && !css.contains('&')
}

/// Theme stylesheets loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ThemeAssets {
    dir: Option<PathBuf>,
    stylesheets: HashMap<Theme, String>,
}

impl ThemeAssets {
    /// Built-in palettes only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Reads `{dir}/{theme}.css` for every theme. Missing files are skipped.
    pub fn load(dir: &Path) -> Self {
        let mut stylesheets = HashMap::new();
        for code in Theme::CODES {
            let Some(theme) = Theme::from_code(code) else {
                continue;
            };
            let path = dir.join(format!("{code}.css"));
            match read_stylesheet(&path) {
                Some(css) => {
                    debug!(theme = code, path = %path.display(), "Loaded theme stylesheet");
                    stylesheets.insert(theme, css);
                }
                None => debug!(theme = code, path = %path.display(), "No theme stylesheet"),
            }
        }
        Self {
            dir: Some(dir.to_path_buf()),
            stylesheets,
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn stylesheet(&self, theme: Theme) -> Option<&str> {
        self.stylesheets.get(&theme).map(String::as_str)
    }

    /// Built-in palette with any stylesheet overrides applied.
    pub fn palette(&self, theme: Theme) -> Palette {
        let palette = Palette::builtin(theme);
        match self.stylesheet(theme) {
            Some(css) => palette.with_overrides(css),
            None => palette,
        }
    }

    /// Full `<style>` body: base rules, then the theme stylesheet if any.
    pub fn css(&self, theme: Theme) -> String {
        let mut css = self.palette(theme).base_css();
        if let Some(extra) = self.stylesheet(theme) {
            css.push_str(extra);
            css.push('\n');
        }
        css
    }
}

fn read_stylesheet(path: &Path) -> Option<String> {
    let meta = fs::metadata(path).ok()?;
    if meta.len() > MAX_STYLESHEET_BYTES {
        warn!(path = %path.display(), bytes = meta.len(), "Theme stylesheet too large, ignoring");
        return None;
    }
    let css = match fs::read_to_string(path) {
        Ok(css) => css,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Theme stylesheet unreadable, ignoring");
            return None;
        }
    };
    if !is_embeddable(&css) {
        warn!(path = %path.display(), "Theme stylesheet contains markup characters, ignoring");
        return None;
    }
    Some(css)
}
