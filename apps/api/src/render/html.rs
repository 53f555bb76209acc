//! HTML projection of a record.
//!
//! Primary path is the minijinja template (auto-escaping on, since the
//! template name ends in `.html`). If the template cannot be loaded, compiled
//! or rendered, a minimal inline layout is produced instead; it escapes every
//! value with `html-escape` and omits empty sections the same way.
//!
//! Both paths emit well-formed XHTML: the PDF and image renderers read the
//! output back with an XML parser.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use html_escape::{encode_double_quoted_attribute, encode_safe};
use minijinja::{context, Environment};
use tracing::{debug, warn};

use crate::models::choices::Choice;
use crate::render::sections::{contact_items, project, SectionBody};
use crate::render::theme::ThemeAssets;
use crate::render::{OutputFormat, RenderFailure, Renderer};
use crate::resume::ResumeRecord;

pub const TEMPLATE_NAME: &str = "resume.html";

const EMBEDDED_TEMPLATE: &str = include_str!("../../templates/resume.html");

pub struct HtmlRenderer {
    env: Option<Environment<'static>>,
    themes: Arc<ThemeAssets>,
}

impl HtmlRenderer {
    /// Uses `{template_dir}/resume.html` when it exists and is readable, the
    /// embedded template otherwise.
    pub fn new(themes: Arc<ThemeAssets>, template_dir: Option<&Path>) -> Self {
        let source = template_dir
            .map(|dir| dir.join(TEMPLATE_NAME))
            .and_then(|path| match fs::read_to_string(&path) {
                Ok(source) => {
                    debug!(path = %path.display(), "Using template override");
                    Some(source)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Template override unreadable, using embedded template");
                    None
                }
            })
            .unwrap_or_else(|| EMBEDDED_TEMPLATE.to_string());
        Self::with_template_source(themes, source)
    }

    pub fn with_template_source(themes: Arc<ThemeAssets>, source: String) -> Self {
        let mut env = Environment::new();
        let env = match env.add_template_owned(TEMPLATE_NAME, source) {
            Ok(()) => Some(env),
            Err(e) => {
                warn!(error = %e, "Resume template failed to compile, using inline layout");
                None
            }
        };
        Self { env, themes }
    }

    /// Inline layout only.
    pub fn inline_only(themes: Arc<ThemeAssets>) -> Self {
        Self { env: None, themes }
    }

    /// Never fails: template errors fall back to the inline layout.
    pub fn render_html(&self, record: &ResumeRecord) -> String {
        if let Some(env) = &self.env {
            match self.render_template(env, record) {
                Ok(html) => return html,
                Err(e) => warn!(error = %e, "Resume template failed to render, using inline layout"),
            }
        }
        self.render_inline(record)
    }

    fn render_template(
        &self,
        env: &Environment<'static>,
        record: &ResumeRecord,
    ) -> Result<String, minijinja::Error> {
        let template = env.get_template(TEMPLATE_NAME)?;
        template.render(context! {
            name => record.name(),
            role => record.role(),
            theme => record.theme().code(),
            css => self.themes.css(record.theme()),
            contact => contact_items(record),
            sections => project(record),
        })
    }

    fn render_inline(&self, record: &ResumeRecord) -> String {
        let name = encode_safe(record.name());
        let role = encode_safe(record.role());

        let mut out = String::with_capacity(4096);
        out.push_str("<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"en\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\" />\n");
        let _ = writeln!(out, "<title>{name} - {role}</title>");
        let _ = writeln!(out, "<style>\n{}</style>", self.themes.css(record.theme()));
        out.push_str("</head>\n");
        let _ = writeln!(out, "<body class=\"theme-{}\">", record.theme().code());
        out.push_str("<main class=\"resume resume-inline\">\n<header>\n");
        let _ = writeln!(out, "<h1>{name}</h1>");
        let _ = writeln!(out, "<p class=\"role\">{role}</p>");

        let contact = contact_items(record);
        if !contact.is_empty() {
            out.push_str("<p class=\"contact\">");
            for (i, item) in contact.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                let text = encode_safe(&item.text);
                match &item.href {
                    Some(href) => {
                        let _ = write!(
                            out,
                            "<a href=\"{}\">{text}</a>",
                            encode_double_quoted_attribute(href)
                        );
                    }
                    None => {
                        let _ = write!(out, "<span>{text}</span>");
                    }
                }
            }
            out.push_str("</p>\n");
        }
        out.push_str("</header>\n");

        for section in project(record) {
            let _ = writeln!(out, "<section class=\"section-{}\">", section.kind.code());
            let _ = writeln!(out, "<h2>{}</h2>", encode_safe(section.title));
            match &section.body {
                SectionBody::Text(text) => {
                    let _ = writeln!(out, "<p>{}</p>", encode_safe(text));
                }
                SectionBody::Inline(_) => {
                    let line = section.body.lines().concat();
                    let _ = writeln!(out, "<p class=\"inline\">{}</p>", encode_safe(&line));
                }
                SectionBody::Bullets(items) => {
                    out.push_str("<ul>\n");
                    for item in items {
                        let _ = writeln!(out, "<li>{}</li>", encode_safe(item));
                    }
                    out.push_str("</ul>\n");
                }
            }
            out.push_str("</section>\n");
        }

        out.push_str("</main>\n</body>\n</html>\n");
        out
    }
}

impl Renderer for HtmlRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Html
    }

    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure> {
        Ok(self.render_html(record).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{parse_blocks, BlockKind};
    use crate::models::fields::ResumeFields;
    use crate::render::test_support::{full_record, minimal_record};
    use crate::resume::build_record;

    fn renderer() -> HtmlRenderer {
        HtmlRenderer::new(Arc::new(ThemeAssets::builtin()), None)
    }

    fn headings(html: &str) -> Vec<String> {
        parse_blocks(html)
            .unwrap()
            .into_iter()
            .filter(|b| b.kind == BlockKind::Heading)
            .map(|b| b.text)
            .collect()
    }

    #[test]
    fn test_minimal_record_renders() {
        let html = renderer().render_html(&minimal_record());
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert!(html.contains("Engineer"));
        assert!(!html.contains("resume-inline"));
        assert!(headings(&html).is_empty());
    }

    #[test]
    fn test_empty_skills_has_no_skills_heading() {
        let html = renderer().render_html(&minimal_record());
        assert!(!headings(&html).iter().any(|h| h == "Skills"));
    }

    #[test]
    fn test_full_record_section_order() {
        let html = renderer().render_html(&full_record());
        assert_eq!(
            headings(&html),
            vec![
                "Professional Summary",
                "Skills",
                "Certifications",
                "Languages",
                "Achievements",
                "Education",
                "Preferences",
            ]
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let record = build_record(&ResumeFields {
            summary: "R&D \"lead\" with 'quotes'".to_string(),
            ..minimal_record().to_fields()
        })
        .unwrap();
        let html = renderer().render_html(&record);
        assert!(!html.contains("R&D \"lead\""));
        assert!(html.contains("R&amp;D"));

        let blocks = parse_blocks(&html).unwrap();
        assert!(blocks
            .iter()
            .any(|b| b.kind == BlockKind::Paragraph && b.text == "R&D \"lead\" with 'quotes'"));
    }

    #[test]
    fn test_broken_template_falls_back_to_inline_layout() {
        let themes = Arc::new(ThemeAssets::builtin());
        let broken = HtmlRenderer::with_template_source(themes, "{% if name %}unclosed".to_string());
        let html = broken.render_html(&full_record());
        assert!(html.contains("resume-inline"));
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert_eq!(headings(&html)[1], "Skills");
    }

    #[test]
    fn test_template_render_error_falls_back() {
        let themes = Arc::new(ThemeAssets::builtin());
        let failing =
            HtmlRenderer::with_template_source(themes, "{{ name.first.second }}".to_string());
        let html = failing.render_html(&minimal_record());
        assert!(html.contains("resume-inline"));
    }

    #[test]
    fn test_inline_layout_matches_template_structure() {
        let themes = Arc::new(ThemeAssets::builtin());
        let inline = HtmlRenderer::inline_only(themes.clone());
        let templated = HtmlRenderer::new(themes, None);
        let record = full_record();
        assert_eq!(
            parse_blocks(&inline.render_html(&record)).unwrap(),
            parse_blocks(&templated.render_html(&record)).unwrap()
        );
    }

    #[test]
    fn test_template_override_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(TEMPLATE_NAME),
            "<html><body><h1>{{ name }}</h1><p class=\"role\">custom</p></body></html>",
        )
        .unwrap();
        let renderer = HtmlRenderer::new(Arc::new(ThemeAssets::builtin()), Some(dir.path()));
        let html = renderer.render_html(&minimal_record());
        assert!(html.contains("<p class=\"role\">custom</p>"));
    }

    #[test]
    fn test_missing_override_uses_embedded_template() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = HtmlRenderer::new(Arc::new(ThemeAssets::builtin()), Some(dir.path()));
        let html = renderer.render_html(&minimal_record());
        assert!(html.contains("class=\"resume\""));
    }
}
