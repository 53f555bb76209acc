//! The ordered, non-empty sections of a record, shared by every renderer so
//! that HTML and DOCX headings come out in the same order.

use serde::Serialize;

use crate::resume::ResumeRecord;
use crate::sanitize::LIST_SEPARATOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Summary,
    Skills,
    Certifications,
    Languages,
    Achievements,
    Education,
    Preferences,
}

impl SectionKind {
    /// Display order after the heading block.
    pub const ORDER: [SectionKind; 7] = [
        SectionKind::Summary,
        SectionKind::Skills,
        SectionKind::Certifications,
        SectionKind::Languages,
        SectionKind::Achievements,
        SectionKind::Education,
        SectionKind::Preferences,
    ];

    /// Lower-case identifier, matching the serialized form.
    pub fn code(self) -> &'static str {
        match self {
            SectionKind::Summary => "summary",
            SectionKind::Skills => "skills",
            SectionKind::Certifications => "certifications",
            SectionKind::Languages => "languages",
            SectionKind::Achievements => "achievements",
            SectionKind::Education => "education",
            SectionKind::Preferences => "preferences",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Summary => "Professional Summary",
            SectionKind::Skills => "Skills",
            SectionKind::Certifications => "Certifications",
            SectionKind::Languages => "Languages",
            SectionKind::Achievements => "Achievements",
            SectionKind::Education => "Education",
            SectionKind::Preferences => "Preferences",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", content = "content", rename_all = "lowercase")]
pub enum SectionBody {
    Text(String),
    /// Short tokens shown on one comma-joined line.
    Inline(Vec<String>),
    Bullets(Vec<String>),
}

impl SectionBody {
    /// Plain-text lines as a word processor would show them.
    pub fn lines(&self) -> Vec<String> {
        match self {
            SectionBody::Text(text) => vec![text.clone()],
            SectionBody::Inline(items) => vec![items.join(LIST_SEPARATOR)],
            SectionBody::Bullets(items) => items.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: &'static str,
    pub body: SectionBody,
}

fn body_for(record: &ResumeRecord, kind: SectionKind) -> Option<SectionBody> {
    let inline = |items: &[String]| (!items.is_empty()).then(|| SectionBody::Inline(items.to_vec()));
    match kind {
        SectionKind::Summary => record.summary().map(|s| SectionBody::Text(s.to_string())),
        SectionKind::Skills => inline(record.skills()),
        SectionKind::Certifications => inline(record.certifications()),
        SectionKind::Languages => inline(record.languages()),
        SectionKind::Achievements => record
            .achievements()
            .map(|s| SectionBody::Text(s.to_string())),
        SectionKind::Education => {
            let education = record.education();
            (!education.is_empty()).then(|| SectionBody::Text(education.summary_line()))
        }
        SectionKind::Preferences => {
            let entries = record.preferences().entries();
            (!entries.is_empty()).then(|| {
                SectionBody::Bullets(
                    entries
                        .into_iter()
                        .map(|(label, value)| format!("{label}: {value}"))
                        .collect(),
                )
            })
        }
    }
}

/// Non-empty sections in display order. Empty fields produce no section at all.
pub fn project(record: &ResumeRecord) -> Vec<Section> {
    SectionKind::ORDER
        .iter()
        .filter_map(|&kind| {
            body_for(record, kind).map(|body| Section {
                kind,
                title: kind.title(),
                body,
            })
        })
        .collect()
}

/// One item of the header contact line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactItem {
    pub text: String,
    pub href: Option<String>,
}

/// Location, phone, email, experience, then links.
pub fn contact_items(record: &ResumeRecord) -> Vec<ContactItem> {
    let plain = |text: &str| ContactItem {
        text: text.to_string(),
        href: None,
    };

    let mut items = Vec::new();
    items.extend(record.location().map(plain));
    items.extend(record.phone().map(plain));
    items.push(ContactItem {
        text: record.email().to_string(),
        href: Some(format!("mailto:{}", record.email())),
    });
    if let Some(years) = record.years_experience() {
        let unit = if years == "1" { "year" } else { "years" };
        items.push(plain(&format!("{years} {unit} experience")));
    }
    items.extend(record.links().iter().map(|url| ContactItem {
        text: display_url(url).to_string(),
        href: Some(url.to_string()),
    }));
    items
}

/// `https://www.github.com/jane/` -> `github.com/jane`.
fn display_url(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest.trim_end_matches('/')
}

/// Contact items joined as one plain-text line.
pub fn contact_line(record: &ResumeRecord) -> String {
    contact_items(record)
        .into_iter()
        .map(|item| item.text)
        .collect::<Vec<_>>()
        .join(" | ")
}
