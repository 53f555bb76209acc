use serde::Serialize;

use crate::models::choices::{Authorization, Choice, Degree, Relocation, Theme, WorkMode};
use crate::models::fields::ResumeFields;
use crate::sanitize::LIST_SEPARATOR;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Links {
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
}

impl Links {
    /// Present links in display order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.linkedin, &self.github, &self.portfolio]
            .into_iter()
            .filter_map(|l| l.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub work_mode: Option<WorkMode>,
    pub relocation: Option<Relocation>,
    pub authorization: Option<Authorization>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self.work_mode.is_none() && self.relocation.is_none() && self.authorization.is_none()
    }

    /// `(label, value)` pairs for the preferences that were given.
    pub fn entries(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = Vec::new();
        if let Some(mode) = self.work_mode {
            out.push(("Work mode", mode.label()));
        }
        if let Some(relocation) = self.relocation {
            out.push(("Open to relocation", relocation.label()));
        }
        if let Some(authorization) = self.authorization {
            out.push(("Work authorization", authorization.label()));
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Education {
    pub degree: Option<Degree>,
    pub school: Option<String>,
    pub graduation_year: Option<u16>,
}

impl Education {
    pub fn is_empty(&self) -> bool {
        self.degree.is_none() && self.school.is_none() && self.graduation_year.is_none()
    }

    /// Single display line: "Bachelor's - State University, 2020".
    pub fn summary_line(&self) -> String {
        let head = [self.degree.map(|d| d.label().to_string()), self.school.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" - ");
        match (head.is_empty(), self.graduation_year) {
            (true, Some(year)) => year.to_string(),
            (false, Some(year)) => format!("{head}, {year}"),
            (_, None) => head,
        }
    }
}

/// The canonical, immutable representation of one resume submission.
///
/// Only `resume::build_record` constructs it; every accessor hands out shared
/// references, so a record never changes after it is built. A new submission
/// produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeRecord {
    pub(super) name: String,
    pub(super) email: String,
    pub(super) phone: Option<String>,
    pub(super) role: String,
    pub(super) location: Option<String>,
    pub(super) links: Links,
    pub(super) summary: Option<String>,
    pub(super) achievements: Option<String>,
    pub(super) skills: Vec<String>,
    pub(super) certifications: Vec<String>,
    pub(super) languages: Vec<String>,
    pub(super) years_experience: Option<String>,
    pub(super) preferences: Preferences,
    pub(super) education: Education,
    pub(super) theme: Theme,
}

impl ResumeRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn achievements(&self) -> Option<&str> {
        self.achievements.as_deref()
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn certifications(&self) -> &[String] {
        &self.certifications
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn years_experience(&self) -> Option<&str> {
        self.years_experience.as_deref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn education(&self) -> &Education {
        &self.education
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Re-derives the field map this record would be built from.
    ///
    /// Building a record from the result yields a record equal to `self`.
    pub fn to_fields(&self) -> ResumeFields {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        ResumeFields {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: opt(&self.phone),
            location: opt(&self.location),
            role: self.role.clone(),
            linkedin: opt(&self.links.linkedin),
            github: opt(&self.links.github),
            portfolio: opt(&self.links.portfolio),
            school: opt(&self.education.school),
            highest_degree: code_or_empty(self.education.degree),
            grad_year: self
                .education
                .graduation_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            years: opt(&self.years_experience),
            summary: opt(&self.summary),
            achievements: opt(&self.achievements),
            skills: self.skills.join(LIST_SEPARATOR),
            certifications: self.certifications.join(LIST_SEPARATOR),
            languages: self.languages.join(LIST_SEPARATOR),
            authorization: code_or_empty(self.preferences.authorization),
            relocation: code_or_empty(self.preferences.relocation),
            work_mode: code_or_empty(self.preferences.work_mode),
            theme: self.theme.code().to_string(),
        }
    }
}

fn code_or_empty<C: Choice>(choice: Option<C>) -> String {
    choice.map(|c| c.code().to_string()).unwrap_or_default()
}
