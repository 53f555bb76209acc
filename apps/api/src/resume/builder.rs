//! Canonical model builder: sanitize, validate, assemble.
//!
//! Narrative fields (summary, achievements) are truncated to their bound.
//! Every other text field is sanitized with one code point of headroom so that
//! over-long input fails the length rule instead of being silently cut; a
//! truncated email or URL would be valid-looking and wrong.

use chrono::{Datelike, Utc};
use tracing::debug;

use crate::models::choices::{Authorization, Choice, Degree, Relocation, Theme, WorkMode};
use crate::models::fields::ResumeFields;
use crate::resume::record::{Education, Links, Preferences, ResumeRecord};
use crate::sanitize::{cap_joined_len, normalize_list, sanitize};
use crate::validation::{FieldRule, Pattern, ValidationFailure, ValidationReport};

// ────────────────────────────────────────────────────────────────────────────
// Bounds
// ────────────────────────────────────────────────────────────────────────────

pub const NAME_MAX: usize = 80;
pub const EMAIL_MAX: usize = 120;
pub const PHONE_MIN: usize = 7;
pub const PHONE_MAX: usize = 20;
pub const ROLE_MAX: usize = 100;
pub const LOCATION_MAX: usize = 120;
pub const SCHOOL_MAX: usize = 120;
pub const URL_MAX: usize = 200;
/// Single bound for the summary across every submission path.
pub const SUMMARY_MAX_CHARS: usize = 1200;
pub const ACHIEVEMENTS_MAX_CHARS: usize = 1200;

/// Raw list text considered before splitting.
pub const LIST_RAW_MAX: usize = 2000;
pub const LIST_ITEM_MAX: usize = 40;
pub const LIST_MAX_ITEMS: usize = 24;
pub const LIST_JOINED_MAX: usize = 600;

pub const GRAD_YEAR_MIN: u16 = 1940;
/// Expected graduations up to this many years ahead are accepted.
pub const GRAD_YEAR_LOOKAHEAD: u16 = 10;
pub const YEARS_EXPERIENCE_MAX: f64 = 60.0;

pub const LINKEDIN_DOMAINS: &[&str] = &["linkedin.com", "linkedin.cn"];
pub const GITHUB_DOMAINS: &[&str] = &["github.com"];

const CHOICE_RAW_MAX: usize = 16;

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Sanitizes with one code point of headroom so the length rule can see overflow.
fn strict(raw: &str, max: usize) -> String {
    sanitize(raw, max + 1)
}

fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn bounded_list(raw: &str) -> Vec<String> {
    let cleaned = sanitize(raw, LIST_RAW_MAX);
    cap_joined_len(
        normalize_list(&cleaned, LIST_ITEM_MAX, LIST_MAX_ITEMS),
        LIST_JOINED_MAX,
    )
}

/// Parses an optional closed-set field. Empty means absent; anything else must
/// be one of `C::CODES` exactly.
fn choice<C: Choice>(report: &mut ValidationReport, field: &str, raw: &str) -> Option<C> {
    let value = sanitize(raw, CHOICE_RAW_MAX);
    if report.check(field, &value, &[FieldRule::OneOf(C::CODES)]) {
        C::from_code(&value)
    } else {
        None
    }
}

fn grad_year_max() -> u16 {
    u16::try_from(Utc::now().year())
        .unwrap_or(u16::MAX - GRAD_YEAR_LOOKAHEAD)
        .saturating_add(GRAD_YEAR_LOOKAHEAD)
}

/// Builds the canonical record or reports every field that failed.
///
/// Name, role and a syntactically valid email are jointly mandatory; every
/// other field may be empty and is then absent from the record.
pub fn build_record(fields: &ResumeFields) -> Result<ResumeRecord, ValidationFailure> {
    let mut report = ValidationReport::new();

    // identity
    let name = strict(&fields.name, NAME_MAX);
    report.check(
        "name",
        &name,
        &[
            FieldRule::Required,
            FieldRule::Length { min: 2, max: NAME_MAX },
            FieldRule::Pattern(Pattern::PersonName),
        ],
    );

    let email = strict(&fields.email, EMAIL_MAX);
    report.check(
        "email",
        &email,
        &[
            FieldRule::Required,
            FieldRule::Length { min: 3, max: EMAIL_MAX },
            FieldRule::Pattern(Pattern::Email),
        ],
    );

    let phone = strict(&fields.phone, PHONE_MAX);
    report.check(
        "phone",
        &phone,
        &[
            FieldRule::Length { min: PHONE_MIN, max: PHONE_MAX },
            FieldRule::Pattern(Pattern::Phone),
        ],
    );

    // positioning
    let role = strict(&fields.role, ROLE_MAX);
    report.check(
        "role",
        &role,
        &[
            FieldRule::Required,
            FieldRule::Length { min: 2, max: ROLE_MAX },
            FieldRule::Pattern(Pattern::SafeText),
        ],
    );

    let location = strict(&fields.location, LOCATION_MAX);
    report.check(
        "location",
        &location,
        &[
            FieldRule::Length { min: 2, max: LOCATION_MAX },
            FieldRule::Pattern(Pattern::SafeText),
        ],
    );

    // links
    let url_len = FieldRule::Length { min: 1, max: URL_MAX };
    let linkedin = strict(&fields.linkedin, URL_MAX);
    report.check(
        "linkedin",
        &linkedin,
        &[url_len, FieldRule::AllowedHost(LINKEDIN_DOMAINS)],
    );
    let github = strict(&fields.github, URL_MAX);
    report.check(
        "github",
        &github,
        &[url_len, FieldRule::AllowedHost(GITHUB_DOMAINS)],
    );
    let portfolio = strict(&fields.portfolio, URL_MAX);
    report.check("portfolio", &portfolio, &[url_len, FieldRule::WebUrl]);

    // narrative
    let summary = sanitize(&fields.summary, SUMMARY_MAX_CHARS);
    let achievements = sanitize(&fields.achievements, ACHIEVEMENTS_MAX_CHARS);

    // lists
    let skills = bounded_list(&fields.skills);
    let certifications = bounded_list(&fields.certifications);
    let languages = bounded_list(&fields.languages);

    // experience
    let years = strict(&fields.years, 4);
    report.check(
        "years",
        &years,
        &[
            FieldRule::Pattern(Pattern::YearsExperience),
            FieldRule::NumericRange {
                min: 0.0,
                max: YEARS_EXPERIENCE_MAX,
            },
        ],
    );

    // education
    let school = strict(&fields.school, SCHOOL_MAX);
    report.check(
        "school",
        &school,
        &[
            FieldRule::Length { min: 2, max: SCHOOL_MAX },
            FieldRule::Pattern(Pattern::SafeText),
        ],
    );
    let degree = choice::<Degree>(&mut report, "highest_degree", &fields.highest_degree);

    let grad_year_raw = strict(&fields.grad_year, 4);
    let grad_year_ok = report.check(
        "grad_year",
        &grad_year_raw,
        &[
            FieldRule::Pattern(Pattern::Year),
            FieldRule::NumericRange {
                min: f64::from(GRAD_YEAR_MIN),
                max: f64::from(grad_year_max()),
            },
        ],
    );
    let graduation_year = if grad_year_ok {
        grad_year_raw.parse::<u16>().ok()
    } else {
        None
    };

    // preferences
    let work_mode = choice::<WorkMode>(&mut report, "work_mode", &fields.work_mode);
    let relocation = choice::<Relocation>(&mut report, "relocation", &fields.relocation);
    let authorization = choice::<Authorization>(&mut report, "authorization", &fields.authorization);

    // presentation
    let theme = if sanitize(&fields.theme, CHOICE_RAW_MAX).is_empty() {
        Some(Theme::default())
    } else {
        choice::<Theme>(&mut report, "theme", &fields.theme)
    };

    if let Err(failure) = report.into_result() {
        debug!(
            failed_fields = failure.errors.len(),
            fields = ?failure.errors.keys().collect::<Vec<_>>(),
            "Resume submission rejected"
        );
        return Err(failure);
    }

    Ok(ResumeRecord {
        name,
        email,
        phone: optional(phone),
        role,
        location: optional(location),
        links: Links {
            linkedin: optional(linkedin),
            github: optional(github),
            portfolio: optional(portfolio),
        },
        summary: optional(summary),
        achievements: optional(achievements),
        skills,
        certifications,
        languages,
        years_experience: optional(years),
        preferences: Preferences {
            work_mode,
            relocation,
            authorization,
        },
        education: Education {
            degree,
            school: optional(school),
            graduation_year,
        },
        theme: theme.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> ResumeFields {
        ResumeFields {
            name: "Jane Doe".to_string(),
            role: "Engineer".to_string(),
            email: "jane@example.com".to_string(),
            ..ResumeFields::default()
        }
    }

    fn full() -> ResumeFields {
        ResumeFields {
            name: "Jane O'Neil-Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+1 (555) 010-2030".to_string(),
            location: "Portland, OR".to_string(),
            role: "Senior Engineer, Platform".to_string(),
            linkedin: "https://www.linkedin.com/in/jane".to_string(),
            github: "https://github.com/jane".to_string(),
            portfolio: "https://jane.dev/work?tab=all".to_string(),
            school: "Oregon State University".to_string(),
            highest_degree: "ba".to_string(),
            grad_year: "2015".to_string(),
            years: "8.5".to_string(),
            summary: "Builds   reliable\nsystems.\u{202E}".to_string(),
            achievements: "Cut p99 latency by 40%.".to_string(),
            skills: "Rust, Go, rust, Kubernetes".to_string(),
            certifications: "CKA".to_string(),
            languages: "English, Spanish".to_string(),
            authorization: "us".to_string(),
            relocation: "maybe".to_string(),
            work_mode: "remote".to_string(),
            theme: "slate".to_string(),
        }
    }

    #[test]
    fn test_minimal_record_builds_with_empty_sections() {
        let record = build_record(&minimal()).unwrap();
        assert_eq!(record.name(), "Jane Doe");
        assert_eq!(record.role(), "Engineer");
        assert_eq!(record.email(), "jane@example.com");
        assert!(record.skills().is_empty());
        assert!(record.summary().is_none());
        assert!(record.phone().is_none());
        assert!(record.education().is_empty());
        assert!(record.preferences().is_empty());
        assert_eq!(record.theme(), Theme::Emerald);
    }

    #[test]
    fn test_full_record_builds() {
        let record = build_record(&full()).unwrap();
        assert_eq!(record.summary(), Some("Builds reliable systems."));
        assert_eq!(record.skills(), ["Rust", "Go", "Kubernetes"]);
        assert_eq!(record.education().degree, Some(Degree::Bachelor));
        assert_eq!(record.education().graduation_year, Some(2015));
        assert_eq!(record.years_experience(), Some("8.5"));
        assert_eq!(record.preferences().work_mode, Some(WorkMode::Remote));
        assert_eq!(record.theme(), Theme::Slate);
        assert_eq!(
            record.links().linkedin.as_deref(),
            Some("https://www.linkedin.com/in/jane")
        );
    }

    #[test]
    fn test_name_role_email_are_jointly_mandatory() {
        let failure = build_record(&ResumeFields::default()).unwrap_err();
        assert!(failure.message_for("name").is_some());
        assert!(failure.message_for("role").is_some());
        assert!(failure.message_for("email").is_some());
        assert_eq!(failure.errors.len(), 3);
    }

    #[test]
    fn test_collects_every_failing_field() {
        let fields = ResumeFields {
            email: "not-an-email".to_string(),
            linkedin: "https://evil.com/linkedin.com".to_string(),
            github: "https://gitlab.com/jane".to_string(),
            work_mode: "sometimes".to_string(),
            grad_year: "1850".to_string(),
            theme: "neon".to_string(),
            ..minimal()
        };
        let failure = build_record(&fields).unwrap_err();
        for field in ["email", "linkedin", "github", "work_mode", "grad_year", "theme"] {
            assert!(failure.message_for(field).is_some(), "missing error for {field}");
        }
        assert!(failure.message_for("name").is_none());
    }

    #[test]
    fn test_linkedin_substring_trick_is_rejected() {
        let fields = ResumeFields {
            linkedin: "https://evil.com/linkedin.com".to_string(),
            ..minimal()
        };
        let failure = build_record(&fields).unwrap_err();
        assert_eq!(
            failure.message_for("linkedin"),
            Some("Must be a linkedin.com or linkedin.cn URL.")
        );
    }

    #[test]
    fn test_enumerations_are_not_coerced() {
        let fields = ResumeFields {
            relocation: "YES".to_string(),
            ..minimal()
        };
        assert!(build_record(&fields).unwrap_err().message_for("relocation").is_some());
    }

    #[test]
    fn test_overlong_structured_fields_are_rejected_not_cut() {
        let fields = ResumeFields {
            name: "A".repeat(NAME_MAX + 5),
            ..minimal()
        };
        assert!(build_record(&fields).unwrap_err().message_for("name").is_some());

        let at_bound = ResumeFields {
            name: "A".repeat(NAME_MAX),
            ..minimal()
        };
        assert!(build_record(&at_bound).is_ok());
    }

    #[test]
    fn test_summary_is_truncated_to_bound() {
        let fields = ResumeFields {
            summary: "word ".repeat(1000),
            ..minimal()
        };
        let record = build_record(&fields).unwrap();
        assert!(record.summary().unwrap().chars().count() <= SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_name_with_markup_is_rejected() {
        let fields = ResumeFields {
            name: "<b>Jane</b>".to_string(),
            ..minimal()
        };
        // angle brackets are stripped, the slash is not a name character
        assert!(build_record(&fields).unwrap_err().message_for("name").is_some());
    }

    #[test]
    fn test_bidi_controls_never_reach_the_record() {
        let fields = ResumeFields {
            name: "Jane\u{202E} Doe\u{200B}".to_string(),
            role: "Engi\u{2066}neer".to_string(),
            ..minimal()
        };
        let record = build_record(&fields).unwrap();
        assert_eq!(record.name(), "Jane Doe");
        assert_eq!(record.role(), "Engineer");
    }

    #[test]
    fn test_list_caps_apply() {
        let many = (0..60).map(|i| format!("skill{i}")).collect::<Vec<_>>().join(",");
        let fields = ResumeFields {
            skills: many,
            ..minimal()
        };
        let record = build_record(&fields).unwrap();
        assert_eq!(record.skills().len(), LIST_MAX_ITEMS);
        assert!(record.skills().join(", ").chars().count() <= LIST_JOINED_MAX);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let dropped_symbols = ResumeFields {
            summary: "Led R \u{00A7} D team".to_string(),
            achievements: "Cut costs \u{00B6} 40%".to_string(),
            ..full()
        };
        for fields in [minimal(), full(), dropped_symbols] {
            let record = build_record(&fields).unwrap();
            let rebuilt = build_record(&record.to_fields()).unwrap();
            assert_eq!(rebuilt, record);
            assert_eq!(rebuilt.to_fields(), record.to_fields());
        }
    }

    #[test]
    fn test_explicit_theme_default_when_empty() {
        let record = build_record(&minimal()).unwrap();
        assert_eq!(record.to_fields().theme, "emerald");
    }
}
