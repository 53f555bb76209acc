//! Field validator: per-field structural checks run on already-sanitized text.
//!
//! Every field is checked against a list of [`FieldRule`]s. The first failing
//! rule produces that field's message; failures across fields are collected
//! into one [`ValidationReport`] so the caller can show every problem at once.
//!
//! An empty value on a field without [`FieldRule::Required`] skips the
//! remaining rules: optional fields are either absent or fully valid.

pub mod url;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Patterns
// ────────────────────────────────────────────────────────────────────────────

/// Structural shapes a field value can be required to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Letters, spaces, `.`, `'`, `-`.
    PersonName,
    /// Letters, digits, space and `, . / & ( ) + # -`.
    SafeText,
    Email,
    /// Digits, `+`, `-`, space, parentheses.
    Phone,
    /// Exactly four digits.
    Year,
    /// `5` or `5.5` style.
    YearsExperience,
}

impl Pattern {
    const ALL: [Pattern; 6] = [
        Pattern::PersonName,
        Pattern::SafeText,
        Pattern::Email,
        Pattern::Phone,
        Pattern::Year,
        Pattern::YearsExperience,
    ];

    fn source(self) -> &'static str {
        match self {
            Pattern::PersonName => r"^[\p{L}\p{M} .'\-]+$",
            Pattern::SafeText => r"^[\p{L}\p{M}0-9 ,./&()+#\-]+$",
            Pattern::Email => {
                r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$"
            }
            Pattern::Phone => r"^[0-9+()\- ]+$",
            Pattern::Year => r"^[0-9]{4}$",
            Pattern::YearsExperience => r"^[0-9]{1,2}(\.[0-9])?$",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Pattern::PersonName => "Use letters, spaces, periods, apostrophes and hyphens only.",
            Pattern::SafeText => "Contains characters that are not allowed.",
            Pattern::Email => "Enter a valid email address.",
            Pattern::Phone => "Enter a valid phone number.",
            Pattern::Year => "Use a 4-digit year.",
            Pattern::YearsExperience => "Use a number like 5 or 5.5.",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Compiled regex, built once per process.
    pub fn regex(self) -> &'static Regex {
        static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
        let compiled = COMPILED.get_or_init(|| {
            Pattern::ALL
                .iter()
                .map(|p| Regex::new(p.source()).expect("static field pattern compiles"))
                .collect()
        });
        &compiled[self.index()]
    }

    pub fn is_match(self, value: &str) -> bool {
        self.regex().is_match(value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rules
// ────────────────────────────────────────────────────────────────────────────

/// One validation capability. Fields combine several.
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    Required,
    /// Inclusive bounds, counted in code points.
    Length { min: usize, max: usize },
    Pattern(Pattern),
    OneOf(&'static [&'static str]),
    /// Absolute http(s) URL whose host equals or is a subdomain of a listed domain.
    AllowedHost(&'static [&'static str]),
    /// Absolute http(s) URL with any host.
    WebUrl,
    /// Inclusive numeric bounds on the parsed value.
    NumericRange { min: f64, max: f64 },
}

impl FieldRule {
    /// Returns the failure message, or `None` when `value` passes.
    fn check(&self, value: &str) -> Option<String> {
        match *self {
            FieldRule::Required => value
                .trim()
                .is_empty()
                .then(|| "This field is required.".to_string()),
            FieldRule::Length { min, max } => {
                let len = value.chars().count();
                (len < min || len > max)
                    .then(|| format!("Must be between {min} and {max} characters."))
            }
            FieldRule::Pattern(p) => (!p.is_match(value)).then(|| p.message().to_string()),
            FieldRule::OneOf(choices) => (!choices.contains(&value))
                .then(|| format!("Not a valid choice. Expected one of: {}.", choices.join(", "))),
            FieldRule::AllowedHost(domains) => url::check_allowed_host(value, domains)
                .err()
                .map(|e| match e {
                    url::UrlCheckError::HostNotAllowed(_) => {
                        format!("Must be a {} URL.", domains.join(" or "))
                    }
                    other => format!("Invalid URL: {other}."),
                }),
            FieldRule::WebUrl => url::web_host(value)
                .err()
                .map(|e| format!("Invalid URL: {e}.")),
            FieldRule::NumericRange { min, max } => match value.parse::<f64>() {
                Ok(n) if n >= min && n <= max => None,
                Ok(_) => Some(format!("Must be between {min} and {max}.")),
                Err(_) => Some("Must be a number.".to_string()),
            },
        }
    }
}

/// Runs `rules` against one field value, returning the first failure.
pub fn validate_field(value: &str, rules: &[FieldRule]) -> Result<(), String> {
    let required = rules.iter().any(|r| matches!(r, FieldRule::Required));
    if value.is_empty() && !required {
        return Ok(());
    }
    match rules.iter().find_map(|rule| rule.check(value)) {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collected failures
// ────────────────────────────────────────────────────────────────────────────

/// Field-level, user-correctable failure: one message per offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationFailure {
    pub errors: BTreeMap<String, String>,
}

impl ValidationFailure {
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

/// Accumulates per-field failures without short-circuiting.
#[derive(Debug, Default)]
pub struct ValidationReport {
    errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `value` and records a failure under `field`. Returns whether it passed.
    pub fn check(&mut self, field: &str, value: &str, rules: &[FieldRule]) -> bool {
        match validate_field(value, rules) {
            Ok(()) => true,
            Err(message) => {
                self.reject(field, message);
                false
            }
        }
    }

    /// Records a failure for `field` unless one is already present.
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationFailure> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure {
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_empty() {
        assert!(validate_field("", &[FieldRule::Required]).is_err());
        assert!(validate_field("x", &[FieldRule::Required]).is_ok());
    }

    #[test]
    fn test_optional_empty_skips_other_rules() {
        let rules = [FieldRule::Length { min: 7, max: 20 }, FieldRule::Pattern(Pattern::Phone)];
        assert!(validate_field("", &rules).is_ok());
        assert!(validate_field("123", &rules).is_err());
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let rules = [
            FieldRule::Length { min: 2, max: 80 },
            FieldRule::Pattern(Pattern::PersonName),
        ];
        let err = validate_field("J", &rules).unwrap_err();
        assert!(err.contains("between 2 and 80"));
        let err = validate_field("J4ne", &rules).unwrap_err();
        assert!(err.contains("letters"));
    }

    #[test]
    fn test_person_name_pattern() {
        assert!(Pattern::PersonName.is_match("Jane O'Neil-Smith Jr."));
        assert!(Pattern::PersonName.is_match("Jos\u{00E9} Mu\u{00F1}oz"));
        assert!(!Pattern::PersonName.is_match("Jane (admin)"));
        assert!(!Pattern::PersonName.is_match("Jane2"));
    }

    #[test]
    fn test_safe_text_pattern() {
        assert!(Pattern::SafeText.is_match("Sr. Engineer, C++ / R&D (Platform) #1"));
        assert!(!Pattern::SafeText.is_match("Engineer; drop table"));
        assert!(!Pattern::SafeText.is_match("Engineer!"));
    }

    #[test]
    fn test_email_pattern() {
        assert!(Pattern::Email.is_match("jane@example.com"));
        assert!(Pattern::Email.is_match("jane.doe+cv@mail.example.co.uk"));
        assert!(!Pattern::Email.is_match("jane@example"));
        assert!(!Pattern::Email.is_match("jane.example.com"));
        assert!(!Pattern::Email.is_match("jane@-example.com"));
        assert!(!Pattern::Email.is_match("jane@@example.com"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(Pattern::Phone.is_match("+1 (555) 010-2030"));
        assert!(!Pattern::Phone.is_match("555.010.2030"));
        assert!(!Pattern::Phone.is_match("call me"));
    }

    #[test]
    fn test_one_of() {
        let rules = [FieldRule::OneOf(&["yes", "no", "maybe"])];
        assert!(validate_field("maybe", &rules).is_ok());
        assert!(validate_field("YES", &rules).is_err());
        assert!(validate_field("sure", &rules).is_err());
    }

    #[test]
    fn test_numeric_range() {
        let rules = [
            FieldRule::Pattern(Pattern::Year),
            FieldRule::NumericRange { min: 1940.0, max: 2035.0 },
        ];
        assert!(validate_field("2020", &rules).is_ok());
        assert!(validate_field("1899", &rules).is_err());
        assert!(validate_field("20x0", &rules).is_err());
    }

    #[test]
    fn test_years_experience_pattern() {
        assert!(Pattern::YearsExperience.is_match("5"));
        assert!(Pattern::YearsExperience.is_match("12.5"));
        assert!(!Pattern::YearsExperience.is_match("5.25"));
        assert!(!Pattern::YearsExperience.is_match("100"));
    }

    #[test]
    fn test_allowed_host_message() {
        let rules = [FieldRule::AllowedHost(&["github.com"])];
        let err = validate_field("https://gitlab.com/jane", &rules).unwrap_err();
        assert_eq!(err, "Must be a github.com URL.");
        assert!(validate_field("https://github.com/jane", &rules).is_ok());
    }

    #[test]
    fn test_report_collects_every_field() {
        let mut report = ValidationReport::new();
        assert!(!report.check("name", "", &[FieldRule::Required]));
        assert!(!report.check("email", "nope", &[FieldRule::Pattern(Pattern::Email)]));
        assert!(report.check("role", "Engineer", &[FieldRule::Required]));

        let failure = report.into_result().unwrap_err();
        assert_eq!(failure.errors.len(), 2);
        assert!(failure.message_for("name").is_some());
        assert!(failure.message_for("email").is_some());
        assert!(failure.message_for("role").is_none());
    }

    #[test]
    fn test_report_keeps_first_message_per_field() {
        let mut report = ValidationReport::new();
        report.reject("email", "first");
        report.reject("email", "second");
        assert_eq!(
            report.into_result().unwrap_err().message_for("email"),
            Some("first")
        );
    }
}
