use serde::{Deserialize, Serialize};

/// Raw submission as handed over by the form boundary.
///
/// Every field is a plain string defaulting to `""`, so deserialization never
/// depends on which keys the client sent and model construction is total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeFields {
    // identity / contact
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,

    // positioning / links
    pub role: String,
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,

    // education
    pub school: String,
    pub highest_degree: String,
    pub grad_year: String,
    pub years: String,

    // free text
    pub summary: String,
    pub achievements: String,
    pub skills: String,
    pub certifications: String,
    pub languages: String,

    // preferences
    pub authorization: String,
    pub relocation: String,
    pub work_mode: String,

    // presentation
    pub theme: String,
}
