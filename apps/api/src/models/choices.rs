//! Closed enumerations accepted by the form. Unknown codes are rejected by the
//! builder, never coerced to a default.

use serde::{Deserialize, Serialize};

/// A closed set of form choices, each with a wire code and a display label.
pub trait Choice: Sized + Copy + 'static {
    /// Every accepted wire code, in display order.
    const CODES: &'static [&'static str];

    fn from_code(code: &str) -> Option<Self>;
    fn code(self) -> &'static str;
    fn label(self) -> &'static str;
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($code:literal, $label:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl Choice for $name {
            const CODES: &'static [&'static str] = &[$($code),+];

            fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }
    };
}

choice_enum! {
    /// Preferred working arrangement.
    WorkMode {
        Onsite => ("onsite", "On-site"),
        Hybrid => ("hybrid", "Hybrid"),
        Remote => ("remote", "Remote"),
    }
}

choice_enum! {
    /// Willingness to relocate.
    Relocation {
        Yes => ("yes", "Yes"),
        No => ("no", "No"),
        Maybe => ("maybe", "Maybe"),
    }
}

choice_enum! {
    /// Work authorization status.
    Authorization {
        UsCitizen => ("us", "US Citizen"),
        GreenCard => ("gc", "Green Card"),
        Ead => ("ead", "EAD"),
        H1b => ("h1b", "H-1B"),
        Tn => ("tn", "TN"),
        E3 => ("e3", "E-3"),
        Other => ("other", "Other"),
    }
}

choice_enum! {
    /// Highest completed degree.
    Degree {
        HighSchool => ("hs", "High School"),
        Associate => ("aa", "Associate"),
        Bachelor => ("ba", "Bachelor's"),
        Master => ("ms", "Master's"),
        Phd => ("phd", "PhD"),
        Bootcamp => ("bootcamp", "Bootcamp"),
        Other => ("other", "Other"),
    }
}

choice_enum! {
    /// Visual theme used by the HTML, PDF and image renderers.
    Theme {
        Emerald => ("emerald", "Emerald"),
        Sapphire => ("sapphire", "Sapphire"),
        Slate => ("slate", "Slate"),
        Rose => ("rose", "Rose"),
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Emerald
    }
}
