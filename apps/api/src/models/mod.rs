pub mod choices;
pub mod fields;

pub use choices::{Choice, Theme};
pub use fields::ResumeFields;
