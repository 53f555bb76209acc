// Canonical Resume Model: the immutable record and the builder that produces it.

pub mod builder;
pub mod record;

pub use builder::build_record;
pub use record::ResumeRecord;
