// Input hygiene for untrusted form text.
// Everything here is pure and infallible; validation lives in `crate::validation`.

pub mod filename;
pub mod list;
pub mod text;

pub use filename::safe_filename;
pub use list::{cap_joined_len, normalize_list, LIST_SEPARATOR};
pub use text::sanitize;
