//! Input channels: turn raw bytes or text into an `Email`.

pub mod eml;
pub mod text;

pub use eml::{parse_eml, read_eml};
pub use text::{parse_text, read_text};
