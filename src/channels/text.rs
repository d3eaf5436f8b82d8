//! Plain-text input, as typed or piped on stdin.

use std::io::Read;

use crate::error::InputError;
use crate::pipeline::types::Email;

const SUBJECT_PREFIX: &str = "subject:";

/// Split a leading `Subject: ...` line off the body.
///
/// The prefix match ignores case. Without a subject line the whole input is
/// the body and the subject is empty.
pub fn parse_text(input: &str) -> Email {
    let input = input.trim_start_matches('\u{feff}');
    let (first, rest) = match input.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (input, ""),
    };

    let has_subject = first
        .get(..SUBJECT_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(SUBJECT_PREFIX));
    if has_subject {
        let subject = first[SUBJECT_PREFIX.len()..].trim().to_string();
        Email::new(subject, rest.trim_start_matches(['\r', '\n']))
    } else {
        Email::new("", input)
    }
}

/// Read all of `reader` as UTF-8 and parse it with `parse_text`.
pub fn read_text<R: Read>(mut reader: R) -> Result<Email, InputError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let text = String::from_utf8(raw)?;
    Ok(parse_text(&text))
}
