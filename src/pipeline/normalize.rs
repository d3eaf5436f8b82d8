//! Text normalizer: combines subject and body, then strips quoted reply
//! chains and boilerplate disclaimers.
//!
//! Pure string processing. Stable under repeated application.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::NormalizedText;

/// "On <date> <person> wrote:" attribution lines.
static ATTRIBUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^on\s.{0,200}\bwrote:$").expect("valid regex"));

/// "--- Original Message ---" / "---------- Forwarded message ---------" separators.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^-{2,}\s*(original message|forwarded message)\s*-{2,}$").expect("valid regex")
});

static OUTLOOK_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^from:\s*\S").expect("valid regex"));

static OUTLOOK_SENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(sent|date):\s*\S").expect("valid regex"));

/// Paragraphs matching this are legal or device boilerplate.
static DISCLAIMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        confidentiality\s+notice
        | this\s+(e-?mail|message|communication)(\s+and\s+any\s+(attachments|files))?[^.]{0,40}\b(is|are|may\s+be|may\s+contain|contains?)\s+(strictly\s+)?(confidential|privileged|intended)
        | intended\s+(solely|only)\s+for\s+the\s+(use\s+of\s+the\s+)?(individual|addressee|named\s+recipient|recipient)
        | if\s+you\s+(are\s+not\s+the\s+intended\s+recipient|have\s+received\s+this\s+(e-?mail|message)?\s*in\s+error)
        | ^disclaimer\b
        | ^sent\s+from\s+my\s+(iphone|ipad|android|mobile|phone|samsung)
        ",
    )
    .expect("valid regex")
});

/// Normalize an email into the text fed to the classifier and summarizer.
pub fn normalize(subject: &str, body: &str) -> NormalizedText {
    NormalizedText::new(strip_quotes_and_disclaimers(&combine_subject_body(
        subject, body,
    )))
}

/// Subject first, a blank line, then the body. Empty parts are skipped.
pub fn combine_subject_body(subject: &str, body: &str) -> String {
    [subject.trim(), body.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Remove quoted replies, forwarded history and disclaimer paragraphs.
pub fn strip_quotes_and_disclaimers(text: &str) -> String {
    let lines = truncate_history(drop_quoted_lines(text));

    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
        .into_iter()
        .map(|paragraph| paragraph.join("\n"))
        .filter(|paragraph| !DISCLAIMER.is_match(paragraph.trim_start()))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

/// Lines starting with `>` are quoted prior correspondence.
fn drop_quoted_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect()
}

/// Cut everything from the first history marker onwards.
fn truncate_history(lines: Vec<&str>) -> Vec<&str> {
    let cut = lines.iter().enumerate().position(|(i, line)| {
        let trimmed = line.trim();
        if ATTRIBUTION.is_match(trimmed) || SEPARATOR.is_match(trimmed) {
            return true;
        }
        // Outlook-style "From: ...\nSent: ..." header block
        OUTLOOK_FROM.is_match(trimmed)
            && lines
                .get(i + 1)
                .is_some_and(|next| OUTLOOK_SENT.is_match(next.trim()))
    });

    match cut {
        Some(index) => lines[..index].to_vec(),
        None => lines,
    }
}
