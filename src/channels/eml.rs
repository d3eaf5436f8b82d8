//! RFC 822 (`.eml`) input.

use std::path::Path;

use mail_parser::{MessageParser, PartType};

use crate::error::InputError;
use crate::pipeline::types::Email;

/// Tags that end a line of rendered text.
const BLOCK_TAGS: &[&str] = &["br", "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "blockquote"];

/// Parse a raw message into subject and plain-text body.
///
/// Prefers the first `text/plain` part and falls back to stripped HTML.
/// A message with neither yields an empty body.
pub fn parse_eml(raw: &[u8]) -> Result<Email, InputError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or(InputError::Unparseable)?;

    let subject = parsed.subject().unwrap_or_default().trim().to_string();

    let plain = parsed.parts.iter().find_map(|part| match &part.body {
        PartType::Text(text) => Some(text.to_string()),
        _ => None,
    });
    let body = plain
        .or_else(|| {
            parsed.parts.iter().find_map(|part| match &part.body {
                PartType::Html(html) => Some(strip_html(html)),
                _ => None,
            })
        })
        .unwrap_or_default();

    Ok(Email::new(subject, body))
}

/// Read and parse an `.eml` file.
pub fn read_eml(path: impl AsRef<Path>) -> Result<Email, InputError> {
    let raw = std::fs::read(path)?;
    parse_eml(&raw)
}

/// Render HTML as plain text. Block-level tags become line breaks so
/// quoted-reply markers and paragraphs survive for normalization.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name: String = tag
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => out.push(ch),
        }
    }

    let out = decode_entities(&out);
    let lines: Vec<String> = out
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    // Collapse runs of blank lines to a single paragraph break.
    let mut text = String::new();
    let mut blank = false;
    for line in lines {
        if line.is_empty() {
            blank = !text.is_empty();
            continue;
        }
        if !text.is_empty() {
            text.push_str(if blank { "\n\n" } else { "\n" });
        }
        text.push_str(&line);
        blank = false;
    }
    text
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
