//! Deterministic template replies: the guaranteed fallback body.
//!
//! Output is body text only. Subject line, salutation and signature are
//! added by `envelope`, never here.

use crate::pipeline::types::{Tone, UrgencyLabel};

/// Draft a reply body for the given label, intent and tone. Never fails.
pub fn draft_reply(label: UrgencyLabel, intent: &str, tone: Tone) -> String {
    let intent = single_line(intent);

    [
        opening(tone).to_string(),
        intent_line(&intent, tone),
        urgency_line(label, tone).to_string(),
        closing(tone).to_string(),
    ]
    .join("\n\n")
}

fn opening(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "Thank you for your message.",
        Tone::Neutral => "Thanks for reaching out.",
        Tone::Friendly => "Thanks so much for getting in touch!",
    }
}

fn intent_line(intent: &str, tone: Tone) -> String {
    if intent.is_empty() {
        return match tone {
            Tone::Formal => "We have carefully reviewed your message.",
            Tone::Neutral => "We've reviewed your message.",
            Tone::Friendly => "I've read through your message.",
        }
        .to_string();
    }

    let intent = with_terminal(intent);
    match tone {
        Tone::Formal => format!("We understand that your message concerns the following: {intent}"),
        Tone::Neutral => format!("Here's what we understand you need: {intent}"),
        Tone::Friendly => format!("Just to make sure I've got it right: {intent}"),
    }
}

fn urgency_line(label: UrgencyLabel, tone: Tone) -> &'static str {
    match (label, tone) {
        (UrgencyLabel::Urgent, Tone::Formal) => {
            "We recognise the time-sensitive nature of this matter and have escalated it for \
             expedited handling. A member of our team will follow up with you as a priority."
        }
        (UrgencyLabel::Urgent, Tone::Neutral) => {
            "We understand this is urgent and have prioritised it for immediate attention. \
             We'll follow up with next steps as soon as possible."
        }
        (UrgencyLabel::Urgent, Tone::Friendly) => {
            "I can see this is urgent, so I've flagged it for fast-track handling. \
             We'll get back to you right away!"
        }
        (UrgencyLabel::Normal, Tone::Formal) => {
            "Your request has been logged and will be reviewed by the appropriate team. \
             We will respond within one business day."
        }
        (UrgencyLabel::Normal, Tone::Neutral) => {
            "We're looking into it and will get back to you within one business day."
        }
        (UrgencyLabel::Normal, Tone::Friendly) => {
            "We're on it and will get back to you within a day or so."
        }
        (UrgencyLabel::Low, Tone::Formal) => {
            "No immediate action appears to be required. We will follow up at our \
             earliest convenience should anything further be needed."
        }
        (UrgencyLabel::Low, Tone::Neutral) => {
            "This doesn't look time-sensitive, so we'll follow up when we have an update."
        }
        (UrgencyLabel::Low, Tone::Friendly) => {
            "No rush on this one. We'll circle back when there's something new to share."
        }
    }
}

fn closing(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => {
            "Should you have any further information that may assist us, please do not \
             hesitate to share it."
        }
        Tone::Neutral => "If there's anything else we should know, just reply to this email.",
        Tone::Friendly => "If anything else comes up, just hit reply and let me know!",
    }
}

/// Collapse all whitespace (including newlines) into single spaces.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn with_terminal(text: &str) -> String {
    if text.ends_with(['.', '!', '?', '…']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}
