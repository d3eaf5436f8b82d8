//! Reply envelope: subject line, salutation and signature around a body.

use std::fmt;

/// Role marker that always closes the signature block.
pub const ROLE_MARKER: &str = "Support";

const GENERIC_GREETING: &str = "Hello,";

/// `"Re: "` + subject, unless the subject already starts with "re:" (any case).
pub fn reply_subject(original: &str) -> String {
    let already_reply = original
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_reply {
        original.to_string()
    } else {
        format!("Re: {original}")
    }
}

/// "Dear {name}," or a generic greeting when the name is blank.
pub fn salutation(recipient_name: &str) -> String {
    let name = recipient_name.trim();
    if name.is_empty() {
        GENERIC_GREETING.to_string()
    } else {
        format!("Dear {name},")
    }
}

/// Fixed sign-off ending in the role marker. The sender name may be blank.
pub fn signature(sender_name: &str) -> String {
    format!("Best regards,\n\n{}\n{ROLE_MARKER}", sender_name.trim())
}

/// A reply body with its envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub subject: String,
    pub salutation: String,
    pub body: String,
    pub signature: String,
}

impl Envelope {
    pub fn wrap(original_subject: &str, body: &str, sender_name: &str, recipient_name: &str) -> Self {
        Self {
            subject: reply_subject(original_subject),
            salutation: salutation(recipient_name),
            body: body.trim().to_string(),
            signature: signature(sender_name),
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Subject: {}\n\n{}\n\n{}\n\n{}",
            self.subject, self.salutation, self.body, self.signature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_gets_prefix() {
        assert_eq!(
            reply_subject("Payment failure on checkout for order #1824"),
            "Re: Payment failure on checkout for order #1824"
        );
    }

    #[test]
    fn existing_prefix_kept_case_insensitively() {
        assert_eq!(reply_subject("Re: hello"), "Re: hello");
        assert_eq!(reply_subject("RE: hello"), "RE: hello");
        assert_eq!(reply_subject("re:hello"), "re:hello");
    }

    #[test]
    fn prefix_must_be_at_start() {
        assert_eq!(reply_subject(" Re: hello"), "Re:  Re: hello");
        assert_eq!(reply_subject("Regarding invoice"), "Re: Regarding invoice");
    }

    #[test]
    fn short_and_non_ascii_subjects() {
        assert_eq!(reply_subject(""), "Re: ");
        assert_eq!(reply_subject("R"), "Re: R");
        assert_eq!(reply_subject("Ré"), "Re: Ré");
        assert_eq!(reply_subject("éé"), "Re: éé");
    }

    #[test]
    fn salutation_generic_when_blank() {
        assert_eq!(salutation(""), "Hello,");
        assert_eq!(salutation("   \t"), "Hello,");
        assert_eq!(salutation(" Dana "), "Dear Dana,");
    }

    #[test]
    fn signature_ends_with_role_marker() {
        assert!(signature("Sam").ends_with("\nSupport"));
        assert!(signature("").ends_with("Support"));
        assert_eq!(signature("Sam"), "Best regards,\n\nSam\nSupport");
    }

    #[test]
    fn render_layout() {
        let envelope = Envelope::wrap("Order", "  Body text.  ", "Sam", "Dana");
        assert_eq!(
            envelope.to_string(),
            "Subject: Re: Order\n\nDear Dana,\n\nBody text.\n\nBest regards,\n\nSam\nSupport"
        );
    }
}
