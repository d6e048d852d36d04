//! PII redaction for text that leaves the trust boundary.
//!
//! Every journal string is passed through [`sanitize`] before it is included
//! in any AI request. The pipeline truncates first, then redacts, in a fixed
//! substitution order. Redaction is idempotent: the placeholder tokens do
//! not themselves match any pattern.
//!
//! Truncation before redaction means a PII pattern split by the cut can
//! remain partially visible in the tail. That trade is accepted rather than
//! repaired. Substitution can also grow the text past the cap ("a@b.co"
//! becomes the longer "[EMAIL]"), so the result is clamped back afterwards,
//! dropping any placeholder the clamp would split — re-applying the pipeline
//! must never see a partial token.

use regex::Regex;
use std::sync::OnceLock;

static EMAIL: OnceLock<Regex> = OnceLock::new();
static PHONE_PLAIN: OnceLock<Regex> = OnceLock::new();
static PHONE_PAREN: OnceLock<Regex> = OnceLock::new();
static SSN: OnceLock<Regex> = OnceLock::new();
static CARD: OnceLock<Regex> = OnceLock::new();
static ADDRESS: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
    })
}

fn phone_plain_re() -> &'static Regex {
    // NNN-NNN-NNNN, NNN.NNN.NNNN, or ten plain digits. The word boundaries
    // keep this from firing inside longer digit runs such as card numbers.
    PHONE_PLAIN.get_or_init(|| {
        Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("valid regex")
    })
}

fn phone_paren_re() -> &'static Regex {
    PHONE_PAREN.get_or_init(|| {
        Regex::new(r"\(\d{3}\)\s?\d{3}[-.]?\d{4}\b").expect("valid regex")
    })
}

fn ssn_re() -> &'static Regex {
    SSN.get_or_init(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid regex"))
}

fn card_re() -> &'static Regex {
    CARD.get_or_init(|| {
        Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").expect("valid regex")
    })
}

fn address_re() -> &'static Regex {
    ADDRESS.get_or_init(|| {
        Regex::new(
            r"(?i)\b\d+\s+[A-Za-z\s]+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln)\b",
        )
        .expect("valid regex")
    })
}

const PLACEHOLDERS: &[&str] = &["[EMAIL]", "[PHONE]", "[SSN]", "[CARD]", "[ADDRESS]"];

/// Clamp redacted text back to `max_len` characters. A placeholder that the
/// clamp would split is dropped whole: a partial token would re-expand or
/// survive differently on the next pass and break idempotence.
fn clamp_redacted(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len).collect();
    if let Some(start) = cut.rfind('[') {
        let tail = &cut[start..];
        if PLACEHOLDERS
            .iter()
            .any(|p| p.len() > tail.len() && p.starts_with(tail))
        {
            cut.truncate(start);
        }
    }
    cut
}

/// Truncate `text` to `max_len` characters, then redact PII patterns in a
/// fixed order: email, phone (two formats), SSN, card number, street address.
/// The result is clamped back to `max_len` and trimmed. Re-applying the
/// function is a no-op.
pub fn sanitize(text: &str, max_len: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let truncated: String = text.chars().take(max_len).collect();

    let out = email_re().replace_all(&truncated, "[EMAIL]");
    let out = phone_plain_re().replace_all(&out, "[PHONE]");
    let out = phone_paren_re().replace_all(&out, "[PHONE]");
    let out = ssn_re().replace_all(&out, "[SSN]");
    let out = card_re().replace_all(&out, "[CARD]");
    let out = address_re().replace_all(&out, "[ADDRESS]");

    clamp_redacted(&out, max_len).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email_and_phone() {
        let out = sanitize("Contact me at a@b.com or 555-123-4567", 200);
        assert_eq!(out, "Contact me at [EMAIL] or [PHONE]");
    }

    #[test]
    fn redacts_phone_variants() {
        assert_eq!(sanitize("call 555.123.4567 now", 200), "call [PHONE] now");
        assert_eq!(sanitize("call 5551234567 now", 200), "call [PHONE] now");
        assert_eq!(sanitize("call (555) 123-4567 now", 200), "call [PHONE] now");
    }

    #[test]
    fn redacts_ssn_not_as_phone() {
        assert_eq!(sanitize("ssn 123-45-6789 end", 200), "ssn [SSN] end");
    }

    #[test]
    fn redacts_card_with_and_without_separators() {
        assert_eq!(
            sanitize("card 1234-5678-9012-3456 end", 200),
            "card [CARD] end"
        );
        assert_eq!(
            sanitize("card 1234 5678 9012 3456 end", 200),
            "card [CARD] end"
        );
    }

    #[test]
    fn redacts_street_address_case_insensitive() {
        assert_eq!(
            sanitize("I live at 42 Maple avenue with my cat", 200),
            "I live at [ADDRESS] with my cat"
        );
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "mail a@b.com phone 555-123-4567 ssn 123-45-6789",
            "card 1234 5678 9012 3456 at 9 Elm Street",
            "nothing sensitive here",
        ];
        for input in inputs {
            let once = sanitize(input, 500);
            let twice = sanitize(&once, 500);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn idempotent_when_redaction_grows_past_the_cap() {
        // "a@b.co a@b.co" is 13 chars; redaction expands it to 15, and the
        // clamp must not leave a split placeholder behind.
        let once = sanitize("a@b.co a@b.co", 13);
        assert_eq!(once, "[EMAIL]");
        assert_eq!(sanitize(&once, 13), once);
    }

    #[test]
    fn output_never_exceeds_the_length_cap() {
        for max_len in 1..=20 {
            let out = sanitize("a@b.co or 555-123-4567", max_len);
            assert!(
                out.chars().count() <= max_len,
                "cap {max_len} exceeded: {out:?}"
            );
            assert_eq!(sanitize(&out, max_len), out, "not a fixed point at {max_len}");
        }
    }

    #[test]
    fn clamp_keeps_a_placeholder_that_fits_exactly() {
        // Cap lands exactly on the closing bracket: the token survives whole.
        assert_eq!(sanitize("a@b.co", 7), "[EMAIL]");
    }

    #[test]
    fn truncates_before_redacting() {
        // The email is cut in half by the length cap; the surviving prefix is
        // no longer a full pattern and stays as-is.
        let out = sanitize("write to someone@example.com", 17);
        assert_eq!(out, "write to someone@");
    }

    #[test]
    fn truncation_is_char_based() {
        let out = sanitize("héllo wörld", 5);
        assert_eq!(out, "héllo");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(sanitize("", 100), "");
    }

    #[test]
    fn output_is_trimmed() {
        assert_eq!(sanitize("  padded  ", 100), "padded");
    }
}
