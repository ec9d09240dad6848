//! PII masking.
//!
//! Email addresses, phone numbers and IPv4 addresses are replaced by fixed
//! placeholders. Each masker returns the rewritten text and the number of
//! replacements made.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const EMAIL_PLACEHOLDER: &str = "|||EMAIL_ADDRESS|||";
pub const PHONE_PLACEHOLDER: &str = "|||PHONE_NUMBER|||";
pub const IP_PLACEHOLDER: &str = "|||IP_ADDRESS|||";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
static IP_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").expect("static regex")
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_REGEX
        .get_or_init(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("static regex"))
}

fn ip_regex() -> &'static Regex {
    IP_REGEX.get_or_init(|| {
        Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("static regex")
    })
}

/// Replace every match of `re` with `placeholder`.
fn mask_with(re: &Regex, text: &str, placeholder: &str) -> (String, usize) {
    let count = re.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (re.replace_all(text, placeholder).into_owned(), count)
}

/// Mask email addresses.
#[must_use]
pub fn mask_emails(text: &str) -> (String, usize) {
    mask_with(email_regex(), text, EMAIL_PLACEHOLDER)
}

/// Mask US-style phone numbers such as `(555) 123-4567` or `555.123.4567`.
#[must_use]
pub fn mask_phone_numbers(text: &str) -> (String, usize) {
    mask_with(phone_regex(), text, PHONE_PLACEHOLDER)
}

/// Mask dotted-quad IPv4 addresses.
#[must_use]
pub fn mask_ips(text: &str) -> (String, usize) {
    mask_with(ip_regex(), text, IP_PLACEHOLDER)
}

/// Replacement counts from [`mask_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiCounts {
    pub emails: usize,
    pub phones: usize,
    pub ips: usize,
}

impl PiiCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.emails + self.phones + self.ips
    }

    pub fn add(&mut self, other: PiiCounts) {
        self.emails += other.emails;
        self.phones += other.phones;
        self.ips += other.ips;
    }
}

/// Mask emails, then phone numbers, then IP addresses.
#[must_use]
pub fn mask_all(text: &str) -> (String, PiiCounts) {
    let (text, emails) = mask_emails(text);
    let (text, phones) = mask_phone_numbers(&text);
    let (text, ips) = mask_ips(&text);
    (text, PiiCounts { emails, phones, ips })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_emails() {
        let (masked, n) = mask_emails("write to jane.doe@example.com or ops+alerts@mail.example.org");
        assert_eq!(n, 2);
        assert_eq!(
            masked,
            format!("write to {EMAIL_PLACEHOLDER} or {EMAIL_PLACEHOLDER}")
        );
    }

    #[test]
    fn test_mask_emails_none() {
        let (masked, n) = mask_emails("no address @ here");
        assert_eq!(n, 0);
        assert_eq!(masked, "no address @ here");
    }

    #[test]
    fn test_mask_phone_numbers() {
        for phone in ["(555) 123-4567", "555-123-4567", "555.123.4567", "5551234567"] {
            let (masked, n) = mask_phone_numbers(&format!("call {phone} today"));
            assert_eq!(n, 1, "{phone}");
            assert_eq!(masked, format!("call {PHONE_PLACEHOLDER} today"));
        }
    }

    #[test]
    fn test_mask_ips() {
        let (masked, n) = mask_ips("hosts 10.0.0.1 and 192.168.100.254 are up");
        assert_eq!(n, 2);
        assert_eq!(
            masked,
            format!("hosts {IP_PLACEHOLDER} and {IP_PLACEHOLDER} are up")
        );

        let (_, n) = mask_ips("version 1.2.3 is not an address");
        assert_eq!(n, 0);
    }

    #[test]
    fn test_mask_all() {
        let text = "mail a@b.com, phone 555-123-4567, host 8.8.8.8";
        let (masked, counts) = mask_all(text);

        assert_eq!(
            counts,
            PiiCounts {
                emails: 1,
                phones: 1,
                ips: 1
            }
        );
        assert_eq!(counts.total(), 3);
        assert_eq!(
            masked,
            format!("mail {EMAIL_PLACEHOLDER}, phone {PHONE_PLACEHOLDER}, host {IP_PLACEHOLDER}")
        );
    }

    #[test]
    fn test_counts_add() {
        let mut total = PiiCounts::default();
        total.add(PiiCounts {
            emails: 1,
            phones: 2,
            ips: 3,
        });
        total.add(PiiCounts {
            emails: 1,
            phones: 0,
            ips: 0,
        });
        assert_eq!(total.emails, 2);
        assert_eq!(total.total(), 7);
    }
}
