/// Email detection over rendered page text
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Local part, `@`, dot-separated domain labels, alphabetic TLD of 2+ letters
///
/// Word boundaries are ASCII-only, so an address run up against CJK or
/// accented text still matches.
pub const EMAIL_PATTERN: &str =
    r"(?-u:\b)[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?-u:\b)";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

/// Extract email addresses from a page's text content
///
/// Matches are returned in first-seen order with duplicates removed.
/// Absent or empty text yields an empty list.
///
/// Examples:
/// - "contact a@b.com or b@c.co" → ["a@b.com", "b@c.co"]
/// - "a@b.com, A@b.com, a@b.com" → ["a@b.com", "A@b.com"]
pub fn detect_emails(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|email| seen.insert(*email))
        .map(str::to_string)
        .collect()
}

/// Check whether a whole string is an email address
pub fn is_email(candidate: &str) -> bool {
    EMAIL_RE
        .find(candidate)
        .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_emails_first_seen_order() {
        assert_eq!(
            detect_emails(Some("contact a@b.com or b@c.co")),
            vec!["a@b.com".to_string(), "b@c.co".to_string()]
        );
    }

    #[test]
    fn test_detect_emails_empty() {
        assert!(detect_emails(None).is_empty());
        assert!(detect_emails(Some("")).is_empty());
        assert!(detect_emails(Some("no addresses here")).is_empty());
    }

    #[test]
    fn test_detect_emails_deduplicates() {
        let text = "Write to sales@acme.io. Again: sales@acme.io, or support@acme.io; sales@acme.io";
        assert_eq!(
            detect_emails(Some(text)),
            vec!["sales@acme.io".to_string(), "support@acme.io".to_string()]
        );
    }

    #[test]
    fn test_detect_emails_case_sensitive_dedup() {
        // Distinct spellings are kept as the page shows them
        assert_eq!(
            detect_emails(Some("a@b.com A@b.com a@b.com")),
            vec!["a@b.com".to_string(), "A@b.com".to_string()]
        );
    }

    #[test]
    fn test_detect_emails_local_part_symbols() {
        let found = detect_emails(Some("mail first.last+tag%x_y-z@sub.example.co.uk now"));
        assert_eq!(found, vec!["first.last+tag%x_y-z@sub.example.co.uk".to_string()]);
    }

    #[test]
    fn test_detect_emails_rejects_short_tld() {
        assert!(detect_emails(Some("user@host.c")).is_empty());
        assert!(detect_emails(Some("user@localhost")).is_empty());
        assert!(detect_emails(Some("user@host.123")).is_empty());
    }

    #[test]
    fn test_detect_emails_trailing_punctuation() {
        assert_eq!(
            detect_emails(Some("(reach me at jane@doe.org.)")),
            vec!["jane@doe.org".to_string()]
        );
    }

    #[test]
    fn test_detect_emails_next_to_non_ascii_letters() {
        assert_eq!(detect_emails(Some("邮箱a@b.com")), vec!["a@b.com".to_string()]);
        assert_eq!(detect_emails(Some("a@b.com联系我们")), vec!["a@b.com".to_string()]);
        assert_eq!(detect_emails(Some("a@b.comé")), vec!["a@b.com".to_string()]);
        assert_eq!(
            detect_emails(Some("联系：jane@doe.org，电话")),
            vec!["jane@doe.org".to_string()]
        );
    }

    #[test]
    fn test_detect_emails_multiline() {
        let text = "Team\nalice@corp.com\n\tbob@corp.com\r\nalice@corp.com";
        assert_eq!(
            detect_emails(Some(text)),
            vec!["alice@corp.com".to_string(), "bob@corp.com".to_string()]
        );
    }

    #[test]
    fn test_detect_emails_output_properties() {
        let inputs = [
            "x@y.zz x@y.zz",
            "foo@bar.com,foo@bar.com;baz@qux.org",
            "@@ a@ @b.com a@b c@d.ef",
            "nested <a href=\"mailto:m@n.io\">m@n.io</a>",
        ];

        for input in inputs {
            let found = detect_emails(Some(input));
            let unique: HashSet<&String> = found.iter().collect();
            assert_eq!(unique.len(), found.len(), "duplicates in {:?}", found);
            assert!(found.iter().all(|e| is_email(e)), "non-email in {:?}", found);
        }
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("a@b.com"));
        assert!(!is_email("a@b.com extra"));
        assert!(!is_email("not-an-email"));
        assert!(!is_email(""));
    }
}
