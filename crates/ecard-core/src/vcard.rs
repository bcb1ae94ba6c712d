//! vCard export
//!
//! Emits a vCard 3.0 record for the contact block of the public preview.
//! Text values are escaped, the URL is written as-is, and content lines longer
//! than 75 octets are folded.

use serde::{Deserialize, Serialize};

/// File name offered for download
pub const VCARD_FILE_NAME: &str = "contact.vcf";

/// MIME type of the exported record
pub const VCARD_MIME: &str = "text/vcard";

/// Longest physical line, in octets, before folding
const LINE_LIMIT: usize = 75;

/// Organisation written when the profile names none
pub const DEFAULT_ORGANIZATION: &str = "My Organization";

/// Contact block shown in the preview header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCard {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub title: String,
    pub organization: String,
    pub website: String,
}

impl ContactCard {
    /// Render as vCard 3.0 with CRLF line endings
    #[must_use]
    pub fn to_vcard(&self) -> String {
        let mut out = String::with_capacity(256);
        let mut line = |text: String| {
            out.push_str(&fold(&text));
            out.push_str("\r\n");
        };

        line("BEGIN:VCARD".into());
        line("VERSION:3.0".into());
        line(format!("FN;CHARSET=UTF-8:{}", escape(&self.name)));
        line(format!("N;CHARSET=UTF-8:{};;;", escape(&self.name)));
        line(format!(
            "EMAIL;CHARSET=UTF-8;type=WORK,INTERNET:{}",
            escape(&self.email)
        ));
        line(format!("TITLE;CHARSET=UTF-8:{}", escape(&self.title)));
        line(format!("ORG;CHARSET=UTF-8:{}", escape(&self.organization)));
        line(format!("TEL;TYPE=WORK,VOICE:{}", escape(&self.phone)));
        line(format!("URL:{}", uri(&self.website)));
        line("END:VCARD".into());
        out
    }
}

/// RFC 6350 text value escaping
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// URI values keep `,` and `;`; only line breaks are dropped
fn uri(value: &str) -> String {
    value.chars().filter(|ch| !matches!(ch, '\r' | '\n')).collect()
}

/// Split at char boundaries so no physical line exceeds [`LINE_LIMIT`]
/// octets; continuation lines start with a single space.
fn fold(line: &str) -> String {
    if line.len() <= LINE_LIMIT {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / 24);
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > LINE_LIMIT {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(ch);
        width += len;
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card() -> ContactCard {
        ContactCard {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+44 20 0000".into(),
            title: "Engineer".into(),
            organization: DEFAULT_ORGANIZATION.into(),
            website: "https://ada.example".into(),
        }
    }

    #[test]
    fn vcard_has_expected_lines_in_order() {
        let vcard = card().to_vcard();
        let lines: Vec<&str> = vcard.split("\r\n").collect();

        assert_eq!(
            lines,
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "FN;CHARSET=UTF-8:Ada Lovelace",
                "N;CHARSET=UTF-8:Ada Lovelace;;;",
                "EMAIL;CHARSET=UTF-8;type=WORK,INTERNET:ada@example.com",
                "TITLE;CHARSET=UTF-8:Engineer",
                "ORG;CHARSET=UTF-8:My Organization",
                "TEL;TYPE=WORK,VOICE:+44 20 0000",
                "URL:https://ada.example",
                "END:VCARD",
                "",
            ]
        );
    }

    #[test]
    fn vcard_escapes_structural_characters() {
        let mut card = card();
        card.title = "Lead, Platform; Infra\nTeam".into();
        card.organization = r"A\B".into();

        let vcard = card.to_vcard();
        assert!(vcard.contains(r"TITLE;CHARSET=UTF-8:Lead\, Platform\; Infra\nTeam"));
        assert!(vcard.contains(r"ORG;CHARSET=UTF-8:A\\B"));
    }

    #[test]
    fn url_is_not_text_escaped() {
        let mut card = card();
        card.website = "https://ada.example/a;b?x=1,2\r\n".into();

        let vcard = card.to_vcard();
        assert!(vcard.contains("\r\nURL:https://ada.example/a;b?x=1,2\r\nEND:VCARD"));
    }

    #[test]
    fn long_lines_fold_at_75_octets() {
        let mut card = card();
        card.name = "Ada Augusta King, Countess of Lovelace née Byron ".repeat(4);

        let vcard = card.to_vcard();
        assert!(vcard.split("\r\n").all(|line| line.len() <= LINE_LIMIT));

        let unfolded = vcard.replace("\r\n ", "");
        let expected = format!("FN;CHARSET=UTF-8:{}\r\n", escape(&card.name));
        assert!(unfolded.contains(&expected));
        assert!(vcard.contains("\r\n "));
    }

    #[test]
    fn short_lines_are_left_alone() {
        assert_eq!(fold("URL:https://ada.example"), "URL:https://ada.example");
        let exact = "x".repeat(LINE_LIMIT);
        assert_eq!(fold(&exact), exact);
    }
}
