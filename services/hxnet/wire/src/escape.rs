//! Control-byte escaping for free text carried inside fields.
//!
//! The server never sends a literal `,`, `;` or `@` inside a field. Text that
//! needs them travels with each delimiter replaced by a private control byte,
//! and list-type free text (notices, multi-line notes) separates its entries
//! with a fourth control byte that is unrelated to the structural three.

/// Control byte standing in for a literal `,`
pub const FIELD_ESCAPE: char = '\u{01}';
/// Control byte standing in for a literal `;`
pub const RECORD_ESCAPE: char = '\u{02}';
/// Control byte standing in for a literal `@`
pub const SECTION_ESCAPE: char = '\u{03}';
/// Control byte separating entries of a free-text list
pub const LIST_ESCAPE: char = '\u{04}';

/// Visible delimiter used between free-text list entries once decoded
pub const LIST_DELIMITER: char = '\n';

const STRUCTURAL: [(char, char); 3] = [
    (FIELD_ESCAPE, ','),
    (RECORD_ESCAPE, ';'),
    (SECTION_ESCAPE, '@'),
];

/// Replace the three structural delimiters with their control bytes.
///
/// Used on user-authored text before it is sent back to the server.
pub fn encode(text: &str) -> String {
    text.chars()
        .map(|c| {
            STRUCTURAL
                .iter()
                .find(|(_, visible)| *visible == c)
                .map(|(control, _)| *control)
                .unwrap_or(c)
        })
        .collect()
}

/// Replace the structural control bytes with the visible delimiters.
///
/// Used when a field is itself a nested document of free text.
pub fn decode(text: &str) -> String {
    text.chars()
        .map(|c| {
            STRUCTURAL
                .iter()
                .find(|(control, _)| *control == c)
                .map(|(_, visible)| *visible)
                .unwrap_or(c)
        })
        .collect()
}

/// Join free-text entries into a single field value.
///
/// Each entry is escaped with [`encode`] and any newline inside an entry is
/// folded into a space so it cannot be confused with an entry boundary after
/// decoding.
pub fn encode_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(LIST_ESCAPE);
        }
        out.extend(encode(item.as_ref()).chars().map(|c| {
            if c == LIST_DELIMITER || c == LIST_ESCAPE {
                ' '
            } else {
                c
            }
        }));
    }
    out
}

/// Split a free-text list field into its decoded entries.
///
/// An empty field is an empty list.
pub fn decode_list(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(LIST_ESCAPE).map(decode).collect()
}

/// Render a free-text list field as newline-separated text.
pub fn list_to_text(field: &str) -> String {
    decode(field).replace(LIST_ESCAPE, &LIST_DELIMITER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_replaces_structural_delimiters() {
        assert_eq!(encode("a,b;c@d"), "a\u{01}b\u{02}c\u{03}d");
        assert_eq!(encode("plain text"), "plain text");
    }

    #[test]
    fn test_decode_inverts_encode() {
        for s in ["", ",,,", "a;b", "@home, ;ok;", "abc123", ";@,"] {
            assert_eq!(decode(&encode(s)), s);
        }
    }

    #[test]
    fn test_decoded_field_parses_as_document() {
        let field = encode("1,alpha;2,beta");
        assert!(!field.contains(','));

        let doc = crate::Document::parse(&decode(&field));
        assert_eq!(doc.field(0, 1, 1).unwrap(), "beta");
    }

    #[test]
    fn test_list_roundtrip() {
        let notes = vec!["first, note", "second; note", "@third"];
        let field = encode_list(&notes);

        assert_eq!(field.matches(LIST_ESCAPE).count(), 2);
        assert_eq!(decode_list(&field), notes);
        assert_eq!(
            list_to_text(&field),
            "first, note\nsecond; note\n@third"
        );
    }

    #[test]
    fn test_list_entry_newlines_are_folded() {
        let field = encode_list(["two\nlines"]);
        assert_eq!(decode_list(&field), vec!["two lines".to_string()]);
    }

    #[test]
    fn test_empty_list() {
        assert!(decode_list("").is_empty());
        assert_eq!(encode_list(Vec::<String>::new()), "");
    }
}
