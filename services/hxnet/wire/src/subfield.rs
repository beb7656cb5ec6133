//! Grammars packed inside a single field.
//!
//! Some fields carry their own small lists: `_`-terminated lists of
//! `*`-joined tuples (the topology field), colon-separated tuples, and packed
//! key/value lists. These helpers split and join them with the same
//! trailing-empty rules as the document itself.

use crate::document::split_trimmed;
use crate::error::WireError;
use std::str::FromStr;

/// Terminator after every member of a packed list
pub const LIST_TERMINATOR: char = '_';
/// Separator between members of a packed tuple
pub const TUPLE_SEPARATOR: char = '*';
/// Separator between members of a colon tuple
pub const COLON_SEPARATOR: char = ':';

/// Split a terminated list (`a_b_c_`) into its members
pub fn split_list(field: &str, terminator: char) -> Vec<&str> {
    split_trimmed(field, terminator)
}

/// Join members into a terminated list, emitting the terminator after each one
pub fn join_list<I, S>(items: I, terminator: char) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for item in items {
        out.push_str(item.as_ref());
        out.push(terminator);
    }
    out
}

/// Split a tuple on `separator`, keeping empty members
pub fn split_tuple(item: &str, separator: char) -> Vec<&str> {
    item.split(separator).collect()
}

/// Split a colon tuple (`level:xp:rank`)
pub fn split_colon(item: &str) -> Vec<&str> {
    split_tuple(item, COLON_SEPARATOR)
}

/// Parse a packed key/value list such as `1:5_2:3_`.
///
/// Entries without the pair separator are kept with an empty value.
pub fn parse_pairs(field: &str, entry: char, pair: char) -> Vec<(String, String)> {
    split_trimmed(field, entry)
        .into_iter()
        .map(|e| match e.split_once(pair) {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (e.to_string(), String::new()),
        })
        .collect()
}

/// Inverse of [`parse_pairs`]
pub fn join_pairs<K, V>(pairs: &[(K, V)], entry: char, pair: char) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    join_list(
        pairs
            .iter()
            .map(|(k, v)| format!("{}{}{}", k.as_ref(), pair, v.as_ref())),
        entry,
    )
}

/// Coerce field text to a number, reporting the offending text on failure
pub fn parse_num<T: FromStr>(text: &str) -> Result<T, WireError> {
    text.parse::<T>()
        .map_err(|_| WireError::InvalidNumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminated_list() {
        assert_eq!(split_list("1*2*3_4*5*6_", '_'), vec!["1*2*3", "4*5*6"]);
        assert_eq!(split_list("100_200", '_'), vec!["100", "200"]);
        assert!(split_list("", '_').is_empty());
        assert_eq!(join_list(["100", "200"], '_'), "100_200_");
        assert_eq!(join_list(Vec::<&str>::new(), '_'), "");
    }

    #[test]
    fn test_tuples() {
        assert_eq!(split_tuple("1*2*3", '*'), vec!["1", "2", "3"]);
        assert_eq!(split_tuple("1**3", '*'), vec!["1", "", "3"]);
        assert_eq!(split_colon("12:3400:7"), vec!["12", "3400", "7"]);
    }

    #[test]
    fn test_packed_pairs() {
        let pairs = parse_pairs("1:5_2:3_flag_", '_', ':');
        assert_eq!(
            pairs,
            vec![
                ("1".to_string(), "5".to_string()),
                ("2".to_string(), "3".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert_eq!(join_pairs(&pairs[..2], '_', ':'), "1:5_2:3_");
    }

    #[test]
    fn test_parse_num() {
        assert_eq!(parse_num::<u64>("4839489"), Ok(4839489));
        assert_eq!(parse_num::<i32>("-7"), Ok(-7));
        assert_eq!(
            parse_num::<u32>("x1"),
            Err(WireError::InvalidNumber("x1".to_string()))
        );
    }
}
