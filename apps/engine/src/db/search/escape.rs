//! Search value escaping helpers.
//!
//! Search values may escape separator characters using `\`:
//! - `\,` (comma in values)
//! - `\|` (system/code separator)
//! - `\\` (literal backslash)

pub(crate) fn split_unescaped(input: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    let bytes = input.as_bytes();
    while i < bytes.len() {
        match bytes[i] as char {
            '\\' => {
                i += 1;
                if i < bytes.len() {
                    i += 1;
                }
            }
            c if c == sep => {
                out.push(&input[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    out.push(&input[start..]);
    out
}

/// Remove escapes. `None` for a dangling or unknown escape.
pub(crate) fn unescape_search_value(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            next @ ('\\' | ',' | '|') => out.push(next),
            _ => return None,
        }
    }
    Some(out)
}

/// Unescape `input`, keeping it verbatim when an escape is invalid.
pub(crate) fn unescape_or_raw(input: &str) -> String {
    unescape_search_value(input).unwrap_or_else(|| input.to_string())
}

/// Split a comma-separated (OR) value into unescaped, trimmed, non-empty parts.
///
/// A part with an invalid escape is kept verbatim.
pub(crate) fn split_or_values(input: &str) -> Vec<String> {
    split_unescaped(input, ',')
        .into_iter()
        .map(unescape_or_raw)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Split a comma-separated (OR) value into trimmed, non-empty parts that keep
/// their escapes, for values with further structure such as `system|code`.
pub(crate) fn split_or_escaped(input: &str) -> Vec<String> {
    split_unescaped(input, ',')
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_unescaped_separator_only() {
        assert_eq!(split_unescaped(r"a,b\,c,d", ','), vec!["a", r"b\,c", "d"]);
        assert_eq!(split_unescaped("http://x|123", '|'), vec!["http://x", "123"]);
    }

    #[test]
    fn or_values_are_unescaped_and_trimmed() {
        assert_eq!(
            split_or_values(r"lung , smith\, j,,"),
            vec!["lung".to_string(), "smith, j".to_string()]
        );
    }

    #[test]
    fn escaped_parts_keep_their_escapes() {
        assert_eq!(
            split_or_escaped(r"A\|B, sys|C\,D ,"),
            vec![r"A\|B".to_string(), r"sys|C\,D".to_string()]
        );
    }

    #[test]
    fn rejects_unknown_escape() {
        assert_eq!(unescape_search_value(r"a\qb"), None);
        assert_eq!(unescape_search_value("trailing\\"), None);
        assert_eq!(unescape_search_value(r"a\|b").as_deref(), Some("a|b"));
    }
}
