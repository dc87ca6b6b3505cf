//! Parsing of `primary: alias1, alias2` lines with escapable `:`, `,`,
//! and `#` delimiters.

use crate::{Error, Result};

const ESCAPE_CHARS: [char; 3] = [',', ':', '#'];

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPE_CHARS.contains(&next) {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Split `s` on every occurrence of `sep` that is not preceded by an
/// unescaped backslash, mirroring the source's `re.split(r'(?<!\\)X')`.
fn split_unescaped(s: &str, sep: char) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == sep && (i == 0 || chars[i - 1] != '\\') {
            parts.push(current.clone());
            current.clear();
        } else {
            current.push(c);
        }
        i += 1;
    }
    parts.push(current);
    parts
}

/// Strip a `#`-to-end-of-line comment, unless the `#` is escaped.
pub fn strip_comment(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    for i in 0..chars.len() {
        if chars[i] == '#' && (i == 0 || chars[i - 1] != '\\') {
            return chars[..i].iter().collect();
        }
    }
    line.to_string()
}

/// Parse one alias-file line (after comment stripping) into its
/// primary name and alias list. The primary and each alias have
/// leading/trailing whitespace trimmed and escape sequences resolved.
pub fn parse_aliases(line: &str) -> Result<(String, Vec<String>)> {
    let parts = split_unescaped(line, ':');
    if parts.len() < 2 {
        return Err(Error::AliasParse(format!(
            "missing unescaped ':' in line: {line:?}"
        )));
    }
    let primary = parts[0].clone();
    let rest = parts[1..].join(":");

    let aliases: Vec<String> = split_unescaped(&rest, ',')
        .into_iter()
        .map(|a| unescape(a.trim()))
        .filter(|a| !a.is_empty())
        .collect();

    Ok((unescape(primary.trim()), aliases))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let (primary, aliases) = parse_aliases("APT32: OceanLotus Group, oceanLotusGroup").unwrap();
        assert_eq!(primary, "APT32");
        assert_eq!(aliases, vec!["OceanLotus Group", "oceanLotusGroup"]);
    }

    #[test]
    fn test_parse_escaped_delimiters() {
        let (primary, aliases) = parse_aliases(r"Group\: One: alias\, with comma, plain").unwrap();
        assert_eq!(primary, "Group: One");
        assert_eq!(aliases, vec!["alias, with comma", "plain"]);
    }

    #[test]
    fn test_parse_no_aliases() {
        let (primary, aliases) = parse_aliases("Solo:").unwrap();
        assert_eq!(primary, "Solo");
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("APT32: alias # a comment"), "APT32: alias ");
        assert_eq!(strip_comment(r"escaped \# not a comment"), r"escaped \# not a comment");
    }

    #[test]
    fn test_missing_colon_is_error() {
        assert!(parse_aliases("no colon here").is_err());
    }
}
