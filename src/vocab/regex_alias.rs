//! Alias → regex compilation.
//!
//! Each alias becomes a case-insensitive, word-bounded regex tolerant
//! of whitespace/punctuation variance at camelCase and letter→digit
//! boundaries, per §4.1.

use regex::Regex;

use crate::{Error, Result};

fn is_camel_case_break(chars: &[char], i: usize) -> bool {
    if i == 0 {
        return false;
    }
    chars[i].is_uppercase() && chars[i - 1].is_lowercase()
}

fn is_alpha_to_digit_break(chars: &[char], i: usize) -> bool {
    if i == 0 {
        return false;
    }
    chars[i].is_ascii_digit() && chars[i - 1].is_alphabetic()
}

/// Build the regex body (without surrounding `\b(...)\b`) for a single
/// alias by walking it character by character.
fn regex_body(alias: &str) -> String {
    let chars: Vec<char> = alias.chars().collect();
    let mut body = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if is_camel_case_break(&chars, i) || is_alpha_to_digit_break(&chars, i) {
            body.push_str(r"\s?[- _.]?");
        }
        if c.is_whitespace() {
            body.push_str(r"\s?[- _.]?");
        } else if c.is_ascii_digit() {
            body.push_str(r"\d");
        } else {
            for lower in c.to_lowercase() {
                if "\\.^$|?*+()[]{}".contains(lower) {
                    body.push('\\');
                }
                body.push(lower);
            }
        }
    }

    body
}

/// Convert an alias into a compiled, case-insensitive, word-bounded
/// regex. All-digit aliases are rejected: matching bare numbers is
/// unsafe (catastrophic false-positive rate).
pub fn regex_from_alias(alias: &str) -> Result<Regex> {
    if !alias.is_empty() && alias.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::RegexCompile(format!(
            "refusing to build regex from all-digit alias: {alias}"
        )));
    }

    let pattern = format!(r"(?i)\b({})\b", regex_body(alias));
    Regex::new(&pattern).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_alias_matches_itself() {
        let re = regex_from_alias("OceanLotus").unwrap();
        assert!(re.is_match("OceanLotus"));
        assert!(re.is_match("oceanlotus"));
    }

    #[test]
    fn test_camel_case_tolerance() {
        let re = regex_from_alias("oceanLotusGroup").unwrap();
        assert!(re.is_match("oceanLotusGroup"));
        assert!(re.is_match("Ocean Lotus Group"));
        assert!(re.is_match("ocean-lotus-group"));
    }

    #[test]
    fn test_letter_digit_tolerance() {
        let re = regex_from_alias("APT27").unwrap();
        assert!(re.is_match("APT27"));
        assert!(re.is_match("APT 27"));
        assert!(re.is_match("apt-27"));
    }

    #[test]
    fn test_all_digit_alias_rejected() {
        assert!(regex_from_alias("12345").is_err());
    }

    #[test]
    fn test_word_boundary() {
        let re = regex_from_alias("APT27").unwrap();
        assert!(!re.is_match("myAPT27x"));
    }
}
