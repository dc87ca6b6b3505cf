//! Deterministic normalization of surface strings into a comparison
//! form, used both to build the `norm` lookup index and to normalize
//! analyzer output (e.g. `threatactor`'s capitalized form).

use regex::Regex;
use std::sync::OnceLock;

fn letter_digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z])(\d)").unwrap())
}

fn lower_upper_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z])([A-Z])").unwrap())
}

fn non_alphanumeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9 ]+").unwrap())
}

fn multi_whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

fn capitalize_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[\s-])[a-z]").unwrap())
}

/// Case transform applied as the final, optional normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    Lower,
    Upper,
    Capitalize,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub space_before_numbers: bool,
    pub space_before_capitalized: bool,
    pub remove_non_alphanumeric: bool,
    pub remove_multiple_whitespace: bool,
    pub case: CaseMode,
    pub uppercase_abbr: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            space_before_numbers: true,
            space_before_capitalized: true,
            remove_non_alphanumeric: true,
            remove_multiple_whitespace: true,
            case: CaseMode::Lower,
            uppercase_abbr: Vec::new(),
        }
    }
}

/// Run the five normalization rules in order: letter→digit spacing,
/// lower→upper (camelCase) spacing, punctuation folding, whitespace
/// collapse, then an optional case transform with an abbreviation
/// whitelist forced to uppercase afterward.
pub fn normalize(name: &str, opts: &NormalizeOptions) -> String {
    let mut s = name.to_string();

    if opts.space_before_numbers {
        s = letter_digit_re().replace_all(&s, "$1 $2").into_owned();
    }

    if opts.space_before_capitalized {
        s = lower_upper_re().replace_all(&s, "$1 $2").into_owned();
    }

    if opts.remove_non_alphanumeric {
        s = non_alphanumeric_re().replace_all(&s, " ").into_owned();
    }

    if opts.remove_multiple_whitespace {
        s = multi_whitespace_re().replace_all(&s, " ").into_owned();
    }

    s = match opts.case {
        CaseMode::Lower => s.to_lowercase(),
        CaseMode::Upper => s.to_uppercase(),
        CaseMode::Capitalize => {
            let mut result = String::with_capacity(s.len());
            let mut last_end = 0;
            for m in capitalize_re().find_iter(&s) {
                result.push_str(&s[last_end..m.start()]);
                let matched = m.as_str();
                let (prefix, last_char) = matched.split_at(matched.len() - 1);
                result.push_str(prefix);
                result.extend(last_char.to_uppercase());
                last_end = m.end();
            }
            result.push_str(&s[last_end..]);
            result
        }
        CaseMode::Unchanged => s,
    };

    for abbr in &opts.uppercase_abbr {
        if let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(abbr))) {
            s = re.replace_all(&s, abbr.to_uppercase().as_str()).into_owned();
        }
    }

    s
}

/// Convenience wrapper matching the default lowercase-only behavior
/// used to build the vocabulary's `norm` index.
pub fn normalize_default(name: &str) -> String {
    normalize(name, &NormalizeOptions::default())
}
