//! Literal and bounded text substitution.
//!
//! These passes work on the raw markup string: the phrases they target live
//! inside a single text element in the source templates.

use regex::{Captures, NoExpand, Regex, RegexBuilder};

use crate::error::{DocforgeError, Result};
use crate::markup::escape;

use super::Applied;

/// Placeholder for the user value in phrase replacement templates.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// First letter upper-case, the rest lower-case: `"bEHAVIOURS"` -> `"Behaviours"`.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub(crate) fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| DocforgeError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Replace a root word in its capitalized and lower-case forms.
///
/// - `Root` / `root` followed by whitespace become `Value ` / `value ` (the run of
///   whitespace collapses to one space).
/// - Whole-word `Root` / `root` become `Value` / `value`, unless directly followed by
///   `protected_suffix` (so `Fallyx` survives a `Fall` replacement).
///
/// All four shapes are matched in a single scan so inserted text is never rescanned.
pub fn replace_root_word(
    text: &str,
    root: &str,
    protected_suffix: Option<&str>,
    value: &str,
) -> Result<Applied> {
    let upper_root = capitalize(root);
    let lower_root = root.to_lowercase();
    let upper_value = escape(&capitalize(value)).into_owned();
    let lower_value = escape(&value.to_lowercase()).into_owned();

    let forms = format!("{}|{}", regex::escape(&upper_root), regex::escape(&lower_root));
    let pattern = format!(r"(?P<spaced>{forms})\s+|\b(?P<word>{forms})\b");
    let re = compile(&pattern, false)?;

    let mut count = 0;
    let out = re.replace_all(text, |caps: &Captures<'_>| {
        let (form, trailing) = match (caps.name("spaced"), caps.name("word")) {
            (Some(m), _) => (m.as_str(), " "),
            (None, Some(m)) => {
                let after = &text[m.end()..];
                if protected_suffix.is_some_and(|suffix| after.starts_with(suffix)) {
                    return caps[0].to_string();
                }
                (m.as_str(), "")
            }
            (None, None) => return caps[0].to_string(),
        };
        count += 1;
        let replacement = if form == upper_root { &upper_value } else { &lower_value };
        format!("{replacement}{trailing}")
    });

    Ok(Applied {
        text: out.into_owned(),
        count,
    })
}

/// Replace every match of `pattern` with `template`, where `{value}` in the
/// template stands for the escaped user value. No `$` group expansion happens.
pub fn replace_phrase(
    text: &str,
    pattern: &str,
    case_insensitive: bool,
    template: &str,
    value: &str,
) -> Result<Applied> {
    let re = compile(pattern, case_insensitive)?;
    let count = re.find_iter(text).count();
    if count == 0 {
        return Ok(Applied::unchanged(text));
    }
    let rendered = template.replace(VALUE_PLACEHOLDER, &escape(value));
    Ok(Applied {
        text: re.replace_all(text, NoExpand(&rendered)).into_owned(),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(text: &str, value: &str) -> String {
        replace_root_word(text, "Fall", Some("yx"), value).unwrap().text
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("bEHAVIOURS"), "Behaviours");
        assert_eq!(capitalize("é"), "É");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_root_word_cases() {
        assert_eq!(root("Fall Detection", "behaviours"), "Behaviours Detection");
        assert_eq!(root("the fall  rate", "Behaviours"), "the behaviours rate");
        assert_eq!(root("Fall.", "analysis"), "Analysis.");
        assert_eq!(root("(fall)", "Analysis"), "(analysis)");
    }

    #[test]
    fn test_brand_is_protected() {
        let out = root("Fallyx monitors every fall; Fallyx Inc.", "Behaviours");
        assert_eq!(out, "Fallyx monitors every behaviours; Fallyx Inc.");
    }

    #[test]
    fn test_inserted_text_is_not_rescanned() {
        assert_eq!(root("Fall Risk", "Nightfall"), "Nightfall Risk");
        assert_eq!(root("Fall", "Fall Risk"), "Fall risk");
    }

    #[test]
    fn test_root_value_is_escaped() {
        assert_eq!(root("Fall plan", "R&D"), "R&amp;d plan");
    }

    #[test]
    fn test_root_word_counts() {
        let applied = replace_root_word("Fall fall Fallyx", "Fall", Some("yx"), "x").unwrap();
        assert_eq!(applied.count, 2);
        assert_eq!(applied.text, "X x Fallyx");
    }

    #[test]
    fn test_phrase_template() {
        let out = replace_phrase(
            "<w:t>Fees are in Canadian dollars.</w:t>",
            "Fees are in Canadian dollars",
            false,
            "Fees are in {value}",
            "US dollars",
        )
        .unwrap();
        assert_eq!(out.text, "<w:t>Fees are in US dollars.</w:t>");
        assert_eq!(out.count, 1);
    }

    #[test]
    fn test_phrase_dollar_is_literal() {
        let out = replace_phrase("fee: X", "X", false, "{value}", "$0.10 $1").unwrap();
        assert_eq!(out.text, "fee: $0.10 $1");
    }

    #[test]
    fn test_phrase_case_insensitive_and_no_match() {
        let out = replace_phrase("CAD and cad", r"\bcad\b", true, "{value}", "USD").unwrap();
        assert_eq!(out.text, "USD and USD");
        let none = replace_phrase("nothing here", "absent", false, "{value}", "x").unwrap();
        assert_eq!(none.count, 0);
        assert_eq!(none.text, "nothing here");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = replace_phrase("x", "(", false, "{value}", "y").unwrap_err();
        assert!(matches!(err, DocforgeError::InvalidPattern { .. }));
    }
}
