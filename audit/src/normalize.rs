//! Text and course-code canonicalization.
//!
//! Audit exports come out of PDF-to-text and HTML renderers that disagree on
//! ligatures, dash glyphs, soft hyphens and spacing. Everything downstream
//! matches against the output of [`normalize_text`], and every course token
//! goes through [`TextNormalizer::normalize_code`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use gradmap_config::AliasConfig;
use gradmap_types::CourseCode;

use crate::error::{AuditError, ErrorCode};

/// Mis-read codes seen in scanned audits, mapped to what they really are.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("CPSC 1201", "CPSC 120L"),
    ("CPSC 12OL", "CPSC 120L"),
    ("CPSC 1211", "CPSC 121L"),
    ("CPSC 12lL", "CPSC 121L"),
];

const SOFT_HYPHEN: char = '\u{00AD}';

struct CodePatterns {
    separators: Regex,
    slash: Regex,
    glued_prefix: Regex,
    detached_suffix: Regex,
}

static CODE_PATTERNS: LazyLock<CodePatterns> = LazyLock::new(|| CodePatterns {
    separators: Regex::new(r"[\s\-]+").expect("valid separator regex"),
    slash: Regex::new(r"\s*/\s*").expect("valid slash regex"),
    glued_prefix: Regex::new(r"^([A-Z]+)(\d)").expect("valid glued prefix regex"),
    detached_suffix: Regex::new(r"^([A-Z]+ \d+) ([A-Z])$").expect("valid detached suffix regex"),
});

/// Canonicalize raw document text.
///
/// - Ligature glyphs (U+FB00..U+FB06) expand to their letters
/// - Every dash/minus variant becomes `-`
/// - Soft hyphens are dropped
/// - Whitespace runs collapse to one space; ends are trimmed
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c == SOFT_HYPHEN {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if is_ligature(c) {
            out.extend(c.to_string().nfkc());
        } else if is_dash(c) {
            out.push('-');
        } else {
            out.push(c);
        }
    }

    out
}

fn is_ligature(c: char) -> bool {
    ('\u{FB00}'..='\u{FB06}').contains(&c)
}

fn is_dash(c: char) -> bool {
    matches!(
        c,
        '\u{2010}'
            | '\u{2011}'
            | '\u{2012}'
            | '\u{2013}'
            | '\u{2014}'
            | '\u{2015}'
            | '\u{2043}'
            | '\u{2212}'
            | '\u{FE58}'
            | '\u{FE63}'
            | '\u{FF0D}'
    )
}

/// Canonicalizes course codes, with a fixed alias table for known misreads.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    aliases: HashMap<String, CourseCode>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(from, to)| {
                (
                    canonical_form(from),
                    CourseCode::from_canonical(canonical_form(to)),
                )
            })
            .collect();
        Self { aliases }
    }
}

impl TextNormalizer {
    /// Built-in aliases extended by configured ones.
    ///
    /// An alias whose target is itself an alias source would make
    /// normalization non-idempotent; such entries are dropped and logged.
    #[must_use]
    pub fn with_aliases(extra: &[AliasConfig]) -> Self {
        let mut normalizer = Self::default();
        let candidates: Vec<(String, String)> = extra
            .iter()
            .map(|alias| (canonical_form(&alias.from), canonical_form(&alias.to)))
            .collect();

        for (from, to) in &candidates {
            let chained = normalizer.aliases.contains_key(to)
                || candidates.iter().any(|(other_from, _)| other_from == to);
            if chained || from == to || from.is_empty() {
                let err = AuditError::new(ErrorCode::InvalidConfig, "alias target is not canonical")
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str());
                tracing::warn!(from = %from, to = %to, "dropping alias: {err}");
                continue;
            }
            normalizer
                .aliases
                .insert(from.clone(), CourseCode::from_canonical(to.clone()));
        }
        normalizer
    }

    /// Canonical `"DEPT NUM[PART]"` form of a raw course token.
    ///
    /// Idempotent: feeding the output back in returns it unchanged.
    #[must_use]
    pub fn normalize_code(&self, raw: &str) -> CourseCode {
        let canonical = canonical_form(raw);
        match self.aliases.get(&canonical) {
            Some(alias) => alias.clone(),
            None => CourseCode::from_canonical(canonical),
        }
    }
}

fn canonical_form(raw: &str) -> String {
    let patterns = &*CODE_PATTERNS;
    let text = normalize_text(raw).to_ascii_uppercase();
    let spaced = patterns.separators.replace_all(&text, " ");
    let spaced = patterns.slash.replace_all(spaced.trim(), "/");
    let unglued = patterns.glued_prefix.replace(&spaced, "$1 $2");
    patterns
        .detached_suffix
        .replace(&unglued, "$1$2")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::{TextNormalizer, normalize_text};
    use gradmap_config::AliasConfig;

    #[test]
    fn text_expands_ligatures() {
        assert_eq!(normalize_text("Certi\u{FB01}ed \u{FB02}owchart"), "Certified flowchart");
    }

    #[test]
    fn text_unifies_dashes_and_strips_soft_hyphens() {
        assert_eq!(normalize_text("CPSC\u{2013}120 B\u{2212}"), "CPSC-120 B-");
        assert_eq!(normalize_text("Ful\u{00AD}filled"), "Fulfilled");
    }

    #[test]
    fn text_collapses_whitespace() {
        assert_eq!(normalize_text("  FA24\t\nCPSC\u{00A0} 120  "), "FA24 CPSC 120");
    }

    #[test]
    fn code_separator_variants_agree() {
        let normalizer = TextNormalizer::default();
        for raw in [
            "CPSC 120A",
            "cpsc120a",
            "CPSC-120A",
            "CPSC  -  120A",
            "CPSC 120 A",
            "CPSC\u{2013}120A",
        ] {
            assert_eq!(normalizer.normalize_code(raw).as_str(), "CPSC 120A", "input {raw:?}");
        }
    }

    #[test]
    fn code_applies_aliases() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize_code("CPSC 1201").as_str(), "CPSC 120L");
        assert_eq!(normalizer.normalize_code("cpsc1201").as_str(), "CPSC 120L");
    }

    #[test]
    fn code_keeps_placeholder_slash() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize_code("cpsc 120a / l").as_str(), "CPSC 120A/L");
    }

    #[test]
    fn code_normalization_is_idempotent() {
        let normalizer = TextNormalizer::default();
        let samples = [
            "CPSC 120A",
            "cpsc120l",
            "  math-150 a ",
            "AB1 C",
            "A-",
            "EGGN 100/L",
            "1 A",
            "ab 12 c d",
            "CPSC\u{2014}\u{2014}121",
            "CPSC 1201",
            "",
            "\u{FB01}1",
        ];
        for raw in samples {
            let once = normalizer.normalize_code(raw);
            let twice = normalizer.normalize_code(once.as_str());
            assert_eq!(once, twice, "input {raw:?}");
        }
    }

    #[test]
    fn configured_aliases_extend_builtins() {
        let normalizer = TextNormalizer::with_aliases(&[AliasConfig {
            from: "EGEC 18OL".to_string(),
            to: "EGEC 180L".to_string(),
        }]);
        assert_eq!(normalizer.normalize_code("egec 18ol").as_str(), "EGEC 180L");
        assert_eq!(normalizer.normalize_code("CPSC 1201").as_str(), "CPSC 120L");
    }

    #[test]
    fn chained_aliases_are_dropped() {
        let normalizer = TextNormalizer::with_aliases(&[AliasConfig {
            from: "CPSC 999".to_string(),
            to: "CPSC 1201".to_string(),
        }]);
        assert_eq!(normalizer.normalize_code("CPSC 999").as_str(), "CPSC 999");
    }
}
