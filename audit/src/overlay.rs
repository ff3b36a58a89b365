//! Structural overlays: requirement containers that report certification
//! instead of listing a course row.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{ContainerView, DocumentQuery, ElementMeta};
use crate::error::{AuditError, ErrorCode};
use crate::schema::GeSchema;

/// Special degree requirement that only certification can satisfy.
pub const AMERICAN_INSTITUTIONS_KEY: &str = "AI";

/// Attributes that name the requirement a container represents.
const NAME_ATTRS: &[&str] = &["rname", "data-rname", "data-requirement", "title"];

/// Status classes that mean the requirement block is complete.
const COMPLETE_CLASSES: &[&str] = &["status_ok", "status-ok", "complete", "fulfilled"];

/// Values that switch a `cert`-named attribute on.
const TRUE_VALUES: &[&str] = &["", "true", "yes", "y", "1"];

/// Leading text length used to identify a container without a name attribute.
const NAME_TEXT_CHARS: usize = 120;

struct OverlayPatterns {
    american_institutions: Regex,
    complete_phrase: Regex,
    certification: Regex,
    cert_token: Regex,
    cert_negated: Regex,
    cert_cell: Regex,
}

static OVERLAY_PATTERNS: LazyLock<OverlayPatterns> = LazyLock::new(|| OverlayPatterns {
    american_institutions: Regex::new(r"(?i)\bAmerican\s+Institutions\b")
        .expect("valid american institutions regex"),
    complete_phrase: Regex::new(
        r"(?i)\b(?:not\s+)?(?:requirement\s+(?:is\s+)?complete|fulfilled)\b",
    )
    .expect("valid completion phrase regex"),
    certification: Regex::new(r"(?i)\b(?:not\s+)?certifi(?:ed|cation)\b")
        .expect("valid certification regex"),
    cert_token: Regex::new(r"(?i)(?:^|[^a-z])cert(?:s|ified|ification)?(?:[^a-z]|$)")
        .expect("valid certification token regex"),
    cert_negated: Regex::new(r"(?i)\b(?:not|non|no)[\s\-_]*cert").expect("valid negation regex"),
    cert_cell: Regex::new(r"(?i)^cert(?:ified|ification)?\.?$")
        .expect("valid certification cell regex"),
});

/// A requirement the document certifies as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayHit {
    /// GE slot key or [`AMERICAN_INSTITUTIONS_KEY`].
    pub key: &'static str,
    pub note: String,
}

pub struct RequirementOverlay {
    extra_phrases: Vec<Regex>,
}

impl RequirementOverlay {
    /// Compile configured certification phrases.
    pub fn new(extra_phrases: &[String]) -> Result<Self, AuditError> {
        let extra_phrases = extra_phrases
            .iter()
            .map(|phrase| {
                Regex::new(&format!("(?i){phrase}")).map_err(|err| {
                    AuditError::new(ErrorCode::InvalidPattern, "invalid certification phrase")
                        .with_detail("pattern", phrase.as_str())
                        .with_detail("reason", err.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { extra_phrases })
    }

    /// Certified requirement blocks, in document order.
    #[must_use]
    pub fn find_certified(&self, query: &dyn DocumentQuery, schema: &GeSchema) -> Vec<OverlayHit> {
        query
            .containers(&is_requirement_container)
            .iter()
            .filter_map(|container| {
                let key = target_key(container, schema)?;
                if !signals_complete(container) {
                    return None;
                }
                if !self.signals_certification(container) {
                    tracing::debug!(slot = key, "complete requirement without certification");
                    return None;
                }
                Some(OverlayHit {
                    key,
                    note: "Certified".to_string(),
                })
            })
            .collect()
    }

    fn signals_certification(&self, container: &ContainerView) -> bool {
        let patterns = &*OVERLAY_PATTERNS;
        let affirmative = |re: &Regex| {
            re.find_iter(&container.text)
                .any(|m| !m.as_str().to_ascii_lowercase().starts_with("not"))
        };

        affirmative(&patterns.certification)
            || self.extra_phrases.iter().any(|re| re.is_match(&container.text))
            || container
                .attrs
                .iter()
                .any(|(name, value)| attr_affirms_certification(name, value))
            || container
                .rows
                .iter()
                .flat_map(|row| row.cells.iter())
                .any(|cell| patterns.cert_cell.is_match(&cell.text))
    }
}

/// A `cert` token in a non-name value (`transfer-cert`), or a `cert`-named
/// attribute switched on. Negated or false values never affirm.
fn attr_affirms_certification(name: &str, value: &str) -> bool {
    let patterns = &*OVERLAY_PATTERNS;
    let value = value.trim();
    if patterns.cert_negated.is_match(value) {
        return false;
    }
    let is_name_attr = NAME_ATTRS.iter().any(|attr| name.eq_ignore_ascii_case(attr));
    if !is_name_attr && patterns.cert_token.is_match(value) {
        return true;
    }
    patterns.cert_token.is_match(name)
        && TRUE_VALUES.iter().any(|on| value.eq_ignore_ascii_case(on))
}

fn is_requirement_container(meta: &ElementMeta<'_>) -> bool {
    meta.has_class("requirement")
        || ["rname", "data-rname", "data-requirement"]
            .iter()
            .any(|attr| meta.attr(attr).is_some())
}

/// Which GE slot (or special requirement) a container is about.
fn target_key(container: &ContainerView, schema: &GeSchema) -> Option<&'static str> {
    let name = NAME_ATTRS
        .iter()
        .find_map(|attr| container.attr(attr).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| {
            let end = container
                .text
                .char_indices()
                .nth(NAME_TEXT_CHARS)
                .map_or(container.text.len(), |(i, _)| i);
            &container.text[..end]
        });

    if OVERLAY_PATTERNS.american_institutions.is_match(name) {
        return Some(AMERICAN_INSTITUTIONS_KEY);
    }
    schema.slot_named(name).map(|slot| slot.key)
}

fn signals_complete(container: &ContainerView) -> bool {
    COMPLETE_CLASSES.iter().any(|class| container.has_class(class))
        || OVERLAY_PATTERNS
            .complete_phrase
            .find_iter(&container.text)
            .any(|m| !m.as_str().to_ascii_lowercase().starts_with("not"))
}

#[cfg(test)]
mod tests {
    use super::{AMERICAN_INSTITUTIONS_KEY, OverlayHit, RequirementOverlay};
    use crate::document::HtmlDocument;
    use crate::error::ErrorCode;
    use crate::schema::GeSchema;

    fn hits(html: &str, phrases: &[String]) -> Vec<OverlayHit> {
        let doc = HtmlDocument::parse(html).unwrap();
        RequirementOverlay::new(phrases)
            .unwrap()
            .find_certified(&doc, GeSchema::legacy())
    }

    #[test]
    fn status_class_with_certification_text() {
        let found = hits(
            r#"<div class="requirement Status_OK" rname="American Institutions">
                 <p>Satisfied by CSU certification</p>
               </div>"#,
            &[],
        );
        assert_eq!(
            found,
            [OverlayHit {
                key: AMERICAN_INSTITUTIONS_KEY,
                note: "Certified".to_string(),
            }]
        );
    }

    #[test]
    fn data_attribute_marks_certification() {
        let found = hits(
            r#"<section data-requirement="GE Area A.1 Oral Communication"
                        data-source="transfer-cert">
                 Requirement complete
               </section>"#,
            &[],
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "A.1");
    }

    #[test]
    fn false_or_negated_certification_attributes_do_not_count() {
        for attrs in [
            r#"data-certified="false""#,
            r#"data-cert="no""#,
            r#"data-source="not-cert""#,
            r#"data-note="uncertain""#,
            r#"data-rname="Certification pending""#,
        ] {
            let found = hits(
                &format!(
                    r#"<div class="requirement Status_OK" rname="A.2 Written Communication" {attrs}>
                         Requirement complete</div>"#
                ),
                &[],
            );
            assert!(found.is_empty(), "{attrs}");
        }
    }

    #[test]
    fn switched_on_certification_attribute_counts() {
        let found = hits(
            r#"<div class="requirement Status_OK" rname="A.2 Written Communication"
                    data-certified="true">Requirement complete</div>"#,
            &[],
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "A.2");
    }

    #[test]
    fn pseudo_row_marks_certification() {
        let found = hits(
            r#"<div class="requirement complete"><h3>Z Cultural Diversity</h3>
                 <table><tr><td>CERT</td><td>Transfer</td></tr></table></div>"#,
            &[],
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "Z");
    }

    #[test]
    fn completion_without_certification_is_not_an_overlay() {
        let found = hits(
            r#"<div class="requirement Status_OK" rname="A.2 Written Communication">
                 FA23 ENGL 101 3.0 A</div>"#,
            &[],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn negated_phrases_do_not_count() {
        let found = hits(
            r#"<div class="requirement" rname="American Institutions">
                 Not fulfilled. Not certified.</div>"#,
            &[],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn configured_phrases_extend_certification() {
        let found = hits(
            r#"<div class="requirement Status_OK" rname="American Institutions">
                 Associate Degree for Transfer</div>"#,
            &["associate degree for transfer".to_string()],
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn invalid_configured_phrase_is_reported() {
        let err = RequirementOverlay::new(&["(unclosed".to_string()])
            .err()
            .unwrap();
        assert_eq!(err.code, ErrorCode::InvalidPattern);
        assert_eq!(err.detail("pattern"), Some("(unclosed"));
    }
}
