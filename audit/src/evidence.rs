//! Evidence aggregation: one pass over a document, every matcher wired in.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use gradmap_types::{CourseCode, Evidence, GeSlotRecord, SlotKey, TranscriptRow};

use crate::document::AuditDocument;
use crate::error::AuditError;
use crate::ge::{GeneralEducationSlotMatcher, SlotEvaluation};
use crate::normalize::TextNormalizer;
use crate::overlay::{AMERICAN_INSTITUTIONS_KEY, RequirementOverlay};
use crate::rows::TranscriptRowParser;
use crate::settings::AuditSettings;
use crate::tech::TechnicalElectiveMatcher;

/// How far after a label an institution name still corroborates it.
const CORROBORATION_WINDOW_CHARS: usize = 100;

static SUBSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\[\s*(?P<label>[^\[\]]+?)\s+SUBS\s+",
        r"(?P<dept>[A-Z]{2,6})\s*-?\s*(?P<num>\d{3,4}[A-Z]?)\s*\]",
    ))
    .expect("valid substitution regex")
});

static INSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:college|university|institute|community)\b")
        .expect("valid institution regex")
});

pub struct EvidenceAggregator<'s> {
    settings: &'s AuditSettings,
}

impl<'s> EvidenceAggregator<'s> {
    #[must_use]
    pub fn new(settings: &'s AuditSettings) -> Self {
        Self { settings }
    }

    /// Parse a raw document and aggregate it.
    ///
    /// Fails only when the input cannot be read as an audit report at all.
    pub fn extract_evidence(&self, raw: &str) -> Result<Evidence, AuditError> {
        let document = AuditDocument::parse(raw)?;
        Ok(self.aggregate(&document))
    }

    #[must_use]
    pub fn aggregate(&self, document: &AuditDocument) -> Evidence {
        let settings = self.settings;
        let parser = TranscriptRowParser::new(&settings.normalizer);
        let text = document.text();

        let mut evidence = Evidence::default();
        record_rows(&mut evidence, &parser.parse_document(document));

        evidence.substitutions = match document {
            AuditDocument::Text(_) => corroborated_substitutions(text, &settings.normalizer),
            AuditDocument::Html(_) => substitutions(text, &settings.normalizer)
                .into_iter()
                .map(|(code, label, _)| (code, label))
                .collect(),
        };

        let ge = GeneralEducationSlotMatcher::new(parser, &settings.extra_boundary_markers);
        let mut slots = ge.evaluate(text);
        let american_institutions = self.apply_overlays(document, &mut slots);
        evidence.ge_slots = slots.fold();
        if let Some(record) = american_institutions {
            evidence
                .ge_slots
                .insert(SlotKey::new(AMERICAN_INSTITUTIONS_KEY), record);
        }

        evidence.tech = TechnicalElectiveMatcher::new(
            &settings.normalizer,
            &settings.tech_start_marker,
            &settings.tech_end_markers,
        )
        .match_electives(text);

        let summary = evidence.summary();
        tracing::info!(
            passed = summary.passed,
            ip = summary.ip,
            substitutions = summary.substitutions,
            ge_slots = summary.ge_slots,
            ge_complete = summary.ge_complete,
            tech_completed = summary.tech_completed,
            tech_ip = summary.tech_ip,
            "extracted audit evidence"
        );
        evidence
    }

    /// Certify slots from requirement containers. Failures leave the slots as
    /// they were.
    fn apply_overlays(
        &self,
        document: &AuditDocument,
        slots: &mut SlotEvaluation,
    ) -> Option<GeSlotRecord> {
        let query = document.query()?;
        let overlay = match RequirementOverlay::new(&self.settings.certification_phrases) {
            Ok(overlay) => overlay,
            Err(err) => {
                tracing::warn!(details = %err.to_json(), "skipping requirement overlays: {err}");
                return None;
            }
        };

        let mut american_institutions = None;
        for hit in overlay.find_certified(query, slots.schema) {
            if hit.key == AMERICAN_INSTITUTIONS_KEY {
                american_institutions = Some(GeSlotRecord::completed_with_note(hit.note));
            } else if slots.certify(hit.key, &hit.note) {
                tracing::debug!(slot = hit.key, "slot certified by requirement block");
            }
        }
        american_institutions
    }
}

fn record_rows(evidence: &mut Evidence, rows: &[TranscriptRow]) {
    for row in rows {
        if row.grade.is_in_progress() {
            evidence.ip.insert(row.code.clone());
        } else if row.grade.is_passing() {
            evidence.passed.insert(row.code.clone());
        }
    }
}

/// Every bracketed `<label> SUBS <code>` claim with its byte range.
fn substitutions(
    text: &str,
    normalizer: &TextNormalizer,
) -> Vec<(CourseCode, String, (usize, usize))> {
    SUBSTITUTION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let code = normalizer.normalize_code(&format!("{} {}", &caps["dept"], &caps["num"]));
            Some((code, caps["label"].trim().to_string(), (whole.start(), whole.end())))
        })
        .collect()
}

/// Substitutions whose label also appears outside the claim, attributed to an
/// institution.
fn corroborated_substitutions(
    text: &str,
    normalizer: &TextNormalizer,
) -> BTreeMap<CourseCode, String> {
    substitutions(text, normalizer)
        .into_iter()
        .filter(|(code, label, (start, end))| {
            let trusted = label_is_corroborated(text, label, *start, *end);
            if !trusted {
                tracing::debug!(
                    code = %code,
                    label = %label,
                    "rejecting uncorroborated substitution"
                );
            }
            trusted
        })
        .map(|(code, label, _)| (code, label))
        .collect()
}

fn label_is_corroborated(text: &str, label: &str, claim_start: usize, claim_end: usize) -> bool {
    let Ok(pattern) = Regex::new(&format!("(?i){}", regex::escape(label))) else {
        return false;
    };
    pattern
        .find_iter(text)
        .filter(|m| m.end() <= claim_start || m.start() >= claim_end)
        .any(|m| {
            let rest = &text[m.end()..];
            let window_end = rest
                .char_indices()
                .nth(CORROBORATION_WINDOW_CHARS)
                .map_or(rest.len(), |(i, _)| i);
            INSTITUTION.is_match(&rest[..window_end])
        })
}
