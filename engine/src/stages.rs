//! Reconciliation stages.
//!
//! Stages run in a fixed order over one [`Staging`] map. Each later stage sees
//! only the capacity earlier stages left behind.

use std::collections::{BTreeSet, HashMap};
use std::iter;

use regex::Regex;

use gradmap_audit::{AMERICAN_INSTITUTIONS_KEY, EquivalencyResolver, TextNormalizer};
use gradmap_types::{
    CourseCode, CurriculumNode, Evidence, GeSlotRecord, GeStatus, NodeCategory, ScheduleLabel,
    SlotKey,
};

use crate::ReconcileSettings;
use crate::staging::Staging;
use crate::templates::NoteTemplates;

/// Read-only inputs shared by every stage.
pub struct StageContext<'a> {
    pub evidence: &'a Evidence,
    pub nodes: &'a [CurriculumNode],
    /// Normalized code per node, parallel to `nodes`.
    pub codes: Vec<CourseCode>,
    pub resolver: &'a EquivalencyResolver,
    pub normalizer: &'a TextNormalizer,
    pub settings: &'a ReconcileSettings,
    pub templates: Option<&'a NoteTemplates>,
}

impl<'a> StageContext<'a> {
    pub fn nodes(&self) -> impl Iterator<Item = (&'a CurriculumNode, &CourseCode)> {
        self.nodes.iter().zip(self.codes.iter())
    }
}

/// What one stage did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub changed: usize,
    pub dropped: usize,
}

impl StageReport {
    fn new(stage: &'static str) -> Self {
        Self {
            stage,
            changed: 0,
            dropped: 0,
        }
    }
}

pub trait Stage {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport;
}

fn matches_with_alternates(
    resolver: &EquivalencyResolver,
    code: &CourseCode,
    matches: impl Fn(&CourseCode) -> bool,
) -> bool {
    matches(code)
        || resolver
            .cross_department_alternates(code)
            .iter()
            .any(matches)
}

// ============================================================================
// 1. In progress
// ============================================================================

/// Mark nodes with in-progress evidence `In Prog.`.
///
/// Pending evidence is the `ip` set plus parts of lecture/lab pairs that are
/// passed while the pair is still incomplete.
pub struct InProgressStage;

impl Stage for InProgressStage {
    fn name(&self) -> &'static str {
        "in_progress"
    }

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport {
        let mut report = StageReport::new(self.name());
        let mut pending: BTreeSet<CourseCode> = ctx.evidence.ip.clone();
        pending.extend(ctx.resolver.partially_passed_parts(&ctx.evidence.passed));
        if pending.is_empty() {
            return report;
        }

        for (node, code) in ctx.nodes() {
            if staging.is_occupied(&node.id) {
                continue;
            }
            if matches_with_alternates(ctx.resolver, code, |c| {
                ctx.resolver.is_in_progress_match(c, &pending)
            }) {
                staging.set_label(&node.id, ScheduleLabel::InProgress);
                report.changed += 1;
            }
        }
        report
    }
}

// ============================================================================
// 2. Technical electives
// ============================================================================

/// Fill unused technical-elective placeholders, completed codes first.
pub struct TechElectiveStage;

impl Stage for TechElectiveStage {
    fn name(&self) -> &'static str {
        "tech_electives"
    }

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport {
        let mut report = StageReport::new(self.name());
        let tech_nodes: Vec<&CurriculumNode> = ctx
            .nodes
            .iter()
            .filter(|node| node.category == NodeCategory::TechnicalElective)
            .collect();

        // Codes a user already placed on some elective node are not placed twice.
        let already_noted: BTreeSet<String> = tech_nodes
            .iter()
            .filter_map(|node| staging.entry(&node.id).and_then(|e| e.note.clone()))
            .collect();

        let mut unused = tech_nodes
            .iter()
            .filter(|node| staging.is_unused(&node.id) && !staging.struck().contains(&node.id))
            .map(|node| node.id.clone())
            .collect::<Vec<_>>()
            .into_iter();

        let tech = &ctx.evidence.tech;
        let queue = tech
            .completed
            .iter()
            .map(|code| (code, ScheduleLabel::Strike))
            .chain(
                tech.ip
                    .iter()
                    .filter(|code| !tech.completed.contains(code))
                    .map(|code| (code, ScheduleLabel::InProgress)),
            )
            .filter(|(code, _)| !already_noted.contains(code.as_str()));

        for (code, label) in queue {
            let Some(id) = unused.next() else {
                report.dropped += 1;
                continue;
            };
            staging.set_note(&id, code.as_str());
            staging.set_label(&id, label);
            report.changed += 1;
        }
        report
    }
}

// ============================================================================
// 3. General education
// ============================================================================

/// Place GE slot outcomes on named or generic GE nodes.
///
/// Statuses drain in order complete, IP, tentative, missing. A key prefers a
/// node whose label names it; otherwise it takes the next generic GE node.
pub struct GeAllocationStage;

const GE_STATUS_ORDER: [GeStatus; 4] = [
    GeStatus::Complete,
    GeStatus::InProgress,
    GeStatus::Tentative,
    GeStatus::Missing,
];

/// Label pattern for a slot key. A merged key (`C.3/Z`) also matches either side.
fn key_pattern(key: &SlotKey) -> Option<Regex> {
    let key = key.as_str();
    let pattern = if key == AMERICAN_INSTITUTIONS_KEY {
        let escaped = regex::escape(key);
        format!(r"(?i)(?:\b{escaped}\b|\bAmerican\s+Institutions\b)")
    } else {
        let sides = key.split('/').filter(|side| !side.is_empty() && *side != key);
        let names = iter::once(key)
            .chain(sides)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        format!(r"(?i)(?:\bArea\s+)?\b(?:{names})\b")
    };
    Regex::new(&pattern).ok()
}

fn ge_note(key: &SlotKey, record: &GeSlotRecord) -> String {
    match record.status {
        GeStatus::Complete | GeStatus::InProgress => match &record.code {
            Some(code) => format!("{code} ({key})"),
            None => format!("{key} ({})", record.note.as_deref().unwrap_or("Waived")),
        },
        GeStatus::Tentative => record.note.clone().unwrap_or_else(|| key.to_string()),
        GeStatus::Missing => key.to_string(),
    }
}

fn ge_label(status: GeStatus) -> Option<ScheduleLabel> {
    match status {
        GeStatus::Complete => Some(ScheduleLabel::Strike),
        GeStatus::InProgress => Some(ScheduleLabel::InProgress),
        GeStatus::Tentative => Some(ScheduleLabel::Review),
        GeStatus::Missing => None,
    }
}

impl Stage for GeAllocationStage {
    fn name(&self) -> &'static str {
        "ge_allocation"
    }

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport {
        let mut report = StageReport::new(self.name());
        let slots = &ctx.evidence.ge_slots;
        let patterns: HashMap<&SlotKey, Regex> = slots
            .keys()
            .filter_map(|key| key_pattern(key).map(|re| (key, re)))
            .collect();

        let ge_nodes: Vec<(&CurriculumNode, &CourseCode)> = ctx
            .nodes()
            .filter(|(node, _)| node.category == NodeCategory::GeneralEducation)
            .collect();
        let generic: Vec<&CurriculumNode> = ge_nodes
            .iter()
            .filter(|(node, code)| {
                let label = node.display_label();
                !patterns.values().any(|re| re.is_match(label))
                    && EquivalencyResolver::parse(code).is_none()
            })
            .map(|(node, _)| *node)
            .collect();

        for status in GE_STATUS_ORDER {
            for (key, record) in slots.iter().filter(|(_, r)| r.status == status) {
                let named = patterns.get(key).and_then(|re| {
                    ge_nodes
                        .iter()
                        .map(|(node, _)| *node)
                        .find(|node| {
                            re.is_match(node.display_label()) && staging.is_unused(&node.id)
                        })
                });
                let target = named.or_else(|| {
                    generic
                        .iter()
                        .copied()
                        .find(|node| staging.is_unused(&node.id))
                });
                let Some(node) = target else {
                    tracing::debug!(slot = %key, status = ?status, "no GE placeholder left");
                    report.dropped += 1;
                    continue;
                };

                staging.set_note(&node.id, &ge_note(key, record));
                if let Some(label) = ge_label(status) {
                    staging.set_label(&node.id, label);
                }
                report.changed += 1;
            }
        }
        report
    }
}

// ============================================================================
// 4. Completion strike
// ============================================================================

/// Strike remaining course nodes the passed set satisfies.
pub struct CompletionStrikeStage;

impl Stage for CompletionStrikeStage {
    fn name(&self) -> &'static str {
        "completion_strike"
    }

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport {
        let mut report = StageReport::new(self.name());
        let passed = &ctx.evidence.passed;
        if passed.is_empty() {
            return report;
        }

        for (node, code) in ctx.nodes() {
            let eligible = match node.category {
                NodeCategory::GeneralEducation | NodeCategory::TechnicalElective => {
                    ctx.settings.strike_whitelist.contains(code)
                }
                NodeCategory::Other(_) => true,
            };
            if !eligible || staging.is_occupied(&node.id) {
                continue;
            }

            let satisfied = ctx.resolver.is_satisfied_match(code, passed)
                || passed.contains(code)
                || matches_with_alternates(ctx.resolver, code, |c| {
                    ctx.resolver.is_satisfied_match(c, passed)
                });
            if satisfied {
                staging.strike(&node.id);
                report.changed += 1;
            }
        }
        report
    }
}

// ============================================================================
// 5. Substitutions
// ============================================================================

/// Note the substituted course on nodes struck by the completion pass.
pub struct SubstitutionStage;

impl Stage for SubstitutionStage {
    fn name(&self) -> &'static str {
        "substitution"
    }

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport {
        let mut report = StageReport::new(self.name());
        let substitutions = &ctx.evidence.substitutions;
        if substitutions.is_empty() {
            return report;
        }

        for (node, code) in ctx.nodes() {
            if !staging.struck().contains(&node.id) || staging.has_note(&node.id) {
                continue;
            }
            if let Some(label) = substitutions.get(code) {
                staging.set_note(&node.id, label);
                report.changed += 1;
            }
        }
        report
    }
}

// ============================================================================
// 6. Template notes
// ============================================================================

/// Fill still-empty notes from the program's note template.
pub struct TemplateNoteStage;

impl Stage for TemplateNoteStage {
    fn name(&self) -> &'static str {
        "template_notes"
    }

    fn run(&self, ctx: &StageContext<'_>, staging: &mut Staging) -> StageReport {
        let mut report = StageReport::new(self.name());
        let Some(templates) = ctx.templates else {
            return report;
        };

        for (node, code) in ctx.nodes() {
            if staging.has_note(&node.id) {
                continue;
            }
            let note = templates.note_for(code).or_else(|| {
                node.label
                    .as_deref()
                    .and_then(|label| templates.note_for(&ctx.normalizer.normalize_code(label)))
            });
            if let Some(note) = note {
                staging.set_note(&node.id, note);
                report.changed += 1;
            }
        }
        report
    }
}

/// The stage order reconciliation depends on.
#[must_use]
pub fn default_stages() -> Vec<Box<dyn Stage + Send + Sync>> {
    vec![
        Box::new(InProgressStage),
        Box::new(TechElectiveStage),
        Box::new(GeAllocationStage),
        Box::new(CompletionStrikeStage),
        Box::new(SubstitutionStage),
        Box::new(TemplateNoteStage),
    ]
}
