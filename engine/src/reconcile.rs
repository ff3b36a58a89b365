//! The reconciliation pipeline.

use std::collections::BTreeSet;

use gradmap_audit::{AuditSettings, EquivalencyResolver, TextNormalizer};
use gradmap_config::EngineConfig;
use gradmap_types::{CourseCode, CurriculumNode, Evidence, ReconciliationResult};

use crate::stages::{Stage, StageContext, StageReport, default_stages};
use crate::staging::Staging;
use crate::templates::NoteTemplates;

/// Resolved engine configuration.
#[derive(Debug, Clone, Default)]
pub struct ReconcileSettings {
    /// GE or elective node codes the completion pass still checks.
    pub strike_whitelist: BTreeSet<CourseCode>,
}

impl ReconcileSettings {
    #[must_use]
    pub fn from_config(config: &EngineConfig, normalizer: &TextNormalizer) -> Self {
        let strike_whitelist = config
            .strike_whitelist
            .iter()
            .flatten()
            .filter(|code| !code.trim().is_empty())
            .map(|code| normalizer.normalize_code(code))
            .collect();
        Self { strike_whitelist }
    }
}

/// Maps audit evidence onto curriculum nodes.
///
/// Holds no per-run state: every [`ReconciliationEngine::reconcile`] call
/// starts from the displayed state it is given and returns a full replacement.
pub struct ReconciliationEngine {
    normalizer: TextNormalizer,
    resolver: EquivalencyResolver,
    settings: ReconcileSettings,
    stages: Vec<Box<dyn Stage + Send + Sync>>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::from_settings(&AuditSettings::default(), ReconcileSettings::default())
    }
}

impl ReconciliationEngine {
    /// Share normalization and equivalencies with the extractor that produced
    /// the evidence.
    #[must_use]
    pub fn from_settings(audit: &AuditSettings, settings: ReconcileSettings) -> Self {
        Self {
            normalizer: audit.normalizer.clone(),
            resolver: audit.equivalencies.clone(),
            settings,
            stages: default_stages(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Produce the label/note map for `nodes`.
    ///
    /// Entries in `displayed` are never overwritten. The returned map contains
    /// them alongside everything the stages added.
    #[must_use]
    pub fn reconcile(
        &self,
        evidence: &Evidence,
        nodes: &[CurriculumNode],
        displayed: &ReconciliationResult,
        templates: Option<&NoteTemplates>,
    ) -> ReconciliationResult {
        let ctx = StageContext {
            evidence,
            nodes,
            codes: nodes
                .iter()
                .map(|node| self.normalizer.normalize_code(&node.code))
                .collect(),
            resolver: &self.resolver,
            normalizer: &self.normalizer,
            settings: &self.settings,
            templates,
        };

        let mut staging = Staging::seeded(displayed);
        let reports: Vec<StageReport> = self
            .stages
            .iter()
            .map(|stage| {
                let report = stage.run(&ctx, &mut staging);
                tracing::debug!(
                    stage = report.stage,
                    changed = report.changed,
                    dropped = report.dropped,
                    "reconciliation stage finished"
                );
                report
            })
            .collect();

        let result = staging.into_result();
        tracing::info!(
            nodes = nodes.len(),
            entries = result.len(),
            changed = reports.iter().map(|r| r.changed).sum::<usize>(),
            dropped = reports.iter().map(|r| r.dropped).sum::<usize>(),
            "reconciled curriculum"
        );
        result
    }
}
