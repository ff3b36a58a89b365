//! Degree-audit extraction.
//!
//! Turns an exported academic-progress audit (free text or HTML) into
//! [`Evidence`]: passed and in-progress course sets, substitutions, per-slot
//! general-education status, and technical-elective mentions.
//!
//! # Pipeline
//!
//! 1. [`AuditDocument::parse`] detects markup vs text and normalizes it.
//! 2. [`TranscriptRowParser`] yields rows in document order.
//! 3. [`EvidenceAggregator`] folds rows into sets and runs the
//!    [`GeneralEducationSlotMatcher`], structural overlays, and the
//!    [`TechnicalElectiveMatcher`].
//!
//! Malformed structure never fails extraction; unmatched things stay
//! missing. Only a document that cannot be read at all is an [`AuditError`].

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics only on literal regexes

mod document;
mod equivalency;
mod error;
mod evidence;
mod ge;
mod normalize;
mod overlay;
mod rows;
mod schema;
mod settings;
mod tech;

pub use document::{
    AuditDocument, CellView, ContainerView, DocumentQuery, ElementMeta, HtmlDocument, RowView,
    TableView,
};
pub use equivalency::{EquivalencyResolver, ParsedCode};
pub use error::{AuditError, ErrorCode, ErrorDetails};
pub use evidence::EvidenceAggregator;
pub use ge::{GeneralEducationSlotMatcher, SlotEvaluation, merge_dual};
pub use normalize::{TextNormalizer, normalize_text};
pub use overlay::{AMERICAN_INSTITUTIONS_KEY, OverlayHit, RequirementOverlay};
pub use rows::{TranscriptRowParser, normalize_grade, strip_advisory};
pub use schema::{DualSlot, GeSchema, SchemaKind, SlotSpec};
pub use settings::AuditSettings;
pub use tech::TechnicalElectiveMatcher;

pub use gradmap_types::Evidence;

/// Extract evidence from a raw document with the given settings.
pub fn extract_evidence(raw: &str, settings: &AuditSettings) -> Result<Evidence, AuditError> {
    EvidenceAggregator::new(settings).extract_evidence(raw)
}
