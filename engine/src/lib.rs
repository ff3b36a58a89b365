//! Reconciliation of audit evidence against a curriculum graph.
//!
//! [`ReconciliationEngine`] runs an ordered list of stages over one staging
//! map seeded from the currently displayed state:
//!
//! 1. in-progress matches
//! 2. technical-elective placeholders
//! 3. general-education placeholders
//! 4. completion strikes
//! 5. substitution notes
//! 6. program note templates
//!
//! Later stages only see capacity earlier ones left. The result replaces the
//! caller's label/note state as a whole.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod reconcile;
mod stages;
mod staging;
mod templates;

pub use reconcile::{ReconcileSettings, ReconciliationEngine};
pub use stages::{
    CompletionStrikeStage, GeAllocationStage, InProgressStage, Stage, StageContext, StageReport,
    SubstitutionStage, TechElectiveStage, TemplateNoteStage, default_stages,
};
pub use staging::Staging;
pub use templates::{NoteTemplateCache, NoteTemplates, TemplateError};

pub use gradmap_types::ReconciliationResult;
