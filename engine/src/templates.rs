//! Per-program supplemental note templates and their cache.
//!
//! A template is a small TOML file:
//!
//! ```toml
//! [notes]
//! "CPSC 131" = "Take with MATH 170A"
//! "GE Area B.4" = "MATH 150A recommended"
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use gradmap_audit::TextNormalizer;
use gradmap_types::CourseCode;

#[derive(Debug, Error)]
#[error("failed to parse note template for {program}: {source}")]
pub struct TemplateError {
    pub program: String,
    #[source]
    pub source: toml::de::Error,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    notes: HashMap<String, String>,
}

/// Parsed notes keyed by normalized node code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteTemplates {
    notes: HashMap<CourseCode, String>,
}

impl NoteTemplates {
    pub fn parse(
        program: &str,
        content: &str,
        normalizer: &TextNormalizer,
    ) -> Result<Self, TemplateError> {
        let file: TemplateFile = toml::from_str(content).map_err(|source| TemplateError {
            program: program.to_string(),
            source,
        })?;
        let notes = file
            .notes
            .into_iter()
            .map(|(code, note)| (normalizer.normalize_code(&code), note))
            .collect();
        Ok(Self { notes })
    }

    #[must_use]
    pub fn note_for(&self, code: &CourseCode) -> Option<&str> {
        self.notes.get(code).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Parsed templates memoized by program for the caller's lifetime.
///
/// Templates never change once parsed, so entries are shared as `Arc`s.
#[derive(Debug, Default)]
pub struct NoteTemplateCache {
    entries: HashMap<String, Arc<NoteTemplates>>,
}

impl NoteTemplateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, program: &str) -> Option<Arc<NoteTemplates>> {
        self.entries.get(program).cloned()
    }

    pub fn insert(&mut self, program: &str, templates: NoteTemplates) -> Arc<NoteTemplates> {
        let templates = Arc::new(templates);
        self.entries
            .insert(program.to_string(), Arc::clone(&templates));
        templates
    }

    /// Cached templates for `program`, parsing `content` only on a miss.
    pub fn get_or_parse(
        &mut self,
        program: &str,
        normalizer: &TextNormalizer,
        content: impl FnOnce() -> String,
    ) -> Result<Arc<NoteTemplates>, TemplateError> {
        if let Some(templates) = self.get(program) {
            return Ok(templates);
        }
        let parsed = NoteTemplates::parse(program, &content(), normalizer)?;
        tracing::debug!(program, notes = parsed.len(), "cached note template");
        Ok(self.insert(program, parsed))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{NoteTemplateCache, NoteTemplates};
    use gradmap_audit::TextNormalizer;
    use gradmap_types::CourseCode;

    const TEMPLATE: &str = r#"
        [notes]
        "cpsc131" = "Take with MATH 170A"
        "GE Area B.4" = "MATH 150A recommended"
    "#;

    #[test]
    fn parse_normalizes_keys() {
        let normalizer = TextNormalizer::default();
        let templates = NoteTemplates::parse("cpsc", TEMPLATE, &normalizer).unwrap();
        assert_eq!(
            templates.note_for(&CourseCode::from_canonical("CPSC 131")),
            Some("Take with MATH 170A")
        );
        assert_eq!(
            templates.note_for(&CourseCode::from_canonical("GE AREA B.4")),
            Some("MATH 150A recommended")
        );
    }

    #[test]
    fn parse_errors_name_the_program() {
        let normalizer = TextNormalizer::default();
        let err = NoteTemplates::parse("cpsc", "[notes\n", &normalizer).unwrap_err();
        assert!(err.to_string().contains("cpsc"));
    }

    #[test]
    fn cache_parses_once_per_program() {
        let normalizer = TextNormalizer::default();
        let mut cache = NoteTemplateCache::new();
        let first = cache
            .get_or_parse("cpsc", &normalizer, || TEMPLATE.to_string())
            .unwrap();
        let second = cache
            .get_or_parse("cpsc", &normalizer, || panic!("cached program must not re-read"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
