//! Resolved extraction settings.
//!
//! [`AuditConfig`] is the boundary type with optional fields; this is what the
//! extractor actually runs on. Resolution happens once per run.

use gradmap_config::AuditConfig;

use crate::equivalency::EquivalencyResolver;
use crate::normalize::TextNormalizer;

#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub normalizer: TextNormalizer,
    pub equivalencies: EquivalencyResolver,
    /// Extra headers that end a general-education slice.
    pub extra_boundary_markers: Vec<String>,
    pub tech_start_marker: String,
    pub tech_end_markers: Vec<String>,
    /// Extra regex phrases counted as certification inside requirement containers.
    pub certification_phrases: Vec<String>,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self::from_config(&AuditConfig::default())
    }
}

impl AuditSettings {
    #[must_use]
    pub fn from_config(config: &AuditConfig) -> Self {
        let normalizer =
            TextNormalizer::with_aliases(config.aliases.as_deref().unwrap_or_default());
        let equivalencies = EquivalencyResolver::from_config(
            config.equivalencies.as_deref().unwrap_or_default(),
            config.cross_department.as_ref(),
            &normalizer,
        );

        Self {
            normalizer,
            equivalencies,
            extra_boundary_markers: non_blank(config.extra_boundary_markers.as_deref()),
            tech_start_marker: config.tech_start_marker().to_string(),
            tech_end_markers: config.tech_end_markers(),
            certification_phrases: non_blank(config.certification_phrases.as_deref()),
        }
    }
}

fn non_blank(values: Option<&[String]>) -> Vec<String> {
    values
        .unwrap_or_default()
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::AuditSettings;
    use gradmap_config::{AliasConfig, AuditConfig};

    #[test]
    fn defaults_resolve_without_config() {
        let settings = AuditSettings::default();
        assert_eq!(settings.tech_start_marker, "Technical Electives");
        assert!(!settings.tech_end_markers.is_empty());
        assert_eq!(settings.equivalencies.groups().len(), 2);
        assert!(settings.certification_phrases.is_empty());
    }

    #[test]
    fn blank_entries_are_ignored() {
        let settings = AuditSettings::from_config(&AuditConfig {
            extra_boundary_markers: Some(vec![
                "  ".to_string(),
                " Minor Requirements ".to_string(),
            ]),
            aliases: Some(vec![AliasConfig {
                from: "MATH 15OA".to_string(),
                to: "MATH 150A".to_string(),
            }]),
            ..Default::default()
        });
        assert_eq!(settings.extra_boundary_markers, ["Minor Requirements"]);
        assert_eq!(
            settings.normalizer.normalize_code("math 15oa").as_str(),
            "MATH 150A"
        );
    }
}
