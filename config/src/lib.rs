//! Configuration for gradmap.
//!
//! Everything is optional. The file lives at `~/.gradmap/config.toml`:
//!
//! ```toml
//! [audit]
//! extra_boundary_markers = ["Minor Requirements"]
//! tech_start_marker = "Technical Electives"
//! tech_end_markers = ["General Education", "Unit Requirements"]
//! certification_phrases = ["Associate Degree for Transfer"]
//!
//! [[audit.equivalencies]]
//! combined = "EGEC 180"
//! parts = ["EGEC 180A", "EGEC 180L"]
//!
//! [[audit.aliases]]
//! from = "CPSC 1201"
//! to = "CPSC 120L"
//!
//! [audit.cross_department]
//! generic = "EGGN"
//! siblings = ["EGCP", "EGEC", "EGEE", "EGME", "EGCE"]
//!
//! [engine]
//! strike_whitelist = ["MATH 338"]
//!
//! [notes]
//! dir = "${HOME}/advising/notes"
//! ```
//!
//! Boundary types keep `Option` fields; consumers resolve them against their
//! own defaults.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct GradmapConfig {
    pub audit: Option<AuditConfig>,
    pub engine: Option<EngineConfig>,
    pub notes: Option<NotesConfig>,
}

/// Extraction tuning. Lists here extend the built-in tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Extra headers that end a general-education slice.
    pub extra_boundary_markers: Option<Vec<String>>,
    /// Header that opens the technical-electives section.
    pub tech_start_marker: Option<String>,
    /// Headers that close the technical-electives section (first one wins).
    pub tech_end_markers: Option<Vec<String>>,
    /// Extra regex phrases that count as certification in requirement containers.
    pub certification_phrases: Option<Vec<String>>,
    pub equivalencies: Option<Vec<EquivalencyConfig>>,
    pub aliases: Option<Vec<AliasConfig>>,
    pub cross_department: Option<CrossDepartmentConfig>,
}

impl AuditConfig {
    pub const DEFAULT_TECH_START_MARKER: &'static str = "Technical Electives";
    pub const DEFAULT_TECH_END_MARKERS: &'static [&'static str] = &[
        "General Education",
        "Upper Division Writing",
        "Unit Requirements",
        "Residence Requirement",
        "Electives Not Applicable",
    ];

    #[must_use]
    pub fn tech_start_marker(&self) -> &str {
        self.tech_start_marker
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(Self::DEFAULT_TECH_START_MARKER)
    }

    #[must_use]
    pub fn tech_end_markers(&self) -> Vec<String> {
        match &self.tech_end_markers {
            Some(markers) if !markers.is_empty() => markers.clone(),
            _ => Self::DEFAULT_TECH_END_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EquivalencyConfig {
    pub combined: String,
    pub parts: [String; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasConfig {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrossDepartmentConfig {
    pub generic: String,
    pub siblings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Course codes in the GE category that the completion strike pass still checks.
    pub strike_whitelist: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotesConfig {
    /// Directory holding `<program>.toml` note templates. Supports `${VAR}`.
    pub dir: Option<String>,
}

impl NotesConfig {
    /// Template path for a program, if a notes directory is known.
    #[must_use]
    pub fn template_path(&self, program: &str) -> Option<PathBuf> {
        let dir = match &self.dir {
            Some(dir) => PathBuf::from(expand_env_vars(dir)),
            None => config_dir()?.join("notes"),
        };
        Some(dir.join(format!("{program}.toml")))
    }
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        if let Some(end) = after.find('}') {
            let var = &after[..end];
            if !var.is_empty() {
                out.push_str(&env::var(var).unwrap_or_default());
            }
            rest = &after[end + 1..];
        } else {
            out.push_str(&rest[start..]);
            rest = "";
        }
    }
    out.push_str(rest);
    out
}

impl GradmapConfig {
    /// Load the user config, logging and ignoring unreadable or malformed files.
    pub fn load() -> Option<Self> {
        let path = config_path()?;
        if !path.exists() {
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn audit(&self) -> AuditConfig {
        self.audit.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn engine(&self) -> EngineConfig {
        self.engine.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn notes(&self) -> NotesConfig {
        self.notes.clone().unwrap_or_default()
    }
}

fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gradmap"))
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
