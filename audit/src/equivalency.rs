//! Combined-vs-split course equivalencies and cross-department aliases.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use gradmap_config::{CrossDepartmentConfig, EquivalencyConfig};
use gradmap_types::{CourseCode, EquivalencyGroup};

use crate::error::{AuditError, ErrorCode};
use crate::normalize::TextNormalizer;

/// Lecture/lab pairs that only count as the combined course together.
const BUILTIN_EQUIVALENCIES: &[(&str, [&str; 2])] = &[
    ("CPSC 120", ["CPSC 120A", "CPSC 120L"]),
    ("CPSC 121", ["CPSC 121A", "CPSC 121L"]),
];

const DEFAULT_GENERIC_DEPARTMENT: &str = "EGGN";
const DEFAULT_SIBLING_DEPARTMENTS: &[&str] = &["EGCP", "EGEC", "EGEE", "EGME", "EGCE"];

static CODE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<dept>[A-Z]{2,6}) (?P<num>\d{3,4})(?P<part>[A-Z])?$")
        .expect("valid course shape regex")
});

/// Department, number and optional part letter of a canonical code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCode {
    pub dept: String,
    pub num: String,
    pub part: Option<char>,
}

impl ParsedCode {
    /// `"DEPT NUM"` without the part letter.
    #[must_use]
    pub fn base(&self) -> CourseCode {
        CourseCode::from_canonical(format!("{} {}", self.dept, self.num))
    }
}

#[derive(Debug, Clone)]
pub struct CrossDepartment {
    generic: String,
    siblings: Vec<String>,
}

/// How a query code relates to an equivalency group.
enum QueryForm<'g> {
    /// The bare combined code, or placeholder notation such as `CPSC 120A/L`.
    Combined(&'g EquivalencyGroup),
    /// One named part.
    Part(&'g EquivalencyGroup, &'g CourseCode),
}

#[derive(Debug, Clone)]
pub struct EquivalencyResolver {
    groups: Vec<EquivalencyGroup>,
    cross_department: Option<CrossDepartment>,
}

impl Default for EquivalencyResolver {
    fn default() -> Self {
        let groups = BUILTIN_EQUIVALENCIES
            .iter()
            .filter_map(|(combined, [a, b])| {
                EquivalencyGroup::new(
                    CourseCode::from_canonical(*combined),
                    [CourseCode::from_canonical(*a), CourseCode::from_canonical(*b)],
                )
                .ok()
            })
            .collect();
        Self {
            groups,
            cross_department: Some(CrossDepartment {
                generic: DEFAULT_GENERIC_DEPARTMENT.to_string(),
                siblings: DEFAULT_SIBLING_DEPARTMENTS
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            }),
        }
    }
}

impl EquivalencyResolver {
    /// Built-in table extended (or overridden per combined code) by configuration.
    ///
    /// Entries that break the group invariant are dropped and logged.
    #[must_use]
    pub fn from_config(
        equivalencies: &[EquivalencyConfig],
        cross_department: Option<&CrossDepartmentConfig>,
        normalizer: &TextNormalizer,
    ) -> Self {
        let mut resolver = Self::default();

        for entry in equivalencies {
            let combined = normalizer.normalize_code(&entry.combined);
            let parts = [
                normalizer.normalize_code(&entry.parts[0]),
                normalizer.normalize_code(&entry.parts[1]),
            ];
            match EquivalencyGroup::new(combined, parts) {
                Ok(group) => {
                    resolver.groups.retain(|g| g.combined != group.combined);
                    resolver.groups.push(group);
                }
                Err(err) => {
                    let err = AuditError::new(ErrorCode::InvalidConfig, err.to_string())
                        .with_detail("combined", entry.combined.as_str());
                    tracing::warn!(combined = %entry.combined, "dropping equivalency: {err}");
                }
            }
        }

        if let Some(cross) = cross_department {
            let generic = cross.generic.trim().to_ascii_uppercase();
            resolver.cross_department = (!generic.is_empty()).then(|| CrossDepartment {
                generic,
                siblings: cross
                    .siblings
                    .iter()
                    .map(|s| s.trim().to_ascii_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect(),
            });
        }

        resolver
    }

    /// Split a canonical code into its parts, or `None` if it is not course-shaped.
    #[must_use]
    pub fn parse(code: &CourseCode) -> Option<ParsedCode> {
        let caps = CODE_SHAPE.captures(code.as_str())?;
        Some(ParsedCode {
            dept: caps["dept"].to_string(),
            num: caps["num"].to_string(),
            part: caps.name("part").and_then(|m| m.as_str().chars().next()),
        })
    }

    /// The group this code belongs to, as combined, part or placeholder.
    #[must_use]
    pub fn group_for(&self, code: &CourseCode) -> Option<&EquivalencyGroup> {
        self.classify(code).map(|form| match form {
            QueryForm::Combined(group) | QueryForm::Part(group, _) => group,
        })
    }

    #[must_use]
    pub fn groups(&self) -> &[EquivalencyGroup] {
        &self.groups
    }

    fn classify(&self, code: &CourseCode) -> Option<QueryForm<'_>> {
        if let Some((head, _)) = code.as_str().split_once('/') {
            let base = Self::parse(&CourseCode::from_canonical(head.trim()))?.base();
            return self
                .groups
                .iter()
                .find(|g| g.combined == base)
                .map(QueryForm::Combined);
        }

        self.groups.iter().find_map(|group| {
            if group.combined == *code {
                Some(QueryForm::Combined(group))
            } else {
                group
                    .parts
                    .iter()
                    .find(|part| *part == code)
                    .map(|part| QueryForm::Part(group, part))
            }
        })
    }

    /// In-progress evidence for `code`.
    ///
    /// A combined or placeholder query is matched by the combined code or
    /// either part; a part query by that part or the combined code.
    #[must_use]
    pub fn is_in_progress_match(&self, code: &CourseCode, ip: &BTreeSet<CourseCode>) -> bool {
        match self.classify(code) {
            None => ip.contains(code),
            Some(QueryForm::Combined(group)) => {
                ip.contains(&group.combined) || group.parts.iter().any(|p| ip.contains(p))
            }
            Some(QueryForm::Part(group, part)) => {
                ip.contains(part) || ip.contains(&group.combined)
            }
        }
    }

    /// Completion evidence for `code`.
    ///
    /// A combined or placeholder query needs the combined code or both parts;
    /// one passed part is not completion.
    #[must_use]
    pub fn is_satisfied_match(&self, code: &CourseCode, passed: &BTreeSet<CourseCode>) -> bool {
        match self.classify(code) {
            None => passed.contains(code),
            Some(QueryForm::Combined(group)) => {
                passed.contains(&group.combined) || group.parts.iter().all(|p| passed.contains(p))
            }
            Some(QueryForm::Part(group, part)) => {
                passed.contains(part) || passed.contains(&group.combined)
            }
        }
    }

    /// Parts that are passed while their pair as a whole is not complete.
    #[must_use]
    pub fn partially_passed_parts(&self, passed: &BTreeSet<CourseCode>) -> Vec<CourseCode> {
        self.groups
            .iter()
            .filter(|group| !self.is_satisfied_match(&group.combined, passed))
            .flat_map(|group| group.parts.iter().filter(|p| passed.contains(*p)).cloned())
            .collect()
    }

    /// The same number under each sibling department when `code` uses the
    /// generic prefix; empty otherwise.
    #[must_use]
    pub fn cross_department_alternates(&self, code: &CourseCode) -> Vec<CourseCode> {
        let Some(cross) = &self.cross_department else {
            return Vec::new();
        };
        let Some(parsed) = Self::parse(code) else {
            return Vec::new();
        };
        if parsed.dept != cross.generic {
            return Vec::new();
        }

        let suffix = parsed.part.map(String::from).unwrap_or_default();
        cross
            .siblings
            .iter()
            .filter(|sibling| **sibling != cross.generic)
            .map(|sibling| CourseCode::from_canonical(format!("{sibling} {}{suffix}", parsed.num)))
            .collect()
    }
}
