//! Term grade files: one reporting period's grades for one child.
//!
//! ```yaml
//! system: de-1-6
//! class_level: 7
//! grades:
//!   - { subject: math, grade: "2", core: true }
//!   - { subject: art, grade: "1", note: "project week" }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bonus::RawGradeEntry;
use crate::config::GradingSystemConfig;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TermFile {
    /// Id of a grading system from the config
    pub system: String,
    pub class_level: u32,
    pub grades: Vec<TermGrade>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TermGrade {
    pub subject: String,
    /// Kept as text: letter grades and "2,5" style values are valid input
    pub grade: GradeText,
    #[serde(default)]
    pub core: bool,
    #[serde(default)]
    pub note: Option<String>,
}

/// Grade as written in YAML; numbers are accepted unquoted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GradeText {
    Number(f64),
    Text(String),
}

impl GradeText {
    pub fn as_text(&self) -> String {
        match self {
            GradeText::Number(n) => n.to_string(),
            GradeText::Text(s) => s.clone(),
        }
    }
}

impl TermFile {
    /// Build engine entries, resolving letter labels through the grading system.
    pub fn entries(&self, system: &GradingSystemConfig) -> Vec<RawGradeEntry> {
        self.grades
            .iter()
            .map(|grade| RawGradeEntry {
                subject: grade.subject.clone(),
                value: system.resolve_raw(&grade.grade.as_text()),
                is_core_subject: grade.core,
                note: grade.note.clone(),
            })
            .collect()
    }
}

/// Load a term file from YAML
pub fn load_term_file(path: &Path) -> Result<TermFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read term file at {}", path.display()))?;

    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse term file: invalid YAML in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::env;

    const SAMPLE: &str = r#"
system: letters-a-f
class_level: 5
grades:
  - subject: math
    grade: b
    core: true
  - subject: art
    grade: 1
    note: project week
  - subject: music
    grade: "Q"
"#;

    #[test]
    fn test_parse_term_file() {
        let term: TermFile = serde_saphyr::from_str(SAMPLE).unwrap();
        assert_eq!(term.system, "letters-a-f");
        assert_eq!(term.class_level, 5);
        assert_eq!(term.grades.len(), 3);
        assert!(term.grades[0].core);
        assert!(!term.grades[1].core);
        assert_eq!(term.grades[1].note.as_deref(), Some("project week"));
    }

    #[test]
    fn test_entries_resolve_labels() {
        let config = Config::default();
        let system = config.grading_system("letters-a-f").unwrap();
        let term: TermFile = serde_saphyr::from_str(SAMPLE).unwrap();
        let entries = term.entries(system);

        assert_eq!(entries[0].value, "2");
        assert!(entries[0].is_core_subject);
        assert_eq!(entries[1].value, "1");
        assert_eq!(entries[2].value, "Q");
    }

    #[test]
    fn test_grade_text_numbers() {
        assert_eq!(GradeText::Number(2.0).as_text(), "2");
        assert_eq!(GradeText::Number(2.5).as_text(), "2.5");
        assert_eq!(GradeText::Text("2,5".to_string()).as_text(), "2,5");
    }

    #[test]
    fn test_load_term_file() {
        let path = env::temp_dir().join("grade_bonus_test_term.yaml");
        fs::write(&path, SAMPLE).unwrap();

        let term = load_term_file(&path).unwrap();
        assert_eq!(term.grades.len(), 3);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_term_file() {
        let path = env::temp_dir().join("grade_bonus_test_term_missing.yaml");
        let _ = fs::remove_file(&path);
        assert!(load_term_file(&path).is_err());
    }
}
