//! Core data types for lab records.
//!
//! [`FormSnapshot`] is both the renderer input and the on-disk form-file
//! shape; [`ExperimentRecord`] is one row of the experiment table.

pub mod blocks;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use blocks::{BlockId, ExperimentBlockStore, RemoveOutcome, StoreChange};

/// A single experiment entry.
///
/// All fields are free-form text. `date` is expected to be `yyyy-mm-dd` but
/// nothing enforces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentRecord {
    /// Date the experiment was performed.
    pub date: String,
    /// Experiment title.
    pub title: String,
    /// Link to the experiment's external resource (repository, notebook).
    pub link: String,
    /// Marks awarded.
    pub marks: String,
}

impl ExperimentRecord {
    /// Get a field by name.
    #[must_use]
    pub fn get(&self, field: ExperimentField) -> &str {
        match field {
            ExperimentField::Date => &self.date,
            ExperimentField::Title => &self.title,
            ExperimentField::Link => &self.link,
            ExperimentField::Marks => &self.marks,
        }
    }

    /// Set a field by name.
    pub fn set(&mut self, field: ExperimentField, value: impl Into<String>) {
        let slot = match field {
            ExperimentField::Date => &mut self.date,
            ExperimentField::Title => &mut self.title,
            ExperimentField::Link => &mut self.link,
            ExperimentField::Marks => &mut self.marks,
        };
        *slot = value.into();
    }

    /// Copy with every field trimmed.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            date: self.date.trim().to_string(),
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            marks: self.marks.trim().to_string(),
        }
    }

    /// True when at least one field holds non-whitespace text.
    #[must_use]
    pub fn has_content(&self) -> bool {
        ExperimentField::ALL
            .iter()
            .any(|field| !self.get(*field).trim().is_empty())
    }
}

/// Everything a renderer needs, captured at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSnapshot {
    /// Course title, e.g. `"CS101 - Intro to Programming"`.
    pub course_title: String,
    /// Student's full name.
    pub student_name: String,
    /// Student's register (roll) number.
    pub register_number: String,
    /// Date of the confirmation statement.
    pub confirm_date: String,
    /// Experiments in table order.
    pub experiments: Vec<ExperimentRecord>,
}

impl FormSnapshot {
    /// Get a top-level field by name.
    #[must_use]
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::CourseTitle => &self.course_title,
            FormField::StudentName => &self.student_name,
            FormField::RegisterNumber => &self.register_number,
            FormField::ConfirmDate => &self.confirm_date,
        }
    }

    /// True if any top-level field or any experiment field is non-empty.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.experiments.iter().any(ExperimentRecord::has_content)
            || FormField::ALL
                .iter()
                .any(|field| !self.get(*field).trim().is_empty())
    }
}

/// Editable fields of an experiment block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperimentField {
    /// Experiment date.
    Date,
    /// Experiment title.
    Title,
    /// External link.
    Link,
    /// Marks.
    Marks,
}

impl ExperimentField {
    /// Every field, in display order.
    pub const ALL: [Self; 4] = [Self::Date, Self::Title, Self::Link, Self::Marks];
}

impl fmt::Display for ExperimentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Title => write!(f, "title"),
            Self::Link => write!(f, "link"),
            Self::Marks => write!(f, "marks"),
        }
    }
}

impl FromStr for ExperimentField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "title" => Ok(Self::Title),
            "link" | "url" => Ok(Self::Link),
            "marks" | "mark" => Ok(Self::Marks),
            other => Err(format!("unknown experiment field '{other}'")),
        }
    }
}

/// Top-level form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Course title.
    CourseTitle,
    /// Student name.
    StudentName,
    /// Register number.
    RegisterNumber,
    /// Confirmation date.
    ConfirmDate,
}

impl FormField {
    /// Every top-level field, in display order.
    pub const ALL: [Self; 4] = [
        Self::CourseTitle,
        Self::StudentName,
        Self::RegisterNumber,
        Self::ConfirmDate,
    ];
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CourseTitle => write!(f, "course"),
            Self::StudentName => write!(f, "student"),
            Self::RegisterNumber => write!(f, "register"),
            Self::ConfirmDate => write!(f, "date"),
        }
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "course" | "course_title" => Ok(Self::CourseTitle),
            "student" | "name" | "student_name" => Ok(Self::StudentName),
            "register" | "reg" | "register_number" => Ok(Self::RegisterNumber),
            "date" | "confirm_date" => Ok(Self::ConfirmDate),
            other => Err(format!("unknown form field '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, title: &str, link: &str, marks: &str) -> ExperimentRecord {
        ExperimentRecord {
            date: date.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            marks: marks.to_string(),
        }
    }

    #[test]
    fn test_record_get_set() {
        let mut rec = ExperimentRecord::default();
        rec.set(ExperimentField::Title, "Sorting");
        rec.set(ExperimentField::Marks, "9");
        assert_eq!(rec.get(ExperimentField::Title), "Sorting");
        assert_eq!(rec.get(ExperimentField::Marks), "9");
        assert_eq!(rec.get(ExperimentField::Link), "");
    }

    #[test]
    fn test_record_trimmed() {
        let rec = record(" 2024-01-05 ", "  Stacks", "https://x.io  ", "\t10\n");
        assert_eq!(rec.trimmed(), record("2024-01-05", "Stacks", "https://x.io", "10"));
    }

    #[test]
    fn test_record_has_content() {
        assert!(!ExperimentRecord::default().has_content());
        assert!(!record("  ", "", "\t", "").has_content());
        assert!(record("", "", "", "7").has_content());
    }

    #[test]
    fn test_empty_snapshot_has_no_content() {
        assert!(!FormSnapshot::default().has_content());
    }

    #[test]
    fn test_snapshot_with_blank_experiments_has_no_content() {
        let snapshot = FormSnapshot {
            experiments: vec![ExperimentRecord::default(), record(" ", "", "", "")],
            ..FormSnapshot::default()
        };
        assert!(!snapshot.has_content());
    }

    #[test]
    fn test_snapshot_top_level_field_is_content() {
        for field in FormField::ALL {
            let mut snapshot = FormSnapshot::default();
            match field {
                FormField::CourseTitle => snapshot.course_title = "CS".into(),
                FormField::StudentName => snapshot.student_name = "Ada".into(),
                FormField::RegisterNumber => snapshot.register_number = "42".into(),
                FormField::ConfirmDate => snapshot.confirm_date = "2024-05-01".into(),
            }
            assert!(snapshot.has_content(), "{field} should count as content");
        }
    }

    #[test]
    fn test_snapshot_experiment_sub_field_is_content() {
        for field in ExperimentField::ALL {
            let mut rec = ExperimentRecord::default();
            rec.set(field, "x");
            let snapshot = FormSnapshot {
                experiments: vec![rec],
                ..FormSnapshot::default()
            };
            assert!(snapshot.has_content(), "{field} should count as content");
        }
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("Title".parse::<ExperimentField>(), Ok(ExperimentField::Title));
        assert_eq!("url".parse::<ExperimentField>(), Ok(ExperimentField::Link));
        assert!("colour".parse::<ExperimentField>().is_err());

        assert_eq!("course".parse::<FormField>(), Ok(FormField::CourseTitle));
        assert_eq!("reg".parse::<FormField>(), Ok(FormField::RegisterNumber));
        assert!("email".parse::<FormField>().is_err());
    }

    #[test]
    fn test_snapshot_deserialize_partial() {
        let json = r#"{"course_title": "CS101", "experiments": [{"title": "Loops"}]}"#;
        let snapshot: FormSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.course_title, "CS101");
        assert_eq!(snapshot.student_name, "");
        assert_eq!(snapshot.experiments.len(), 1);
        assert_eq!(snapshot.experiments[0].title, "Loops");
        assert_eq!(snapshot.experiments[0].link, "");
    }
}
