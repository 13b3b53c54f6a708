use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{GraderError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub group_id: Option<String>,
}

impl StudentRecord {
    pub fn new(student_id: &str, last_name: &str, first_name: &str) -> Self {
        StudentRecord {
            student_id: student_id.to_string(),
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            group_id: None,
        }
    }
}

/// Class list in export order. Student ids are unique.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<StudentRecord>,
}

impl Roster {
    pub fn from_records(students: Vec<StudentRecord>) -> Result<Self> {
        let mut seen = HashSet::new();
        for student in students.iter() {
            if !seen.insert(student.student_id.to_uppercase()) {
                return Err(GraderError::DuplicateStudent(student.student_id.clone()));
            }
        }
        Ok(Roster { students })
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Per-grader counts in grader order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    counts: Vec<(String, usize)>,
}

impl Quota {
    pub(crate) fn new(counts: Vec<(String, usize)>) -> Self {
        Quota { counts }
    }

    pub fn get(&self, grader: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(g, _)| g == grader)
            .map(|(_, c)| *c)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(g, c)| (g.as_str(), *c))
    }

    pub fn max(&self) -> usize {
        self.counts.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }

    pub fn min(&self) -> usize {
        self.counts.iter().map(|(_, c)| *c).min().unwrap_or(0)
    }
}

/// Subject (student or group id) to grader pairs, in subject order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    pairs: Vec<(String, String)>,
}

impl Assignment {
    pub(crate) fn new(pairs: Vec<(String, String)>) -> Self {
        Assignment { pairs }
    }

    pub fn grader_for(&self, subject: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(s, _)| s == subject)
            .map(|(_, g)| g.as_str())
    }

    pub fn count_for(&self, grader: &str) -> usize {
        self.pairs.iter().filter(|(_, g)| g == grader).count()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, g)| (s.as_str(), g.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFolder {
    pub raw_name: String,
    pub parsed_student_id: Option<String>,
    pub parsed_timestamp: Option<NaiveDateTime>,
}

/// Student id to submission timestamps in discovery order. Only ids with
/// more than one submission are present. A folder named without a date
/// contributes `None`.
pub type DuplicateReport = BTreeMap<String, Vec<Option<NaiveDateTime>>>;

pub fn describe_duplicates(report: &DuplicateReport) -> String {
    report
        .iter()
        .map(|(id, stamps)| {
            let stamps: Vec<String> = stamps
                .iter()
                .map(|s| match s {
                    Some(s) => s.format("%Y-%m-%d %H:%M").to_string(),
                    None => String::from("undated"),
                })
                .collect();
            format!(" - {}: {}", id, stamps.join(", "))
        })
        .collect::<Vec<String>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Outcome {
    Renamed,
    Failed,
    AlreadyCorrect,
    NoMatchFound,
}

/// One row of the folder rename audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameAttempt {
    #[serde(rename = "Original Name")]
    pub original_name: String,
    #[serde(rename = "Suggested Name")]
    pub suggested_name: Option<String>,
    #[serde(rename = "Outcome")]
    pub outcome: Outcome,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl RenameAttempt {
    pub fn renamed(original: &str, suggested: &str) -> Self {
        RenameAttempt {
            original_name: original.to_string(),
            suggested_name: Some(suggested.to_string()),
            outcome: Outcome::Renamed,
            error: None,
        }
    }

    pub fn failed(original: &str, suggested: Option<&str>, error: impl ToString) -> Self {
        RenameAttempt {
            original_name: original.to_string(),
            suggested_name: suggested.map(String::from),
            outcome: Outcome::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn with_outcome(original: &str, suggested: Option<&str>, outcome: Outcome) -> Self {
        RenameAttempt {
            original_name: original.to_string(),
            suggested_name: suggested.map(String::from),
            outcome,
            error: None,
        }
    }
}
