use std::sync::OnceLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::StudentRecord;

pub const EXPORT_DELIMITER: &str = " - ";

static RAW_ID: OnceLock<Regex> = OnceLock::new();
static CANONICAL: OnceLock<Regex> = OnceLock::new();

fn raw_id_regex() -> &'static Regex {
    RAW_ID.get_or_init(|| Regex::new(r" - (\d+)\b").expect("valid student id pattern"))
}

fn canonical_regex() -> &'static Regex {
    CANONICAL.get_or_init(|| {
        Regex::new(r"^[^,]+, [^(]+\(([^)]+)\)$").expect("valid canonical name pattern")
    })
}

/// Whether a space separates the first name from the `(id)` suffix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NameFormat {
    /// `SMITH, ANA(1234567)`
    #[default]
    Compact,
    /// `SMITH, ANA (1234567)`
    Spaced,
}

pub fn canonical_name(student: &StudentRecord, format: NameFormat) -> String {
    let gap = match format {
        NameFormat::Compact => "",
        NameFormat::Spaced => " ",
    };
    format!(
        "{}, {}{}({})",
        student.last_name.to_uppercase(),
        student.first_name.to_uppercase(),
        gap,
        student.student_id
    )
}

/// The digits directly after the first `" - "` in a raw Brightspace folder name.
pub fn extract_student_id(folder_name: &str) -> Option<String> {
    raw_id_regex()
        .captures(folder_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// The text in front of the export delimiter, usually the student's name.
pub fn free_text(folder_name: &str) -> &str {
    folder_name
        .split_once(EXPORT_DELIMITER)
        .map_or(folder_name, |(head, _)| head)
}

pub fn is_raw_export(folder_name: &str) -> bool {
    folder_name.contains(EXPORT_DELIMITER)
}

/// The id inside `LAST, FIRST(id)` or `LAST, FIRST (id)`.
pub fn canonical_id(folder_name: &str) -> Option<String> {
    canonical_regex()
        .captures(folder_name.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

pub fn is_canonical(folder_name: &str) -> bool {
    !is_raw_export(folder_name) && canonical_id(folder_name).is_some()
}
