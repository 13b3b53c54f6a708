use strum::{Display, EnumString};
use tracing::debug;

use crate::{
    config::{LETTER_GRADE_COLUMN, STUDENT_ID_COLUMN, TOTAL_COLUMN},
    error::{GraderError, Result},
    table::Table,
};

const COURSEWORK: &str = "Coursework";
const FULL_MARKS: &str = "(100)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum LetterGrade {
    A1,
    A2,
    B1,
    B2,
    B3,
    C1,
    C2,
    C3,
    D1,
    D2,
    F,
    /// No grade: the score is too low to count as an attempt.
    NG,
}

/// Lower bound of each passing band, highest first.
const BANDS: [(f64, LetterGrade); 10] = [
    (80.0, LetterGrade::A1),
    (75.0, LetterGrade::A2),
    (70.0, LetterGrade::B1),
    (65.0, LetterGrade::B2),
    (60.0, LetterGrade::B3),
    (55.0, LetterGrade::C1),
    (50.0, LetterGrade::C2),
    (45.0, LetterGrade::C3),
    (40.0, LetterGrade::D1),
    (35.0, LetterGrade::D2),
];

/// Scores of 10 or less are NG. Anything under `fail_threshold`, and anything
/// under 35, is an F.
pub fn letter_grade(score: f64, fail_threshold: f64) -> Result<LetterGrade> {
    if !(0.0..=100.0).contains(&score) {
        return Err(GraderError::InvalidScore(score, String::from("must be between 0 and 100")));
    }
    if !(0.0..=100.0).contains(&fail_threshold) {
        return Err(GraderError::InvalidScore(
            fail_threshold,
            String::from("fail threshold must be between 0 and 100"),
        ));
    }
    if score <= 10.0 {
        return Ok(LetterGrade::NG);
    }
    if score < fail_threshold {
        return Ok(LetterGrade::F);
    }
    Ok(BANDS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map_or(LetterGrade::F, |(_, grade)| *grade))
}

fn parse_cell(column: &str, value: &str) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| GraderError::NonNumeric {
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn format_number(value: f64) -> String {
    format!("{}", (value * 100.0).round() / 100.0)
}

/// Adds `<base> (<weight as %>%)` holding `column * weight`, rounded to a
/// whole mark. `Coursework 1 (100)` weighted 0.4 becomes `Coursework 1 (40%)`.
pub fn weighted_score(table: &Table, column: &str, weight: f64) -> Result<Table> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(GraderError::InvalidConfig(format!(
            "weight {} for '{}' must be between 0 and 1",
            weight, column
        )));
    }
    let base = column.split('(').next().unwrap_or(column).trim();
    let name = format!("{} ({}%)", base, format_number(weight * 100.0));

    let values = table
        .column(column)?
        .into_iter()
        .map(|cell| {
            Ok(parse_cell(column, cell)?
                .map(|score| format_number((score * weight).round()))
                .unwrap_or_default())
        })
        .collect::<Result<Vec<String>>>()?;
    debug!(column = %name, "weighted score");
    Ok(table.with_column(&name, values))
}

/// Fills `Total % Grade`. A single `Coursework n (100)` column is copied.
/// With several, the weighted `Coursework` columns are summed, so
/// `weighted_score` must have been run for each of them first.
pub fn total_module_score(table: &Table) -> Result<Table> {
    if table.is_empty() {
        return Err(GraderError::InvalidConfig(String::from("no students to total")));
    }
    table.require_column(STUDENT_ID_COLUMN)?;

    let full: Vec<&String> = table
        .headers()
        .iter()
        .filter(|h| h.contains(COURSEWORK) && h.contains(FULL_MARKS))
        .collect();
    let sources: Vec<&String> = match full.len() {
        0 => return Err(GraderError::MissingColumn(format!("{} n {}", COURSEWORK, FULL_MARKS))),
        1 => full,
        _ => {
            let weighted: Vec<&String> = table
                .headers()
                .iter()
                .filter(|h| h.contains(COURSEWORK) && !h.contains("100"))
                .collect();
            if weighted.is_empty() {
                return Err(GraderError::MissingColumn(format!("{} n (<weight>%)", COURSEWORK)));
            }
            weighted
        }
    };

    let columns = sources
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<Vec<&str>>>>()?;
    let mut totals = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let mut total = 0.0;
        for (name, column) in sources.iter().zip(columns.iter()) {
            total += parse_cell(name, column[row])?.unwrap_or(0.0);
        }
        totals.push(format_number(total));
    }
    Ok(table.with_column(TOTAL_COLUMN, totals))
}

/// Adds `Letter Grade` from `Total % Grade`. Blank totals stay blank.
pub fn with_letter_grades(table: &Table, fail_threshold: f64) -> Result<Table> {
    let grades = table
        .column(TOTAL_COLUMN)?
        .into_iter()
        .map(|cell| match parse_cell(TOTAL_COLUMN, cell)? {
            Some(score) => Ok(letter_grade(score, fail_threshold)?.to_string()),
            None => Ok(String::new()),
        })
        .collect::<Result<Vec<String>>>()?;
    Ok(table.with_column(LETTER_GRADE_COLUMN, grades))
}
