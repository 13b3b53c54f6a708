use std::{fs, path::Path};

use tracing::{info, warn};

use crate::{
    config::grader_sheet_file,
    error::{GraderError, Result},
    table::Table,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSummary {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Graders named in `column`, in first-seen order.
pub fn graders_in(table: &Table, column: &str) -> Result<Vec<String>> {
    let mut graders: Vec<String> = Vec::new();
    for grader in table.column(column)? {
        let grader = grader.trim();
        if !grader.is_empty() && !graders.iter().any(|g| g == grader) {
            graders.push(grader.to_string());
        }
    }
    Ok(graders)
}

/// Writes `<grader>.csv` into `dir` for every grader in `column`, holding that
/// grader's rows plus an empty column per marking criterion.
pub fn save_grader_sheets(
    table: &Table,
    column: &str,
    dir: &Path,
    criteria: &[String],
    overwrite: bool,
) -> Result<SheetSummary> {
    fs::create_dir_all(dir)?;
    let table = table.with_empty_columns(criteria);

    let mut summary = SheetSummary::default();
    for grader in graders_in(&table, column)? {
        let path = grader_sheet_file(dir, &grader);
        if path.exists() && !overwrite {
            warn!(sheet = ?path, "sheet exists, skipped");
            summary.skipped.push(grader);
            continue;
        }
        let sheet = table.filter_eq(column, &grader)?;
        sheet.write_csv(&path)?;
        info!(grader = %grader, students = sheet.len(), "wrote sheet");
        summary.written.push(grader);
    }
    Ok(summary)
}

/// Stacks the completed sheets of `graders` found in `dir`.
pub fn merge_grader_sheets(dir: &Path, graders: &[String]) -> Result<Table> {
    let mut sheets = Vec::new();
    for grader in graders {
        let path = grader_sheet_file(dir, grader);
        if !path.is_file() {
            warn!(grader = %grader, sheet = ?path, "sheet missing, skipped");
            continue;
        }
        sheets.push(Table::read_csv(&path)?);
    }
    if sheets.is_empty() {
        return Err(GraderError::NoGraderSheets(dir.to_path_buf()));
    }
    let merged = Table::concat(&sheets);
    info!(sheets = sheets.len(), rows = merged.len(), "merged grader sheets");
    Ok(merged)
}
