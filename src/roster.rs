use std::path::Path;

use tracing::debug;

use crate::{
    config::{FIRST_NAME_COLUMN, GROUP_COLUMN, LAST_NAME_COLUMN, SCORE_COLUMN, STUDENT_ID_COLUMN},
    error::{GraderError, Result},
    table::Table,
    types::{Roster, StudentRecord},
};

/// Columns Brightspace has used for the student number, most specific first.
const ID_COLUMNS: [&str; 3] = [STUDENT_ID_COLUMN, "Username", "OrgDefinedId"];

/// Reads a Brightspace class list export and reduces it to
/// `Student ID, Last Name, First Name, [Group], <assignment or Score>`.
pub fn load_classlist(path: &Path, assignment: Option<&str>) -> Result<Table> {
    if path.extension().map_or(true, |ext| ext != "csv") {
        return Err(GraderError::InvalidConfig(format!(
            "class list {:?} must be a .csv export",
            path
        )));
    }
    let raw = Table::read_csv(path)?;
    normalize_classlist(&raw, assignment)
}

pub fn normalize_classlist(raw: &Table, assignment: Option<&str>) -> Result<Table> {
    let id_column = ID_COLUMNS
        .iter()
        .find(|c| raw.has_column(c))
        .ok_or_else(|| GraderError::MissingColumn(String::from("Username")))?;

    let mut table = raw
        .rename_column(id_column, STUDENT_ID_COLUMN)
        .rename_column("Group Name", GROUP_COLUMN)
        .map_column(STUDENT_ID_COLUMN, |id| id.replace('#', "").trim().to_string())?;

    let mut columns = vec![STUDENT_ID_COLUMN, LAST_NAME_COLUMN, FIRST_NAME_COLUMN];
    if table.has_column(GROUP_COLUMN) {
        columns.push(GROUP_COLUMN);
    }
    match assignment {
        Some(name) => columns.push(name),
        None => {
            table = table.with_empty_columns(&[SCORE_COLUMN.to_string()]);
            columns.push(SCORE_COLUMN);
        }
    }
    let table = table.select(&columns)?;
    debug!(students = table.len(), "loaded class list");
    Ok(table)
}

pub fn roster_from_table(table: &Table) -> Result<Roster> {
    let ids = table.column(STUDENT_ID_COLUMN)?;
    let last = table.column(LAST_NAME_COLUMN)?;
    let first = table.column(FIRST_NAME_COLUMN)?;
    let groups = table.column(GROUP_COLUMN).ok();

    let students = (0..ids.len())
        .map(|i| StudentRecord {
            student_id: ids[i].trim().to_string(),
            last_name: last[i].trim().to_string(),
            first_name: first[i].trim().to_string(),
            group_id: groups
                .as_ref()
                .map(|g| g[i].trim())
                .filter(|g| !g.is_empty())
                .map(String::from),
        })
        .collect();
    Roster::from_records(students)
}

pub fn load_roster(path: &Path) -> Result<Roster> {
    roster_from_table(&load_classlist(path, None)?)
}
