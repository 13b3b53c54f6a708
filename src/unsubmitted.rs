use std::{collections::HashSet, path::Path};

use tracing::{info, warn};

use crate::{
    config::STUDENT_ID_COLUMN,
    error::{GraderError, Result},
    folder_names::{canonical_id, extract_student_id},
    table::Table,
    util::list_subdirectories,
};

/// Student ids that have a submission folder, whether or not the folder has
/// been renamed yet.
pub fn submitted_ids(folder: &Path) -> Result<HashSet<String>> {
    if !folder.is_dir() {
        return Err(GraderError::NotADirectory(folder.to_path_buf()));
    }
    let ids: HashSet<String> = list_subdirectories(folder)?
        .iter()
        .filter_map(|name| extract_student_id(name).or_else(|| canonical_id(name)))
        .map(|id| id.to_uppercase())
        .collect();
    if ids.is_empty() {
        warn!(folder = ?folder, "no submission folders found");
    }
    Ok(ids)
}

/// Rows of `classlist` with no submission folder in `folder`.
pub fn find_unsubmitted(classlist: &Table, folder: &Path) -> Result<Table> {
    let submitted = submitted_ids(folder)?;
    let id_index = classlist.require_column(STUDENT_ID_COLUMN)?;
    let rows: Vec<Vec<String>> = classlist
        .rows()
        .iter()
        .filter(|row| !submitted.contains(&row[id_index].trim().to_uppercase()))
        .cloned()
        .collect();
    info!(missing = rows.len(), of = classlist.len(), "unsubmitted students");
    Ok(Table::new(classlist.headers().to_vec(), rows))
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;

    use super::*;

    fn classlist() -> Table {
        Table::new(
            vec![STUDENT_ID_COLUMN.to_string(), "Last Name".to_string()],
            vec![
                vec!["1234567".to_string(), "Smith".to_string()],
                vec!["7654321".to_string(), "Jones".to_string()],
                vec!["5555555".to_string(), "Byrne".to_string()],
            ],
        )
    }

    #[test]
    fn raw_and_renamed_folders_both_count() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("Smith, Ana - 1234567 13 September 2025 310 PM").create_dir_all().unwrap();
        dir.child("JONES, BO (7654321)").create_dir_all().unwrap();

        let missing = find_unsubmitted(&classlist(), dir.path()).unwrap();
        assert_eq!(missing.column(STUDENT_ID_COLUMN).unwrap(), vec!["5555555"]);
        assert_eq!(missing.headers(), classlist().headers());
    }

    #[test]
    fn empty_folder_means_nobody_submitted() {
        let dir = assert_fs::TempDir::new().unwrap();
        assert_eq!(find_unsubmitted(&classlist(), dir.path()).unwrap().len(), 3);
    }
}
