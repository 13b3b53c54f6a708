use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use tracing::{info, warn};

use crate::{
    config::{rename_log_file, restore_log_file, unfound_names_file},
    error::{GraderError, Result},
    rename_folders::rename_folder,
    rename_log::{load_rename_log, write_unfound_names, AuditLog},
    types::{Outcome, RenameAttempt},
    util::list_subdirectories,
};

#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub attempts: Vec<RenameAttempt>,
    /// Folders the log knows nothing about.
    pub unfound: Vec<String>,
}

/// Undoes earlier renames using the `Renamed` rows of `log`.
///
/// Folder names are compared case-insensitively. When a folder was renamed
/// more than once, the latest row wins. Attempts are appended to
/// `folder_brightspace_name_log.csv` and the folders nobody recognised are
/// written to `folder_brightspace_name_unfound.csv`.
pub fn restore_original_names(log: &[RenameAttempt], folder: &Path) -> Result<RestoreReport> {
    if !folder.is_dir() {
        return Err(GraderError::NotADirectory(folder.to_path_buf()));
    }

    let mut originals: HashMap<String, &str> = HashMap::new();
    let mut untouched: HashSet<String> = HashSet::new();
    for row in log.iter().filter(|r| r.outcome == Outcome::Renamed) {
        if let Some(suggested) = row.suggested_name.as_deref() {
            originals.insert(suggested.to_uppercase(), row.original_name.as_str());
            untouched.insert(row.original_name.to_uppercase());
        }
    }

    let mut audit = AuditLog::new(&restore_log_file(folder));
    let mut report = RestoreReport::default();
    for name in list_subdirectories(folder)? {
        let key = name.to_uppercase();
        let attempt = if let Some(original) = originals.get(&key) {
            rename_folder(folder, &name, original)
        } else if untouched.contains(&key) {
            RenameAttempt::with_outcome(&name, Some(name.as_str()), Outcome::AlreadyCorrect)
        } else {
            warn!(folder = %name, "not in rename log");
            report.unfound.push(name);
            continue;
        };
        audit.record(&attempt)?;
        info!(folder = %name, outcome = %attempt.outcome, "restored");
        report.attempts.push(attempt);
    }

    write_unfound_names(&unfound_names_file(folder), &report.unfound)?;
    Ok(report)
}

/// Restores `folder` from the rename log kept inside it.
pub fn restore_from_rename_log(folder: &Path) -> Result<RestoreReport> {
    let log = load_rename_log(&rename_log_file(folder))?;
    restore_original_names(&log, folder)
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    use super::*;
    use crate::{
        rename_folders::{decline, rename_to_canonical, RenameOptions},
        types::{Roster, StudentRecord},
    };

    #[test]
    fn rename_then_restore_gives_back_original_names() {
        let dir = assert_fs::TempDir::new().unwrap();
        let raw = [
            "Smith, Ana - 1234567 13 September 2025 310 PM",
            "Jones, Bo - 7654321 13 September 2025 311 PM",
        ];
        for name in raw {
            dir.child(name).create_dir_all().unwrap();
        }
        let roster = Roster::from_records(vec![
            StudentRecord::new("1234567", "Smith", "Ana"),
            StudentRecord::new("7654321", "Jones", "Bo"),
        ])
        .unwrap();
        rename_to_canonical(&roster, dir.path(), &RenameOptions::default(), decline).unwrap();
        dir.child("extra").create_dir_all().unwrap();

        let report = restore_from_rename_log(dir.path()).unwrap();

        assert_eq!(report.attempts.len(), 2);
        assert!(report.attempts.iter().all(|a| a.outcome == Outcome::Renamed));
        for name in raw {
            dir.child(name).assert(predicate::path::is_dir());
        }
        assert_eq!(report.unfound, vec!["extra"]);
        dir.child("folder_brightspace_name_unfound.csv").assert("Unfound Name\nextra\n");
        dir.child("folder_brightspace_name_log.csv")
            .assert(predicate::str::contains("SMITH, ANA(1234567)"));
    }

    #[test]
    fn restored_folders_are_already_correct() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("Smith, Ana - 1").create_dir_all().unwrap();
        let log = vec![RenameAttempt::renamed("Smith, Ana - 1", "SMITH, ANA(1)")];

        let report = restore_original_names(&log, dir.path()).unwrap();
        assert_eq!(report.attempts[0].outcome, Outcome::AlreadyCorrect);
        assert!(report.unfound.is_empty());
        dir.child("folder_brightspace_name_unfound.csv").assert("Unfound Name\n");
    }

    #[test]
    fn only_renamed_rows_are_reversed() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("SMITH, ANA(1)").create_dir_all().unwrap();
        let log = vec![RenameAttempt::failed("Smith, Ana - 1", Some("SMITH, ANA(1)"), "busy")];

        let report = restore_original_names(&log, dir.path()).unwrap();
        assert!(report.attempts.is_empty());
        assert_eq!(report.unfound, vec!["SMITH, ANA(1)"]);
        dir.child("folder_brightspace_name_log.csv").assert(predicate::path::missing());
    }

    #[test]
    fn lookup_ignores_case() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("smith, ana(1)").create_dir_all().unwrap();
        let log = vec![RenameAttempt::renamed("Smith, Ana - 1", "SMITH, ANA(1)")];

        restore_original_names(&log, dir.path()).unwrap();
        dir.child("Smith, Ana - 1").assert(predicate::path::is_dir());
    }
}
