use std::{
    fs::{File, OpenOptions},
    io::BufReader,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{config::UNFOUND_NAME_COLUMN, error::Result, types::RenameAttempt};

/// Reads an audit log. A log that does not exist yet is empty.
pub fn load_rename_log(path: &Path) -> Result<Vec<RenameAttempt>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));
    let mut attempts = Vec::new();
    for row in rdr.deserialize() {
        attempts.push(row?);
    }
    debug!(path = ?path, rows = attempts.len(), "loaded rename log");
    Ok(attempts)
}

/// Append-only handle on an audit log. Every attempt is flushed as it is
/// recorded so an interrupted run still leaves a truthful log.
pub struct AuditLog {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl AuditLog {
    /// Nothing touches the disk until the first attempt is recorded.
    pub fn new(path: &Path) -> Self {
        AuditLog {
            path: path.to_path_buf(),
            writer: None,
        }
    }

    pub fn record(&mut self, attempt: &RenameAttempt) -> Result<()> {
        if self.writer.is_none() {
            let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.writer = Some(
                csv::WriterBuilder::new()
                    .has_headers(needs_header)
                    .from_writer(file),
            );
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.serialize(attempt)?;
            writer.flush()?;
        }
        Ok(())
    }
}

/// Replaces the unfound-names side file with `names`.
pub fn write_unfound_names(path: &Path, names: &[String]) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut wtr = csv::Writer::from_writer(tmp.as_file_mut());
        wtr.write_record([UNFOUND_NAME_COLUMN])?;
        for name in names {
            wtr.write_record([name])?;
        }
        wtr.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    use super::*;
    use crate::types::Outcome;

    #[test]
    fn attempts_are_appended_across_runs() {
        let dir = assert_fs::TempDir::new().unwrap();
        let log = dir.child("folder_rename_log.csv");

        let mut first = AuditLog::new(log.path());
        first.record(&RenameAttempt::renamed("Smith - 1", "SMITH, ANA(1)")).unwrap();
        drop(first);

        let mut second = AuditLog::new(log.path());
        second
            .record(&RenameAttempt::failed("Doe - 9", None, "Student Number not present in class list"))
            .unwrap();
        drop(second);

        log.assert(predicate::str::starts_with(
            "Original Name,Suggested Name,Outcome,Error\n",
        ));
        let rows = load_rename_log(log.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].outcome, Outcome::Renamed);
        assert_eq!(rows[0].error, None);
        assert_eq!(rows[1].suggested_name, None);
        assert_eq!(
            rows[1].error.as_deref(),
            Some("Student Number not present in class list")
        );
    }

    #[test]
    fn unrecorded_log_is_never_created() {
        let dir = assert_fs::TempDir::new().unwrap();
        let log = dir.child("folder_rename_log.csv");
        let _ = AuditLog::new(log.path());
        log.assert(predicate::path::missing());
        assert!(load_rename_log(log.path()).unwrap().is_empty());
    }

    #[test]
    fn unfound_file_is_overwritten() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("folder_brightspace_name_unfound.csv");
        write_unfound_names(file.path(), &["a".to_string(), "b".to_string()]).unwrap();
        write_unfound_names(file.path(), &["c".to_string()]).unwrap();
        file.assert("Unfound Name\nc\n");
    }
}
