use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::{
    error::{GraderError, Result},
    folder_names::{is_canonical, EXPORT_DELIMITER},
    types::{DuplicateReport, SubmissionFolder},
    util::list_subdirectories,
};

const TIMESTAMP_FORMAT: &str = "%d %B %Y %I:%M %p";

/// Parses Brightspace's `13 September 2025 310 PM`. The minute separator is
/// often missing from the time token, so `310` is read as `3:10`.
pub fn parse_submission_timestamp(text: &str) -> std::result::Result<NaiveDateTime, String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let &[day, month, year, time, meridiem] = tokens.as_slice() else {
        return Err(format!("expected '<day> <month> <year> <time> <AM|PM>', got '{}'", text));
    };
    let time = if time.contains(':') {
        time.to_string()
    } else if time.len() >= 3 && time.chars().all(|c| c.is_ascii_digit()) {
        let (hours, minutes) = time.split_at(time.len() - 2);
        format!("{}:{}", hours, minutes)
    } else {
        return Err(format!("unrecognised time '{}'", time));
    };
    let normalized = format!("{} {} {} {} {}", day, month, year, time, meridiem);
    NaiveDateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT)
        .map_err(|e| format!("cannot read date '{}': {}", text, e))
}

/// Splits `<free text> - <student id> <timestamp>` into its parts.
pub fn parse_submission_folder(name: &str) -> Result<SubmissionFolder> {
    let (student_id, timestamp) = split_submission_name(name)?;
    Ok(SubmissionFolder {
        raw_name: name.to_string(),
        parsed_student_id: Some(student_id),
        parsed_timestamp: timestamp,
    })
}

fn split_submission_name(name: &str) -> Result<(String, Option<NaiveDateTime>)> {
    let malformed = |reason: String| GraderError::MalformedSubmissionName {
        name: name.to_string(),
        reason,
    };
    let (_, rest) = name
        .trim()
        .split_once(EXPORT_DELIMITER)
        .ok_or_else(|| malformed(format!("missing '{}' delimiter", EXPORT_DELIMITER)))?;

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let student_id = match tokens.first() {
        Some(id) => id.to_string(),
        None => return Err(malformed(String::from("missing student id"))),
    };
    // A bare `<name> - <id>` carries no date; anything after the id must be one.
    let timestamp = match tokens.len() {
        1 => None,
        2..=5 => return Err(malformed(String::from("incomplete submission date"))),
        len => Some(parse_submission_timestamp(&tokens[len - 5..].join(" ")).map_err(malformed)?),
    };

    Ok((student_id, timestamp))
}

/// Students with more than one submission folder, with every submission time.
///
/// Folders already renamed to `LAST, FIRST(id)` have been reconciled on an
/// earlier run and are not scanned. Any other name that does not follow the
/// export convention aborts the scan.
pub fn scan_for_duplicates(folder: &Path) -> Result<DuplicateReport> {
    if !folder.is_dir() {
        return Err(GraderError::NotADirectory(folder.to_path_buf()));
    }

    let mut seen: Vec<(String, Vec<Option<NaiveDateTime>>)> = Vec::new();
    for name in list_subdirectories(folder)? {
        if is_canonical(&name) {
            debug!(folder = %name, "already renamed, not scanned");
            continue;
        }
        let (id, stamp) = split_submission_name(&name)?;
        match seen.iter_mut().find(|(s, _)| *s == id) {
            Some((_, stamps)) => stamps.push(stamp),
            None => seen.push((id, vec![stamp])),
        }
    }

    let report: DuplicateReport = seen
        .into_iter()
        .filter(|(_, stamps)| stamps.len() > 1)
        .collect();
    for (id, stamps) in report.iter() {
        warn!(student = %id, submissions = stamps.len(), "multiple submissions");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn timestamp_without_colon_is_repaired() {
        assert_eq!(parse_submission_timestamp("13 September 2025 310 PM").unwrap(), at(13, 15, 10));
        assert_eq!(parse_submission_timestamp("13 September 2025 3:10 PM").unwrap(), at(13, 15, 10));
        assert_eq!(parse_submission_timestamp("14 September 2025 1205 AM").unwrap(), at(14, 0, 5));
        assert!(parse_submission_timestamp("14 September 2025 PM").is_err());
        assert!(parse_submission_timestamp("14 Smarch 2025 310 PM").is_err());
    }

    #[test]
    fn folder_name_is_split() {
        let s = parse_submission_folder("A - 111 13 September 2025 310 PM").unwrap();
        assert_eq!(s.parsed_student_id.as_deref(), Some("111"));
        assert_eq!(s.parsed_timestamp, Some(at(13, 15, 10)));

        let bare = parse_submission_folder("Smith, Ana - 1234567").unwrap();
        assert_eq!(bare.parsed_student_id.as_deref(), Some("1234567"));
        assert_eq!(bare.parsed_timestamp, None);

        assert!(parse_submission_folder("Smith, Ana - 1234567 late").is_err());
        assert!(parse_submission_folder("Smith, Ana - ").is_err());
    }

    #[test]
    fn duplicates_are_reported() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A - 111 13 September 2025 310 PM").create_dir_all().unwrap();
        dir.child("B - 111 14 September 2025 200 PM").create_dir_all().unwrap();
        dir.child("C - 222 14 September 2025 200 PM").create_dir_all().unwrap();
        dir.child("folder_rename_log.csv").touch().unwrap();

        let report = scan_for_duplicates(dir.path()).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report["111"], vec![Some(at(13, 15, 10)), Some(at(14, 14, 0))]);
    }

    #[test]
    fn undated_folders_count_as_submissions() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A - 111").create_dir_all().unwrap();
        dir.child("B - 111 13 September 2025 310 PM").create_dir_all().unwrap();

        let report = scan_for_duplicates(dir.path()).unwrap();
        assert_eq!(report["111"], vec![None, Some(at(13, 15, 10))]);
    }

    #[test]
    fn unique_ids_report_nothing() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A - 111 13 September 2025 310 PM").create_dir_all().unwrap();
        dir.child("B - 222 14 September 2025 200 PM").create_dir_all().unwrap();
        dir.child("SMITH, ANA(111)").create_dir_all().unwrap();
        assert!(scan_for_duplicates(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn malformed_folder_aborts_scan() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("A - 111 13 September 2025 310 PM").create_dir_all().unwrap();
        dir.child("random stuff").create_dir_all().unwrap();
        assert!(matches!(
            scan_for_duplicates(dir.path()),
            Err(GraderError::MalformedSubmissionName { name, .. }) if name == "random stuff"
        ));
    }

    #[test]
    fn scanning_a_file_is_a_configuration_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("export.zip");
        file.touch().unwrap();
        assert!(matches!(
            scan_for_duplicates(file.path()),
            Err(GraderError::NotADirectory(_))
        ));
    }
}
