use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const STUDENT_ID_COLUMN: &str = "Student ID";
pub const LAST_NAME_COLUMN: &str = "Last Name";
pub const FIRST_NAME_COLUMN: &str = "First Name";
pub const GROUP_COLUMN: &str = "Group";
pub const SCORE_COLUMN: &str = "Score";
pub const TOTAL_COLUMN: &str = "Total % Grade";
pub const LETTER_GRADE_COLUMN: &str = "Letter Grade";

pub const UNFOUND_NAME_COLUMN: &str = "Unfound Name";

pub fn default_config_file() -> PathBuf {
    PathBuf::from("grading.json")
}

pub fn rename_log_file(submissions: &Path) -> PathBuf {
    submissions.join("folder_rename_log.csv")
}

pub fn restore_log_file(submissions: &Path) -> PathBuf {
    submissions.join("folder_brightspace_name_log.csv")
}

pub fn unfound_names_file(submissions: &Path) -> PathBuf {
    submissions.join("folder_brightspace_name_unfound.csv")
}

pub fn grader_sheet_file(dir: &Path, grader: &str) -> PathBuf {
    dir.join(format!("{}.csv", grader))
}

pub fn completed_grades_file(dir: &Path) -> PathBuf {
    dir.join("completed_grades.csv")
}

/// Saved next to the submissions folder rather than inside it so it is not
/// mistaken for a submission.
pub fn unsubmitted_file(submissions: &Path, date: NaiveDate) -> PathBuf {
    let name = format!("unsubmitted_{}.csv", date.format("%Y-%m-%d"));
    match submissions.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
