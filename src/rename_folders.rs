use std::{collections::HashMap, fs, path::Path};

use tracing::{debug, info, warn};

use crate::{
    config::rename_log_file,
    error::{GraderError, Result},
    folder_names::{canonical_name, extract_student_id, free_text, NameFormat},
    rename_log::{load_rename_log, AuditLog},
    scan_submissions::scan_for_duplicates,
    types::{describe_duplicates, Outcome, RenameAttempt, Roster, StudentRecord},
    util::list_subdirectories,
};

pub const NOT_IN_CLASS_LIST: &str = "Student Number not present in class list";

/// Ways of tying a raw export folder to a class list row, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// The student number after `" - "`. Trusted without confirmation.
    StudentIdAfterDelimiter,
    /// Last and first name both appear in the text before `" - "`. Only a
    /// suggestion: the caller's `confirm` decides.
    NameInFreeText,
}

enum Proposal<'a> {
    Exact(&'a StudentRecord),
    Candidate(&'a StudentRecord),
    UnknownId(String),
    NoOpinion,
}

struct Lookup<'a> {
    by_id: HashMap<String, &'a StudentRecord>,
    students: &'a [StudentRecord],
}

impl<'a> Lookup<'a> {
    fn new(roster: &'a Roster) -> Self {
        let by_id = roster
            .students()
            .iter()
            .map(|s| (s.student_id.to_uppercase(), s))
            .collect();
        Lookup {
            by_id,
            students: roster.students(),
        }
    }
}

impl MatchStrategy {
    fn propose<'a>(&self, folder_name: &str, lookup: &Lookup<'a>) -> Proposal<'a> {
        match self {
            MatchStrategy::StudentIdAfterDelimiter => match extract_student_id(folder_name) {
                Some(id) => match lookup.by_id.get(&id.to_uppercase()) {
                    Some(student) => Proposal::Exact(*student),
                    None => Proposal::UnknownId(id),
                },
                None => Proposal::NoOpinion,
            },
            MatchStrategy::NameInFreeText => {
                let text = free_text(folder_name).to_uppercase();
                lookup
                    .students
                    .iter()
                    .find(|s| {
                        let last = s.last_name.trim().to_uppercase();
                        let first = s.first_name.trim().to_uppercase();
                        !last.is_empty() && !first.is_empty() && text.contains(&last) && text.contains(&first)
                    })
                    .map_or(Proposal::NoOpinion, Proposal::Candidate)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub name_format: NameFormat,
    pub strategies: Vec<MatchStrategy>,
}

impl Default for RenameOptions {
    fn default() -> Self {
        RenameOptions {
            name_format: NameFormat::default(),
            strategies: vec![
                MatchStrategy::StudentIdAfterDelimiter,
                MatchStrategy::NameInFreeText,
            ],
        }
    }
}

/// Confirmation that never approves a suggestion.
pub fn decline(_original: &str, _suggested: &str) -> bool {
    false
}

#[derive(Debug, Clone, Default)]
pub struct RenameReport {
    /// Attempts made by this run.
    pub attempts: Vec<RenameAttempt>,
    /// Earlier runs' rows followed by this run's.
    pub log: Vec<RenameAttempt>,
}

impl RenameReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.attempts.iter().filter(|a| a.outcome == outcome).count()
    }
}

/// Renames raw Brightspace submission folders to `LAST, FIRST(id)`.
///
/// Refuses to start while any student has more than one submission. Folders
/// that carry no student number (including ones already renamed) are left
/// alone, which makes re-running after late submissions safe. Each attempt is
/// appended to `folder_rename_log.csv` as soon as it is made.
pub fn rename_to_canonical(
    roster: &Roster,
    folder: &Path,
    options: &RenameOptions,
    mut confirm: impl FnMut(&str, &str) -> bool,
) -> Result<RenameReport> {
    let duplicates = scan_for_duplicates(folder)?;
    if !duplicates.is_empty() {
        return Err(GraderError::DuplicateSubmissions(describe_duplicates(&duplicates)));
    }

    let log_path = rename_log_file(folder);
    let prior = load_rename_log(&log_path)?;
    let lookup = Lookup::new(roster);
    let mut log = AuditLog::new(&log_path);

    let mut attempts = Vec::new();
    for name in list_subdirectories(folder)? {
        let Some(attempt) = reconcile_folder(folder, &name, &lookup, options, &mut confirm) else {
            debug!(folder = %name, "no student number, skipped");
            continue;
        };
        log.record(&attempt)?;
        match attempt.outcome {
            Outcome::Renamed | Outcome::AlreadyCorrect => {
                info!(folder = %name, to = ?attempt.suggested_name, outcome = %attempt.outcome, "reconciled")
            }
            Outcome::Failed | Outcome::NoMatchFound => {
                warn!(folder = %name, error = ?attempt.error, outcome = %attempt.outcome, "not renamed")
            }
        }
        attempts.push(attempt);
    }

    if attempts.is_empty() {
        return Err(GraderError::NoRawSubmissionFolders(folder.to_path_buf()));
    }

    let mut combined = prior;
    combined.extend(attempts.iter().cloned());
    Ok(RenameReport {
        attempts,
        log: combined,
    })
}

fn reconcile_folder(
    folder: &Path,
    name: &str,
    lookup: &Lookup,
    options: &RenameOptions,
    confirm: &mut impl FnMut(&str, &str) -> bool,
) -> Option<RenameAttempt> {
    extract_student_id(name)?;

    let mut unknown_id = false;
    let mut declined: Option<String> = None;
    for strategy in options.strategies.iter() {
        match strategy.propose(name, lookup) {
            Proposal::Exact(student) => {
                let suggested = canonical_name(student, options.name_format);
                return Some(rename_folder(folder, name, &suggested));
            }
            Proposal::Candidate(student) => {
                let suggested = canonical_name(student, options.name_format);
                if confirm(name, &suggested) {
                    return Some(rename_folder(folder, name, &suggested));
                }
                declined.get_or_insert(suggested);
            }
            Proposal::UnknownId(id) => {
                debug!(folder = %name, student = %id, "student number not in class list");
                unknown_id = true;
            }
            Proposal::NoOpinion => {}
        }
    }

    // An unknown student number is a failure even when a name match was offered.
    Some(match (unknown_id, declined) {
        (true, suggested) => RenameAttempt::failed(name, suggested.as_deref(), NOT_IN_CLASS_LIST),
        (false, suggested) => {
            RenameAttempt::with_outcome(name, suggested.as_deref(), Outcome::NoMatchFound)
        }
    })
}

/// Renames `folder/original` to `folder/suggested`, turning any failure into
/// a Failed attempt.
pub(crate) fn rename_folder(folder: &Path, original: &str, suggested: &str) -> RenameAttempt {
    // Only reachable from restore: raw and canonical names never coincide.
    if original == suggested {
        return RenameAttempt::with_outcome(original, Some(suggested), Outcome::AlreadyCorrect);
    }
    let target = folder.join(suggested);
    if target.exists() {
        return RenameAttempt::failed(
            original,
            Some(suggested),
            format!("'{}' already exists", suggested),
        );
    }
    match fs::rename(folder.join(original), &target) {
        Ok(()) => RenameAttempt::renamed(original, suggested),
        Err(e) => RenameAttempt::failed(original, Some(suggested), e),
    }
}
