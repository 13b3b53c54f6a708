use std::path::Path;

use chrono::Local;

use crate::{
    assign::{assign_graders, assign_graders_to_groups},
    config::{completed_grades_file, grader_sheet_file, unsubmitted_file},
    folder_names::NameFormat,
    grader_config::{load_graders, read_config_or_default, write_config, GraderConfig},
    grader_sheets::{merge_grader_sheets, save_grader_sheets},
    grades::{total_module_score, weighted_score, with_letter_grades},
    quota::compute_quota,
    rename_folders::{decline, rename_to_canonical, RenameOptions},
    restore_folders::restore_from_rename_log,
    roster::{load_classlist, load_roster},
    scan_submissions::scan_for_duplicates,
    table::Table,
    types::{describe_duplicates, Outcome},
    unpack::unpack_submissions,
    unsubmitted::find_unsubmitted,
    util::{confirm_rename, prompt_yn},
};

fn load_config(config_file: &Path) -> Option<GraderConfig> {
    match read_config_or_default(config_file) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Failed to read config {:?}: {}", config_file, e);
            None
        }
    }
}

/// Asks before replacing `path`. Missing files need no confirmation.
fn may_write(path: &Path) -> bool {
    !path.exists()
        || prompt_yn(&format!("{:?} already exists. Overwrite? (y/n)", path)).unwrap_or(false)
}

fn print_table(table: &Table) {
    println!("{}", table.headers().join(", "));
    for row in table.rows() {
        println!("{}", row.join(", "));
    }
}

pub fn init_config(config_file: &Path, graders_file: Option<&Path>, graders: Vec<String>, seed: Option<u64>) -> bool {
    if !may_write(config_file) {
        return false;
    }
    let mut graders = graders;
    if let Some(file) = graders_file {
        match load_graders(file) {
            Ok(names) => graders.extend(names),
            Err(e) => {
                eprintln!("Failed to read graders from {:?}: {}", file, e);
                return false;
            }
        }
    }
    let config = GraderConfig {
        graders,
        seed,
        ..Default::default()
    };
    if let Err(e) = write_config(config_file, &config) {
        eprintln!("Failed to write config: {}", e);
        return false;
    }
    println!("Wrote {:?} with {} graders", config_file, config.graders.len());
    true
}

pub fn quota(config_file: &Path, students: usize) -> bool {
    let Some(config) = load_config(config_file) else {
        return false;
    };
    match compute_quota(&config.graders, students, config.weights.as_ref(), config.seed) {
        Ok(quota) => {
            for (grader, count) in quota.iter() {
                println!("{}: {}", grader, count);
            }
            true
        }
        Err(e) => {
            eprintln!("Failed to compute quotas: {}", e);
            false
        }
    }
}

pub fn assign(
    config_file: &Path,
    classlist: &Path,
    assignment: Option<&str>,
    outfile: &Path,
    by_group: bool,
    overwrite: bool,
) -> bool {
    let Some(config) = load_config(config_file) else {
        return false;
    };
    let table = match load_classlist(classlist, assignment) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to load class list: {}", e);
            return false;
        }
    };
    let options = config.assign_options(overwrite);
    let assigned = if by_group {
        assign_graders_to_groups(&table, &config.graders, &options)
    } else {
        assign_graders(&table, &config.graders, &options)
    };
    let assigned = match assigned {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to assign graders: {}", e);
            return false;
        }
    };
    if !may_write(outfile) {
        return false;
    }
    if let Err(e) = assigned.write_csv(outfile) {
        eprintln!("Failed to write {:?}: {}", outfile, e);
        return false;
    }
    println!("Assigned {} students to {} graders in {:?}", assigned.len(), config.graders.len(), outfile);
    true
}

pub fn write_sheets(config_file: &Path, assigned: &Path, dir: &Path, overwrite: bool) -> bool {
    let Some(config) = load_config(config_file) else {
        return false;
    };
    let table = match Table::read_csv(assigned) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", assigned, e);
            return false;
        }
    };
    let existing = config
        .graders
        .iter()
        .any(|g| grader_sheet_file(dir, g).exists());
    let overwrite = overwrite
        || (existing
            && prompt_yn(&format!("Some grader sheets already exist in {:?}. Overwrite them? (y/n)", dir))
                .unwrap_or(false));
    match save_grader_sheets(&table, &config.column, dir, &config.criteria, overwrite) {
        Ok(summary) => {
            for grader in summary.written.iter() {
                println!("Wrote {:?}", grader_sheet_file(dir, grader));
            }
            for grader in summary.skipped.iter() {
                println!("Skipped {:?}", grader_sheet_file(dir, grader));
            }
            true
        }
        Err(e) => {
            eprintln!("Failed to write grader sheets: {}", e);
            false
        }
    }
}

pub fn merge(config_file: &Path, dir: &Path, outfile: Option<&Path>) -> bool {
    let Some(config) = load_config(config_file) else {
        return false;
    };
    let merged = match merge_grader_sheets(dir, &config.graders) {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Failed to merge grader sheets: {}", e);
            return false;
        }
    };
    let outfile = outfile.map_or_else(|| completed_grades_file(dir), Path::to_path_buf);
    if !may_write(&outfile) {
        return false;
    }
    if let Err(e) = merged.write_csv(&outfile) {
        eprintln!("Failed to write {:?}: {}", outfile, e);
        return false;
    }
    println!("Merged {} rows into {:?}", merged.len(), outfile);
    true
}

pub fn scan_duplicates(folder: &Path) -> bool {
    match scan_for_duplicates(folder) {
        Ok(report) if report.is_empty() => {
            println!("No student has more than one submission");
            true
        }
        Ok(report) => {
            println!("The following students have multiple submissions:");
            println!("{}", describe_duplicates(&report));
            true
        }
        Err(e) => {
            eprintln!("Failed to scan {:?}: {}", folder, e);
            false
        }
    }
}

pub fn rename_folders(
    config_file: &Path,
    classlist: &Path,
    folder: &Path,
    name_format: Option<NameFormat>,
    interactive: bool,
) -> bool {
    let Some(config) = load_config(config_file) else {
        return false;
    };
    let roster = match load_roster(classlist) {
        Ok(roster) => roster,
        Err(e) => {
            eprintln!("Failed to load class list: {}", e);
            return false;
        }
    };
    let options = RenameOptions {
        name_format: name_format.unwrap_or(config.name_format),
        ..Default::default()
    };
    let confirm: fn(&str, &str) -> bool = if interactive { confirm_rename } else { decline };
    match rename_to_canonical(&roster, folder, &options, confirm) {
        Ok(report) => {
            println!(
                "Renamed: {}, already correct: {}, no match: {}, failed: {}",
                report.count(Outcome::Renamed),
                report.count(Outcome::AlreadyCorrect),
                report.count(Outcome::NoMatchFound),
                report.count(Outcome::Failed)
            );
            for attempt in report.attempts.iter().filter(|a| a.outcome == Outcome::Failed) {
                println!(
                    "  {}: {}",
                    attempt.original_name,
                    attempt.error.as_deref().unwrap_or_default()
                );
            }
            true
        }
        Err(e) => {
            eprintln!("Failed to rename folders: {}", e);
            false
        }
    }
}

pub fn restore_folders(folder: &Path) -> bool {
    match restore_from_rename_log(folder) {
        Ok(report) => {
            let restored = report
                .attempts
                .iter()
                .filter(|a| a.outcome == Outcome::Renamed)
                .count();
            println!("Restored {} folders", restored);
            if !report.unfound.is_empty() {
                println!("Not in the rename log:");
                for name in report.unfound.iter() {
                    println!("  {}", name);
                }
            }
            true
        }
        Err(e) => {
            eprintln!("Failed to restore folder names: {}", e);
            false
        }
    }
}

pub fn unsubmitted(classlist: &Path, folder: &Path, save: bool) -> bool {
    let table = match load_classlist(classlist, None) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to load class list: {}", e);
            return false;
        }
    };
    let missing = match find_unsubmitted(&table, folder) {
        Ok(missing) => missing,
        Err(e) => {
            eprintln!("Failed to check submissions: {}", e);
            return false;
        }
    };
    if missing.is_empty() {
        println!("Every student has submitted");
        return true;
    }
    print_table(&missing);
    if save {
        let outfile = unsubmitted_file(folder, Local::now().date_naive());
        if let Err(e) = missing.write_csv(&outfile) {
            eprintln!("Failed to write {:?}: {}", outfile, e);
            return false;
        }
        println!("Saved to {:?}", outfile);
    }
    true
}

pub fn unpack(zipfile: &Path, dest: &Path) -> bool {
    match unpack_submissions(zipfile, dest) {
        Ok(names) => {
            println!("Unpacked {} submissions into {:?}", names.len(), dest);
            true
        }
        Err(e) => {
            eprintln!("Failed to unpack {:?}: {}", zipfile, e);
            false
        }
    }
}

/// Merges the sheets, weights each coursework, totals and letter-grades.
pub fn finalize(
    config_file: &Path,
    dir: &Path,
    weights: &[(String, f64)],
    fail_threshold: f64,
    outfile: Option<&Path>,
) -> bool {
    let Some(config) = load_config(config_file) else {
        return false;
    };
    let graded = merge_grader_sheets(dir, &config.graders).and_then(|mut table| {
        for (column, weight) in weights {
            table = weighted_score(&table, column, *weight)?;
        }
        let table = total_module_score(&table)?;
        with_letter_grades(&table, fail_threshold)
    });
    let graded = match graded {
        Ok(graded) => graded,
        Err(e) => {
            eprintln!("Failed to finalize grades: {}", e);
            return false;
        }
    };
    let outfile = outfile.map_or_else(|| completed_grades_file(dir), Path::to_path_buf);
    if !may_write(&outfile) {
        return false;
    }
    if let Err(e) = graded.write_csv(&outfile) {
        eprintln!("Failed to write {:?}: {}", outfile, e);
        return false;
    }
    println!("Graded {} students into {:?}", graded.len(), outfile);
    true
}
