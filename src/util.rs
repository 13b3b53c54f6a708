use std::fs;
use std::io::{self, prelude::*, Result};
use std::path::Path;

pub fn prompt_yn(prompt: &str) -> Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("{} ", prompt);
    stdout.flush()?;
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().to_lowercase() == "y")
}

/// Interactive confirmation for a suggested folder rename. Declines when
/// stdin cannot be read.
pub fn confirm_rename(original: &str, suggested: &str) -> bool {
    prompt_yn(&format!("Rename '{}' to '{}'? (y/n)", original, suggested)).unwrap_or(false)
}

/// Names of the immediate subdirectories of `dir`, sorted. Files and names
/// that are not valid UTF-8 are left out.
pub fn list_subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;

    use super::list_subdirectories;

    #[test]
    fn only_directories_are_listed() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("b").create_dir_all().unwrap();
        dir.child("a").create_dir_all().unwrap();
        dir.child("log.csv").touch().unwrap();
        assert_eq!(list_subdirectories(dir.path()).unwrap(), vec!["a", "b"]);
    }
}
