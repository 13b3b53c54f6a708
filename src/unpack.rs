use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Component, Path},
};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{GraderError, Result};

/// Brightspace adds this listing to every download.
const IGNORED_FILES: [&str; 1] = ["index.html"];

/// Extracts a Brightspace submissions download into `dest`, one directory per
/// submission. Returns the submission directory names.
pub fn unpack_submissions(zipfile: &Path, dest: &Path) -> Result<Vec<String>> {
    if !zipfile.is_file() || zipfile.extension().map_or(true, |ext| ext != "zip") {
        return Err(GraderError::InvalidConfig(format!(
            "{:?} is not a zipfile",
            zipfile
        )));
    }
    fs::create_dir_all(dest)?;

    let mut archive = ZipArchive::new(File::open(zipfile)?)?;
    let mut submissions = BTreeSet::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Entries escaping `dest` are dropped.
        let Some(relative) = entry.enclosed_name() else {
            debug!(entry = entry.name(), "unsafe path, skipped");
            continue;
        };
        if relative
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| IGNORED_FILES.contains(&n))
        {
            continue;
        }
        if let Some(Component::Normal(top)) = relative.components().next() {
            if relative.components().count() > 1 || entry.is_dir() {
                submissions.insert(top.to_string_lossy().into_owned());
            }
        }

        let out_path = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&out_path)?);
        io::copy(&mut entry, &mut writer)?;
        writer.flush()?;
    }

    info!(dest = ?dest, submissions = submissions.len(), "unpacked submissions");
    Ok(submissions.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use zip::{write::SimpleFileOptions, ZipWriter};

    use super::*;

    fn build_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn submissions_are_extracted_without_index() {
        let dir = assert_fs::TempDir::new().unwrap();
        let zipfile = dir.child("download.zip");
        build_zip(
            zipfile.path(),
            &[
                ("index.html", "<html></html>"),
                ("Smith, Ana - 1234567 13 September 2025 310 PM/essay.docx", "a"),
                ("Jones, Bo - 7654321 13 September 2025 311 PM/essay.pdf", "b"),
            ],
        );
        let dest = dir.child("subs");

        let names = unpack_submissions(zipfile.path(), dest.path()).unwrap();

        assert_eq!(
            names,
            vec![
                "Jones, Bo - 7654321 13 September 2025 311 PM",
                "Smith, Ana - 1234567 13 September 2025 310 PM",
            ]
        );
        dest.child("index.html").assert(predicate::path::missing());
        dest.child("Smith, Ana - 1234567 13 September 2025 310 PM/essay.docx")
            .assert("a");
    }

    #[test]
    fn non_zip_is_rejected() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("download.txt");
        file.touch().unwrap();
        assert!(matches!(
            unpack_submissions(file.path(), dir.path()),
            Err(GraderError::InvalidConfig(_))
        ));
    }
}
