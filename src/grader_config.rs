use std::{
    collections::BTreeMap,
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    assign::AssignOptions,
    error::{GraderError, Result},
    folder_names::NameFormat,
};

fn default_column() -> String {
    String::from("grader")
}

/// Settings for one piece of coursework, stored as `grading.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraderConfig {
    #[serde(default)]
    pub graders: Vec<String>,
    #[serde(default)]
    pub weights: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_column")]
    pub column: String,
    #[serde(default)]
    pub name_format: NameFormat,
    #[serde(default)]
    pub criteria: Vec<String>,
}

impl Default for GraderConfig {
    fn default() -> Self {
        GraderConfig {
            graders: Vec::new(),
            weights: None,
            seed: None,
            column: default_column(),
            name_format: NameFormat::default(),
            criteria: Vec::new(),
        }
    }
}

impl GraderConfig {
    pub fn assign_options(&self, overwrite: bool) -> AssignOptions {
        AssignOptions {
            column: self.column.clone(),
            overwrite,
            seed: self.seed,
            weights: self.weights.clone(),
        }
    }
}

pub fn read_config(path: &Path) -> Result<GraderConfig> {
    let file = OpenOptions::new().read(true).open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| GraderError::InvalidConfig(format!("failed to read {:?}: {}", path, e)))
}

/// Missing file means defaults; a present but broken file is an error.
pub fn read_config_or_default(path: &Path) -> Result<GraderConfig> {
    if !path.exists() {
        return Ok(GraderConfig::default());
    }
    read_config(path)
}

/// One grader per line. Blank lines are ignored.
pub fn load_graders(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let mut graders = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            graders.push(name.to_string());
        }
    }
    Ok(graders)
}

pub fn write_config(path: &Path, config: &GraderConfig) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grading.json");
        std::fs::write(&path, r#"{"graders": ["alice", "bob"], "seed": 3}"#).unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.graders, vec!["alice", "bob"]);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.column, "grader");
        assert_eq!(config.name_format, NameFormat::Compact);
    }

    #[test]
    fn config_survives_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grading.json");
        let mut weights = BTreeMap::new();
        weights.insert("alice".to_string(), 2.0);
        let config = GraderConfig {
            graders: vec!["alice".into()],
            weights: Some(weights),
            name_format: NameFormat::Spaced,
            ..Default::default()
        };
        write_config(&path, &config).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test]
    fn graders_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graders.txt");
        std::fs::write(&path, "alice\n\n  bob \n\n").unwrap();
        assert_eq!(load_graders(&path).unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn missing_config_is_default_but_broken_config_is_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grading.json");
        assert_eq!(read_config_or_default(&path).unwrap(), GraderConfig::default());
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_config_or_default(&path),
            Err(GraderError::InvalidConfig(_))
        ));
    }
}
