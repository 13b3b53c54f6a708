use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

use crate::folder_names::NameFormat;

mod assign;
mod commands;
mod config;
mod error;
mod folder_names;
mod grader_config;
mod grader_sheets;
mod grades;
mod logging;
mod quota;
mod rename_folders;
mod rename_log;
mod restore_folders;
mod roster;
mod scan_submissions;
mod table;
mod types;
mod unpack;
mod unsubmitted;
mod util;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Grading config for this piece of coursework [default: grading.json]
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Write a grading config listing the graders
    InitConfig {
        #[arg(long)]
        graders_file: Option<Utf8PathBuf>,
        #[arg(long = "grader")]
        graders: Vec<String>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show how many students each grader would get
    Quota { students: usize },
    /// Add a grader column to a Brightspace class list
    Assign {
        classlist: Utf8PathBuf,
        outfile: Utf8PathBuf,
        /// Keep this grade column from the class list instead of adding an empty Score
        #[arg(long)]
        assignment: Option<String>,
        /// Give every member of a group the same grader
        #[arg(long)]
        groups: bool,
        #[arg(long)]
        overwrite: bool,
    },
    /// Write one sheet per grader from an assigned class list
    WriteSheets {
        assigned: Utf8PathBuf,
        dir: Utf8PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Combine the completed grader sheets
    Merge {
        dir: Utf8PathBuf,
        #[arg(long)]
        outfile: Option<Utf8PathBuf>,
    },
    /// List students with more than one submission folder
    ScanDuplicates { folder: Utf8PathBuf },
    /// Rename raw submission folders to LAST, FIRST(id)
    RenameFolders {
        classlist: Utf8PathBuf,
        folder: Utf8PathBuf,
        #[arg(long, value_enum)]
        name_format: Option<NameFormat>,
        /// Ask before accepting a match made on the student's name
        #[arg(long)]
        interactive: bool,
    },
    /// Put the Brightspace folder names back using the rename log
    RestoreFolders { folder: Utf8PathBuf },
    /// List students without a submission folder
    Unsubmitted {
        classlist: Utf8PathBuf,
        folder: Utf8PathBuf,
        /// Save the list as unsubmitted_<date>.csv next to the folder
        #[arg(long)]
        save: bool,
    },
    /// Extract a Brightspace submissions download
    Unpack {
        zipfile: Utf8PathBuf,
        dest: Utf8PathBuf,
    },
    /// Merge sheets, weight courseworks, total and letter-grade
    Finalize {
        dir: Utf8PathBuf,
        /// "<column>=<weight>", e.g. "Coursework 1 (100)=0.4"
        #[arg(long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,
        #[arg(long, default_value_t = 35.0)]
        fail_threshold: f64,
        #[arg(long)]
        outfile: Option<Utf8PathBuf>,
    },
}

fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (column, weight) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected <column>=<weight>, got '{}'", s))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad weight '{}': {}", weight, e))?;
    Ok((column.trim().to_string(), weight))
}

fn main() {
    let cli = Args::parse();
    logging::init(cli.verbose);
    let config_file = cli
        .config
        .map_or_else(config::default_config_file, Utf8PathBuf::into_std_path_buf);
    let config = config_file.as_path();

    let ok = match cli.command {
        SubCommand::InitConfig {
            graders_file,
            graders,
            seed,
        } => commands::init_config(
            config,
            graders_file.as_ref().map(|p| p.as_std_path()),
            graders,
            seed,
        ),
        SubCommand::Quota { students } => commands::quota(config, students),
        SubCommand::Assign {
            classlist,
            outfile,
            assignment,
            groups,
            overwrite,
        } => commands::assign(
            config,
            classlist.as_std_path(),
            assignment.as_deref(),
            outfile.as_std_path(),
            groups,
            overwrite,
        ),
        SubCommand::WriteSheets {
            assigned,
            dir,
            overwrite,
        } => commands::write_sheets(config, assigned.as_std_path(), dir.as_std_path(), overwrite),
        SubCommand::Merge { dir, outfile } => commands::merge(
            config,
            dir.as_std_path(),
            outfile.as_ref().map(|p| p.as_std_path()),
        ),
        SubCommand::ScanDuplicates { folder } => commands::scan_duplicates(folder.as_std_path()),
        SubCommand::RenameFolders {
            classlist,
            folder,
            name_format,
            interactive,
        } => commands::rename_folders(
            config,
            classlist.as_std_path(),
            folder.as_std_path(),
            name_format,
            interactive,
        ),
        SubCommand::RestoreFolders { folder } => commands::restore_folders(folder.as_std_path()),
        SubCommand::Unsubmitted {
            classlist,
            folder,
            save,
        } => commands::unsubmitted(classlist.as_std_path(), folder.as_std_path(), save),
        SubCommand::Unpack { zipfile, dest } => {
            commands::unpack(zipfile.as_std_path(), dest.as_std_path())
        }
        SubCommand::Finalize {
            dir,
            weights,
            fail_threshold,
            outfile,
        } => commands::finalize(
            config,
            dir.as_std_path(),
            &weights,
            fail_threshold,
            outfile.as_ref().map(|p| p.as_std_path()),
        ),
    };

    if !ok {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_argument_splits_on_last_equals() {
        assert_eq!(
            parse_weight("Coursework 1 (100)=0.4").unwrap(),
            ("Coursework 1 (100)".to_string(), 0.4)
        );
        assert!(parse_weight("Coursework 1").is_err());
        assert!(parse_weight("Coursework 1=heavy").is_err());
    }

    #[test]
    fn config_is_optional() {
        let args = Args::parse_from(["grader_cli", "quota", "12"]);
        assert!(args.config.is_none());
        assert_eq!(config::default_config_file(), std::path::PathBuf::from("grading.json"));
        let args = Args::parse_from(["grader_cli", "quota", "12", "--config", "lab1.json"]);
        assert_eq!(args.config.as_deref().map(|p| p.as_str()), Some("lab1.json"));
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
