//! Main CLI application

use crate::config::{Task, Taskfile};
use crate::reader;
use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::Colorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Written by `--init`
pub const STARTER_TASKFILE: &str = r#"version: '3'

vars:
  GREETING: Hello, World!

tasks:
  default:
    cmds:
      - echo "{{.GREETING}}"
    silent: true
"#;

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("taskfile")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve a Taskfile and its includes into one task graph")
        .arg(
            Arg::new("dir")
                .short('d')
                .long("dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory to start searching for a Taskfile in"),
        )
        .arg(
            Arg::new("taskfile")
                .short('t')
                .long("taskfile")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Explicit Taskfile (or package.json) to resolve"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log include resolution to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the merged declaration as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("init")
                .long("init")
                .help("Create a starter Taskfile.yml in the directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completion")
                .long("completion")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print shell completions"),
        )
}

/// Run the CLI application with process arguments
pub fn run() -> Result<()> {
    let matches = build_command().get_matches();
    run_with(&matches)
}

/// Run the CLI application with already-parsed arguments
pub fn run_with(matches: &ArgMatches) -> Result<()> {
    init_logging(matches.get_flag("verbose"));

    if let Some(shell) = matches.get_one::<Shell>("completion") {
        let mut cmd = build_command();
        clap_complete::generate(*shell, &mut cmd, "taskfile", &mut io::stdout());
        return Ok(());
    }

    let dir = matches.get_one::<PathBuf>("dir").cloned().unwrap_or_default();

    if matches.get_flag("init") {
        let path = init_taskfile(&dir)?;
        println!("{} created", path.display());
        return Ok(());
    }

    let (dir, entrypoint) = split_entrypoint(&dir, matches.get_one::<PathBuf>("taskfile"));
    let (taskfile, _) = reader::read(dir, entrypoint).context("Failed to resolve Taskfile")?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&taskfile)?);
    } else {
        print_tasks(&taskfile);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "taskfile=debug" } else { "taskfile=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Turn `--dir` plus an optional `--taskfile` into a (directory, file name) pair
fn split_entrypoint(dir: &Path, taskfile: Option<&PathBuf>) -> (PathBuf, String) {
    match taskfile {
        Some(file) => {
            let path = dir.join(file);
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (parent, name)
        }
        None => (dir.to_path_buf(), String::new()),
    }
}

/// Write the starter Taskfile, refusing to overwrite an existing one
fn init_taskfile(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("Taskfile.yml");
    if path.exists() {
        bail!("A Taskfile already exists at {}", path.display());
    }
    fs::write(&path, STARTER_TASKFILE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Public task names in sorted order
fn visible_tasks(taskfile: &Taskfile) -> Vec<&Task> {
    let mut tasks: Vec<&Task> = taskfile.tasks.values().filter(|t| !t.internal).collect();
    tasks.sort_by(|a, b| a.name.cmp(&b.name));
    tasks
}

fn print_tasks(taskfile: &Taskfile) {
    for task in visible_tasks(taskfile) {
        let mut line = format!("* {}", task.name.green());
        if let Some(desc) = &task.desc {
            line.push_str(&format!(": {}", desc));
        }
        if !task.aliases.is_empty() {
            line.push_str(&format!(" (aliases: {})", task.aliases.join(", ")));
        }
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_entrypoint() {
        let (dir, name) = split_entrypoint(
            Path::new("/work"),
            Some(&PathBuf::from("sub/Custom.yml")),
        );
        assert_eq!(dir, PathBuf::from("/work/sub"));
        assert_eq!(name, "Custom.yml");

        let (dir, name) = split_entrypoint(Path::new("/work"), None);
        assert_eq!(dir, PathBuf::from("/work"));
        assert!(name.is_empty());
    }

    #[test]
    fn test_visible_tasks_hides_internal_and_sorts() {
        let mut taskfile = Taskfile::default();
        for (name, internal) in [("b", false), ("a", false), ("hidden", true)] {
            taskfile.tasks.insert(
                name.to_string(),
                Task {
                    name: name.to_string(),
                    internal,
                    ..Task::default()
                },
            );
        }

        let names: Vec<&str> = visible_tasks(&taskfile)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = init_taskfile(temp_dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_TASKFILE);
        assert!(init_taskfile(temp_dir.path()).is_err());
    }

    #[test]
    fn test_starter_taskfile_parses() {
        let taskfile: Taskfile = serde_yaml::from_str(STARTER_TASKFILE).unwrap();
        assert_eq!(taskfile.parsed_version().unwrap(), 3.0);
        assert!(taskfile.tasks.contains_key("default"));
    }
}
