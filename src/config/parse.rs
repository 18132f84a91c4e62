//! Declaration file discovery and parsing

use crate::config::types::Taskfile;
use crate::error::{Result, TaskfileError};
use crate::utils;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Default declaration file names, probed in order
pub const DEFAULT_TASKFILES: &[&str] = &[
    "Taskfile.yml",
    "Taskfile.yaml",
    "Taskfile.dist.yml",
    "Taskfile.dist.yaml",
    MANIFEST_FILE_NAME,
];

/// Name of the foreign script manifest
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Resolve a file or directory to a concrete declaration file
///
/// A regular file is returned unchanged. A directory is probed for each of
/// [`DEFAULT_TASKFILES`]; the first one present wins.
pub fn locate(path: &Path) -> Result<PathBuf> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TaskfileError::NotFound {
            dir: path.to_path_buf(),
        },
        _ => TaskfileError::io(path, e),
    })?;

    if metadata.is_file() {
        return Ok(path.to_path_buf());
    }

    probe_dir(path)?.ok_or_else(|| TaskfileError::NotFound {
        dir: path.to_path_buf(),
    })
}

/// First default declaration file inside `dir`, if any
fn probe_dir(dir: &Path) -> Result<Option<PathBuf>> {
    for name in DEFAULT_TASKFILES {
        let candidate = dir.join(name);
        trace!("probing {}", candidate.display());
        match fs::metadata(&candidate) {
            Ok(_) => return Ok(Some(candidate)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(TaskfileError::io(candidate, e)),
        }
    }
    Ok(None)
}

/// Find the entrypoint by searching `start_dir` and then each parent directory
///
/// Directories that cannot be inspected are skipped.
pub fn find_taskfile_from(start_dir: &Path) -> Result<PathBuf> {
    let mut current_dir = Some(start_dir);

    while let Some(dir) = current_dir {
        match probe_dir(dir) {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => {}
            Err(e) => trace!("skipping {}: {}", dir.display(), e),
        }
        current_dir = dir.parent();
    }

    Err(TaskfileError::NotFound {
        dir: start_dir.to_path_buf(),
    })
}

/// Whether a resolved path names the foreign script manifest
pub fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .map_or(false, |name| name == MANIFEST_FILE_NAME)
}

/// Parse a native declaration file and stamp its tasks with their origin
pub fn read_taskfile(path: &Path) -> Result<Taskfile> {
    let file = File::open(path).map_err(|e| TaskfileError::io(path, e))?;

    let mut taskfile: Taskfile =
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| TaskfileError::Parse {
            path: utils::try_abs_to_rel(path),
            source,
        })?;

    for task in taskfile.tasks.values_mut() {
        task.source_file = Some(path.to_path_buf());
    }

    Ok(taskfile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SIMPLE: &str = r#"
version: '3'
tasks:
  test:
    cmds:
      - echo "test"
"#;

    #[test]
    fn test_locate_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yml");
        fs::write(&path, SIMPLE).unwrap();

        assert_eq!(locate(&path).unwrap(), path);
    }

    #[test]
    fn test_locate_probes_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Taskfile.dist.yml"), SIMPLE).unwrap();
        fs::write(temp_dir.path().join("package.json"), "{}").unwrap();

        let found = locate(temp_dir.path()).unwrap();
        assert_eq!(found, temp_dir.path().join("Taskfile.dist.yml"));

        fs::write(temp_dir.path().join("Taskfile.yaml"), SIMPLE).unwrap();
        let found = locate(temp_dir.path()).unwrap();
        assert_eq!(found, temp_dir.path().join("Taskfile.yaml"));
    }

    #[test]
    fn test_locate_falls_back_to_manifest() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{}").unwrap();

        let found = locate(temp_dir.path()).unwrap();
        assert!(is_manifest(&found));
    }

    #[test]
    fn test_locate_empty_dir_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = locate(temp_dir.path());
        assert!(matches!(result, Err(TaskfileError::NotFound { .. })));
    }

    #[test]
    fn test_locate_missing_path_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = locate(&temp_dir.path().join("nope"));
        assert!(matches!(result, Err(TaskfileError::NotFound { .. })));
    }

    #[test]
    fn test_find_taskfile_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("Taskfile.yml");
        let sub_dir = temp_dir.path().join("subdir");

        fs::create_dir(&sub_dir).unwrap();
        fs::write(&config_path, SIMPLE).unwrap();

        let found = find_taskfile_from(&sub_dir).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_find_taskfile_skips_uninspectable_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("Taskfile.yml");
        let blocker = temp_dir.path().join("notes.txt");
        fs::write(&config_path, SIMPLE).unwrap();
        fs::write(&blocker, "not a directory").unwrap();

        // Probing below a regular file fails with something other than NotFound
        let start = blocker.join("nested");
        assert!(matches!(probe_dir(&start), Err(TaskfileError::Io { .. })));

        let found = find_taskfile_from(&start).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_locate_keeps_strict_errors() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("notes.txt");
        fs::write(&blocker, "not a directory").unwrap();

        let result = locate(&blocker.join("Taskfile.yml"));
        assert!(matches!(result, Err(TaskfileError::Io { .. })));
    }

    #[test]
    fn test_read_taskfile_stamps_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Taskfile.yml");
        fs::write(&path, SIMPLE).unwrap();

        let tf = read_taskfile(&path).unwrap();
        assert_eq!(tf.tasks["test"].source_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_read_taskfile_parse_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Taskfile.yml");
        fs::write(&path, "version: '3'\ntasks: [unclosed\n").unwrap();

        let err = read_taskfile(&path).unwrap_err();
        assert!(matches!(err, TaskfileError::Parse { .. }));
        assert!(err.to_string().contains("Taskfile.yml"));
    }
}
