//! Tasks synthesized from a `package.json` script manifest
//!
//! Every entry of `scripts` becomes a task that installs dependencies from the
//! frozen lockfile and then runs the script through yarn or npm.

use crate::config::types::{Cmd, Task, Taskfile};
use crate::error::{Result, TaskfileError};
use crate::utils;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Version stamped on manifest-derived declarations
pub const MANIFEST_VERSION: &str = "3";

/// The only part of the manifest we read
#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: HashMap<String, String>,
}

/// Build a declaration from the manifest at `path`
pub fn read_package_json(project_root: &Path, path: &Path) -> Result<Taskfile> {
    let content = fs::read(path).map_err(|e| TaskfileError::io(path, e))?;

    let package: PackageJson =
        serde_json::from_slice(&content).map_err(|source| TaskfileError::Manifest {
            path: utils::try_abs_to_rel(path),
            source,
        })?;

    let text = String::from_utf8_lossy(&content);
    let rel_file = utils::try_abs_to_rel(path);
    let runner = package_manager(path);

    let mut taskfile = Taskfile {
        version: MANIFEST_VERSION.to_string(),
        ..Taskfile::default()
    };

    for (name, _script) in package.scripts {
        let location = match find_line_number(&text, &name) {
            Some(line) => format!("{}:{}", rel_file, line),
            None => rel_file.clone(),
        };

        let task = Task {
            desc: Some(format!("→ {}", location)),
            cmds: vec![
                Cmd::command(format!("{} install --silent --frozen-lockfile", runner)),
                Cmd::command(format!("{} run {}", runner, name)),
            ],
            dir: project_root.display().to_string(),
            source_file: Some(path.to_path_buf()),
            ..Task::default()
        };
        taskfile.tasks.insert(name, task);
    }

    Ok(taskfile)
}

/// `yarn` when a `yarn.lock` sits next to the manifest, `npm` otherwise
fn package_manager(manifest: &Path) -> &'static str {
    let lockfile = manifest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("yarn.lock");
    if lockfile.exists() {
        "yarn"
    } else {
        "npm"
    }
}

/// 1-indexed line of the first line containing `"<script>":`
pub fn find_line_number(content: &str, script: &str) -> Option<usize> {
    let needle = format!("\"{}\":", script);
    content
        .lines()
        .position(|line| line.contains(&needle))
        .map(|index| index + 1)
}
