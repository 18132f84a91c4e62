//! Include resolution
//!
//! Loads a root declaration, then recursively resolves each of its includes and
//! merges them into the root under their namespace. Includes are processed in
//! declaration order. Any error aborts the whole resolution.

pub mod node;

pub use node::*;

use crate::config::{
    find_taskfile_from, is_manifest, locate, merge, read_package_json, read_taskfile, Include,
    Taskfile,
};
use crate::error::{Result, TaskfileError};
use crate::templater::Templater;
use crate::utils;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Version from which include templating and the dotenv restriction apply,
/// and below which the per-OS sibling file is merged
pub const VERSION_GATE: f64 = 3.0;

/// Resolve the declaration in `dir` (or the nearest parent) into a merged task graph
///
/// An empty `entrypoint` searches for one of the default file names.
pub fn read(dir: impl Into<PathBuf>, entrypoint: impl Into<String>) -> Result<(Taskfile, PathBuf)> {
    resolve(ReaderNode::root(dir, entrypoint))
}

/// Resolve `node` and everything it includes
///
/// Returns the merged declaration and the directory of the file it came from.
pub fn resolve(mut node: ReaderNode) -> Result<(Taskfile, PathBuf)> {
    if node.dir.as_os_str().is_empty() {
        node.dir = env::current_dir().map_err(|e| TaskfileError::io(".", e))?;
    }
    node.dir = utils::absolute(&node.dir)?;

    let path = if node.entrypoint.is_empty() {
        find_taskfile_from(&node.dir)?
    } else {
        utils::absolute(&node.location().path())?
    };
    node = node.with_path(&path);
    debug!("resolving {}", path.display());

    let mut taskfile = if is_manifest(&path) {
        read_package_json(&node.dir, &path)?
    } else {
        read_taskfile(&path)?
    };

    let taskfile_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| node.dir.clone());
    default_task_dirs(&mut taskfile, &taskfile_dir);

    let version = taskfile.parsed_version()?;

    annotate_includes(&mut taskfile, &node.dir);

    let includes: Vec<(String, Include)> = taskfile
        .includes
        .iter()
        .map(|(namespace, include)| (namespace.clone(), include.clone()))
        .collect();

    for (namespace, include) in includes {
        include_taskfile(&mut taskfile, &node, &namespace, include, version)?;
    }

    if version < VERSION_GATE {
        merge_os_taskfile(&mut taskfile, &node.dir)?;
    }

    for (name, task) in taskfile.tasks.iter_mut() {
        task.name = name.clone();
    }

    Ok((taskfile, taskfile_dir))
}

/// Record the directory relative include paths resolve against; the first assignment wins
fn annotate_includes(taskfile: &mut Taskfile, dir: &Path) {
    for include in taskfile.includes.values_mut() {
        if include.base_dir.is_none() {
            include.base_dir = Some(dir.to_path_buf());
        }
    }
}

/// Resolve one include and merge it into `parent`
fn include_taskfile(
    parent: &mut Taskfile,
    node: &ReaderNode,
    namespace: &str,
    include: Include,
    version: f64,
) -> Result<()> {
    let include = if version >= VERSION_GATE {
        template_include(include)?
    } else {
        include
    };

    let path = match locate(&include.full_taskfile_path()?) {
        Ok(path) => path,
        Err(e) if include.optional => {
            debug!("skipping optional include {}: {}", namespace, e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let child_node = node.child(&path, include.optional);
    check_circular_includes(&child_node)?;

    let (mut child, child_dir) = match resolve(child_node) {
        Ok(resolved) => resolved,
        Err(e) if e.is_cycle() => return Err(e),
        Err(e) if include.optional => {
            debug!("skipping optional include {}: {}", namespace, e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if version >= VERSION_GATE && !child.dotenv.is_empty() {
        return Err(TaskfileError::DotenvInInclude);
    }

    if include.advanced_import {
        rebase(&mut child, &include, &child_dir)?;
    }

    let child_has_default = child.tasks.contains_key("default");

    debug!("merging {} under {}", path.display(), namespace);
    merge(parent, child, Some(&include), Some(namespace))?;

    if child_has_default && !parent.tasks.contains_key(namespace) {
        let default_task = format!("{}:default", namespace);
        if let Some(task) = parent.tasks.get_mut(&default_task) {
            task.aliases.push(namespace.to_string());
            task.aliases.extend(include.aliases.iter().cloned());
        }
    }

    Ok(())
}

/// Substitute literal defaults in the include's path and dir fields
fn template_include(include: Include) -> Result<Include> {
    let mut tr = Templater::default().with_remove_no_value(true);
    let taskfile = tr.replace(&include.taskfile);
    let dir = tr.replace(&include.dir);
    tr.err()?;

    Ok(Include {
        taskfile,
        dir,
        ..include
    })
}

/// Move an advanced import's vars, env and tasks under the include's directory
///
/// Tasks keep the include's own vars and the included file's vars as two
/// separate scopes.
fn rebase(child: &mut Taskfile, include: &Include, child_dir: &Path) -> Result<()> {
    let dir = include.full_dir_path()?;

    for var in child.vars.values_mut() {
        var.dir = Some(dir.clone());
    }
    for var in child.env.values_mut() {
        var.dir = Some(dir.clone());
    }

    let native_vars = child.vars.clone();
    let origin = Box::new(include.clone());

    for task in child.tasks.values_mut() {
        task.dir = rebase_task_dir(&dir, child_dir, &task.dir, include.dir.is_empty());
        task.include_vars = Some(include.vars.clone());
        task.included_taskfile_vars = Some(native_vars.clone());
        task.included_taskfile = Some(origin.clone());
    }

    Ok(())
}

/// Join a task's directory onto the include directory
///
/// With an explicit include `dir`, a task living in (or below) the included
/// file's own directory keeps its relative position under the include dir.
/// Absolute directories elsewhere are left alone.
fn rebase_task_dir(include_dir: &Path, child_dir: &Path, task_dir: &str, implicit: bool) -> String {
    let task_dir = Path::new(task_dir);
    let rebased = match task_dir.strip_prefix(child_dir) {
        Ok(relative) if !implicit => include_dir.join(relative),
        _ => include_dir.join(task_dir),
    };
    utils::clean(&rebased).display().to_string()
}

/// Tasks without a directory run in the directory of the declaring file
fn default_task_dirs(taskfile: &mut Taskfile, dir: &Path) {
    for task in taskfile.tasks.values_mut() {
        if task.dir.is_empty() {
            task.dir = dir.display().to_string();
        }
    }
}

/// Name of the legacy per-platform sibling file, e.g. `Taskfile_linux.yml`
pub fn os_taskfile_name() -> String {
    let os = match env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    format!("Taskfile_{}.yml", os)
}

/// Flat-merge the per-platform sibling file if it exists
fn merge_os_taskfile(taskfile: &mut Taskfile, dir: &Path) -> Result<()> {
    let path = dir.join(os_taskfile_name());
    if !path.is_file() {
        return Ok(());
    }

    debug!("merging platform file {}", path.display());
    let mut os_taskfile = read_taskfile(&path)?;
    default_task_dirs(&mut os_taskfile, dir);
    merge(taskfile, os_taskfile, None, None)?;
    Ok(())
}
