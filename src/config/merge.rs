//! Splicing one declaration into another under a namespace

use crate::config::types::{Include, Taskfile};
use crate::error::{MergeError, MergeResult};
use tracing::trace;

/// Separator between a namespace and a task name
pub const NAMESPACE_SEPARATOR: &str = ":";

/// Merge `child` into `parent`
///
/// Every child task lands under `<namespace>:<task>` (verbatim when no
/// namespace is given), with its deps, task calls and aliases namespaced the
/// same way. Child vars and env entries overwrite equal keys in the parent.
pub fn merge(
    parent: &mut Taskfile,
    child: Taskfile,
    include: Option<&Include>,
    namespace: Option<&str>,
) -> MergeResult<()> {
    if major_version(&parent.version) != major_version(&child.version) {
        return Err(MergeError::VersionMismatch {
            first: parent.version.clone(),
            second: child.version.clone(),
        });
    }

    parent.vars.merge(child.vars);
    parent.env.merge(child.env);

    for (name, mut task) in child.tasks {
        task.internal = task.internal || include.map_or(false, |i| i.internal);

        for dep in &mut task.deps {
            dep.task = with_namespace(&dep.task, namespace);
        }
        for call in task.cmds.iter_mut().filter_map(|cmd| cmd.task.as_mut()) {
            *call = with_namespace(call, namespace);
        }

        let declared_aliases = std::mem::take(&mut task.aliases);
        task.aliases = declared_aliases
            .iter()
            .map(|alias| with_namespace(alias, namespace))
            .collect();

        if let Some(include) = include {
            for namespace_alias in &include.aliases {
                task.aliases
                    .push(with_namespace(&name, Some(namespace_alias.as_str())));
                for alias in &declared_aliases {
                    task.aliases
                        .push(with_namespace(alias, Some(namespace_alias.as_str())));
                }
            }
        }

        let key = with_namespace(&name, namespace);
        trace!("merging task {}", key);
        task.name = key.clone();
        parent.tasks.insert(key, task);
    }

    Ok(())
}

/// Prefix `name` with `namespace`; a leading `:` addresses the root and is kept flat
pub fn with_namespace(name: &str, namespace: Option<&str>) -> String {
    if let Some(root) = name.strip_prefix(NAMESPACE_SEPARATOR) {
        return root.to_string();
    }
    match namespace {
        Some(ns) => format!("{}{}{}", ns, NAMESPACE_SEPARATOR, name),
        None => name.to_string(),
    }
}

fn major_version(version: &str) -> &str {
    version.trim().split('.').next().unwrap_or_default()
}
