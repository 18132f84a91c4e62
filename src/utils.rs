//! Path helpers shared by the loader and the include resolver

use crate::error::{Result, TaskfileError};
use directories::BaseDirs;
use regex::{Captures, Regex};
use std::env;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("environment variable pattern is valid")
    })
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references
///
/// Unset variables expand to the empty string, as a shell would.
pub fn expand(path: &str) -> String {
    let mut expanded = path.to_string();

    if expanded == "~" || expanded.starts_with("~/") {
        if let Some(dirs) = BaseDirs::new() {
            expanded = format!("{}{}", dirs.home_dir().display(), &expanded[1..]);
        }
    }

    env_var_regex()
        .replace_all(&expanded, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            env::var(name).unwrap_or_default()
        })
        .into_owned()
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent
pub fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}

/// Make a path absolute against the working directory and clean it
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(clean(path));
    }
    let cwd = env::current_dir().map_err(|e| TaskfileError::io(".", e))?;
    Ok(clean(&cwd.join(path)))
}

/// Relative path from `base` to `target`, using `../` when `target` is outside `base`
///
/// Both paths should be absolute and cleaned.
pub fn relative_to(base: &Path, target: &Path) -> PathBuf {
    if let Ok(relative) = target.strip_prefix(base) {
        return relative.to_path_buf();
    }

    let base_components: Vec<_> = base.components().collect();
    let target_components: Vec<_> = target.components().collect();

    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(b, t)| b == t)
        .count();

    let mut result = PathBuf::new();
    for _ in &base_components[common..] {
        result.push("..");
    }
    for component in &target_components[common..] {
        result.push(component.as_os_str());
    }
    result
}

/// Render a path relative to the working directory when possible
pub fn try_abs_to_rel(path: &Path) -> String {
    if !path.is_absolute() {
        return path.display().to_string();
    }
    match env::current_dir() {
        Ok(cwd) => relative_to(&clean(&cwd), &clean(path)).display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
