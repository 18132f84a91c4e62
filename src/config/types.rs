//! Core declaration types
//!
//! This module defines the data structures that represent a Taskfile.yml file
//! (or a task collection synthesized from a package manifest).

use crate::config::ordered::OrderedMap;
use crate::error::{Result, TaskfileError};
use crate::utils;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Variables keyed by name, in declaration order
pub type Vars = OrderedMap<Var>;

/// Tasks keyed by their (possibly namespaced) name
pub type Tasks = HashMap<String, Task>;

/// A parsed declaration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Taskfile {
    /// Schema version, kept as written
    #[serde(default, deserialize_with = "deserialize_version")]
    pub version: String,

    /// Tasks defined in the file
    #[serde(default, serialize_with = "serialize_sorted_tasks")]
    pub tasks: Tasks,

    /// Other declarations pulled in under a namespace
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub includes: OrderedMap<Include>,

    /// Global variables
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub vars: Vars,

    /// Global environment
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub env: Vars,

    /// Environment files to load, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dotenv: Vec<String>,
}

impl Taskfile {
    /// Parse the version string as a decimal number (`"3"` -> 3.0)
    pub fn parsed_version(&self) -> Result<f64> {
        self.version
            .trim()
            .parse::<f64>()
            .map_err(|source| TaskfileError::Version {
                version: self.version.clone(),
                source,
            })
    }
}

/// Emit tasks in key order so dumps are stable across runs
fn serialize_sorted_tasks<S: Serializer>(
    tasks: &Tasks,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let sorted: BTreeMap<&String, &Task> = tasks.iter().collect();
    sorted.serialize(serializer)
}

fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(D::Error::custom("version must be a string or a number")),
    }
}

/// A task definition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    /// Name under which the task is stored; stamped after resolution
    #[serde(rename = "task", skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cmds: Vec<Cmd>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<Dep>,

    /// Working directory; defaults to the directory of the declaring file
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dir: String,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub vars: Vars,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub env: Vars,

    /// Hidden from listings and not callable directly
    pub internal: bool,

    pub silent: bool,

    /// File the task was declared in
    #[serde(skip)]
    pub source_file: Option<PathBuf>,

    /// Vars the including file passed to the include (advanced imports only)
    #[serde(skip)]
    pub include_vars: Option<Vars>,

    /// Vars native to the included file (advanced imports only)
    #[serde(skip)]
    pub included_taskfile_vars: Option<Vars>,

    /// The include this task arrived through (advanced imports only)
    #[serde(skip)]
    pub included_taskfile: Option<Box<Include>>,
}

/// Long form of a task, as written in YAML
#[derive(Deserialize)]
struct TaskDef {
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    cmds: Vec<Cmd>,
    #[serde(default)]
    deps: Vec<Dep>,
    #[serde(default)]
    dir: String,
    #[serde(default)]
    vars: Vars,
    #[serde(default)]
    env: Vars,
    #[serde(default)]
    internal: bool,
    #[serde(default)]
    silent: bool,
}

impl From<TaskDef> for Task {
    fn from(def: TaskDef) -> Self {
        Task {
            desc: def.desc,
            summary: def.summary,
            aliases: def.aliases,
            cmds: def.cmds,
            deps: def.deps,
            dir: def.dir,
            vars: def.vars,
            env: def.env,
            internal: def.internal,
            silent: def.silent,
            ..Task::default()
        }
    }
}

/// A task is a mapping, a single command, a list of commands or null
impl<'de> Deserialize<'de> for Task {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;

        match value {
            Value::Null => Ok(Task::default()),
            Value::String(s) => Ok(Task {
                cmds: vec![Cmd::command(s)],
                ..Task::default()
            }),
            Value::Sequence(_) => {
                let cmds = Vec::<Cmd>::deserialize(value).map_err(D::Error::custom)?;
                Ok(Task {
                    cmds,
                    ..Task::default()
                })
            }
            Value::Mapping(_) => TaskDef::deserialize(value)
                .map(Task::from)
                .map_err(D::Error::custom),
            _ => Err(D::Error::custom(
                "task must be null, a string, a list of commands or a mapping",
            )),
        }
    }
}

/// A single step of a task: a shell command or a call to another task
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cmd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub vars: Vars,

    pub silent: bool,

    pub ignore_error: bool,
}

impl Cmd {
    /// A plain shell command
    pub fn command(cmd: impl Into<String>) -> Self {
        Cmd {
            cmd: Some(cmd.into()),
            ..Cmd::default()
        }
    }
}

/// A task dependency
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dep {
    pub task: String,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub vars: Vars,
}

/// A variable: a static value or a shell command whose output is the value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Var {
    pub static_value: Option<String>,
    pub sh: Option<String>,

    /// Directory the variable is evaluated in; set by advanced imports
    pub dir: Option<PathBuf>,
}

impl Var {
    pub fn literal(value: impl Into<String>) -> Self {
        Var {
            static_value: Some(value.into()),
            ..Var::default()
        }
    }
}

impl Serialize for Var {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.sh {
            Some(sh) => {
                let mut map = HashMap::new();
                map.insert("sh", sh);
                map.serialize(serializer)
            }
            None => self.static_value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Var {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct DynamicVar {
            sh: String,
        }

        let value = Value::deserialize(deserializer)?;

        match value {
            Value::Null => Ok(Var::default()),
            Value::String(s) => Ok(Var::literal(s)),
            Value::Number(n) => Ok(Var::literal(n.to_string())),
            Value::Bool(b) => Ok(Var::literal(b.to_string())),
            Value::Mapping(_) => {
                let dynamic = DynamicVar::deserialize(value).map_err(D::Error::custom)?;
                Ok(Var {
                    sh: Some(dynamic.sh),
                    ..Var::default()
                })
            }
            _ => Err(D::Error::custom("var must be a scalar or a mapping with 'sh'")),
        }
    }
}

/// An include directive
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Include {
    /// Path template of the included file or directory
    pub taskfile: String,

    /// Directory template the included tasks run in
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dir: String,

    pub optional: bool,

    pub internal: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Set when the include was written in its mapping form
    #[serde(skip)]
    pub advanced_import: bool,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub vars: Vars,

    /// Directory relative templates resolve against; first assignment wins
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
struct IncludeDef {
    taskfile: String,
    #[serde(default)]
    dir: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    internal: bool,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    vars: Vars,
}

impl<'de> Deserialize<'de> for Include {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;

        match value {
            Value::String(taskfile) => Ok(Include {
                taskfile,
                ..Include::default()
            }),
            Value::Mapping(_) => {
                let def = IncludeDef::deserialize(value).map_err(D::Error::custom)?;
                Ok(Include {
                    taskfile: def.taskfile,
                    dir: def.dir,
                    optional: def.optional,
                    internal: def.internal,
                    aliases: def.aliases,
                    advanced_import: true,
                    vars: def.vars,
                    base_dir: None,
                })
            }
            _ => Err(D::Error::custom("include must be a string or a mapping")),
        }
    }
}

impl Include {
    /// Absolute path of the included file (or directory holding it)
    pub fn full_taskfile_path(&self) -> Result<PathBuf> {
        self.resolve_path(&self.taskfile)
    }

    /// Absolute directory the included tasks are rebased into
    pub fn full_dir_path(&self) -> Result<PathBuf> {
        self.resolve_path(&self.dir)
    }

    fn resolve_path(&self, path: &str) -> Result<PathBuf> {
        let expanded = PathBuf::from(utils::expand(path));
        let joined = match &self.base_dir {
            Some(base) => base.join(expanded),
            None => expanded,
        };
        utils::absolute(&joined)
    }
}

impl<'de> Deserialize<'de> for Cmd {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct CmdDef {
            #[serde(default)]
            cmd: Option<String>,
            #[serde(default)]
            task: Option<String>,
            #[serde(default)]
            vars: Vars,
            #[serde(default)]
            silent: bool,
            #[serde(default)]
            ignore_error: bool,
        }

        let value = Value::deserialize(deserializer)?;

        match value {
            Value::String(s) => Ok(Cmd::command(s)),
            Value::Mapping(_) => {
                let def = CmdDef::deserialize(value).map_err(D::Error::custom)?;
                Ok(Cmd {
                    cmd: def.cmd,
                    task: def.task,
                    vars: def.vars,
                    silent: def.silent,
                    ignore_error: def.ignore_error,
                })
            }
            _ => Err(D::Error::custom("command must be a string or a mapping")),
        }
    }
}

impl<'de> Deserialize<'de> for Dep {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct DepDef {
            task: String,
            #[serde(default)]
            vars: Vars,
        }

        let value = Value::deserialize(deserializer)?;

        match value {
            Value::String(task) => Ok(Dep {
                task,
                vars: Vars::new(),
            }),
            Value::Mapping(_) => {
                let def = DepDef::deserialize(value).map_err(D::Error::custom)?;
                Ok(Dep {
                    task: def.task,
                    vars: def.vars,
                })
            }
            _ => Err(D::Error::custom("dependency must be a string or a mapping")),
        }
    }
}
