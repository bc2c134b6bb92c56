//! Playbook definitions and parsing.
//!
//! A playbook is a YAML list of plays; each play targets a host pattern and
//! runs a list of tasks. Only the subset of the playbook language needed to
//! exercise filter plugins is modelled here.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::vars::Variables;

/// Namespace prefix accepted in front of module names.
const BUILTIN_NAMESPACE: &str = "ansible.builtin.";

/// A playbook containing one or more plays.
#[derive(Debug, Clone)]
pub struct Playbook {
    /// Name of the playbook (derived from the filename)
    pub name: Option<String>,

    /// The plays in this playbook
    pub plays: Vec<Play>,

    /// Path to the playbook file (set during loading)
    pub source_path: Option<PathBuf>,
}

impl Playbook {
    /// Loads a playbook from a YAML file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::playbook_parse(path, format!("Failed to read file: {}", e), Some(Box::new(e)))
        })?;

        Self::from_yaml(&content, Some(path.to_path_buf()))
    }

    /// Parses a playbook from a YAML string.
    pub fn from_yaml(yaml: &str, source_path: Option<PathBuf>) -> Result<Self> {
        let plays: Vec<Play> = serde_yaml::from_str(yaml).map_err(|e| {
            Error::playbook_parse(
                source_path.as_ref().map_or("<string>".into(), |p| p.clone()),
                e.to_string(),
                Some(Box::new(e)),
            )
        })?;

        let name = source_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string());

        Ok(Self {
            name,
            plays,
            source_path,
        })
    }

    /// Validates the playbook structure.
    pub fn validate(&self) -> Result<()> {
        if self.plays.is_empty() {
            return Err(Error::PlaybookValidation(
                "Playbook must contain at least one play".to_string(),
            ));
        }

        for (idx, play) in self.plays.iter().enumerate() {
            play.validate().map_err(|e| {
                Error::PlaybookValidation(format!("Play {} validation failed: {}", idx + 1, e))
            })?;
        }

        Ok(())
    }

    /// Returns the number of plays.
    pub fn play_count(&self) -> usize {
        self.plays.len()
    }

    /// Returns total number of tasks across all plays.
    pub fn task_count(&self) -> usize {
        self.plays.iter().map(|p| p.tasks.len()).sum()
    }
}

/// A play within a playbook.
#[derive(Debug, Clone, Deserialize)]
pub struct Play {
    /// Name of the play
    #[serde(default)]
    pub name: String,

    /// Host pattern
    #[serde(default)]
    pub hosts: String,

    /// Accepted for compatibility; facts are never gathered.
    #[serde(default)]
    pub gather_facts: bool,

    /// Variables for this play
    #[serde(default)]
    pub vars: Variables,

    /// Tasks to run
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Tags applied to every task of the play
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Play {
    /// Creates a new play with the given name and host pattern.
    pub fn new(name: impl Into<String>, hosts: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: hosts.into(),
            gather_facts: false,
            vars: Variables::new(),
            tasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Validates the play structure.
    pub fn validate(&self) -> Result<()> {
        if self.hosts.trim().is_empty() {
            return Err(Error::PlaybookValidation(
                "Play must specify hosts".to_string(),
            ));
        }

        for task in &self.tasks {
            task.validate()?;
        }

        Ok(())
    }
}

/// A task to execute.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "IndexMap<String, serde_json::Value>")]
pub struct Task {
    /// Name of the task
    pub name: String,

    /// Module to execute and its arguments
    pub module: TaskModule,

    /// Conditional execution
    pub when: Option<When>,

    /// Register result in variable
    pub register: Option<String>,

    /// Task-level variables
    pub vars: Variables,

    /// Whether to ignore errors
    pub ignore_errors: bool,

    /// Tags
    pub tags: Vec<String>,
}

impl Task {
    /// Creates a new task.
    pub fn new(name: impl Into<String>, module: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            module: TaskModule {
                name: module.into(),
                args,
            },
            when: None,
            register: None,
            vars: Variables::new(),
            ignore_errors: false,
            tags: Vec::new(),
        }
    }

    /// Validates the task.
    pub fn validate(&self) -> Result<()> {
        if self.module.name.is_empty() {
            return Err(Error::PlaybookValidation(
                "Task must specify a module".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the module name.
    pub fn module_name(&self) -> &str {
        &self.module.name
    }

    /// Returns the module arguments.
    pub fn module_args(&self) -> &serde_json::Value {
        &self.module.args
    }

    /// Display name: the task name, or the module name when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.module.name
        } else {
            &self.name
        }
    }
}

impl TryFrom<IndexMap<String, serde_json::Value>> for Task {
    type Error = String;

    fn try_from(mut raw: IndexMap<String, serde_json::Value>) -> std::result::Result<Self, String> {
        let name = match raw.shift_remove("name") {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        };

        let when = raw
            .shift_remove("when")
            .map(serde_json::from_value::<When>)
            .transpose()
            .map_err(|e| format!("invalid 'when' in task '{}': {}", name, e))?;

        let register = match raw.shift_remove("register") {
            None => None,
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => {
                return Err(format!(
                    "'register' in task '{}' must be a string, got {}",
                    name, other
                ))
            }
        };

        let vars = raw
            .shift_remove("vars")
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<Variables>)
            .transpose()
            .map_err(|e| format!("invalid 'vars' in task '{}': {}", name, e))?
            .unwrap_or_default();

        let ignore_errors = raw
            .shift_remove("ignore_errors")
            .map(serde_json::from_value::<bool>)
            .transpose()
            .map_err(|e| format!("invalid 'ignore_errors' in task '{}': {}", name, e))?
            .unwrap_or(false);

        let tags = match raw.shift_remove("tags") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::String(s)) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            Some(other) => serde_json::from_value::<Vec<String>>(other)
                .map_err(|e| format!("invalid 'tags' in task '{}': {}", name, e))?,
        };

        if raw.len() != 1 {
            let keys: Vec<_> = raw.keys().cloned().collect();
            return Err(if keys.is_empty() {
                format!("task '{}' does not name a module", name)
            } else {
                format!(
                    "task '{}' must name exactly one module, found: {}",
                    name,
                    keys.join(", ")
                )
            });
        }

        let (module, args) = raw
            .into_iter()
            .next()
            .ok_or_else(|| format!("task '{}' does not name a module", name))?;

        Ok(Self {
            name,
            module: TaskModule::new(module, args),
            when,
            register,
            vars,
            ignore_errors,
            tags,
        })
    }
}

/// Module invocation in a task.
#[derive(Debug, Clone)]
pub struct TaskModule {
    /// Module name, without the `ansible.builtin.` namespace
    pub name: String,

    /// Module arguments (always an object)
    pub args: serde_json::Value,
}

impl TaskModule {
    fn new(name: String, args: serde_json::Value) -> Self {
        let name = name
            .strip_prefix(BUILTIN_NAMESPACE)
            .map(str::to_string)
            .unwrap_or(name);

        let args = match args {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            serde_json::Value::String(s) => parse_free_form(&s),
            other => other,
        };

        Self { name, args }
    }
}

/// Parse `key=value key2=value2` module arguments.
///
/// A token without `=` continues the value of the previous key.
fn parse_free_form(input: &str) -> serde_json::Value {
    let mut args = serde_json::Map::new();
    let mut current: Option<String> = None;

    for token in input.split_whitespace() {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                args.insert(key.to_string(), serde_json::Value::String(value.to_string()));
                current = Some(key.to_string());
            }
            _ => {
                if let Some(serde_json::Value::String(existing)) =
                    current.as_ref().and_then(|k| args.get_mut(k))
                {
                    existing.push(' ');
                    existing.push_str(token);
                }
            }
        }
    }

    serde_json::Value::Object(args)
}

/// Conditional expression.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum When {
    /// Literal boolean
    Bool(bool),
    /// Single condition
    Single(String),
    /// Multiple conditions (AND)
    Multiple(Vec<String>),
}

impl When {
    /// Returns the conditions as expressions.
    pub fn conditions(&self) -> Vec<String> {
        match self {
            Self::Bool(b) => vec![b.to_string()],
            Self::Single(s) => vec![s.clone()],
            Self::Multiple(v) => v.clone(),
        }
    }
}
