//! Task modules.
//!
//! A module is the unit of work a task invokes. Only control-node modules
//! are provided: they never touch a remote host, which is all a playbook
//! exercising template filters needs.
//!
//! - [`debug`]: print a message or a variable
//! - [`set_fact`]: set host variables

pub mod debug;
pub mod set_fact;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a module can report.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result type for module operations
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Parameters passed to a module (task arguments, already rendered).
pub type ModuleParams = HashMap<String, serde_json::Value>;

/// Status of a module execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// Nothing changed
    Ok,
    /// Something changed
    Changed,
    /// The module decided not to run
    Skipped,
    /// The module failed
    Failed,
}

/// Data key under which a module returns facts to set on the host.
pub const FACTS_KEY: &str = "ansible_facts";

/// Output from a module execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleOutput {
    /// Whether the module changed anything
    pub changed: bool,
    /// Human-readable message about what happened
    pub msg: String,
    /// Status of the execution
    pub status: ModuleStatus,
    /// Additional data returned by the module
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,
}

impl ModuleOutput {
    /// Create a new successful output with no changes
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            msg: msg.into(),
            status: ModuleStatus::Ok,
            data: HashMap::new(),
        }
    }

    /// Create a new successful output with changes
    pub fn changed(msg: impl Into<String>) -> Self {
        Self {
            changed: true,
            msg: msg.into(),
            status: ModuleStatus::Changed,
            data: HashMap::new(),
        }
    }

    /// Create a skipped output
    pub fn skipped(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            msg: msg.into(),
            status: ModuleStatus::Skipped,
            data: HashMap::new(),
        }
    }

    /// Create a failed output
    pub fn failed(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            msg: msg.into(),
            status: ModuleStatus::Failed,
            data: HashMap::new(),
        }
    }

    /// Attach facts for the executor to store on the host.
    pub fn with_facts(self, facts: serde_json::Map<String, serde_json::Value>) -> Self {
        self.with_data(FACTS_KEY, serde_json::Value::Object(facts))
    }

    /// Facts this output asks the executor to set, if any.
    pub fn facts(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.data.get(FACTS_KEY).and_then(serde_json::Value::as_object)
    }

    /// Attach a data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// The result as a JSON object, the shape `register` stores.
    pub fn to_registered(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.data {
            map.insert(key.clone(), value.clone());
        }
        map.insert("changed".to_string(), serde_json::Value::Bool(self.changed));
        map.insert(
            "failed".to_string(),
            serde_json::Value::Bool(self.status == ModuleStatus::Failed),
        );
        map.insert(
            "skipped".to_string(),
            serde_json::Value::Bool(self.status == ModuleStatus::Skipped),
        );
        map.entry("msg".to_string())
            .or_insert_with(|| serde_json::Value::String(self.msg.clone()));
        serde_json::Value::Object(map)
    }
}

/// Context a module runs in.
#[derive(Debug, Clone, Default)]
pub struct ModuleContext {
    /// Variables visible to the task
    pub vars: HashMap<String, serde_json::Value>,
    /// Verbosity requested on the command line
    pub verbosity: u8,
}

impl ModuleContext {
    /// Set the visible variables.
    pub fn with_vars(mut self, vars: HashMap<String, serde_json::Value>) -> Self {
        self.vars = vars;
        self
    }

    /// Set the verbosity.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Trait implemented by every task module.
pub trait Module: Send + Sync {
    /// Returns the name of the module
    fn name(&self) -> &'static str;

    /// Returns a description of what the module does
    fn description(&self) -> &'static str;

    /// Execute the module with the given parameters
    fn execute(&self, params: &ModuleParams, context: &ModuleContext)
        -> ModuleResult<ModuleOutput>;

    /// Validate the parameters before execution
    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let _ = params;
        Ok(())
    }
}

/// Registry of available modules.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in modules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(debug::DebugModule));
        registry.register(Arc::new(set_fact::SetFactModule));
        registry
    }

    /// Register a module
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.insert(module.name().to_string(), module);
    }

    /// Get a module by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name).cloned()
    }

    /// Check if a module exists
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Get all module names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate and execute a module by name
    pub fn execute(
        &self,
        name: &str,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let module = self
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        module.validate_params(params)?;
        module.execute(params, context)
    }
}
