//! # custom-filter - A title-casing filter plugin for Jinja2 playbooks
//!
//! This crate provides the `custom_title` template filter and the small
//! playbook host that exercises it. The filter title-cases a string and
//! prepends a prefix; any value that is not a string passes through unchanged.
//!
//! ## Core Concepts
//!
//! - **Filter modules**: named tables mapping filter names to functions
//! - **Template engine**: a minijinja environment with the filter modules installed
//! - **Playbooks**: YAML plays and tasks whose arguments are rendered through the engine
//! - **Modules**: `debug` and `set_fact`, run on the control node
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                              │
//! │                    (clap-based command parsing)                      │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Playbook Executor                            │
//! └─────────────────────────────────────────────────────────────────────┘
//!                    │                                   │
//!                    ▼                                   ▼
//! ┌─────────────────────────────────┐   ┌─────────────────────────────────┐
//! │        Module Registry          │   │        Template Engine          │
//! │      (debug, set_fact)          │   │  (minijinja + filter registry)  │
//! └─────────────────────────────────┘   └─────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use custom_filter::prelude::*;
//! use serde_json::json;
//!
//! let engine = TemplateEngine::new();
//! let mut vars = TemplateVars::new();
//! vars.insert("msg".to_string(), json!("hello ansible"));
//!
//! let out = engine.render("{{ msg | custom_title('Custom: ') }}", &vars).unwrap();
//! assert_eq!(out, "Custom: Hello Ansible");
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    // Error handling
    pub use crate::error::{Error, Result};

    // Execution engine
    pub use crate::executor::{
        ExecutionCallback, ExecutorConfig, NullCallback, PlaybookExecutor, PlaybookStats,
        TaskResult, TaskStatus,
    };

    // Module system
    pub use crate::modules::{Module, ModuleRegistry, ModuleResult};

    // Playbooks
    pub use crate::playbook::{Play, Playbook, Task};

    // Filter plugins
    pub use crate::plugins::prelude::*;

    // Templates
    pub use crate::template::{TemplateEngine, TemplateVars};

    // Variables
    pub use crate::vars::Variables;
}

// ============================================================================
// Core Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Variable storage and merging.
pub mod vars;

/// Filter plugins and the registry that installs them.
pub mod plugins;

/// Template rendering on top of minijinja.
///
/// Renders strings and evaluates expressions with the registered filter
/// modules. A string that is exactly one `{{ expression }}` evaluates to a
/// native value, so non-string values survive a round trip through a filter.
pub mod template;

// ============================================================================
// Playbook Components
// ============================================================================

/// Playbook parsing and representation.
pub mod playbook;

/// Task modules run on the control node.
pub mod modules;

/// Sequential playbook execution.
pub mod executor;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration management.
///
/// Handles loading and merging configuration from config files and
/// environment variables.
pub mod config;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of custom-filter.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
