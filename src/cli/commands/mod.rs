//! Subcommands module for custom-filter CLI
//!
//! This module contains all the subcommand implementations.

pub mod filters;
pub mod render;
pub mod run;
pub mod validate;

use crate::cli::output::OutputFormatter;
use anyhow::{Context, Result};
use custom_filter::config::Config;
use custom_filter::plugins::filter::FilterRegistry;
use custom_filter::template::TemplateEngine;
use custom_filter::vars::Variables;
use std::collections::HashMap;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Extra variables
    pub extra_vars: Vec<String>,
    /// Verbosity level
    pub verbosity: u8,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let use_color = !cli.no_color && config.colors.enabled;
        let output = OutputFormatter::new(use_color, cli.is_json(), cli.verbosity());

        Self {
            config,
            output,
            extra_vars: cli.extra_vars.clone(),
            verbosity: cli.verbosity(),
        }
    }

    /// Build a template engine with the configured filter modules
    pub fn template_engine(&self) -> Result<TemplateEngine> {
        let registry = FilterRegistry::with_builtins();
        TemplateEngine::with_filter_modules(&registry, &self.config.filters.enabled)
            .context("Failed to set up the template environment")
    }

    /// Parse extra variables (`key=value` or `@file.yml`)
    pub fn parse_extra_vars(&self) -> Result<Variables> {
        let mut vars = Variables::new();

        for var in &self.extra_vars {
            if let Some(file_path) = var.strip_prefix('@') {
                // Load from file
                let content = std::fs::read_to_string(file_path)
                    .with_context(|| format!("Failed to read extra vars file: {}", file_path))?;
                let file_vars: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse extra vars file: {}", file_path))?;
                for (key, value) in file_vars {
                    vars.set(key, serde_json::to_value(value)?);
                }
            } else if let Some((key, value)) = var.split_once('=') {
                // Parse key=value, keeping YAML scalars typed
                let parsed_value: serde_yaml::Value = serde_yaml::from_str(value)
                    .unwrap_or_else(|_| serde_yaml::Value::String(value.to_string()));
                vars.set(key.trim(), serde_json::to_value(parsed_value)?);
            } else {
                anyhow::bail!("Invalid extra var '{}': expected key=value or @file", var);
            }
        }

        Ok(vars)
    }
}
