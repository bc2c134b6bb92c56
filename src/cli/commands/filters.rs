//! Filters command - List filter modules and the filters they provide

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use custom_filter::plugins::filter::FilterRegistry;

/// Arguments for the filters command
#[derive(Parser, Debug, Clone)]
pub struct FiltersArgs {
    /// Show only modules enabled by the configuration
    #[arg(long)]
    pub enabled: bool,
}

impl FiltersArgs {
    /// Execute the filters command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let registry = FilterRegistry::with_builtins();
        let enabled = &ctx.config.filters.enabled;

        if ctx.output.is_json() {
            let modules: Vec<serde_json::Value> = registry
                .module_names()
                .into_iter()
                .filter(|name| !self.enabled || enabled.iter().any(|e| e == *name))
                .filter_map(|name| registry.module(name))
                .map(|module| {
                    let filters: Vec<&str> = module.filters().keys().copied().collect();
                    serde_json::json!({
                        "module": module.name(),
                        "description": module.description(),
                        "enabled": enabled.iter().any(|e| e == module.name()),
                        "filters": filters,
                    })
                })
                .collect();
            println!("{}", serde_json::Value::Array(modules));
            return Ok(0);
        }

        ctx.output.section("Filter modules");
        for name in registry.module_names() {
            let is_enabled = enabled.iter().any(|e| e == name);
            if self.enabled && !is_enabled {
                continue;
            }
            let Some(module) = registry.module(name) else {
                continue;
            };

            let title = format!(
                "{}{} - {}",
                name,
                if is_enabled { "" } else { " (disabled)" },
                module.description()
            );
            let filters: Vec<String> = module.filters().keys().map(|f| f.to_string()).collect();
            ctx.output.list(&title, &filters);
        }

        for name in enabled {
            if registry.module(name).is_none() {
                ctx.output
                    .warning(&format!("Configured filter module '{}' is not available", name));
            }
        }

        Ok(0)
    }
}
