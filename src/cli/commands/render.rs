//! Render command - Render a template with the installed filters

use super::CommandContext;
use anyhow::{Context, Result};
use clap::Parser;

/// Arguments for the render command
#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    /// Template text, or a path when --file is given
    pub template: String,

    /// Read the template from a file
    #[arg(long, short = 'f')]
    pub file: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let source = if self.file {
            tokio::fs::read_to_string(&self.template)
                .await
                .with_context(|| format!("Failed to read template: {}", self.template))?
        } else {
            self.template.clone()
        };

        let engine = ctx.template_engine()?;
        let vars = ctx.parse_extra_vars()?.to_context();

        // A lone expression keeps its native type; anything else renders to text.
        match engine.render_value(&serde_json::Value::String(source), &vars) {
            Ok(value) => {
                ctx.output.result(&value);
                Ok(0)
            }
            Err(e) => {
                ctx.output.error(&e.to_string());
                Ok(e.exit_code())
            }
        }
    }
}
