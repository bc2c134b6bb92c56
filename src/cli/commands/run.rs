//! Run command - Execute a playbook
//!
//! This module implements the `run` subcommand for executing playbooks on
//! the control node.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use custom_filter::executor::{ExecutorConfig, PlaybookExecutor};
use custom_filter::playbook::Playbook;
use std::path::PathBuf;
use tracing::debug;

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the playbook file
    #[arg(required = true)]
    pub playbook: PathBuf,

    /// Tags to run (only tasks with these tags)
    #[arg(long, short = 't', action = clap::ArgAction::Append)]
    pub tags: Vec<String>,

    /// Tags to skip (skip tasks with these tags)
    #[arg(long, action = clap::ArgAction::Append)]
    pub skip_tags: Vec<String>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        // Validate playbook exists
        if !self.playbook.exists() {
            ctx.output.error(&format!(
                "Playbook file not found: {}",
                self.playbook.display()
            ));
            return Ok(1);
        }

        ctx.output.banner(&format!(
            "PLAYBOOK: {}",
            self.playbook
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
        ));

        ctx.output.info("Loading playbook...");
        let loaded = Playbook::from_file(&self.playbook)
            .await
            .and_then(|playbook| playbook.validate().map(|()| playbook));
        let playbook = match loaded {
            Ok(playbook) => playbook,
            Err(e) => {
                ctx.output.error(&e.to_string());
                return Ok(e.exit_code());
            }
        };

        let extra_vars = ctx.parse_extra_vars()?;
        debug!(count = extra_vars.len(), "Parsed extra vars");

        let executor = PlaybookExecutor::new(ctx.template_engine()?).with_config(ExecutorConfig {
            extra_vars,
            tags: split_tags(&self.tags),
            skip_tags: split_tags(&self.skip_tags),
            verbosity: ctx.verbosity,
        });

        let stats = match executor.run(&playbook, &mut ctx.output) {
            Ok(stats) => stats,
            Err(e) => {
                ctx.output.error(&e.to_string());
                return Ok(e.exit_code());
            }
        };

        ctx.output.recap(&stats);
        ctx.output.flush();

        Ok(if stats.has_failures() { 2 } else { 0 })
    }
}

/// Accept both repeated flags and comma-separated lists.
fn split_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .flat_map(|t| t.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
