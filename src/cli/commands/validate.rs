//! Validate command - Check playbook syntax without running it

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use custom_filter::modules::ModuleRegistry;
use custom_filter::playbook::Playbook;
use std::path::PathBuf;

/// Arguments for validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Playbook file to validate
    pub playbook: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        ctx.output.banner("PLAYBOOK VALIDATION");
        ctx.output
            .info(&format!("Validating: {}", self.playbook.display()));

        let playbook = match Playbook::from_file(&self.playbook).await {
            Ok(playbook) => playbook,
            Err(e) => {
                ctx.output.error(&e.to_string());
                return Ok(e.exit_code());
            }
        };

        if let Err(e) = playbook.validate() {
            ctx.output.error(&e.to_string());
            return Ok(e.exit_code());
        }

        let modules = ModuleRegistry::with_builtins();
        let mut warnings = 0;
        for (i, play) in playbook.plays.iter().enumerate() {
            if play.tasks.is_empty() {
                ctx.output.warning(&format!(
                    "Play {} '{}': no tasks defined",
                    i + 1,
                    play.name
                ));
                warnings += 1;
            }
            for task in &play.tasks {
                if !modules.contains(task.module_name()) {
                    ctx.output.warning(&format!(
                        "Task '{}' in play {}: unknown module '{}'",
                        task.display_name(),
                        i + 1,
                        task.module_name()
                    ));
                    warnings += 1;
                }
            }
        }

        ctx.output.section("Validation Results");
        if warnings == 0 {
            ctx.output.result(&serde_json::json!(format!(
                "Playbook syntax is valid: {} play(s), {} task(s).",
                playbook.play_count(),
                playbook.task_count()
            )));
        } else {
            ctx.output.warning(&format!(
                "Playbook is valid with {} warning(s)",
                warnings
            ));
        }

        Ok(0)
    }
}
