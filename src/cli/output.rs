//! Output formatting module for custom-filter
//!
//! Provides colored, human-readable output and a line-oriented JSON mode.
//! The formatter doubles as the executor callback for `run`.

use colored::Colorize;
use custom_filter::executor::{ExecutionCallback, PlaybookStats, TaskResult, TaskStatus};
use custom_filter::playbook::{Play, Task};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Get the colored string representation of a task status
pub fn colored_status(status: TaskStatus) -> String {
    match status {
        TaskStatus::Ok => "ok".green().to_string(),
        TaskStatus::Changed => "changed".yellow().to_string(),
        TaskStatus::Skipped => "skipping".cyan().to_string(),
        TaskStatus::Failed => "failed".red().bold().to_string(),
        TaskStatus::Ignored => "ignored".blue().to_string(),
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            json_mode,
            verbosity,
            start_time: Instant::now(),
        }
    }

    /// Whether machine-readable output was requested
    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print a play header
    pub fn play_header(&self, play_name: &str) {
        self.header("PLAY", play_name);
    }

    /// Print a task header
    pub fn task_header(&self, task_name: &str) {
        self.header("TASK", task_name);
    }

    fn header(&self, kind: &str, name: &str) {
        if self.json_mode {
            return;
        }

        let header = format!("{} [{}]", kind, name);
        let stars = "*".repeat(80_usize.saturating_sub(header.len()));

        if self.use_color {
            println!(
                "\n{} {}",
                header.bright_white().bold(),
                stars.bright_black()
            );
        } else {
            println!("\n{} {}", header, stars);
        }
    }

    /// Print task result
    pub fn task_result(&self, host: &str, status: TaskStatus, message: Option<&str>) {
        if self.json_mode {
            let result = serde_json::json!({
                "host": host,
                "status": status.as_str(),
                "message": message
            });
            println!("{}", result);
            return;
        }

        let status_str = if self.use_color {
            colored_status(status)
        } else {
            status.as_str().to_string()
        };

        let host_str = if self.use_color {
            host.bright_white().bold().to_string()
        } else {
            host.to_string()
        };

        print!("{}: [{}]", status_str, host_str);
        if let Some(msg) = message.filter(|m| !m.is_empty()) {
            print!(" => {}", msg);
        }
        println!();
    }

    /// Print a recap summary
    pub fn recap(&self, stats: &PlaybookStats) {
        if self.json_mode {
            let recap = serde_json::json!({ "type": "recap", "stats": stats });
            println!("{}", recap);
            return;
        }

        let header = "PLAY RECAP";
        let stars = "*".repeat(80 - header.len());

        if self.use_color {
            println!(
                "\n{} {}",
                header.bright_white().bold(),
                stars.bright_black()
            );
        } else {
            println!("\n{} {}", header, stars);
        }

        for (host, host_stats) in &stats.hosts {
            if self.use_color {
                let host_colored = if host_stats.failed > 0 {
                    host.red().bold()
                } else if host_stats.changed > 0 {
                    host.yellow()
                } else {
                    host.green()
                };

                // Dim if zero, colored if non-zero
                let fmt_stat = |label: &str, value: u32, color: colored::Color| -> String {
                    if value > 0 {
                        format!("{}={:<4}", label.color(color), value)
                    } else {
                        format!("{}={:<4}", label, value).dimmed().to_string()
                    }
                };

                println!(
                    "{:<30} : {} {} {} {} {}",
                    host_colored,
                    fmt_stat("ok", host_stats.ok, colored::Color::Green),
                    fmt_stat("changed", host_stats.changed, colored::Color::Yellow),
                    fmt_stat("failed", host_stats.failed, colored::Color::Red),
                    fmt_stat("skipped", host_stats.skipped, colored::Color::Cyan),
                    fmt_stat("ignored", host_stats.ignored, colored::Color::Blue),
                );
            } else {
                println!(
                    "{:<30} : ok={:<4} changed={:<4} failed={:<4} skipped={:<4} ignored={:<4}",
                    host,
                    host_stats.ok,
                    host_stats.changed,
                    host_stats.failed,
                    host_stats.skipped,
                    host_stats.ignored
                );
            }
        }

        let duration_str = format_duration(self.start_time.elapsed());
        if self.use_color {
            println!(
                "\n{} {}",
                "Playbook run took".bright_black(),
                duration_str.bright_white()
            );
            if stats.has_failures() {
                println!("{}", "Playbook run failed.".red().bold());
            } else {
                println!("{}", "Playbook completed successfully.".green().bold());
            }
        } else {
            println!("\nPlaybook run took {}", duration_str);
            if stats.has_failures() {
                println!("Playbook run failed.");
            } else {
                println!("Playbook completed successfully.");
            }
        }
    }

    /// Print a plain result line (always shown)
    pub fn result(&self, value: &serde_json::Value) {
        if self.json_mode {
            let result = serde_json::json!({ "type": "result", "value": value });
            println!("{}", result);
            return;
        }

        match value {
            serde_json::Value::String(s) => println!("{}", s),
            other => println!("{}", other),
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        self.message_to_stderr("error", "ERROR:", message, |s| s.red().bold());
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        self.message_to_stderr("warning", "WARNING:", message, |s| s.yellow().bold());
    }

    fn message_to_stderr(
        &self,
        kind: &str,
        label: &str,
        message: &str,
        paint: impl Fn(&str) -> colored::ColoredString,
    ) {
        if self.json_mode {
            let msg = serde_json::json!({ "type": kind, "message": message });
            eprintln!("{}", msg);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", paint(label), message);
        } else {
            eprintln!("{} {}", label, message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.json_mode {
            let info = serde_json::json!({ "type": "info", "message": message });
            println!("{}", info);
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.json_mode {
            let list = serde_json::json!({ "title": title, "items": items });
            println!("{}", list);
            return;
        }

        if self.use_color {
            println!("{}", title.bright_white().bold());
        } else {
            println!("{}", title);
        }
        for item in items {
            println!("  - {}", item);
        }
    }

    /// Flush output buffers
    pub fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}

impl ExecutionCallback for OutputFormatter {
    fn on_play_start(&mut self, play: &Play, hosts: &[String]) {
        self.play_header(&play.name);
        if self.verbosity >= 1 && !self.json_mode {
            self.info(&format!("hosts: {}", hosts.join(", ")));
        }
    }

    fn on_task_start(&mut self, task: &Task) {
        self.task_header(task.display_name());
    }

    fn on_task_result(&mut self, result: &TaskResult) {
        let message = match result.status {
            TaskStatus::Skipped if self.verbosity == 0 => None,
            _ => Some(result.msg.as_str()),
        };
        self.task_result(&result.host, result.status, message);
    }
}

/// Format a duration as a human-readable string
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        format!("{}h {}m {}s", hours, mins, secs)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_display() {
        assert_eq!(TaskStatus::Ok.as_str(), "ok");
        assert_eq!(TaskStatus::Skipped.as_str(), "skipping");
        assert!(colored_status(TaskStatus::Ok).contains("ok"));
        assert!(colored_status(TaskStatus::Ignored).contains("ignored"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1h 1m 5s");
    }
}
