//! Playbook execution on the control node.
//!
//! The executor walks plays and tasks in order. For every task and host it
//! evaluates `when`, renders the module arguments through the
//! [`TemplateEngine`] (this is where filter plugins run), executes the module
//! and reports the outcome to an [`ExecutionCallback`].
//!
//! Variable precedence, lowest first: play vars, task vars, host facts
//! (`set_fact` and `register`), extra vars.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::modules::{ModuleContext, ModuleOutput, ModuleParams, ModuleRegistry, ModuleStatus};
use crate::playbook::{Play, Playbook, Task};
use crate::template::{TemplateEngine, TemplateVars};
use crate::vars::Variables;

/// Host every local pattern resolves to.
pub const LOCALHOST: &str = "localhost";

/// Tag that always runs unless explicitly skipped.
const ALWAYS_TAG: &str = "always";

/// Outcome of one task on one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Completed with no changes
    Ok,
    /// Completed with changes
    Changed,
    /// Skipped by a condition
    Skipped,
    /// Failed
    Failed,
    /// Failed, but `ignore_errors` was set
    Ignored,
}

impl TaskStatus {
    /// Plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Ok => "ok",
            TaskStatus::Changed => "changed",
            TaskStatus::Skipped => "skipping",
            TaskStatus::Failed => "failed",
            TaskStatus::Ignored => "ignored",
        }
    }
}

/// Result of a task on one host.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    /// Target host
    pub host: String,
    /// Task display name
    pub task: String,
    /// Outcome
    pub status: TaskStatus,
    /// Message shown to the user
    pub msg: String,
    /// Structured result, as stored by `register`
    pub result: serde_json::Value,
}

/// Receives execution events.
pub trait ExecutionCallback {
    /// A play is about to run on `hosts`.
    fn on_play_start(&mut self, play: &Play, hosts: &[String]) {
        let _ = (play, hosts);
    }

    /// A task is about to run.
    fn on_task_start(&mut self, task: &Task) {
        let _ = task;
    }

    /// A task finished on a host.
    fn on_task_result(&mut self, result: &TaskResult) {
        let _ = result;
    }
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCallback;

impl ExecutionCallback for NullCallback {}

/// Statistics for a single host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub ok: u32,
    pub changed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub ignored: u32,
}

impl HostStats {
    /// Record a task status
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Ok => self.ok += 1,
            TaskStatus::Changed => self.changed += 1,
            TaskStatus::Skipped => self.skipped += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Ignored => {
                self.ok += 1;
                self.ignored += 1;
            }
        }
    }

    /// Check if there were any failures
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Statistics for all hosts, in the order hosts were first seen
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybookStats {
    pub hosts: IndexMap<String, HostStats>,
}

impl PlaybookStats {
    /// Create new empty recap stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task result for a host
    pub fn record(&mut self, host: &str, status: TaskStatus) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .record(status);
    }

    /// Check if any host had failures
    pub fn has_failures(&self) -> bool {
        self.hosts.values().any(HostStats::has_failures)
    }

    /// Get total task count
    pub fn total_tasks(&self) -> u32 {
        self.hosts
            .values()
            .map(|h| h.ok + h.changed + h.failed + h.skipped)
            .sum()
    }
}

/// Executor settings.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Extra vars from the command line (highest precedence)
    pub extra_vars: Variables,
    /// Only run tasks carrying one of these tags
    pub tags: Vec<String>,
    /// Skip tasks carrying one of these tags
    pub skip_tags: Vec<String>,
    /// Verbosity handed to modules
    pub verbosity: u8,
}

/// Runs playbooks on the control node.
pub struct PlaybookExecutor {
    engine: TemplateEngine,
    modules: ModuleRegistry,
    config: ExecutorConfig,
}

impl PlaybookExecutor {
    /// Create an executor with the built-in modules.
    pub fn new(engine: TemplateEngine) -> Self {
        Self {
            engine,
            modules: ModuleRegistry::with_builtins(),
            config: ExecutorConfig::default(),
        }
    }

    /// Replace the module registry.
    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = modules;
        self
    }

    /// Replace the executor settings.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// The template engine tasks are rendered with.
    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Run every play of `playbook`.
    ///
    /// Task failures are reported through `callback` and counted in the
    /// returned stats; only play-level problems (such as play vars that do
    /// not render) are returned as errors.
    pub fn run(
        &self,
        playbook: &Playbook,
        callback: &mut dyn ExecutionCallback,
    ) -> Result<PlaybookStats> {
        let mut stats = PlaybookStats::new();
        let mut facts: HashMap<String, Variables> = HashMap::new();
        let mut failed_hosts: HashSet<String> = HashSet::new();

        for play in &playbook.plays {
            self.run_play(play, callback, &mut stats, &mut facts, &mut failed_hosts)?;
        }

        info!(
            tasks = stats.total_tasks(),
            failed = stats.has_failures(),
            "Playbook finished"
        );
        Ok(stats)
    }

    fn run_play(
        &self,
        play: &Play,
        callback: &mut dyn ExecutionCallback,
        stats: &mut PlaybookStats,
        facts: &mut HashMap<String, Variables>,
        failed_hosts: &mut HashSet<String>,
    ) -> Result<()> {
        let hosts = resolve_hosts(&play.hosts);
        info!(play = %play.name, hosts = ?hosts, "Starting play");
        callback.on_play_start(play, &hosts);

        let play_vars = self.render_vars(&play.vars, &self.config.extra_vars.to_context())?;

        for task in &play.tasks {
            if !self.should_run(play, task) {
                debug!(task = task.display_name(), "Skipping task by tags");
                continue;
            }

            let active: Vec<&String> = hosts.iter().filter(|h| !failed_hosts.contains(*h)).collect();
            if active.is_empty() {
                warn!(play = %play.name, "No hosts remaining");
                break;
            }

            callback.on_task_start(task);
            for host in active {
                let host_facts = facts.entry(host.clone()).or_default();
                let result = self.run_task(task, host, &play_vars, host_facts);

                stats.record(host, result.status);
                if result.status == TaskStatus::Failed {
                    failed_hosts.insert(host.clone());
                }
                callback.on_task_result(&result);
            }
        }

        Ok(())
    }

    fn run_task(
        &self,
        task: &Task,
        host: &str,
        play_vars: &Variables,
        host_facts: &mut Variables,
    ) -> TaskResult {
        let task_name = task.display_name().to_string();

        let output = self.execute_task(task, host, play_vars, host_facts);
        let (status, output) = match output {
            Ok(output) => {
                let status = match output.status {
                    ModuleStatus::Ok if output.changed => TaskStatus::Changed,
                    ModuleStatus::Ok => TaskStatus::Ok,
                    ModuleStatus::Changed => TaskStatus::Changed,
                    ModuleStatus::Skipped => TaskStatus::Skipped,
                    ModuleStatus::Failed => TaskStatus::Failed,
                };
                (status, output)
            }
            Err(e) => (TaskStatus::Failed, ModuleOutput::failed(e.to_string())),
        };

        let status = if status == TaskStatus::Failed {
            warn!("{}", Error::task_failed(&task_name, host, &output.msg));
            if task.ignore_errors {
                TaskStatus::Ignored
            } else {
                TaskStatus::Failed
            }
        } else {
            status
        };

        let result = output.to_registered();
        if let Some(register) = &task.register {
            host_facts.set(register.clone(), result.clone());
        }

        TaskResult {
            host: host.to_string(),
            task: task_name,
            status,
            msg: output.msg,
            result,
        }
    }

    fn execute_task(
        &self,
        task: &Task,
        host: &str,
        play_vars: &Variables,
        host_facts: &mut Variables,
    ) -> Result<ModuleOutput> {
        let mut vars = play_vars.clone();
        vars.set("inventory_hostname", serde_json::Value::String(host.to_string()));
        let task_vars = self.render_vars(&task.vars, &vars.to_context())?;
        vars.merge(&task_vars);
        vars.merge(host_facts);
        vars.merge(&self.config.extra_vars);
        let context = vars.to_context();

        if let Some(when) = &task.when {
            for condition in when.conditions() {
                if !self.engine.evaluate_condition(&condition, &context)? {
                    debug!(task = %task.display_name(), host, condition = %condition, "Condition false");
                    return Ok(ModuleOutput::skipped(format!(
                        "Conditional result was False: {}",
                        condition
                    )));
                }
            }
        }

        let module = self
            .modules
            .get(task.module_name())
            .ok_or_else(|| Error::ModuleNotFound(task.module_name().to_string()))?;

        let rendered = self.engine.render_value(task.module_args(), &context)?;
        let params: ModuleParams = match rendered {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            other => {
                return Err(Error::module_args(
                    task.module_name(),
                    format!("arguments must be a mapping, got {}", other),
                ))
            }
        };

        let module_context = ModuleContext::default()
            .with_vars(context)
            .with_verbosity(self.config.verbosity);

        module
            .validate_params(&params)
            .and_then(|()| module.execute(&params, &module_context))
            .map_err(|e| Error::module_args(task.module_name(), e.to_string()))
            .map(|output| {
                if output.status != ModuleStatus::Failed {
                    if let Some(facts) = output.facts() {
                        for (key, value) in facts {
                            host_facts.set(key.clone(), value.clone());
                        }
                    }
                }
                output
            })
    }

    /// Render a variable block in order, each entry seeing the ones before it.
    fn render_vars(&self, vars: &Variables, base: &TemplateVars) -> Result<Variables> {
        let mut context = base.clone();
        let mut rendered = Variables::new();
        for (key, value) in vars.iter() {
            let value = self.engine.render_value(value, &context)?;
            context.insert(key.clone(), value.clone());
            rendered.set(key.clone(), value);
        }
        Ok(rendered)
    }

    fn should_run(&self, play: &Play, task: &Task) -> bool {
        let tags: Vec<&String> = play.tags.iter().chain(task.tags.iter()).collect();
        let has = |wanted: &[String]| tags.iter().any(|t| wanted.contains(*t));

        if has(&self.config.skip_tags) {
            return false;
        }
        if self.config.tags.is_empty() {
            return true;
        }
        has(&self.config.tags) || tags.iter().any(|t| t.as_str() == ALWAYS_TAG)
    }
}

/// Resolve a host pattern without an inventory.
///
/// `all`, `localhost` and `127.0.0.1` mean the control node; other names are
/// taken literally (comma-separated) and run locally as well.
pub fn resolve_hosts(pattern: &str) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for name in pattern.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let host = match name {
            "all" | "localhost" | "127.0.0.1" => LOCALHOST.to_string(),
            other => other.to_string(),
        };
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }
    if hosts.is_empty() {
        hosts.push(LOCALHOST.to_string());
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        results: Vec<TaskResult>,
    }

    impl ExecutionCallback for Recorder {
        fn on_task_result(&mut self, result: &TaskResult) {
            self.results.push(result.clone());
        }
    }

    fn run(yaml: &str, config: ExecutorConfig) -> (PlaybookStats, Vec<TaskResult>) {
        let playbook = Playbook::from_yaml(yaml, None).unwrap();
        let executor = PlaybookExecutor::new(TemplateEngine::new()).with_config(config);
        let mut recorder = Recorder::default();
        let stats = executor.run(&playbook, &mut recorder).unwrap();
        (stats, recorder.results)
    }

    #[test]
    fn test_resolve_hosts() {
        assert_eq!(resolve_hosts("all"), vec!["localhost"]);
        assert_eq!(resolve_hosts("localhost,127.0.0.1"), vec!["localhost"]);
        assert_eq!(resolve_hosts("web1, web2"), vec!["web1", "web2"]);
        assert_eq!(resolve_hosts(""), vec!["localhost"]);
    }

    #[test]
    fn test_debug_with_filter() {
        let (stats, results) = run(
            r#"
- hosts: localhost
  vars:
    greeting: hello ansible
  tasks:
    - debug:
        msg: "{{ greeting | custom_title('Custom: ') }}"
"#,
            ExecutorConfig::default(),
        );
        assert!(!stats.has_failures());
        assert_eq!(results[0].msg, "Custom: Hello Ansible");
        assert_eq!(results[0].status, TaskStatus::Ok);
    }

    #[test]
    fn test_set_fact_register_and_precedence() {
        let mut extra = Variables::new();
        extra.set("who", json!("extra vars"));
        let config = ExecutorConfig {
            extra_vars: extra,
            ..Default::default()
        };

        let (_, results) = run(
            r#"
- hosts: localhost
  vars:
    who: play vars
    number: 42
  tasks:
    - set_fact:
        title: "{{ who | custom_title('> ') }}"
        same_number: "{{ number | custom_title('> ') }}"
    - debug:
        var: same_number
      register: shown
    - debug:
        msg: "{{ title }} / {{ shown.same_number + 1 }}"
"#,
            config,
        );

        assert_eq!(results[1].msg, "same_number: 42");
        assert_eq!(results[2].msg, "> Extra Vars / 43");
    }

    #[test]
    fn test_when_and_failures() {
        let (stats, results) = run(
            r#"
- hosts: localhost
  vars:
    enabled: false
  tasks:
    - debug: msg=skipped
      when: enabled
    - debug:
        msg: "{{ missing_var }}"
      ignore_errors: true
    - debug:
        msg: "{{ also_missing }}"
    - debug: msg=never
"#,
            ExecutorConfig::default(),
        );

        let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Skipped, TaskStatus::Ignored, TaskStatus::Failed]
        );
        let host = &stats.hosts["localhost"];
        assert_eq!(host.skipped, 1);
        assert_eq!(host.ignored, 1);
        assert_eq!(host.ok, 1);
        assert_eq!(host.failed, 1);
        assert!(stats.has_failures());
    }

    #[test]
    fn test_unknown_module_fails_task() {
        let (stats, results) = run(
            r#"
- hosts: localhost
  tasks:
    - copy:
        src: a
        dest: b
"#,
            ExecutorConfig::default(),
        );
        assert!(stats.has_failures());
        assert!(results[0].msg.contains("Module 'copy' not found"));
    }

    #[test]
    fn test_tags() {
        let yaml = r#"
- hosts: localhost
  tasks:
    - debug: msg=one
      tags: [first]
    - debug: msg=two
      tags: [second]
    - debug: msg=three
      tags: [always]
"#;
        let (_, results) = run(
            yaml,
            ExecutorConfig {
                tags: vec!["second".into()],
                ..Default::default()
            },
        );
        let msgs: Vec<_> = results.iter().map(|r| r.msg.as_str()).collect();
        assert_eq!(msgs, vec!["two", "three"]);

        let (_, results) = run(
            yaml,
            ExecutorConfig {
                skip_tags: vec!["always".into()],
                ..Default::default()
            },
        );
        let msgs: Vec<_> = results.iter().map(|r| r.msg.as_str()).collect();
        assert_eq!(msgs, vec!["one", "two"]);
    }

    #[test]
    fn test_facts_persist_across_plays() {
        let (_, results) = run(
            r#"
- hosts: localhost
  tasks:
    - set_fact:
        banner: "{{ 'first play' | custom_title }}"
- hosts: all
  tasks:
    - debug:
        var: banner
"#,
            ExecutorConfig::default(),
        );
        assert_eq!(results[1].msg, "banner: First Play");
    }

    struct HostnameFacts;

    impl crate::modules::Module for HostnameFacts {
        fn name(&self) -> &'static str {
            "hostname_facts"
        }

        fn description(&self) -> &'static str {
            "Report the host name as a fact"
        }

        fn execute(
            &self,
            _params: &ModuleParams,
            _context: &ModuleContext,
        ) -> crate::modules::ModuleResult<ModuleOutput> {
            let mut facts = serde_json::Map::new();
            facts.insert("host_label".to_string(), json!("build server"));
            Ok(ModuleOutput::ok("gathered").with_facts(facts))
        }
    }

    #[test]
    fn test_any_module_can_set_facts() {
        let mut modules = ModuleRegistry::with_builtins();
        modules.register(std::sync::Arc::new(HostnameFacts));
        let executor = PlaybookExecutor::new(TemplateEngine::new()).with_modules(modules);

        let playbook = Playbook::from_yaml(
            r#"
- hosts: localhost
  tasks:
    - hostname_facts: {}
    - debug:
        msg: "{{ host_label | custom_title('Host: ') }}"
"#,
            None,
        )
        .unwrap();
        let mut recorder = Recorder::default();
        let stats = executor.run(&playbook, &mut recorder).unwrap();

        assert!(!stats.has_failures());
        assert_eq!(recorder.results[1].msg, "Host: Build Server");
    }

    #[test]
    fn test_playbook_stats() {
        let mut stats = PlaybookStats::new();
        stats.record("host1", TaskStatus::Ok);
        stats.record("host1", TaskStatus::Changed);
        stats.record("host2", TaskStatus::Failed);

        assert!(stats.has_failures());
        assert_eq!(stats.total_tasks(), 3);
    }
}
