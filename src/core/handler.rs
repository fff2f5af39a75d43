//! Public facade over tasks, hooks and the active context.
//!
//! One handler holds everything a run needs. Nothing is global, so separate
//! runs get separate handlers.

use serde::Serialize;

use crate::builder::{self, TaskHandle, TaskKind};
use crate::config::DeployConfig;
use crate::context::ExecutionContext;
use crate::error::{Error, RemoteCommandFailedDetails, Result};
use crate::executor::{CommandExecutor, CommandOutput};
use crate::hooks::{HookOrigin, HookPayload, HookRegistry, Phase, Targets};
use crate::listeners::{self, Listeners};
use crate::loader::{self, ProjectionReport};
use crate::task::{
    builtin, InlineTask, NativeTask, ReleasePaths, TaskDefinition, TaskRef, TaskStore, TaskSummary,
};
use crate::utils::template::{render, TemplateVars};

/// Everything one task invocation would run, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlan {
    pub task: String,
    pub kind: TaskKind,
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub release_path: String,
    pub before: Vec<String>,
    pub commands: Vec<String>,
    pub after: Vec<String>,
}

impl TaskPlan {
    /// Non-empty batches labelled `before`, `task` and `after`.
    pub fn batches(&self) -> Vec<(&'static str, &[String])> {
        [
            ("before", self.before.as_slice()),
            ("task", self.commands.as_slice()),
            ("after", self.after.as_slice()),
        ]
        .into_iter()
        .filter(|(_, commands)| !commands.is_empty())
        .collect()
    }

    /// Every command of the plan, flattened.
    pub fn all_commands(&self) -> Vec<String> {
        self.before
            .iter()
            .chain(&self.commands)
            .chain(&self.after)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch: &'static str,
    pub commands: Vec<String>,
    pub output: CommandOutput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub task: String,
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub batches: Vec<BatchReport>,
}

#[derive(Debug)]
pub struct TasksHandler {
    tasks: TaskStore,
    hooks: HookRegistry,
    context: ExecutionContext,
    config: DeployConfig,
}

impl TasksHandler {
    /// Handler with built-in tasks, configured inline tasks and one projection
    /// of configured hooks for the initial context.
    pub fn new(config: DeployConfig) -> Result<Self> {
        let context = ExecutionContext::from_config(&config)?;

        let mut tasks = TaskStore::new();
        builtin::register_builtins(&mut tasks)?;
        for (slug, commands) in config.inline_tasks()? {
            tasks.register_override(&slug, TaskDefinition::commands(commands))?;
        }

        let mut handler = Self {
            tasks,
            hooks: HookRegistry::new(),
            context,
            config,
        };
        handler.register_configured_events();
        Ok(handler)
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Switch the active connection. Call `register_configured_events`
    /// afterwards to refresh configured hooks.
    pub fn set_connection(&mut self, connection: &str) -> Result<()> {
        self.context.set_connection(connection)
    }

    /// Switch or clear the active stage. Configured hooks are not refreshed.
    pub fn set_stage(&mut self, stage: Option<&str>) {
        self.context.set_stage(stage);
    }

    pub(crate) fn replace_context(&mut self, context: ExecutionContext) {
        self.context = context;
    }

    // === Hooks ===

    pub fn attach(
        &mut self,
        targets: impl Into<Targets>,
        phase: Phase,
        payload: impl Into<HookPayload>,
        priority: i32,
    ) -> Result<()> {
        self.hooks
            .attach(targets, phase, payload, priority, HookOrigin::Explicit)
    }

    pub fn before(
        &mut self,
        targets: impl Into<Targets>,
        payload: impl Into<HookPayload>,
        priority: i32,
    ) -> Result<()> {
        self.attach(targets, Phase::Before, payload, priority)
    }

    pub fn after(
        &mut self,
        targets: impl Into<Targets>,
        payload: impl Into<HookPayload>,
        priority: i32,
    ) -> Result<()> {
        self.attach(targets, Phase::After, payload, priority)
    }

    /// Re-project configured hooks for the current context. Safe to repeat.
    pub fn register_configured_events(&mut self) -> ProjectionReport {
        loader::project(&self.config, &self.context, &mut self.hooks)
    }

    /// Resolved listeners for `slug` and `phase`. Unknown slugs resolve empty.
    pub fn get_tasks_listeners(&self, slug: &str, phase: Phase, flatten: bool) -> Listeners {
        if flatten {
            Listeners::Commands(listeners::resolve(&self.tasks, &self.hooks, slug, phase))
        } else {
            Listeners::Records(listeners::records(&self.tasks, &self.hooks, slug, phase))
        }
    }

    // === Tasks ===

    /// Register a native task under its own slug.
    pub fn add(&mut self, task: impl NativeTask + 'static) -> Result<TaskHandle> {
        let slug = task.slug().to_string();
        self.tasks.register(&slug, TaskDefinition::native(task))?;
        self.build(slug)
    }

    /// Register an inline task under `slug`.
    pub fn task(&mut self, slug: &str, task: InlineTask) -> Result<TaskHandle> {
        self.build(TaskRef::inline(Some(slug), task))
    }

    pub fn register_task(&mut self, slug: &str, definition: TaskDefinition) -> Result<()> {
        self.tasks.register(slug, definition)
    }

    pub fn register_task_override(&mut self, slug: &str, definition: TaskDefinition) -> Result<()> {
        self.tasks.register_override(slug, definition)
    }

    pub fn build(&mut self, reference: impl Into<TaskRef>) -> Result<TaskHandle> {
        builder::build(&mut self.tasks, reference)
    }

    pub fn task_summaries(&self) -> Vec<TaskSummary> {
        self.tasks.summaries()
    }

    // === Planning and running ===

    /// Resolve a task and its listeners into one plan for the active context.
    pub fn plan(&mut self, reference: impl Into<TaskRef>, paths: &ReleasePaths) -> Result<TaskPlan> {
        let handle = self.build(reference)?;
        let slug = handle.slug().to_string();
        let release_path = paths.release_path();
        let connection = self.context.active_connection().to_string();
        let stage = self.context.active_stage().map(str::to_string);

        let vars = [
            (TemplateVars::RELEASE_PATH, release_path.as_str()),
            (TemplateVars::CONNECTION, connection.as_str()),
            (TemplateVars::STAGE, stage.as_deref().unwrap_or("")),
            (TemplateVars::TASK, slug.as_str()),
        ];
        let rendered = |commands: Vec<String>| -> Vec<String> {
            commands.iter().map(|c| render(c, &vars)).collect()
        };

        let before = rendered(listeners::resolve(
            &self.tasks,
            &self.hooks,
            &slug,
            Phase::Before,
        ));
        let after = rendered(listeners::resolve(
            &self.tasks,
            &self.hooks,
            &slug,
            Phase::After,
        ));
        let commands = handle.commands(paths)?;

        Ok(TaskPlan {
            task: slug,
            kind: handle.kind(),
            connection,
            stage,
            release_path,
            before,
            commands,
            after,
        })
    }

    /// Plan a task and send its batches to `executor`, stopping at the first
    /// failed batch.
    pub fn run(
        &mut self,
        reference: impl Into<TaskRef>,
        paths: &ReleasePaths,
        executor: &mut dyn CommandExecutor,
    ) -> Result<RunReport> {
        let plan = self.plan(reference, paths)?;
        execute_plan(&plan, executor)
    }
}

/// Send the batches of `plan` to `executor`.
pub fn execute_plan(plan: &TaskPlan, executor: &mut dyn CommandExecutor) -> Result<RunReport> {
    let mut report = RunReport {
        task: plan.task.clone(),
        connection: plan.connection.clone(),
        stage: plan.stage.clone(),
        batches: Vec::new(),
    };

    for (batch, commands) in plan.batches() {
        log_status!(
            "run",
            "{} {}: {} command(s) on {}",
            plan.task,
            batch,
            commands.len(),
            plan.connection
        );

        let output = executor.execute(&plan.connection, commands);
        if !output.success {
            return Err(Error::remote_command_failed(RemoteCommandFailedDetails {
                task: plan.task.clone(),
                connection: plan.connection.clone(),
                commands: commands.to_vec(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            }));
        }

        report.batches.push(BatchReport {
            batch,
            commands: commands.to_vec(),
            output,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeConfig;
    use crate::executor::PretendExecutor;
    use crate::task::TaskRun;
    use serde_json::json;

    struct IntrinsicDeploy;

    impl NativeTask for IntrinsicDeploy {
        fn slug(&self) -> &str {
            "deploy"
        }

        fn listeners(&self, phase: Phase) -> Vec<String> {
            match phase {
                Phase::Before => vec!["before".to_string(), "foobar".to_string()],
                Phase::After => Vec::new(),
            }
        }

        fn execute(&self, run: &mut TaskRun) -> Result<()> {
            run.run("echo deploying");
            Ok(())
        }
    }

    struct FailingExecutor;

    impl CommandExecutor for FailingExecutor {
        fn execute(&mut self, _connection: &str, _commands: &[String]) -> CommandOutput {
            CommandOutput {
                stderr: "permission denied".to_string(),
                exit_code: 13,
                ..CommandOutput::default()
            }
        }
    }

    fn flat(handler: &TasksHandler, slug: &str, phase: Phase) -> Vec<String> {
        match handler.get_tasks_listeners(slug, phase, true) {
            Listeners::Commands(commands) => commands,
            Listeners::Records(_) => panic!("expected flattened commands"),
        }
    }

    fn paths() -> ReleasePaths {
        ReleasePaths::new("/home/www/app", "20000000000000")
    }

    #[test]
    fn new_registers_builtins_and_config_tasks() {
        let mut config = DeployConfig::default();
        config.tasks.insert("foobar".to_string(), json!(["ls", "ls"]));

        let handler = TasksHandler::new(config).unwrap();
        assert!(handler.tasks().contains("deploy"));
        assert!(handler.tasks().contains("foobar"));
        assert_eq!(handler.context().active_connection(), "production");
    }

    #[test]
    fn new_fails_on_malformed_config_task() {
        let mut config = DeployConfig::default();
        config.tasks.insert("broken".to_string(), json!({"a": 1}));

        let err = TasksHandler::new(config).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn priority_orders_listeners_after_intrinsic_ones() {
        let mut handler = TasksHandler::new(DeployConfig::default()).unwrap();
        handler
            .register_task_override("deploy", TaskDefinition::native(IntrinsicDeploy))
            .unwrap();

        handler.before("deploy", "second", -5).unwrap();
        handler.before("deploy", "first", 0).unwrap();

        assert_eq!(
            flat(&handler, "deploy", Phase::Before),
            vec!["before", "foobar", "first", "second"]
        );
    }

    #[test]
    fn non_flattened_listeners_are_records() {
        let mut handler = TasksHandler::new(DeployConfig::default()).unwrap();
        handler.after("setup", ["a", "b"], 0).unwrap();

        match handler.get_tasks_listeners("setup", Phase::After, false) {
            Listeners::Records(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].commands, vec!["a", "b"]);
            }
            Listeners::Commands(_) => panic!("expected records"),
        }
    }

    #[test]
    fn add_native_task_conflicting_with_builtin_fails() {
        let mut handler = TasksHandler::new(DeployConfig::default()).unwrap();
        let err = handler.add(IntrinsicDeploy).unwrap_err();
        assert_eq!(err.code.as_str(), "task.duplicate");
    }

    #[test]
    fn plan_renders_hook_placeholders() {
        let mut config = DeployConfig::default();
        config.connections.insert(
            "staging".to_string(),
            ScopeConfig::with_hooks(json!({
                "after": { "deploy": "cd {{releasePath}} && echo {{connection}} {{task}}" }
            })),
        );
        config.default = Some("staging".to_string());

        let mut handler = TasksHandler::new(config).unwrap();
        let plan = handler.plan("deploy", &paths()).unwrap();

        assert_eq!(
            plan.after,
            vec!["cd /home/www/app/releases/20000000000000 && echo staging deploy"]
        );
        assert_eq!(plan.kind, TaskKind::Native);
        assert!(plan.before.is_empty());
    }

    #[test]
    fn run_sends_non_empty_batches_in_order() {
        let mut handler = TasksHandler::new(DeployConfig::default()).unwrap();
        handler.task("foobar", InlineTask::commands(["ls", "ls"])).unwrap();
        handler.after("foobar", "echo done", 0).unwrap();

        let mut executor = PretendExecutor::new();
        let report = handler.run("foobar", &paths(), &mut executor).unwrap();

        assert_eq!(report.batches.len(), 2);
        assert_eq!(report.batches[0].batch, "task");
        assert_eq!(
            executor.commands(),
            vec![
                "cd /home/www/app/releases/20000000000000",
                "ls",
                "ls",
                "echo done"
            ]
        );
    }

    #[test]
    fn run_stops_at_first_failed_batch() {
        let mut handler = TasksHandler::new(DeployConfig::default()).unwrap();
        handler.before("setup", "whoami", 0).unwrap();

        let err = handler
            .run("setup", &paths(), &mut FailingExecutor)
            .unwrap_err();

        assert_eq!(err.code.as_str(), "remote.command_failed");
        assert_eq!(err.details["task"], "setup");
        assert_eq!(err.details["exitCode"], 13);
        assert_eq!(err.details["commands"][0], "whoami");
    }

    #[test]
    fn run_unknown_task_fails_before_executing() {
        let mut handler = TasksHandler::new(DeployConfig::default()).unwrap();
        let mut executor = PretendExecutor::new();

        let err = handler.run("nope", &paths(), &mut executor).unwrap_err();
        assert_eq!(err.code.as_str(), "task.not_found");
        assert!(executor.history().is_empty());
    }
}
