use launchpad::config::ScopeConfig;
use launchpad::task::InlineTask;
use launchpad::{
    DeployConfig, Listeners, NativeTask, Phase, PretendExecutor, ReleasePaths, Result,
    TaskDefinition, TaskKind, TaskRef, TaskRun, TasksHandler,
};
use serde_json::json;

struct HookedDeploy;

impl NativeTask for HookedDeploy {
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
        run.run_for_current_release("git pull");
        Ok(())
    }
}

fn handler() -> TasksHandler {
    TasksHandler::new(DeployConfig::default()).unwrap()
}

fn listeners(handler: &TasksHandler, slug: &str, phase: Phase) -> Vec<String> {
    match handler.get_tasks_listeners(slug, phase, true) {
        Listeners::Commands(commands) => commands,
        Listeners::Records(_) => panic!("flatten=true must return commands"),
    }
}

#[test]
fn attach_before_task_exists_is_resolvable() {
    let mut handler = handler();
    handler.after("composer", "composer install", 0).unwrap();

    assert!(!handler.tasks().contains("composer"));
    assert_eq!(
        listeners(&handler, "composer", Phase::After),
        vec!["composer install"]
    );

    handler
        .register_task("composer", TaskDefinition::commands("composer dump-autoload"))
        .unwrap();
    assert_eq!(
        listeners(&handler, "composer", Phase::After),
        vec!["composer install"]
    );
}

#[test]
fn multi_target_attach_adds_listener_to_each_slug_once() {
    let mut handler = handler();
    handler
        .after(["cleanup", "setup"], "composer install", 0)
        .unwrap();

    assert_eq!(
        listeners(&handler, "cleanup", Phase::After),
        vec!["composer install"]
    );
    assert_eq!(
        listeners(&handler, "setup", Phase::After),
        vec!["composer install"]
    );
}

#[test]
fn priority_sorts_after_intrinsic_listeners() {
    let mut handler = handler();
    handler
        .register_task_override("deploy", TaskDefinition::native(HookedDeploy))
        .unwrap();

    handler.before("deploy", "second", -5).unwrap();
    handler.before("deploy", "first", 0).unwrap();

    assert_eq!(
        listeners(&handler, "deploy", Phase::Before),
        vec!["before", "foobar", "first", "second"]
    );
}

#[test]
fn stage_switch_changes_configured_listeners() {
    let mut config = DeployConfig::default();
    config.stages.insert(
        "hasEvent".to_string(),
        ScopeConfig::with_hooks(json!({ "before": { "check": ["ls"] } })),
    );
    config
        .stages
        .insert("noEvent".to_string(), ScopeConfig::default());
    let mut handler = TasksHandler::new(config).unwrap();

    handler.set_stage(Some("hasEvent"));
    handler.register_configured_events();
    assert_eq!(listeners(&handler, "check", Phase::Before), vec!["ls"]);

    handler.set_stage(Some("noEvent"));
    handler.register_configured_events();
    assert!(listeners(&handler, "check", Phase::Before).is_empty());
}

#[test]
fn connection_switch_changes_configured_listeners() {
    let mut config = DeployConfig::default();
    config.default = Some("production".to_string());
    config.connections.insert(
        "staging".to_string(),
        ScopeConfig::with_hooks(json!({
            "after": { "deploy": ["npm install", "bower install"] }
        })),
    );
    let mut handler = TasksHandler::new(config).unwrap();

    assert!(listeners(&handler, "deploy", Phase::After).is_empty());

    handler.set_connection("staging").unwrap();
    handler.register_configured_events();
    assert_eq!(
        listeners(&handler, "deploy", Phase::After),
        vec!["npm install", "bower install"]
    );

    handler.set_connection("production").unwrap();
    handler.register_configured_events();
    assert!(listeners(&handler, "deploy", Phase::After).is_empty());
}

#[test]
fn switching_context_without_projection_keeps_previous_listeners() {
    let mut config = DeployConfig::default();
    config.connections.insert(
        "staging".to_string(),
        ScopeConfig::with_hooks(json!({ "after": { "deploy": "npm install" } })),
    );
    config.default = Some("staging".to_string());
    let mut handler = TasksHandler::new(config).unwrap();

    handler.set_connection("production").unwrap();
    assert_eq!(
        listeners(&handler, "deploy", Phase::After),
        vec!["npm install"]
    );
}

#[test]
fn repeated_projection_is_idempotent() {
    let mut config = DeployConfig::default();
    config.hooks = launchpad::config::HookTable::new(json!({
        "before": { "deploy": "php artisan down" },
        "after": { "deploy": ["php artisan up"] }
    }));
    let mut handler = TasksHandler::new(config).unwrap();
    let count = handler.hooks().len();

    handler.register_configured_events();
    handler.register_configured_events();

    assert_eq!(handler.hooks().len(), count);
    assert_eq!(
        listeners(&handler, "deploy", Phase::Before),
        vec!["php artisan down"]
    );
}

#[test]
fn inline_task_runs_inside_release_directory() {
    let mut handler = handler();
    handler
        .task("foobar", InlineTask::commands(["ls", "ls"]))
        .unwrap();

    let handle = handler.build("foobar").unwrap();
    assert_eq!(handle.kind(), TaskKind::Inline);

    let paths = ReleasePaths::new("/home/www/foobar", "20240101000000");
    assert_eq!(
        handle.commands(&paths).unwrap(),
        vec!["cd /home/www/foobar/releases/20240101000000", "ls", "ls"]
    );
}

#[test]
fn inline_closure_task_gets_run_handle() {
    let mut handler = handler();
    handler
        .task(
            "whoami",
            InlineTask::closure(|run| {
                let release = run.paths().release_path();
                run.run(format!("echo {}", release));
                Ok(())
            }),
        )
        .unwrap();

    let mut executor = PretendExecutor::new();
    let paths = ReleasePaths::new("/srv/app", "1");
    handler.run("whoami", &paths, &mut executor).unwrap();

    assert_eq!(executor.commands(), vec!["echo /srv/app/releases/1"]);
}

#[test]
fn anonymous_inline_task_gets_generated_slug() {
    let mut handler = handler();
    let handle = handler
        .build(TaskRef::inline(None, InlineTask::commands("uptime")))
        .unwrap();

    assert!(handle.slug().starts_with("inline-"));
    assert!(handler.tasks().contains(handle.slug()));
}

#[test]
fn run_sends_hooks_around_task() {
    let mut handler = handler();
    handler
        .register_task_override("deploy", TaskDefinition::native(HookedDeploy))
        .unwrap();
    handler.after("deploy", "echo {{task}} on {{connection}}", 0).unwrap();

    let mut executor = PretendExecutor::new();
    let paths = ReleasePaths::new("/srv/app", "7");
    let report = handler.run("deploy", &paths, &mut executor).unwrap();

    assert_eq!(report.batches.len(), 3);
    assert_eq!(
        executor.commands(),
        vec![
            "before",
            "foobar",
            "cd /srv/app/releases/7",
            "git pull",
            "echo deploy on production",
        ]
    );
    assert!(executor
        .history()
        .iter()
        .all(|(connection, _)| connection == "production"));
}

#[test]
fn unknown_task_is_an_error_but_unknown_listeners_are_empty() {
    let mut handler = handler();
    assert!(listeners(&handler, "nothing", Phase::Before).is_empty());

    let err = handler.build("nothing").unwrap_err();
    assert_eq!(err.code.as_str(), "task.not_found");
}

#[test]
fn blank_hook_command_is_rejected() {
    let mut handler = handler();
    let err = handler.before("deploy", ["ls", "  "], 0).unwrap_err();

    assert_eq!(err.code.as_str(), "hook.invalid_payload");
    assert!(listeners(&handler, "deploy", Phase::Before).is_empty());
}
