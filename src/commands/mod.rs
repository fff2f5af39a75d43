use launchpad::config;
use launchpad::loader::ProjectionReport;
use launchpad::{ReleasePaths, TasksHandler};

pub type CmdResult<T> = launchpad::Result<(T, i32)>;

/// Application root used when neither `--root` nor `root:` is set.
pub const DEFAULT_ROOT: &str = "/home/www/app";

/// Release name format for new releases.
pub const RELEASE_FORMAT: &str = "%Y%m%d%H%M%S";

pub(crate) struct GlobalArgs {
    pub config: Option<String>,
    pub connection: Option<String>,
    pub stage: Option<String>,
}

/// Load configuration, apply `--on`/`--stage` and project configured hooks.
pub(crate) fn load_handler(global: &GlobalArgs) -> launchpad::Result<(TasksHandler, ProjectionReport)> {
    let cwd = std::env::current_dir().map_err(|e| {
        launchpad::Error::internal_io(e.to_string(), Some("read current directory".to_string()))
    })?;
    let (config, _) = config::load_or_default(global.config.as_deref(), &cwd)?;

    let mut handler = TasksHandler::new(config)?;
    if let Some(connection) = &global.connection {
        handler.set_connection(connection)?;
    }
    if let Some(stage) = &global.stage {
        handler.set_stage(Some(stage));
    }
    let report = handler.register_configured_events();

    Ok((handler, report))
}

/// Release layout from `--root`/`--release`, falling back to config and a
/// timestamped release name.
pub(crate) fn release_paths(
    handler: &TasksHandler,
    root: Option<&str>,
    release: Option<&str>,
) -> ReleasePaths {
    let root = root
        .or(handler.config().root.as_deref())
        .map(|r| shellexpand::tilde(r).to_string())
        .unwrap_or_else(|| DEFAULT_ROOT.to_string());
    let release = release
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().format(RELEASE_FORMAT).to_string());

    ReleasePaths::new(&root, &release)
}

pub mod hooks;
pub mod plan;
pub mod run;
pub mod tasks;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (launchpad::Result<serde_json::Value>, i32) {
    crate::tty::status("launchpad is working...");

    match command {
        crate::Commands::Tasks(args) => dispatch!(args, global, tasks),
        crate::Commands::Hooks(args) => dispatch!(args, global, hooks),
        crate::Commands::Plan(args) => dispatch!(args, global, plan),
        crate::Commands::Run(args) => dispatch!(args, global, run),
    }
}
