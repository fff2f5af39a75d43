use clap::Args;
use serde::Serialize;

use launchpad::{CommandExecutor, LocalExecutor, PretendExecutor, RunReport};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct RunArgs {
    /// Task slug to run
    pub task: String,

    /// Application root on the target (default: config `root`, else /home/www/app)
    #[arg(long)]
    pub root: Option<String>,

    /// Release name (default: current timestamp)
    #[arg(long)]
    pub release: Option<String>,

    /// Execute batches on this machine instead of only printing them
    #[arg(long)]
    pub local: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub command: &'static str,
    pub mode: &'static str,
    pub release: String,
    pub report: RunReport,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> CmdResult<RunOutput> {
    let (mut handler, _) = super::load_handler(global)?;
    let paths = super::release_paths(&handler, args.root.as_deref(), args.release.as_deref());

    let (mode, mut executor): (&'static str, Box<dyn CommandExecutor>) = if args.local {
        ("local", Box::new(LocalExecutor::new()))
    } else {
        ("pretend", Box::new(PretendExecutor::new()))
    };

    let report = handler.run(args.task.as_str(), &paths, executor.as_mut())?;

    Ok((
        RunOutput {
            command: "run",
            mode,
            release: paths.release().to_string(),
            report,
        },
        0,
    ))
}
