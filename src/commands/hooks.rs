use clap::Args;
use serde::Serialize;

use launchpad::loader::SkippedHook;
use launchpad::{Listeners, Phase};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct HooksArgs {
    /// Task slug (need not be registered)
    pub task: String,

    /// Phase: before or after
    pub phase: String,

    /// Show listener records with their source and priority
    #[arg(long)]
    pub records: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HooksOutput {
    pub command: &'static str,
    pub task: String,
    pub phase: Phase,
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub listeners: Listeners,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedHook>,
}

pub fn run(args: HooksArgs, global: &GlobalArgs) -> CmdResult<HooksOutput> {
    let phase: Phase = args.phase.parse()?;
    let (handler, report) = super::load_handler(global)?;
    let task = args.task.trim().to_string();
    let listeners = handler.get_tasks_listeners(&task, phase, !args.records);

    Ok((
        HooksOutput {
            command: "hooks",
            task,
            phase,
            connection: report.connection,
            stage: report.stage,
            listeners,
            skipped: report.skipped,
        },
        0,
    ))
}
