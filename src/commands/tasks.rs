use clap::Args;
use serde::Serialize;

use launchpad::task::TaskSummary;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct TasksArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksOutput {
    pub command: &'static str,
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub tasks: Vec<TaskSummary>,
}

pub fn run(_args: TasksArgs, global: &GlobalArgs) -> CmdResult<TasksOutput> {
    let (handler, _) = super::load_handler(global)?;
    let context = handler.context();

    Ok((
        TasksOutput {
            command: "tasks",
            connection: context.active_connection().to_string(),
            stage: context.active_stage().map(str::to_string),
            tasks: handler.task_summaries(),
        },
        0,
    ))
}
