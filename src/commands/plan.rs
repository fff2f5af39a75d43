use clap::Args;
use serde::Serialize;

use launchpad::queue::{self, QueueRequest};
use launchpad::TaskPlan;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct PlanArgs {
    /// Task slugs to plan, in order
    #[arg(required = true)]
    pub tasks: Vec<String>,

    /// Application root on the target (default: config `root`, else /home/www/app)
    #[arg(long)]
    pub root: Option<String>,

    /// Release name (default: current timestamp)
    #[arg(long)]
    pub release: Option<String>,

    /// Plan for this connection instead of the active one (repeatable)
    #[arg(long = "target", value_name = "CONNECTION")]
    pub targets: Vec<String>,

    /// Plan for this stage instead of the active one (repeatable)
    #[arg(long = "target-stage", value_name = "STAGE")]
    pub target_stages: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutput {
    pub command: &'static str,
    pub release: String,
    pub plans: Vec<TaskPlan>,
}

pub fn run(args: PlanArgs, global: &GlobalArgs) -> CmdResult<PlanOutput> {
    let (mut handler, _) = super::load_handler(global)?;
    let paths = super::release_paths(&handler, args.root.as_deref(), args.release.as_deref());

    let request = QueueRequest {
        tasks: args.tasks,
        connections: args.targets,
        stages: args.target_stages,
    };
    let plans = queue::plan_queue(&mut handler, &request, &paths)?;

    Ok((
        PlanOutput {
            command: "plan",
            release: paths.release().to_string(),
            plans,
        },
        0,
    ))
}
