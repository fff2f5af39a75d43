//! Planning a list of tasks across several connections and stages.

use serde::Deserialize;

use crate::error::Result;
use crate::handler::{TaskPlan, TasksHandler};
use crate::task::ReleasePaths;
use crate::utils::validation;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRequest {
    pub tasks: Vec<String>,
    /// Empty means the active connection.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Empty means the active stage (or none).
    #[serde(default)]
    pub stages: Vec<String>,
}

impl QueueRequest {
    pub fn new(tasks: Vec<String>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }
}

/// Plan every task for every connection and stage pair.
///
/// Configured hooks are re-projected before each target. The original
/// context and its projection are restored afterwards, also on error.
pub fn plan_queue(
    handler: &mut TasksHandler,
    request: &QueueRequest,
    paths: &ReleasePaths,
) -> Result<Vec<TaskPlan>> {
    validation::require_non_empty_vec(&request.tasks, "tasks", "At least one task is required")?;

    let original = handler.context().clone();
    let connections = if request.connections.is_empty() {
        vec![original.active_connection().to_string()]
    } else {
        request.connections.clone()
    };
    let stages: Vec<Option<String>> = if request.stages.is_empty() {
        vec![original.active_stage().map(str::to_string)]
    } else {
        request.stages.iter().cloned().map(Some).collect()
    };

    let result = plan_targets(handler, &request.tasks, &connections, &stages, paths);

    handler.replace_context(original);
    handler.register_configured_events();

    result
}

fn plan_targets(
    handler: &mut TasksHandler,
    tasks: &[String],
    connections: &[String],
    stages: &[Option<String>],
    paths: &ReleasePaths,
) -> Result<Vec<TaskPlan>> {
    let mut plans = Vec::with_capacity(tasks.len() * connections.len() * stages.len());

    for connection in connections {
        for stage in stages {
            handler.set_connection(connection)?;
            handler.set_stage(stage.as_deref());
            handler.register_configured_events();

            for task in tasks {
                plans.push(handler.plan(task, paths)?);
            }
        }
    }

    Ok(plans)
}
