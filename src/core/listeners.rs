use serde::Serialize;
use std::cmp::Reverse;

use crate::hooks::{HookOrigin, HookRegistry, Phase};
use crate::task::TaskStore;

/// Where a resolved listener came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerSource {
    Intrinsic,
    Explicit,
    Configured,
}

impl From<HookOrigin> for ListenerSource {
    fn from(origin: HookOrigin) -> Self {
        match origin {
            HookOrigin::Explicit => ListenerSource::Explicit,
            HookOrigin::Configured => ListenerSource::Configured,
        }
    }
}

/// One entry of a resolved listener list, before flattening.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRecord {
    pub slug: String,
    pub phase: Phase,
    pub commands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub source: ListenerSource,
}

/// Resolved listeners, flattened into commands or kept as records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listeners {
    Commands(Vec<String>),
    Records(Vec<ListenerRecord>),
}

/// Ordered listener records for `slug` and `phase`.
///
/// Intrinsic listeners lead, as one record. Registry listeners follow in
/// descending priority; equal priorities keep attach order.
pub fn records(
    tasks: &TaskStore,
    hooks: &HookRegistry,
    slug: &str,
    phase: Phase,
) -> Vec<ListenerRecord> {
    let slug = slug.trim();
    let mut records = Vec::new();

    let intrinsic = tasks.intrinsic_listeners(slug, phase);
    if !intrinsic.is_empty() {
        records.push(ListenerRecord {
            slug: slug.to_string(),
            phase,
            commands: intrinsic,
            priority: None,
            source: ListenerSource::Intrinsic,
        });
    }

    let mut stored = hooks.listeners_for(slug, phase).to_vec();
    stored.sort_by_key(|listener| Reverse(listener.priority));

    records.extend(stored.into_iter().map(|listener| ListenerRecord {
        slug: listener.slug,
        phase,
        commands: listener.commands,
        priority: Some(listener.priority),
        source: listener.origin.into(),
    }));

    records
}

/// Ordered commands for `slug` and `phase`, flattened one level.
pub fn resolve(tasks: &TaskStore, hooks: &HookRegistry, slug: &str, phase: Phase) -> Vec<String> {
    records(tasks, hooks, slug, phase)
        .into_iter()
        .flat_map(|record| record.commands)
        .collect()
}
