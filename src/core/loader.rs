//! Projection of configured hooks into the registry.
//!
//! Only the global scope, the active connection and the active stage are
//! walked. Everything attached here carries `HookOrigin::Configured` so the
//! next projection can clear it first.

use serde::Serialize;
use serde_json::Value;

use crate::config::{DeployConfig, HookTable};
use crate::context::ExecutionContext;
use crate::error::Error;
use crate::hooks::{value_kind, HookOrigin, HookPayload, HookRegistry, Phase};

/// One of the three configuration scopes hooks can live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum HookScope {
    Global,
    Connection(String),
    Stage(String),
}

impl HookScope {
    /// Dotted path of the scope's entry, e.g. `stages.qa`. Empty for global.
    pub fn entry(&self) -> String {
        match self {
            HookScope::Global => String::new(),
            HookScope::Connection(id) => format!("connections.{}", id),
            HookScope::Stage(id) => format!("stages.{}", id),
        }
    }

    /// Dotted path of the scope's hook table, e.g. `stages.qa.hooks`.
    pub fn path(&self) -> String {
        match self {
            HookScope::Global => "hooks".to_string(),
            _ => format!("{}.hooks", self.entry()),
        }
    }
}

/// A configured entry that was not attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedHook {
    pub scope: HookScope,
    pub key: String,
    pub problem: String,
}

impl SkippedHook {
    fn new(scope: &HookScope, key: String, problem: impl Into<String>) -> Self {
        Self {
            scope: scope.clone(),
            key,
            problem: problem.into(),
        }
    }

    pub fn to_error(&self) -> Error {
        Error::config_invalid_value(self.key.clone(), None, self.problem.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Configured listeners removed before attaching.
    pub cleared: usize,
    pub attached: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedHook>,
}

/// Scopes eligible under `context`, in attach order.
pub fn eligible_scopes(context: &ExecutionContext) -> Vec<HookScope> {
    let mut scopes = vec![
        HookScope::Global,
        HookScope::Connection(context.active_connection().to_string()),
    ];
    if let Some(stage) = context.active_stage() {
        scopes.push(HookScope::Stage(stage.to_string()));
    }
    scopes
}

/// Hook table of `scope`, `None` when the scope is not declared.
fn table_for(config: &DeployConfig, scope: &HookScope) -> Result<Option<HookTable>, SkippedHook> {
    let entry = match scope {
        HookScope::Global => return Ok(Some(config.hooks.clone())),
        HookScope::Connection(id) => config.connections.get(id),
        HookScope::Stage(id) => config.stages.get(id),
    };

    match entry {
        Some(entry) => entry
            .hooks()
            .map(Some)
            .map_err(|problem| SkippedHook::new(scope, scope.entry(), problem)),
        None => Ok(None),
    }
}

/// Replace every configured listener with the ones eligible under `context`.
///
/// Malformed entries are reported in the returned report and skipped; the
/// rest of the projection continues.
pub fn project(
    config: &DeployConfig,
    context: &ExecutionContext,
    registry: &mut HookRegistry,
) -> ProjectionReport {
    let mut report = ProjectionReport {
        connection: context.active_connection().to_string(),
        stage: context.active_stage().map(str::to_string),
        cleared: registry.clear_configured(None),
        attached: 0,
        skipped: Vec::new(),
    };

    for scope in eligible_scopes(context) {
        match table_for(config, &scope) {
            Ok(Some(table)) => project_scope(&scope, table.raw(), registry, &mut report),
            Ok(None) => {}
            Err(skipped) => report.skipped.push(skipped),
        }
    }

    for skipped in &report.skipped {
        log_status!("hooks", "Skipped {}: {}", skipped.key, skipped.problem);
    }
    log_status!(
        "hooks",
        "Projected {} configured listener(s) for {}",
        report.attached,
        context.label()
    );

    report
}

fn project_scope(
    scope: &HookScope,
    table: &Value,
    registry: &mut HookRegistry,
    report: &mut ProjectionReport,
) {
    let scope_path = scope.path();
    let phases = match table {
        Value::Null => return,
        Value::Object(phases) => phases,
        other => {
            report.skipped.push(SkippedHook::new(
                scope,
                scope_path,
                format!("expected a mapping of phases, got {}", value_kind(other)),
            ));
            return;
        }
    };

    for (phase_name, slugs) in phases {
        let phase_path = format!("{}.{}", scope_path, phase_name);
        let phase = match phase_name.parse::<Phase>() {
            Ok(phase) => phase,
            Err(err) => {
                report
                    .skipped
                    .push(SkippedHook::new(scope, phase_path, err.message));
                continue;
            }
        };

        let slugs = match slugs {
            Value::Null => continue,
            Value::Object(slugs) => slugs,
            other => {
                report.skipped.push(SkippedHook::new(
                    scope,
                    phase_path,
                    format!("expected a mapping of tasks, got {}", value_kind(other)),
                ));
                continue;
            }
        };

        for (slug, value) in slugs {
            let key = format!("{}.{}", phase_path, slug);
            let payload = match HookPayload::from_value(value) {
                Ok(payload) => payload,
                Err(problem) => {
                    report.skipped.push(SkippedHook::new(scope, key, problem));
                    continue;
                }
            };

            match registry.attach(slug.as_str(), phase, payload, 0, HookOrigin::Configured) {
                Ok(()) => report.attached += 1,
                Err(err) => {
                    let problem = err.details["problem"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or(err.message);
                    report.skipped.push(SkippedHook::new(scope, key, problem));
                }
            }
        }
    }
}
