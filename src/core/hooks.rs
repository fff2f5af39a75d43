//! Hook registry: commands attached to run before or after a named task.
//!
//! Listeners are keyed by task slug and phase only. A slug never needs a
//! registered task to receive listeners, so hooks can be attached to tasks
//! that are defined later (or never).
//!
//! Two origins share the registry:
//! - `explicit` listeners come from code (`before`/`after`/`attach`)
//! - `configured` listeners are projected from configuration for the active
//!   connection and stage, and are cleared before every projection

use crate::error::{Error, Result};
use crate::utils::validation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// When a hook runs relative to its target task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Before, Phase::After];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Phase::Before),
            "after" => Ok(Phase::After),
            _ => Err(Error::hook_invalid_phase(s)),
        }
    }
}

/// Where a stored listener came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookOrigin {
    Explicit,
    Configured,
}

/// Ordered command list carried by one listener.
///
/// A single command string and a list of commands both normalize to a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookPayload(Vec<String>);

impl HookPayload {
    pub fn commands(&self) -> &[String] {
        &self.0
    }

    pub fn into_commands(self) -> Vec<String> {
        self.0
    }

    /// Interpret a configuration value as a payload.
    ///
    /// Accepts a string or an array of strings; anything else returns the
    /// problem description so callers can attach their own context.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::String(command) => Ok(Self(vec![command.clone()])),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(command) => Ok(command.clone()),
                    other => Err(format!(
                        "item {} is {}, expected a command string",
                        index,
                        value_kind(other)
                    )),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self),
            other => Err(format!(
                "got {}, expected a command string or a list of command strings",
                value_kind(other)
            )),
        }
    }

    fn validate(&self, slug: &str, phase: Phase) -> Result<()> {
        if let Some(index) = self.0.iter().position(|c| c.trim().is_empty()) {
            return Err(Error::hook_invalid_payload(
                slug,
                phase.as_str(),
                format!("command {} is blank", index),
            ));
        }
        Ok(())
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

impl From<&str> for HookPayload {
    fn from(command: &str) -> Self {
        Self(vec![command.to_string()])
    }
}

impl From<String> for HookPayload {
    fn from(command: String) -> Self {
        Self(vec![command])
    }
}

impl From<Vec<String>> for HookPayload {
    fn from(commands: Vec<String>) -> Self {
        Self(commands)
    }
}

impl From<Vec<&str>> for HookPayload {
    fn from(commands: Vec<&str>) -> Self {
        Self(commands.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for HookPayload {
    fn from(commands: &[&str]) -> Self {
        Self(commands.iter().map(|c| c.to_string()).collect())
    }
}

impl From<&[String]> for HookPayload {
    fn from(commands: &[String]) -> Self {
        Self(commands.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for HookPayload {
    fn from(commands: [&str; N]) -> Self {
        Self(commands.iter().map(|c| c.to_string()).collect())
    }
}

/// One or more task slugs targeted by a single attach call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets(Vec<String>);

impl Targets {
    /// Trimmed slugs, duplicates removed in first-seen order.
    fn normalized(&self) -> Result<Vec<String>> {
        validation::require_non_empty_vec(&self.0, "task", "At least one task slug is required")?;

        let mut slugs: Vec<String> = Vec::with_capacity(self.0.len());
        for raw in &self.0 {
            let slug = validation::require_non_empty(raw, "task", "Task slug cannot be empty")?;
            if !slugs.iter().any(|s| s == slug) {
                slugs.push(slug.to_string());
            }
        }
        Ok(slugs)
    }
}

impl From<&str> for Targets {
    fn from(slug: &str) -> Self {
        Self(vec![slug.to_string()])
    }
}

impl From<String> for Targets {
    fn from(slug: String) -> Self {
        Self(vec![slug])
    }
}

impl From<&String> for Targets {
    fn from(slug: &String) -> Self {
        Self(vec![slug.clone()])
    }
}

impl From<Vec<String>> for Targets {
    fn from(slugs: Vec<String>) -> Self {
        Self(slugs)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(slugs: Vec<&str>) -> Self {
        Self(slugs.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Targets {
    fn from(slugs: &[&str]) -> Self {
        Self(slugs.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(slugs: [&str; N]) -> Self {
        Self(slugs.iter().map(|s| s.to_string()).collect())
    }
}

/// A stored hook: commands for one slug and phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookListener {
    pub slug: String,
    pub phase: Phase,
    pub commands: Vec<String>,
    pub priority: i32,
    pub origin: HookOrigin,
}

#[derive(Debug, Default)]
struct PhaseSlots {
    before: Vec<HookListener>,
    after: Vec<HookListener>,
}

impl PhaseSlots {
    fn get(&self, phase: Phase) -> &[HookListener] {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    fn get_mut(&mut self, phase: Phase) -> &mut Vec<HookListener> {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }

    fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Listener storage keyed by task slug, then phase, in registration order.
#[derive(Debug, Default)]
pub struct HookRegistry {
    slots: HashMap<String, PhaseSlots>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach commands to one or more task slugs.
    ///
    /// Every target is validated before anything is stored, so a failed call
    /// leaves the registry untouched.
    pub fn attach(
        &mut self,
        targets: impl Into<Targets>,
        phase: Phase,
        payload: impl Into<HookPayload>,
        priority: i32,
        origin: HookOrigin,
    ) -> Result<()> {
        let slugs = targets.into().normalized()?;
        let payload = payload.into();
        for slug in &slugs {
            payload.validate(slug, phase)?;
        }

        for slug in slugs {
            let listener = HookListener {
                slug: slug.clone(),
                phase,
                commands: payload.commands().to_vec(),
                priority,
                origin,
            };
            self.slots
                .entry(slug)
                .or_default()
                .get_mut(phase)
                .push(listener);
        }

        Ok(())
    }

    /// All stored listeners for an exact slug and phase, in registration order.
    pub fn listeners_for(&self, slug: &str, phase: Phase) -> &[HookListener] {
        self.slots
            .get(slug.trim())
            .map(|slots| slots.get(phase))
            .unwrap_or(&[])
    }

    /// Drop configured-origin listeners, for every slug or just one.
    /// Returns how many listeners were removed.
    pub fn clear_configured(&mut self, slug: Option<&str>) -> usize {
        let mut removed = 0;

        for (key, slots) in self.slots.iter_mut() {
            if slug.is_some_and(|s| s.trim() != key.as_str()) {
                continue;
            }
            for phase in Phase::ALL {
                let listeners = slots.get_mut(phase);
                let before = listeners.len();
                listeners.retain(|l| l.origin != HookOrigin::Configured);
                removed += before - listeners.len();
            }
        }

        self.slots.retain(|_, slots| !slots.is_empty());
        removed
    }

    /// Slugs that currently have at least one listener, sorted.
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }

    pub fn len(&self) -> usize {
        self.slots
            .values()
            .map(|slots| slots.before.len() + slots.after.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commands(registry: &HookRegistry, slug: &str, phase: Phase) -> Vec<String> {
        registry
            .listeners_for(slug, phase)
            .iter()
            .flat_map(|l| l.commands.clone())
            .collect()
    }

    #[test]
    fn phase_parses_case_insensitively() {
        assert_eq!("Before".parse::<Phase>().unwrap(), Phase::Before);
        assert_eq!(" after ".parse::<Phase>().unwrap(), Phase::After);
    }

    #[test]
    fn phase_rejects_unknown_names() {
        let err = "during".parse::<Phase>().unwrap_err();
        assert_eq!(err.code.as_str(), "hook.invalid_phase");
    }

    #[test]
    fn attach_stores_listener_for_unknown_slug() {
        let mut registry = HookRegistry::new();
        registry
            .attach("setup", Phase::After, "composer install", 0, HookOrigin::Explicit)
            .unwrap();

        assert_eq!(commands(&registry, "setup", Phase::After), vec!["composer install"]);
        assert!(registry.listeners_for("setup", Phase::Before).is_empty());
    }

    #[test]
    fn attach_targets_every_slug_once() {
        let mut registry = HookRegistry::new();
        registry
            .attach(
                ["cleanup", "setup", "cleanup"],
                Phase::After,
                "composer install",
                0,
                HookOrigin::Explicit,
            )
            .unwrap();

        assert_eq!(registry.listeners_for("cleanup", Phase::After).len(), 1);
        assert_eq!(registry.listeners_for("setup", Phase::After).len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn attach_keeps_payload_order() {
        let mut registry = HookRegistry::new();
        registry
            .attach(
                "deploy",
                Phase::After,
                vec!["composer install", "bower install"],
                0,
                HookOrigin::Explicit,
            )
            .unwrap();

        let listeners = registry.listeners_for("deploy", Phase::After);
        assert_eq!(listeners.len(), 1);
        assert_eq!(listeners[0].commands, vec!["composer install", "bower install"]);
    }

    #[test]
    fn attach_trims_slugs() {
        let mut registry = HookRegistry::new();
        registry
            .attach("  deploy ", Phase::Before, "ls", 0, HookOrigin::Explicit)
            .unwrap();
        assert_eq!(commands(&registry, "deploy", Phase::Before), vec!["ls"]);
    }

    #[test]
    fn attach_rejects_blank_command_without_mutation() {
        let mut registry = HookRegistry::new();
        let err = registry
            .attach(
                ["deploy", "setup"],
                Phase::Before,
                vec!["ls", "  "],
                0,
                HookOrigin::Explicit,
            )
            .unwrap_err();

        assert_eq!(err.code.as_str(), "hook.invalid_payload");
        assert!(registry.is_empty());
    }

    #[test]
    fn attach_rejects_empty_target_list() {
        let mut registry = HookRegistry::new();
        let targets: Vec<String> = Vec::new();
        let err = registry
            .attach(targets, Phase::Before, "ls", 0, HookOrigin::Explicit)
            .unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn attach_accepts_empty_payload_list() {
        let mut registry = HookRegistry::new();
        let payload: Vec<String> = Vec::new();
        registry
            .attach("deploy", Phase::Before, payload, 0, HookOrigin::Explicit)
            .unwrap();
        assert!(commands(&registry, "deploy", Phase::Before).is_empty());
    }

    #[test]
    fn clear_configured_keeps_explicit_listeners() {
        let mut registry = HookRegistry::new();
        registry
            .attach("deploy", Phase::After, "explicit", 0, HookOrigin::Explicit)
            .unwrap();
        registry
            .attach("deploy", Phase::After, "configured", 0, HookOrigin::Configured)
            .unwrap();
        registry
            .attach("check", Phase::Before, "configured", 0, HookOrigin::Configured)
            .unwrap();

        assert_eq!(registry.clear_configured(None), 2);
        assert_eq!(commands(&registry, "deploy", Phase::After), vec!["explicit"]);
        assert_eq!(registry.slugs(), vec!["deploy"]);
    }

    #[test]
    fn clear_configured_can_target_one_slug() {
        let mut registry = HookRegistry::new();
        registry
            .attach(["deploy", "check"], Phase::Before, "ls", 0, HookOrigin::Configured)
            .unwrap();

        assert_eq!(registry.clear_configured(Some("deploy")), 1);
        assert!(registry.listeners_for("deploy", Phase::Before).is_empty());
        assert_eq!(registry.listeners_for("check", Phase::Before).len(), 1);
    }

    #[test]
    fn payload_from_value_accepts_string_and_list() {
        assert_eq!(
            HookPayload::from_value(&json!("ls")).unwrap().commands().to_vec(),
            vec!["ls"]
        );
        assert_eq!(
            HookPayload::from_value(&json!(["a", "b"]))
                .unwrap()
                .into_commands(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn payload_from_value_reports_offending_item() {
        let problem = HookPayload::from_value(&json!(["ls", 3])).unwrap_err();
        assert!(problem.contains("item 1"));

        let problem = HookPayload::from_value(&json!({"cmd": "ls"})).unwrap_err();
        assert!(problem.contains("a mapping"));
    }
}
