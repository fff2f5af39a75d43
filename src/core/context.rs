use serde::Serialize;

use crate::config::DeployConfig;
use crate::error::Result;
use crate::utils::validation;

/// Connection used when configuration names none.
pub const DEFAULT_CONNECTION: &str = "production";

// === Execution Context (active connection + stage) ===

/// The connection and optional stage a run currently targets.
///
/// Owned by whoever drives a run and passed explicitly to projection and
/// resolution. Switching values never re-projects configured hooks by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
}

impl ExecutionContext {
    pub fn new(connection: &str) -> Result<Self> {
        let connection = validation::require_non_empty(
            connection,
            "connection",
            "Connection cannot be empty",
        )?;
        Ok(Self {
            connection: connection.to_string(),
            stage: None,
        })
    }

    /// Initial context from configuration.
    ///
    /// Connection: `default`, else the first declared connection, else
    /// `production`. Stage: `stage` when set.
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        let connection = config
            .default
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| config.connections.keys().next().map(String::as_str))
            .unwrap_or(DEFAULT_CONNECTION);

        let mut context = Self::new(connection)?;
        context.set_stage(config.stage.as_deref());
        Ok(context)
    }

    pub fn active_connection(&self) -> &str {
        &self.connection
    }

    pub fn active_stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn set_connection(&mut self, connection: &str) -> Result<()> {
        let connection = validation::require_non_empty(
            connection,
            "connection",
            "Connection cannot be empty",
        )?;
        self.connection = connection.to_string();
        Ok(())
    }

    /// Set or clear the active stage. A blank stage clears it.
    pub fn set_stage(&mut self, stage: Option<&str>) {
        self.stage = stage
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    /// Human label like `staging` or `staging/qa`.
    pub fn label(&self) -> String {
        match &self.stage {
            Some(stage) => format!("{}/{}", self.connection, stage),
            None => self.connection.clone(),
        }
    }
}
