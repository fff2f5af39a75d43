use crate::error::{Error, Result};
use crate::hooks::{value_kind, HookPayload};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File names tried, in order, when no config path is given.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "launchpad.yml",
    "launchpad.yaml",
    "launchpad.json",
    "launchpad.toml",
];

// ============================================================================
// Configuration model
// ============================================================================

/// Deployment configuration: three hook scopes plus startup defaults.
///
/// ```yaml
/// default: production
/// root: /home/www/app
/// hooks:
///   before: { deploy: ["php artisan down"] }
/// connections:
///   staging:
///     hooks:
///       after: { deploy: ["npm install"] }
/// stages:
///   qa:
///     hooks:
///       before: { check: "ls" }
/// tasks:
///   foobar: ["ls", "ls"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Initially active connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Initially active stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Application root on the target, holding `releases/`, `current` and
    /// `shared/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Global scope, always eligible.
    #[serde(default, skip_serializing_if = "HookTable::is_empty")]
    pub hooks: HookTable,

    #[serde(
        default,
        deserialize_with = "deserialize_scopes",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub connections: BTreeMap<String, ScopeConfig>,

    #[serde(
        default,
        deserialize_with = "deserialize_scopes",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub stages: BTreeMap<String, ScopeConfig>,

    /// Inline tasks: slug to command or command list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<String, Value>,
}

/// Settings attached to one connection or stage.
///
/// Held raw: an entry that is not a mapping is reported by the loader under
/// its own path instead of failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeConfig(Value);

impl ScopeConfig {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn with_hooks(hooks: Value) -> Self {
        Self(serde_json::json!({ "hooks": hooks }))
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// The entry's hook table. An empty entry has no hooks; anything other
    /// than a mapping is an error naming what was found.
    pub fn hooks(&self) -> std::result::Result<HookTable, String> {
        match &self.0 {
            Value::Null => Ok(HookTable::default()),
            Value::Object(entry) => Ok(HookTable(
                entry.get("hooks").cloned().unwrap_or(Value::Null),
            )),
            other => Err(format!("expected a mapping, got {}", value_kind(other))),
        }
    }
}

/// `phase -> task slug -> commands` table.
///
/// Kept as raw JSON so a malformed leaf can be reported and skipped during
/// projection instead of failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookTable(Value);

impl HookTable {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// The `connections`/`stages` key itself may be left empty.
fn deserialize_scopes<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, ScopeConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, ScopeConfig>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

impl DeployConfig {
    /// Inline tasks declared under `tasks`, in slug order.
    pub fn inline_tasks(&self) -> Result<Vec<(String, Vec<String>)>> {
        self.tasks
            .iter()
            .map(|(slug, value)| {
                HookPayload::from_value(value)
                    .map(|payload| (slug.clone(), payload.into_commands()))
                    .map_err(|problem| {
                        Error::config_invalid_value(
                            format!("tasks.{}", slug),
                            Some(value.to_string()),
                            problem,
                        )
                    })
            })
            .collect()
    }

    pub fn stage_ids(&self) -> Vec<String> {
        self.stages.keys().cloned().collect()
    }
}

// ============================================================================
// Loading
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yml") | Some("yaml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            other => Err(Error::validation_invalid_argument(
                "config",
                format!(
                    "Unsupported config extension '{}', expected .json, .yml, .yaml or .toml",
                    other.unwrap_or("")
                ),
                Some(path.display().to_string()),
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }
}

/// Parse configuration text. `source` names the origin in error details.
pub fn parse(content: &str, format: ConfigFormat, source: &str) -> Result<DeployConfig> {
    let parsed: std::result::Result<DeployConfig, String> = match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|error| Error::config_parse_failed(source, format.as_str(), error))
}

/// Load a configuration file. `~` is expanded.
pub fn load(path: &str) -> Result<DeployConfig> {
    let expanded = PathBuf::from(shellexpand::tilde(path).to_string());
    let format = ConfigFormat::from_path(&expanded)?;
    let content = std::fs::read_to_string(&expanded).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("read config {}", expanded.display())),
        )
    })?;

    parse(&content, format, &expanded.display().to_string())
}

/// First known config file inside `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Load the explicit path, else a discovered file in `dir`, else defaults.
/// Returns the path that was read, if any.
pub fn load_or_default(path: Option<&str>, dir: &Path) -> Result<(DeployConfig, Option<PathBuf>)> {
    if let Some(path) = path {
        let config = load(path)?;
        return Ok((config, Some(PathBuf::from(shellexpand::tilde(path).to_string()))));
    }

    match discover(dir) {
        Some(found) => {
            let config = load(&found.to_string_lossy())?;
            Ok((config, Some(found)))
        }
        None => Ok((DeployConfig::default(), None)),
    }
}
