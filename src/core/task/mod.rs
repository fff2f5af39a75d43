//! Task definitions: the slug to implementation store.
//!
//! A task is either native (a type implementing [`NativeTask`]) or inline (a
//! command list or a closure). Slugs are bound once; rebinding to a different
//! implementation needs an explicit override.

pub mod builtin;
pub mod inline;

pub use inline::{InlineTask, ReleasePaths, TaskClosure, TaskRun};

use crate::error::{Error, Result};
use crate::hooks::{HookPayload, Phase};
use crate::utils::validation;
use heck::ToKebabCase;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A task implemented in code.
pub trait NativeTask: Send + Sync {
    fn slug(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Fully-qualified type name, used to resolve `TaskRef::Type`.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Commands this task always runs before/after itself. They lead every
    /// resolved listener list and ignore priorities.
    fn listeners(&self, _phase: Phase) -> Vec<String> {
        Vec::new()
    }

    fn execute(&self, run: &mut TaskRun) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Native,
    Inline,
}

/// Implementation bound to a slug.
#[derive(Clone)]
pub enum TaskDefinition {
    Native(Arc<dyn NativeTask>),
    Inline(InlineTask),
}

impl TaskDefinition {
    pub fn native(task: impl NativeTask + 'static) -> Self {
        TaskDefinition::Native(Arc::new(task))
    }

    pub fn commands(commands: impl Into<HookPayload>) -> Self {
        TaskDefinition::Inline(InlineTask::commands(commands))
    }

    pub fn closure<F>(closure: F) -> Self
    where
        F: Fn(&mut TaskRun) -> Result<()> + Send + Sync + 'static,
    {
        TaskDefinition::Inline(InlineTask::closure(closure))
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            TaskDefinition::Native(_) => TaskKind::Native,
            TaskDefinition::Inline(_) => TaskKind::Inline,
        }
    }

    pub fn description(&self) -> String {
        match self {
            TaskDefinition::Native(task) => task.description().to_string(),
            TaskDefinition::Inline(inline) => inline.describe(),
        }
    }

    /// Intrinsic listeners; inline tasks declare none.
    pub fn listeners(&self, phase: Phase) -> Vec<String> {
        match self {
            TaskDefinition::Native(task) => task.listeners(phase),
            TaskDefinition::Inline(_) => Vec::new(),
        }
    }

    pub fn execute(&self, run: &mut TaskRun) -> Result<()> {
        match self {
            TaskDefinition::Native(task) => task.execute(run),
            TaskDefinition::Inline(inline) => inline.execute(run),
        }
    }

    fn same_as(&self, other: &TaskDefinition) -> bool {
        match (self, other) {
            (TaskDefinition::Native(a), TaskDefinition::Native(b)) => Arc::ptr_eq(a, b),
            (TaskDefinition::Inline(a), TaskDefinition::Inline(b)) => a.same_as(b),
            _ => false,
        }
    }

    fn identity(&self) -> String {
        match self {
            TaskDefinition::Native(task) => format!("native {}", task.type_name()),
            TaskDefinition::Inline(inline) => format!("inline {}", inline.describe()),
        }
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskDefinition::Native(task) => f
                .debug_tuple("Native")
                .field(&task.type_name())
                .finish(),
            TaskDefinition::Inline(inline) => f.debug_tuple("Inline").field(inline).finish(),
        }
    }
}

/// How a caller names the task it wants.
#[derive(Debug, Clone)]
pub enum TaskRef {
    /// A registered slug, e.g. `deploy`.
    Slug(String),
    /// A native type name, e.g. `app::tasks::MigrateDatabase`.
    Type(String),
    /// An inline implementation to register on the fly. Without a name a
    /// slug like `inline-1a2b3c4d` is generated.
    Inline {
        name: Option<String>,
        task: InlineTask,
    },
}

impl TaskRef {
    pub fn of_type(type_name: impl Into<String>) -> Self {
        TaskRef::Type(type_name.into())
    }

    pub fn inline(name: Option<&str>, task: InlineTask) -> Self {
        TaskRef::Inline {
            name: name.map(str::to_string),
            task,
        }
    }
}

impl From<&str> for TaskRef {
    fn from(slug: &str) -> Self {
        TaskRef::Slug(slug.to_string())
    }
}

impl From<String> for TaskRef {
    fn from(slug: String) -> Self {
        TaskRef::Slug(slug)
    }
}

impl From<&String> for TaskRef {
    fn from(slug: &String) -> Self {
        TaskRef::Slug(slug.clone())
    }
}

/// Listing entry for a registered task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub slug: String,
    pub kind: TaskKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `slug` to `definition`.
    ///
    /// Registering the identical implementation again is a no-op; a different
    /// one fails with `task.duplicate`.
    pub fn register(&mut self, slug: &str, definition: TaskDefinition) -> Result<()> {
        let slug = validation::require_slug(slug, "slug")?;
        validate_definition(slug, &definition)?;

        if let Some(existing) = self.tasks.get(slug) {
            if existing.same_as(&definition) {
                return Ok(());
            }
            return Err(Error::task_duplicate(
                slug,
                existing.identity(),
                definition.identity(),
            ));
        }

        self.tasks.insert(slug.to_string(), definition);
        Ok(())
    }

    /// Bind `slug` to `definition`, replacing any existing binding.
    pub fn register_override(&mut self, slug: &str, definition: TaskDefinition) -> Result<()> {
        let slug = validation::require_slug(slug, "slug")?;
        validate_definition(slug, &definition)?;

        if let Some(previous) = self.tasks.insert(slug.to_string(), definition) {
            log_status!("tasks", "Overrode '{}' ({})", slug, previous.identity());
        }
        Ok(())
    }

    /// Resolve a reference to its slug and implementation, registering
    /// inline references first.
    pub fn resolve(&mut self, reference: TaskRef) -> Result<(String, TaskDefinition)> {
        match reference {
            TaskRef::Slug(slug) => {
                let slug = slug.trim();
                self.get(slug)
                    .cloned()
                    .map(|definition| (slug.to_string(), definition))
                    .ok_or_else(|| Error::task_not_found(slug, self.slugs()))
            }
            TaskRef::Type(type_name) => self.resolve_type(&type_name),
            TaskRef::Inline { name, task } => {
                let slug = match name {
                    Some(name) => name,
                    None => anonymous_slug(),
                };
                let definition = TaskDefinition::Inline(task);
                self.register(&slug, definition.clone())?;
                Ok((slug.trim().to_string(), definition))
            }
        }
    }

    fn resolve_type(&self, type_name: &str) -> Result<(String, TaskDefinition)> {
        let type_name = type_name.trim();
        let suffix = format!("::{}", type_name);

        let by_type = self.tasks.iter().find(|(_, definition)| match definition {
            TaskDefinition::Native(task) => {
                task.type_name() == type_name || task.type_name().ends_with(&suffix)
            }
            TaskDefinition::Inline(_) => false,
        });
        if let Some((slug, definition)) = by_type {
            return Ok((slug.clone(), definition.clone()));
        }

        let slug = slug_for_type(type_name);
        self.get(&slug)
            .cloned()
            .map(|definition| (slug, definition))
            .ok_or_else(|| Error::task_not_found(type_name, self.slugs()))
    }

    pub fn get(&self, slug: &str) -> Option<&TaskDefinition> {
        self.tasks.get(slug.trim())
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.tasks.contains_key(slug.trim())
    }

    /// Intrinsic listeners declared by the task bound to `slug`; empty when
    /// the slug is unbound.
    pub fn intrinsic_listeners(&self, slug: &str, phase: Phase) -> Vec<String> {
        self.get(slug)
            .map(|definition| definition.listeners(phase))
            .unwrap_or_default()
    }

    pub fn slugs(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn summaries(&self) -> Vec<TaskSummary> {
        self.tasks
            .iter()
            .map(|(slug, definition)| TaskSummary {
                slug: slug.clone(),
                kind: definition.kind(),
                description: definition.description(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn validate_definition(slug: &str, definition: &TaskDefinition) -> Result<()> {
    if let TaskDefinition::Inline(InlineTask::Commands(commands)) = definition {
        if let Some(index) = commands.iter().position(|c| c.trim().is_empty()) {
            return Err(Error::validation_invalid_argument(
                "commands",
                format!("Command {} of inline task '{}' is blank", index, slug),
                Some(slug.to_string()),
                None,
            ));
        }
    }
    Ok(())
}

/// `app::tasks::MigrateDatabase` -> `migrate-database`.
pub fn slug_for_type(type_name: &str) -> String {
    type_name
        .rsplit("::")
        .next()
        .unwrap_or(type_name)
        .to_kebab_case()
}

fn anonymous_slug() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("inline-{}", &id[..8])
}
