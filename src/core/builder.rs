use crate::error::Result;
use crate::task::{ReleasePaths, TaskDefinition, TaskRef, TaskRun, TaskStore};

pub use crate::task::TaskKind;

/// A resolved task ready to produce its command sequence.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    slug: String,
    definition: TaskDefinition,
}

impl TaskHandle {
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn kind(&self) -> TaskKind {
        self.definition.kind()
    }

    pub fn is_inline(&self) -> bool {
        self.kind() == TaskKind::Inline
    }

    pub fn description(&self) -> String {
        self.definition.description()
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    /// Commands the task body produces for one release.
    ///
    /// Inline command lists come back prefixed with `cd <release path>`.
    pub fn commands(&self, paths: &ReleasePaths) -> Result<Vec<String>> {
        let mut run = TaskRun::new(&self.slug, paths);
        self.definition.execute(&mut run)?;
        Ok(run.into_commands())
    }
}

/// Resolve `reference` and wrap it in a handle. Inline references are
/// registered on the way.
pub fn build(store: &mut TaskStore, reference: impl Into<TaskRef>) -> Result<TaskHandle> {
    let (slug, definition) = store.resolve(reference.into())?;
    Ok(TaskHandle { slug, definition })
}
