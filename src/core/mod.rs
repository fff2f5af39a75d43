// Public modules
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handler;
pub mod hooks;
pub mod listeners;
pub mod loader;
pub mod queue;
pub mod task;

// Re-export common types for convenience
pub use builder::{TaskHandle, TaskKind};
pub use config::DeployConfig;
pub use context::ExecutionContext;
pub use error::{Error, ErrorCode, Result};
pub use executor::{CommandExecutor, CommandOutput, LocalExecutor, PretendExecutor};
pub use handler::{RunReport, TaskPlan, TasksHandler};
pub use hooks::{HookOrigin, HookPayload, HookRegistry, Phase, Targets};
pub use listeners::{ListenerRecord, Listeners};
pub use loader::{HookScope, ProjectionReport};
pub use task::{NativeTask, ReleasePaths, TaskDefinition, TaskRef, TaskRun, TaskStore};
