//! Native tasks registered on every handler.
//!
//! They only emit shell commands against the release layout; source transfer
//! and dependency installation are left to hooks.

use super::{NativeTask, TaskDefinition, TaskRun, TaskStore};
use crate::error::Result;
use crate::utils::shell::quote_arg;

/// Releases kept by `cleanup`, including the live one.
pub const DEFAULT_KEEP_RELEASES: usize = 4;

pub struct Check;

impl NativeTask for Check {
    fn slug(&self) -> &str {
        "check"
    }

    fn description(&self) -> &str {
        "Check the server can receive releases"
    }

    fn execute(&self, run: &mut TaskRun) -> Result<()> {
        let root = quote_arg(run.paths().root());
        run.run(vec![
            "command -v git".to_string(),
            format!("test -d {}", root),
            format!("test -w {}", root),
        ]);
        Ok(())
    }
}

pub struct Setup;

impl NativeTask for Setup {
    fn slug(&self) -> &str {
        "setup"
    }

    fn description(&self) -> &str {
        "Create the releases and shared directories"
    }

    fn execute(&self, run: &mut TaskRun) -> Result<()> {
        let releases = quote_arg(&run.paths().releases_dir());
        let shared = quote_arg(&run.paths().shared_path());
        run.run(vec![
            format!("mkdir -p {}", releases),
            format!("mkdir -p {}", shared),
        ]);
        Ok(())
    }
}

pub struct Deploy;

impl NativeTask for Deploy {
    fn slug(&self) -> &str {
        "deploy"
    }

    fn description(&self) -> &str {
        "Create a new release and make it current"
    }

    fn execute(&self, run: &mut TaskRun) -> Result<()> {
        let release = quote_arg(&run.paths().release_path());
        let current = quote_arg(&run.paths().current_path());
        run.run(vec![
            format!("mkdir -p {}", release),
            format!("ln -sfn {} {}", release, current),
        ]);
        Ok(())
    }
}

pub struct Cleanup {
    pub keep: usize,
}

impl Default for Cleanup {
    fn default() -> Self {
        Self {
            keep: DEFAULT_KEEP_RELEASES,
        }
    }
}

impl NativeTask for Cleanup {
    fn slug(&self) -> &str {
        "cleanup"
    }

    fn description(&self) -> &str {
        "Remove old releases"
    }

    fn execute(&self, run: &mut TaskRun) -> Result<()> {
        let releases = quote_arg(&run.paths().releases_dir());
        run.run(format!(
            "cd {} && ls -1t | tail -n +{} | xargs -r rm -rf",
            releases,
            self.keep.max(1) + 1
        ));
        Ok(())
    }
}

pub struct Rollback;

impl NativeTask for Rollback {
    fn slug(&self) -> &str {
        "rollback"
    }

    fn description(&self) -> &str {
        "Point current at the previous release"
    }

    /// Fails without touching `current` when there is no previous release.
    fn execute(&self, run: &mut TaskRun) -> Result<()> {
        let releases = quote_arg(&run.paths().releases_dir());
        let current = quote_arg(&run.paths().current_path());
        run.run(format!(
            "cd {} && prev=$(ls -1t | sed -n 2p) && [ -n \"$prev\" ] && ln -sfn \"$(pwd)/$prev\" {}",
            releases, current
        ));
        Ok(())
    }
}

pub struct Teardown;

impl NativeTask for Teardown {
    fn slug(&self) -> &str {
        "teardown"
    }

    fn description(&self) -> &str {
        "Remove the application root from the server"
    }

    fn execute(&self, run: &mut TaskRun) -> Result<()> {
        let root = quote_arg(run.paths().root());
        run.run(format!("rm -rf {}", root));
        Ok(())
    }
}

/// Register every built-in task under its own slug.
pub fn register_builtins(store: &mut TaskStore) -> Result<()> {
    let builtins = [
        TaskDefinition::native(Check),
        TaskDefinition::native(Setup),
        TaskDefinition::native(Deploy),
        TaskDefinition::native(Cleanup::default()),
        TaskDefinition::native(Rollback),
        TaskDefinition::native(Teardown),
    ];

    for definition in builtins {
        let slug = match &definition {
            TaskDefinition::Native(task) => task.slug().to_string(),
            TaskDefinition::Inline(_) => continue,
        };
        store.register(&slug, definition)?;
    }
    Ok(())
}
