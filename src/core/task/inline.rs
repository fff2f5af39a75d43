use crate::error::Result;
use crate::hooks::HookPayload;
use crate::utils::shell;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub type TaskClosure = Arc<dyn Fn(&mut TaskRun) -> Result<()> + Send + Sync>;

/// Task body supplied at registration time instead of as a native type.
#[derive(Clone)]
pub enum InlineTask {
    /// Commands run from inside the current release directory.
    Commands(Vec<String>),
    Closure(TaskClosure),
}

impl InlineTask {
    pub fn commands(commands: impl Into<HookPayload>) -> Self {
        InlineTask::Commands(commands.into().into_commands())
    }

    pub fn closure<F>(closure: F) -> Self
    where
        F: Fn(&mut TaskRun) -> Result<()> + Send + Sync + 'static,
    {
        InlineTask::Closure(Arc::new(closure))
    }

    pub fn execute(&self, run: &mut TaskRun) -> Result<()> {
        match self {
            InlineTask::Commands(commands) => {
                run.run_for_current_release(commands.as_slice());
                Ok(())
            }
            InlineTask::Closure(closure) => closure(run),
        }
    }

    pub(crate) fn same_as(&self, other: &InlineTask) -> bool {
        match (self, other) {
            (InlineTask::Commands(a), InlineTask::Commands(b)) => a == b,
            (InlineTask::Closure(a), InlineTask::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            InlineTask::Commands(commands) => format!("commands [{}]", commands.join(", ")),
            InlineTask::Closure(_) => "closure".to_string(),
        }
    }
}

impl fmt::Debug for InlineTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineTask::Commands(commands) => f.debug_tuple("Commands").field(commands).finish(),
            InlineTask::Closure(_) => f.write_str("Closure(..)"),
        }
    }
}

// === Release layout ===

/// Remote directory layout for one release.
///
/// `{root}/releases/{release}` holds the release, `{root}/current` points at
/// the live one and `{root}/shared` keeps files across releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePaths {
    root: String,
    release: String,
}

impl ReleasePaths {
    pub fn new(root: &str, release: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
            release: release.to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn releases_dir(&self) -> String {
        format!("{}/releases", self.root)
    }

    pub fn release_path(&self) -> String {
        format!("{}/releases/{}", self.root, self.release)
    }

    pub fn current_path(&self) -> String {
        format!("{}/current", self.root)
    }

    pub fn shared_path(&self) -> String {
        format!("{}/shared", self.root)
    }
}

// === Task run ===

/// Collects the commands a task body asks for.
///
/// Nothing is executed here; the handler hands the collected batch to an
/// executor.
#[derive(Debug)]
pub struct TaskRun<'a> {
    slug: &'a str,
    paths: &'a ReleasePaths,
    commands: Vec<String>,
}

impl<'a> TaskRun<'a> {
    pub fn new(slug: &'a str, paths: &'a ReleasePaths) -> Self {
        Self {
            slug,
            paths,
            commands: Vec::new(),
        }
    }

    pub fn slug(&self) -> &str {
        self.slug
    }

    pub fn paths(&self) -> &ReleasePaths {
        self.paths
    }

    pub fn run(&mut self, commands: impl Into<HookPayload>) {
        self.commands.extend(commands.into().into_commands());
    }

    /// Queue commands prefixed with `cd` into the release directory.
    pub fn run_for_current_release(&mut self, commands: impl Into<HookPayload>) {
        self.commands.push(format!(
            "cd {}",
            shell::quote_arg(&self.paths.release_path())
        ));
        self.run(commands);
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_paths_layout() {
        let paths = ReleasePaths::new("/var/www/app/", "20240101120000");
        assert_eq!(paths.releases_dir(), "/var/www/app/releases");
        assert_eq!(paths.release_path(), "/var/www/app/releases/20240101120000");
        assert_eq!(paths.current_path(), "/var/www/app/current");
        assert_eq!(paths.shared_path(), "/var/www/app/shared");
    }

    #[test]
    fn inline_commands_run_from_release_directory() {
        let paths = ReleasePaths::new("/var/www/app", "10000000000000");
        let mut run = TaskRun::new("foobar", &paths);

        InlineTask::commands(["ls", "ls"]).execute(&mut run).unwrap();

        assert_eq!(
            run.into_commands(),
            vec!["cd /var/www/app/releases/10000000000000", "ls", "ls"]
        );
    }

    #[test]
    fn closure_receives_run() {
        let paths = ReleasePaths::new("/srv", "1");
        let mut run = TaskRun::new("whoami", &paths);

        InlineTask::closure(|run| {
            let cmd = format!("echo {}", run.slug());
            run.run(cmd);
            Ok(())
        })
        .execute(&mut run)
        .unwrap();

        assert_eq!(run.commands(), ["echo whoami".to_string()]);
    }

    #[test]
    fn release_dir_with_spaces_is_quoted() {
        let paths = ReleasePaths::new("/srv/my app", "1");
        let mut run = TaskRun::new("foobar", &paths);
        run.run_for_current_release("ls");
        assert_eq!(run.commands()[0], "cd '/srv/my app/releases/1'");
    }
}
