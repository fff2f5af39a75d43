// Command execution seam - the handler produces batches, executors run them

use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;

use crate::utils::shell;

/// Environment variable carrying the target connection into local batches.
pub const CONNECTION_ENV: &str = "LAUNCHPAD_CONNECTION";

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// Runs one ordered command batch against a connection.
///
/// A batch stops at its first failing command.
pub trait CommandExecutor {
    fn execute(&mut self, connection: &str, commands: &[String]) -> CommandOutput;
}

/// Records every batch instead of running it.
#[derive(Debug, Default)]
pub struct PretendExecutor {
    history: Vec<(String, Vec<String>)>,
}

impl PretendExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(connection, commands)` for every batch, in order.
    pub fn history(&self) -> &[(String, Vec<String>)] {
        &self.history
    }

    /// All recorded commands, flattened.
    pub fn commands(&self) -> Vec<String> {
        self.history
            .iter()
            .flat_map(|(_, commands)| commands.iter().cloned())
            .collect()
    }
}

impl CommandExecutor for PretendExecutor {
    fn execute(&mut self, connection: &str, commands: &[String]) -> CommandOutput {
        self.history
            .push((connection.to_string(), commands.to_vec()));
        CommandOutput::succeeded()
    }
}

/// Runs batches on this machine through `sh -c`.
#[derive(Debug, Default)]
pub struct LocalExecutor {
    current_dir: Option<PathBuf>,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: Some(dir.into()),
        }
    }
}

impl CommandExecutor for LocalExecutor {
    fn execute(&mut self, connection: &str, commands: &[String]) -> CommandOutput {
        let script = shell::join_batch(commands);

        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", script.as_str()]);
            cmd
        };

        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", script.as_str()]);
            cmd
        };

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.env(CONNECTION_ENV, connection);

        match cmd.output() {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("Command error: {}", e),
                success: false,
                exit_code: -1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretend_records_batches_per_connection() {
        let mut executor = PretendExecutor::new();
        executor.execute("staging", &["ls".to_string()]);
        executor.execute("production", &["pwd".to_string(), "ls".to_string()]);

        assert_eq!(executor.history().len(), 2);
        assert_eq!(executor.history()[0].0, "staging");
        assert_eq!(executor.commands(), vec!["ls", "pwd", "ls"]);
    }

    #[cfg(unix)]
    #[test]
    fn local_runs_batch_and_exposes_connection() {
        let mut executor = LocalExecutor::new();
        let output = executor.execute(
            "staging",
            &["echo one".to_string(), "echo $LAUNCHPAD_CONNECTION".to_string()],
        );
        assert!(output.success);
        assert_eq!(output.stdout, "one\nstaging\n");
    }

    #[cfg(unix)]
    #[test]
    fn local_stops_at_first_failure() {
        let mut executor = LocalExecutor::new();
        let output = executor.execute(
            "production",
            &["false".to_string(), "echo unreachable".to_string()],
        );
        assert!(!output.success);
        assert_eq!(output.exit_code, 1);
        assert!(output.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn local_honours_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let mut executor = LocalExecutor::in_dir(dir.path());
        let output = executor.execute("production", &["ls".to_string()]);
        assert!(output.stdout.contains("marker.txt"));
    }
}
