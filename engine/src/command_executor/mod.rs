use std::collections::HashSet;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Default upper bound for a single helper command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// CommandExecutor runs local helper programs with allowlist validation,
/// shell injection prevention and a hard timeout.
///
/// # Security Features
/// - Allowlist-based command validation
/// - Shell invocation rejection (sh, bash, zsh, fish)
/// - Shell metacharacter detection in arguments
/// - execve-style execution (no shell)
/// - stdin set to null, stdout/stderr piped
/// - child killed when the timeout elapses
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    allowlist: HashSet<String>,
    timeout: Duration,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command not allowed: {0}")]
    CommandNotAllowed(String),

    #[error("Shell invocation attempt detected")]
    ShellInjectionAttempt,

    #[error("Shell metacharacters detected in argument: {0}")]
    ShellMetacharactersDetected(String),

    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Command exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Command execution failed: {0}")]
    ExecutionFailed(#[from] std::io::Error),
}

impl CommandExecutor {
    /// Creates a CommandExecutor that only allows the editor (`code`) and
    /// the package runner (`npx`).
    pub fn new() -> Self {
        Self::with_allowlist(vec!["code".to_string(), "npx".to_string()])
    }

    /// Creates a CommandExecutor with a custom allowlist.
    pub fn with_allowlist(commands: Vec<String>) -> Self {
        Self {
            allowlist: commands.into_iter().collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validates a command through all security gates without executing it.
    pub fn validate(&self, command: &str, args: &[String]) -> Result<(), CommandError> {
        // Gate 1: Reject shell invocation patterns
        if matches!(command, "sh" | "bash" | "zsh" | "fish") {
            return Err(CommandError::ShellInjectionAttempt);
        }

        // Gate 2: Validate command is in allowlist
        if !self.allowlist.contains(command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        // Gate 3: Check for shell metacharacters in arguments
        for arg in args {
            if has_shell_metacharacters(arg) {
                return Err(CommandError::ShellMetacharactersDetected(arg.clone()));
            }
        }

        Ok(())
    }

    /// Executes a command after validation and returns its raw output,
    /// whatever the exit status.
    pub async fn execute(&self, command: &str, args: &[String]) -> Result<Output, CommandError> {
        self.validate(command, args)?;

        tracing::debug!(command, ?args, "Running helper command");

        let child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CommandError::NotFound(command.to_string()))
            }
            Ok(Err(e)) => Err(CommandError::ExecutionFailed(e)),
            Err(_) => {
                tracing::warn!(command, timeout_secs = self.timeout.as_secs(), "Helper command timed out");
                Err(CommandError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    /// Executes a command and returns its stdout, treating a non-zero exit
    /// status as an error.
    pub async fn execute_stdout(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<Vec<u8>, CommandError> {
        let output = self.execute(command, args).await?;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks if a string contains shell metacharacters.
///
/// Detects: | & ; ' " ` \n < > $
fn has_shell_metacharacters(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '|' | '&' | ';' | '\'' | '"' | '`' | '\n' | '<' | '>' | '$'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist() {
        let executor = CommandExecutor::new();
        assert!(executor.validate("code", &["-s".to_string()]).is_ok());
        assert!(executor
            .validate("npx", &["-y".to_string(), "prettier@3.4.2".to_string()])
            .is_ok());
        assert!(matches!(
            executor.validate("rm", &["-rf".to_string()]),
            Err(CommandError::CommandNotAllowed(_))
        ));
    }

    #[test]
    fn test_shell_invocation_rejected() {
        let executor = CommandExecutor::with_allowlist(vec!["bash".to_string()]);
        let result = executor.validate("bash", &["-c".to_string(), "echo hi".to_string()]);
        assert!(matches!(result, Err(CommandError::ShellInjectionAttempt)));
    }

    #[test]
    fn test_shell_metacharacters_detected() {
        let executor = CommandExecutor::new();

        for arg in ["README.md | cat", "; rm -rf /", "`whoami`", "$(id)"] {
            let result = executor.validate("npx", &[arg.to_string()]);
            assert!(matches!(
                result,
                Err(CommandError::ShellMetacharactersDetected(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_stdout_captured() {
        let executor = CommandExecutor::with_allowlist(vec!["echo".to_string()]);
        let stdout = executor
            .execute_stdout("echo", &["test".to_string()])
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&stdout), "test\n");
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_found() {
        let executor =
            CommandExecutor::with_allowlist(vec!["definitely-not-a-real-binary-xyz".to_string()]);
        let result = executor
            .execute("definitely-not-a-real-binary-xyz", &[])
            .await;
        assert!(matches!(result, Err(CommandError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let executor = CommandExecutor::with_allowlist(vec!["sleep".to_string()])
            .with_timeout(Duration::from_millis(200));
        let result = executor.execute("sleep", &["5".to_string()]).await;
        assert!(matches!(result, Err(CommandError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let executor = CommandExecutor::with_allowlist(vec!["false".to_string()]);
        let result = executor.execute_stdout("false", &[]).await;
        assert!(matches!(result, Err(CommandError::NonZeroExit { .. })));
    }
}
