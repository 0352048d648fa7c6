// ABOUTME: Command executor that runs docker command lines through the platform shell
// ABOUTME: Captures exit status plus merged stdout/stderr lines, with cancellation and timeout support

use crate::environment::DockhandEnvironment;
use crate::error::{DockhandError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Captured result of one finished process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Stdout and stderr lines merged in the order they arrived
    pub lines: Vec<String>,
}

impl CommandOutput {
    /// A successful result whose stdout holds the given lines
    pub fn success_with_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        Self::from_stdout_lines(true, Some(0), lines)
    }

    /// A failed result whose merged output holds the given lines
    pub fn failure_with_lines<S: AsRef<str>>(exit_code: i32, lines: &[S]) -> Self {
        Self::from_stdout_lines(false, Some(exit_code), lines)
    }

    fn from_stdout_lines<S: AsRef<str>>(success: bool, exit_code: Option<i32>, lines: &[S]) -> Self {
        let lines: Vec<String> = lines.iter().map(|l| l.as_ref().to_string()).collect();
        let stdout = lines.iter().map(|l| format!("{}\n", l)).collect();
        Self {
            success,
            exit_code,
            stdout,
            stderr: String::new(),
            lines,
        }
    }

    /// Stdout and stderr lines, equivalent to `2>&1` on the command line
    pub fn output_and_error_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn first_stdout_line(&self) -> Option<&str> {
        self.stdout.lines().next()
    }

    /// Turn an unsuccessful result into the error callers see
    pub fn into_failure(self, command: &str) -> DockhandError {
        DockhandError::command_failed(command, self.lines)
    }

    /// Pass a successful result through, fail otherwise
    pub fn ensure_success(self, command: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(self.into_failure(command))
        }
    }
}

/// Something that can run a command line to completion
#[async_trait]
pub trait RunCommands: Send + Sync {
    async fn run_command(
        &self,
        command: &str,
        working_directory: &Path,
        cancel: Option<CancellationToken>,
    ) -> Result<CommandOutput>;
}

#[cfg(test)]
mockall::mock! {
    pub Runner {}

    #[async_trait]
    impl RunCommands for Runner {
        async fn run_command(
            &self,
            command: &str,
            working_directory: &Path,
            cancel: Option<CancellationToken>,
        ) -> Result<CommandOutput>;
    }
}

/// Program and arguments a command line is dispatched through
#[derive(Debug, Clone, PartialEq)]
pub struct ShellInvocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl ShellInvocation {
    pub fn for_environment(environment: &dyn DockhandEnvironment, command: &str) -> Self {
        if environment.is_windows() {
            Self {
                program: "cmd.exe",
                args: vec!["/C".to_string(), command.replace('/', "\\")],
            }
        } else {
            Self {
                program: "/bin/bash",
                args: vec!["-c".to_string(), command.replace('\\', "/")],
            }
        }
    }

    pub fn command_line(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for ShellInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.program == "cmd.exe" {
            write!(f, "cmd.exe /C {}", self.command_line())
        } else {
            write!(
                f,
                "/bin/bash -c \"{}\"",
                self.command_line().replace('"', "\\\"")
            )
        }
    }
}

/// Runs commands as child processes of the current process
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    environment: Arc<dyn DockhandEnvironment>,
    timeout: Option<Duration>,
}

impl ShellCommandRunner {
    pub fn new(environment: Arc<dyn DockhandEnvironment>) -> Self {
        Self {
            environment,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

enum Waited {
    Exited(std::io::Result<ExitStatus>, std::io::Result<CapturedStreams>),
    Cancelled,
    TimedOut(Duration),
}

#[async_trait]
impl RunCommands for ShellCommandRunner {
    async fn run_command(
        &self,
        command: &str,
        working_directory: &Path,
        cancel: Option<CancellationToken>,
    ) -> Result<CommandOutput> {
        if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(DockhandError::Cancelled {
                command: command.to_string(),
            });
        }

        let invocation = ShellInvocation::for_environment(self.environment.as_ref(), command);
        debug!("Running {} in {}", invocation, working_directory.display());

        let mut child = Command::new(invocation.program)
            .args(&invocation.args)
            .current_dir(working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("Failed to capture stderr"))?;

        let waited = tokio::select! {
            (status, captured) = async { tokio::join!(child.wait(), capture_streams(stdout, stderr)) } => {
                Waited::Exited(status, captured)
            }
            _ = wait_for_cancel(cancel.as_ref()) => Waited::Cancelled,
            _ = wait_for_timeout(self.timeout) => Waited::TimedOut(self.timeout.unwrap_or_default()),
        };

        match waited {
            Waited::Exited(status, captured) => {
                let status = status?;
                let captured = captured?;
                debug!(
                    "Command exited with {:?} ({} lines): {}",
                    status.code(),
                    captured.lines.len(),
                    command
                );
                Ok(CommandOutput {
                    success: status.success(),
                    exit_code: status.code(),
                    stdout: captured.stdout,
                    stderr: captured.stderr,
                    lines: captured.lines,
                })
            }
            Waited::Cancelled => {
                terminate(&mut child, command).await;
                Err(DockhandError::Cancelled {
                    command: command.to_string(),
                })
            }
            Waited::TimedOut(timeout) => {
                terminate(&mut child, command).await;
                Err(DockhandError::TimedOut {
                    command: command.to_string(),
                    seconds: timeout.as_secs(),
                })
            }
        }
    }
}

async fn terminate(child: &mut tokio::process::Child, command: &str) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill process for `{}`: {}", command, e);
    }
}

async fn wait_for_cancel(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn wait_for_timeout(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

#[derive(Default)]
struct CapturedStreams {
    stdout: String,
    stderr: String,
    lines: Vec<String>,
}

async fn capture_streams(stdout: ChildStdout, stderr: ChildStderr) -> std::io::Result<CapturedStreams> {
    let mut out_lines = BufReader::new(stdout).split(b'\n');
    let mut err_lines = BufReader::new(stderr).split(b'\n');
    let mut captured = CapturedStreams::default();
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            segment = out_lines.next_segment(), if out_open => match segment? {
                Some(bytes) => {
                    let line = decode_line(&bytes);
                    captured.stdout.push_str(&line);
                    captured.stdout.push('\n');
                    captured.lines.push(line);
                }
                None => out_open = false,
            },
            segment = err_lines.next_segment(), if err_open => match segment? {
                Some(bytes) => {
                    let line = decode_line(&bytes);
                    captured.stderr.push_str(&line);
                    captured.stderr.push('\n');
                    captured.lines.push(line);
                }
                None => err_open = false,
            },
        }
    }

    Ok(captured)
}

/// Tools may print bytes that are not UTF-8; those become U+FFFD
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{StaticEnvironment, SystemEnvironment};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dispatches_through_bash_off_windows() {
        let env = StaticEnvironment::linux(4);
        let invocation = ShellInvocation::for_environment(&env, "docker build . -f dir\\Dockerfile");

        assert_eq!(invocation.program, "/bin/bash");
        assert_eq!(
            invocation.args,
            vec!["-c".to_string(), "docker build . -f dir/Dockerfile".to_string()]
        );
    }

    #[test]
    fn test_dispatches_through_cmd_on_windows() {
        let env = StaticEnvironment::windows(4);
        let invocation = ShellInvocation::for_environment(&env, "docker build . -f dir/Dockerfile");

        assert_eq!(invocation.program, "cmd.exe");
        assert_eq!(
            invocation.args,
            vec!["/C".to_string(), "docker build . -f dir\\Dockerfile".to_string()]
        );
        assert_eq!(
            invocation.to_string(),
            "cmd.exe /C docker build . -f dir\\Dockerfile"
        );
    }

    #[test]
    fn test_bash_display_escapes_quotes() {
        let env = StaticEnvironment::linux(1);
        let invocation = ShellInvocation::for_environment(&env, r#"docker run --cpus "1.5" abc"#);

        assert_eq!(
            invocation.to_string(),
            r#"/bin/bash -c "docker run --cpus \"1.5\" abc""#
        );
    }

    #[test]
    fn test_ensure_success_maps_failure() {
        let output = CommandOutput::failure_with_lines(1, &["Error: No such image: abc"]);
        let error = output.ensure_success("docker rmi abc").unwrap_err();

        assert!(error.is_command_failure());
        assert!(error.to_string().contains("No such image"));
    }

    #[test]
    fn test_first_stdout_line() {
        let output = CommandOutput::success_with_lines(&["0123456789abcdef", "second"]);
        assert_eq!(output.first_stdout_line(), Some("0123456789abcdef"));
        assert_eq!(CommandOutput::default().first_stdout_line(), None);
    }

    #[cfg(unix)]
    fn runner() -> ShellCommandRunner {
        ShellCommandRunner::new(Arc::new(SystemEnvironment))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_command_and_merges_streams() {
        let dir = tempfile::tempdir().unwrap();
        let output = runner()
            .run_command("echo out && echo err 1>&2", dir.path(), None)
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.lines.len(), 2);
        assert!(output.lines.contains(&"out".to_string()));
        assert!(output.lines.contains(&"err".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_utf8_output_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let output = runner()
            .run_command(r"printf 'ok\n\377\376\r\n' && printf 'bad \377\n' 1>&2", dir.path(), None)
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.stdout, "ok\n\u{FFFD}\u{FFFD}\n");
        assert_eq!(output.stderr, "bad \u{FFFD}\n");
        assert_eq!(output.lines.len(), 3);
    }

    #[test]
    fn test_decode_line_strips_carriage_return() {
        assert_eq!(decode_line(b"id\r"), "id");
        assert_eq!(decode_line(b"caf\xc3\xa9"), "café");
        assert_eq!(decode_line(b"\xff"), "\u{FFFD}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = runner().run_command("exit 3", dir.path(), None).await.unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let output = runner().run_command("ls", dir.path(), None).await.unwrap();

        assert!(output.lines.contains(&"marker.txt".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = runner().run_command("sleep 5", dir.path(), Some(token)).await;

        assert!(matches!(result, Err(DockhandError::Cancelled { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_already_cancelled_token_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result = runner()
            .run_command("touch should_not_exist", dir.path(), Some(token))
            .await;

        assert!(matches!(result, Err(DockhandError::Cancelled { .. })));
        assert!(!dir.path().join("should_not_exist").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let result = runner()
            .with_timeout(Some(Duration::from_millis(100)))
            .run_command("sleep 5", dir.path(), None)
            .await;

        assert!(matches!(result, Err(DockhandError::TimedOut { .. })));
    }
}
