// ABOUTME: Common test utilities for docker client integration tests
// ABOUTME: Provides a scripted command runner that records every invocation

use async_trait::async_trait;
use dockhand::{CommandOutput, DockerClient, Result, RunCommands, StaticEnvironment};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Answers commands from per-command queues of canned outputs
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    invocations: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    /// Queue an output for the next run of `command`
    pub fn respond(&self, command: impl Into<String>, output: CommandOutput) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.into())
            .or_default()
            .push_back(output);
        self
    }

    #[allow(dead_code)]
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

#[async_trait]
impl RunCommands for ScriptedRunner {
    async fn run_command(
        &self,
        command: &str,
        _working_directory: &Path,
        _cancel: Option<CancellationToken>,
    ) -> Result<CommandOutput> {
        self.invocations.lock().unwrap().push(command.to_string());

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(command)
            .and_then(VecDeque::pop_front);

        Ok(scripted.unwrap_or_else(|| {
            CommandOutput::failure_with_lines(127, &[format!("unscripted command: {}", command)])
        }))
    }
}

/// Client wired to a scripted runner inside a temporary working directory
pub struct TestContext {
    pub client: DockerClient,
    pub runner: Arc<ScriptedRunner>,
    pub _temp_dir: TempDir,
}

pub fn setup_client() -> TestContext {
    let temp_dir = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::default());

    let client = DockerClient::with_runner(
        temp_dir.path(),
        runner.clone(),
        Arc::new(StaticEnvironment::linux(4)),
    )
    .unwrap();

    TestContext {
        client,
        runner,
        _temp_dir: temp_dir,
    }
}

#[allow(dead_code)]
pub fn image_line(repository: &str, tag: &str, id: &str) -> String {
    format!(
        r#"{{"repository":"{}","tag":"{}","id":"{}"}}"#,
        repository, tag, id
    )
}

#[allow(dead_code)]
pub fn stats_line(cpu: &str, mem: &str) -> String {
    format!(r#"{{"cpu":"{}","mem":"{}"}}"#, cpu, mem)
}
