//! Subprocess agent: spawn an agent command and exchange JSONL over
//! stdin/stdout.
//!
//! Each sample is sent as one JSON line and the agent replies with one
//! JSON object carrying `output` or `error`. The subprocess is started
//! lazily on the first sample and restarted if it exits; stderr is
//! forwarded to the log.

use anyhow::anyhow;
use async_trait::async_trait;
use gradebench_core::config::AgentConfig;
use gradebench_core::harness::{Agent, AgentInput};
use serde_json::Value;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

struct AgentProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr_task: JoinHandle<()>,
}

impl AgentProcess {
    fn kill(&mut self) {
        let _ = self.child.start_kill();
        self.stderr_task.abort();
    }
}

/// An agent driven over a subprocess pipe.
///
/// The harness serializes calls (one sample at a time), but `Agent::run`
/// takes `&self`, so the process handle lives behind a mutex.
pub struct CommandAgent {
    config: AgentConfig,
    process: Mutex<Option<AgentProcess>>,
}

impl CommandAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            process: Mutex::new(None),
        }
    }

    async fn spawn(&self) -> anyhow::Result<AgentProcess> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.config.command);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.envs(self.config.env.clone());

        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| anyhow!("child missing stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("child missing stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("child missing stderr"))?;

        let agent_name = self.config.name.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    warn!(agent = %agent_name, "[stderr] {}", line);
                }
            }
        });

        Ok(AgentProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr_task,
        })
    }
}

#[async_trait]
impl Agent for CommandAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run(&self, input: AgentInput) -> anyhow::Result<String> {
        let mut guard = self.process.lock().await;
        if guard.is_none() {
            *guard = Some(self.spawn().await?);
        }
        let process = guard.as_mut().ok_or_else(|| anyhow!("agent process unavailable"))?;

        let line = serde_json::to_string(&input)? + "\n";
        process.stdin.write_all(line.as_bytes()).await?;
        process.stdin.flush().await?;

        loop {
            let mut buf = String::new();
            let n = process.stdout.read_line(&mut buf).await?;
            if n == 0 {
                // EOF: drop the process so the next sample respawns it.
                if let Some(mut dead) = guard.take() {
                    dead.kill();
                }
                return Err(anyhow!("agent process exited unexpectedly"));
            }
            if buf.trim().is_empty() {
                continue;
            }
            // Non-JSON chatter on stdout is skipped until a response object
            // arrives.
            let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&buf) else {
                continue;
            };
            if let Some(error) = map.get("error").and_then(Value::as_str) {
                return Err(anyhow!("agent error: {error}"));
            }
            if let Some(output) = map.get("output") {
                return Ok(match output {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            }
        }
    }
}

impl Drop for CommandAgent {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.process.try_lock() {
            if let Some(mut process) = guard.take() {
                process.kill();
            }
        }
    }
}
