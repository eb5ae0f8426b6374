//! Subprocess backend: pipes the prompt to any CLI and reads its stdout.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{Generator, GeneratorOutput};
use crate::prompts::Prompt;

/// Generator that runs an external program per prompt
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Spawn the program, write `input` to stdin, and collect stdout
    async fn run(&self, input: &str, step_timeout: Duration) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn generator command '{}'", self.program))?;

        // Feed stdin while stdout drains; a child that echoes a large prompt
        // would otherwise block on a full stdout pipe
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A program that exits without reading closes the pipe early;
                // its exit status is reported below
                match stdin.write_all(input.as_bytes()).await {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
                // Dropping stdin signals EOF
            }
            Ok(())
        };

        let (written, output) = timeout(step_timeout, async {
            tokio::join!(feed, child.wait_with_output())
        })
        .await
        .with_context(|| {
            format!(
                "Generator command '{}' timed out after {:?}",
                self.program, step_timeout
            )
        })?;

        written.context("Failed to write prompt to generator stdin")?;
        let output =
            output.with_context(|| format!("Failed to wait for generator command '{}'", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Generator command '{}' failed with exit code {}: {}",
                self.program,
                exit_code,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("Generator output is not valid UTF-8")
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    fn name(&self) -> &str {
        "command"
    }

    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<GeneratorOutput> {
        let content = self.run(&prompt.to_plain_text(), timeout).await?;
        Ok(GeneratorOutput::new(content))
    }

    async fn health_check(&self) -> Result<()> {
        which_program(&self.program)
            .with_context(|| format!("Generator command '{}' is not available", self.program))?;
        Ok(())
    }
}

/// Resolve a program name against PATH (or accept an existing path)
fn which_program(program: &str) -> Result<std::path::PathBuf> {
    let path = std::path::Path::new(program);
    if path.components().count() > 1 {
        anyhow::ensure!(path.is_file(), "no such file: {}", program);
        return Ok(path.to_path_buf());
    }

    let search = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
        .with_context(|| format!("'{}' not found on PATH", program))
}
