//! Configuration for clausealign.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CLAUSEALIGN_BACKEND, CLAUSEALIGN_MODEL, CLAUSEALIGN_BASE_URL)
//! 2. Project config file (.clausealign/config.yaml)
//! 3. User config file (<config dir>/clausealign/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .clausealign/config.yaml
//! - A relative generator command path is relative to the project root
//!   (the directory holding .clausealign/)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::adapters::{CommandGenerator, Generator, OpenAiGenerator};
use crate::anchor::LocatorConfig;
use crate::core::SafetyLimits;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".clausealign";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub matching: LocatorConfig,
    #[serde(default)]
    pub safety: SafetyLimits,
}

/// Which generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI-compatible chat completions over HTTP
    #[default]
    OpenAi,
    /// External program reading the prompt on stdin
    Command,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Backend::OpenAi),
            "command" => Ok(Backend::Command),
            other => anyhow::bail!("Unknown generator backend '{}' (expected openai or command)", other),
        }
    }
}

/// `generator` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Model name sent to the chat completions endpoint
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Program for the command backend
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            command: None,
            args: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Apply CLAUSEALIGN_* overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(backend) = lookup("CLAUSEALIGN_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(model) = lookup("CLAUSEALIGN_MODEL") {
            self.model = model;
        }
        if let Some(base_url) = lookup("CLAUSEALIGN_BASE_URL") {
            self.base_url = base_url;
        }
        Ok(())
    }

    /// Construct the configured backend
    pub fn build(&self) -> Result<Box<dyn Generator>> {
        match self.backend {
            Backend::OpenAi => {
                let api_key = std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty());
                if api_key.is_none() {
                    warn!(var = %self.api_key_env, "API key variable is not set; sending requests without auth");
                }
                Ok(Box::new(OpenAiGenerator::new(&self.base_url, &self.model, api_key)))
            }
            Backend::Command => {
                let program = self
                    .command
                    .as_deref()
                    .context("generator.command must be set for the command backend")?;
                Ok(Box::new(CommandGenerator::new(program, self.args.clone())))
            }
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub generator: GeneratorConfig,
    pub matching: LocatorConfig,
    pub safety: SafetyLimits,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find the project config file by searching `start` and its parents
fn find_config_file_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Project config, else the per-user config
fn find_config_file() -> Option<PathBuf> {
    let project = std::env::current_dir()
        .ok()
        .and_then(|dir| find_config_file_from(&dir));

    project.or_else(|| {
        let user = dirs::config_dir()?.join("clausealign").join(CONFIG_FILE);
        user.exists().then_some(user)
    })
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Build the resolved config from an optional file and an env lookup
fn resolve(
    config_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut file = match config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    // Bare program names stay as-is for PATH lookup
    if let (Some(path), Some(command)) = (config_path, file.generator.command.as_mut()) {
        if command.contains('/') {
            let base_dir = path
                .parent() // .clausealign/
                .and_then(|p| p.parent()) // project root
                .unwrap_or(Path::new("."));
            *command = resolve_path(base_dir, command).to_string_lossy().into_owned();
        }
    }

    file.generator.apply_overrides(lookup)?;

    Ok(ResolvedConfig {
        generator: file.generator,
        matching: file.matching,
        safety: file.safety,
        config_file: config_path.map(Path::to_path_buf),
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    debug!(config_file = ?config_file, "Loading configuration");
    resolve(config_file.as_deref(), |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::EndBoundary;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(root: &Path, yaml: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", yaml).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, no_env).unwrap();
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.generator.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.matching, LocatorConfig::default());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
generator:
  backend: command
  command: ./bin/llm
  args: ["--quiet"]
matching:
  anchor_max_distance: 3
  end_boundary: matched_length
safety:
  max_document_bytes: 1000
  step_timeout_seconds: 30
"#,
        );

        let config = resolve(Some(&path), no_env).unwrap();
        assert_eq!(config.generator.backend, Backend::Command);
        assert_eq!(config.generator.args, vec!["--quiet".to_string()]);
        assert!(config.generator.command.unwrap().ends_with("bin/llm"));
        assert_eq!(config.matching.anchor_max_distance, 3);
        assert_eq!(config.matching.end_boundary, EndBoundary::MatchedLength);
        // Unset keys keep their defaults
        assert!(config.matching.fuzzy_enabled);
        assert_eq!(config.safety.max_document_bytes, 1000);
        assert_eq!(config.safety.step_timeout_seconds, 30);
        assert_eq!(config.safety.max_generation_calls, 100);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CLAUSEALIGN_BACKEND", "command"),
            ("CLAUSEALIGN_MODEL", "gpt-local"),
            ("CLAUSEALIGN_BASE_URL", "http://localhost:11434/v1"),
        ]
        .into_iter()
        .collect();

        let config = resolve(None, |key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.generator.backend, Backend::Command);
        assert_eq!(config.generator.model, "gpt-local");
        assert_eq!(config.generator.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_bad_backend_override() {
        let result = resolve(None, |key| {
            (key == "CLAUSEALIGN_BACKEND").then(|| "carrier-pigeon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_discovery_walks_parents() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "version: \"1.0\"");
        let nested = temp.path().join("contracts").join("2024");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file_from(&nested), Some(path));
    }

    #[test]
    fn test_command_backend_requires_program() {
        let generator = GeneratorConfig {
            backend: Backend::Command,
            ..Default::default()
        };
        assert!(generator.build().is_err());

        let generator = GeneratorConfig {
            backend: Backend::Command,
            command: Some("cat".to_string()),
            ..Default::default()
        };
        assert_eq!(generator.build().unwrap().name(), "command");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./bin/llm"),
            PathBuf::from("/home/user/project/./bin/llm")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
