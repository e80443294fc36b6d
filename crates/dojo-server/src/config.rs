//! Server configuration: command line and environment, then an optional JSON file.
//!
//! Values given on the command line (or through their environment variable)
//! override the file; the file overrides built-in defaults.

use clap::Parser;
use dojo_agent_loop::{AgentConfig, DEFAULT_STEP_TIMEOUT};
use genai::chat::ChatOptions;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
Your objective is to call the check_in_mat tool with the correct parameters to check in a student to a class.

The tool requires:
- memberName: The name of the student to check in
- className: The name of the class they're checking in to

Extract the member name and class name from the conversation, using the gym details below, \
and call the check_in_mat tool with those parameters. If the tool reports a cancellation or \
an error, tell the user plainly.";

#[derive(Debug, Clone, Parser)]
#[command(name = "dojo-server", about = "HTTP/SSE server for the dojo check-in agent")]
pub struct Args {
    #[arg(long, env = "DOJO_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub http_addr: String,

    /// Persist threads as JSON files here; threads live in memory when unset.
    #[arg(long, env = "DOJO_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    #[arg(long, env = "DOJO_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DOJO_MODEL")]
    pub model: Option<String>,

    /// Roster JSON file; the built-in sample roster is used when unset.
    #[arg(long, env = "DOJO_ROSTER")]
    pub roster: Option<PathBuf>,

    #[arg(long, env = "DOJO_STEP_TIMEOUT_SECS")]
    pub step_timeout_secs: Option<u64>,

    #[arg(long, env = "DOJO_LOG_JSON")]
    pub log_json: bool,
}

/// Optional JSON config file.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub step_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_json_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub storage_dir: Option<PathBuf>,
    pub roster: Option<PathBuf>,
    pub model: String,
    pub system_prompt: String,
    pub temperature: Option<f64>,
    pub step_timeout: Duration,
    pub log_json: bool,
}

impl ServerConfig {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Combine `args` with an already parsed file, `args` winning.
    pub fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let http_addr = args.http_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Invalid(format!("http address {:?}: {e}", args.http_addr))
        })?;

        let step_timeout = match args.step_timeout_secs.or(file.step_timeout_secs) {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "step timeout must be at least one second".to_string(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_STEP_TIMEOUT,
        };

        if let Some(t) = file.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }

        let model = args
            .model
            .or(file.model)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            http_addr,
            storage_dir: args.storage_dir,
            roster: args.roster,
            model,
            system_prompt: file
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: file.temperature,
            step_timeout,
            log_json: args.log_json,
        })
    }

    /// Agent settings with `gym_context` appended to the system prompt.
    pub fn agent_config(&self, gym_context: &str) -> AgentConfig {
        let mut options = ChatOptions::default().with_capture_tool_calls(true);
        if let Some(t) = self.temperature {
            options = options.with_temperature(t);
        }
        let prompt = if gym_context.is_empty() {
            self.system_prompt.clone()
        } else {
            format!("{}\n\n{}", self.system_prompt.trim_end(), gym_context)
        };
        AgentConfig::new(self.model.clone())
            .with_id("dojo")
            .with_system_prompt(prompt)
            .with_chat_options(options)
            .with_step_timeout(self.step_timeout)
    }
}
