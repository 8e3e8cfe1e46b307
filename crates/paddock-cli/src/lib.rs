//! Command-line configuration for the `paddock` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use paddock_core::config::DEFAULT_API_BASE;
use paddock_core::{HorseStatus, HttpConfig};

#[derive(Debug, Parser)]
#[command(name = "paddock", version, about = "Track your ZED Champions stables")]
pub struct Config {
    /// Directory holding collections and the stored API token.
    #[arg(long, env = "PADDOCK_DATA_DIR", default_value = ".paddock")]
    pub data_dir: PathBuf,

    /// Registry API root.
    #[arg(long, env = "ZED_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Forwarding proxy tried before the API root.
    #[arg(long, env = "ZED_PROXY_URL")]
    pub proxy_url: Option<String>,

    /// API token to use instead of the stored one.
    #[arg(long, env = "ZED_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            api_base: self.api_base.clone(),
            proxy_base: self
                .proxy_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the API bearer token.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Check the token against `GET /me`.
    TestConnection,

    /// Import horses from the registry.
    Import {
        #[command(subcommand)]
        source: ImportCommand,
    },

    /// Search the registry for horses by name.
    Search { query: String },

    /// Show tracked horses of one stable.
    List { status: HorseStatus },

    /// Export tracked horses of one stable.
    Export {
        status: HorseStatus,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Store a token (the `Bearer ` prefix is optional).
    Set { token: String },
    /// Show whether the stored token is still valid.
    Status,
    /// Forget the stored token.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Import every horse of one of your stables.
    Stable {
        kind: HorseStatus,

        /// Partition receiving the horses (defaults to the stable's own).
        #[arg(long = "into")]
        into: Option<HorseStatus>,
    },

    /// Import one horse by id or pasted URL.
    Horse {
        id: String,

        #[arg(long = "as", default_value = "racing")]
        target: HorseStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Jsonl,
    Csv,
}
