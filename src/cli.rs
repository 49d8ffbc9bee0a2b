//! Command-line argument parsing for pgdash.

use crate::db::Value;
use clap::Parser;
use std::path::PathBuf;

/// A PostgreSQL dashboard and query explorer for the terminal.
///
/// Connection settings come from DB_HOST, DB_PORT, DB_NAME, DB_USER and
/// DB_PASSWORD, optionally loaded from a .env file.
#[derive(Parser, Debug)]
#[command(name = "pgdash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "PGDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// .env file to load instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Use an in-memory mock database
    #[arg(long)]
    pub mock_db: bool,

    /// Refuse statements that modify the database
    #[arg(long)]
    pub read_only: bool,

    /// Run one query without the UI and print the result as CSV
    #[arg(short = 'e', long, value_name = "SQL")]
    pub execute: Option<String>,

    /// Positional parameter for --execute, bound to $1, $2, ... in order
    #[arg(short = 'p', long = "param", value_name = "VALUE", requires = "execute")]
    pub params: Vec<String>,

    /// Write the --execute result to a file instead of stdout
    #[arg(short = 'o', long, value_name = "PATH", requires = "execute")]
    pub output_file: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns true when running a single query without the UI.
    pub fn is_headless(&self) -> bool {
        self.execute.is_some()
    }

    /// Converts `--param` values into bind parameters.
    pub fn bind_params(&self) -> Vec<Value> {
        self.params.iter().map(|p| Value::parse_param(p)).collect()
    }
}
