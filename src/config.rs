use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

#[derive(Parser, Debug)]
#[command(name = "readeck-sync")]
#[command(about = "Syncs Readeck highlights into markdown notes", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch new highlights and write them into the sync folder
    Sync {
        /// Keep running and sync every `sync.interval_seconds`
        #[arg(long)]
        watch: bool,
    },
    /// Verify the Readeck url and token
    Check,
    /// Show when the last successful sync happened
    Status,
    /// Forget the last sync time so the next sync fetches everything again
    Reset,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".readeck-sync")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReadeckSettings {
    #[serde(default = "default_readeck_url")]
    pub url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ReadeckSettings {
    fn default() -> Self {
        Self {
            url: default_readeck_url(),
            api_token: String::new(),
            page_size: default_page_size(),
        }
    }
}

fn default_readeck_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_page_size() -> u32 {
    crate::backend::HIGHLIGHTS_PER_PAGE
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    #[serde(default = "default_sync_folder")]
    pub folder: PathBuf,
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    #[serde(default = "default_sync_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            folder: default_sync_folder(),
            state_file: None,
            interval_seconds: default_sync_interval(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_sync_folder() -> PathBuf {
    PathBuf::from("Readeck")
}

fn default_sync_interval() -> u64 {
    3600
}

fn default_timeout() -> u64 {
    120
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub readeck: ReadeckSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Checks everything a run needs before the first request goes out.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.readeck.api_token.trim().is_empty() {
            return Err(SyncError::Configuration(
                "Readeck API token is not configured (readeck.api_token)".to_string(),
            ));
        }
        if self.readeck.url.trim().is_empty() {
            return Err(SyncError::Configuration(
                "Readeck url is not configured (readeck.url)".to_string(),
            ));
        }
        Ok(())
    }

    /// Relative folders and state files live next to the config file.
    pub fn sync_folder(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.sync.folder)
    }

    pub fn state_file(&self, data_dir: &Path) -> PathBuf {
        match &self.sync.state_file {
            Some(path) => data_dir.join(path),
            None => data_dir.join("state.json"),
        }
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
