//! Where panelkit keeps its config file and logs
//!
//! Everything sits in one `panelkit` directory under the platform's user
//! config location.

use std::{env, fs, path::PathBuf};

use anyhow::Context;

const APP_DIR: &str = "panelkit";
const CONFIG_FILE: &str = "config.yaml";
const LOGS_DIR: &str = "logs";

/// File name prefix of the rolling log files
pub const LOG_FILE_PREFIX: &str = "panelkit.log";

/// The panelkit directory: `$XDG_CONFIG_HOME/panelkit`, else
/// `~/.config/panelkit`, or `%APPDATA%\panelkit` on Windows.
pub fn config_dir() -> Option<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        env::var_os("APPDATA").map(PathBuf::from)
    } else {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
    };
    base.map(|dir| dir.join(APP_DIR))
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(LOGS_DIR))
}

/// Create the logs directory if needed and return it
pub fn ensure_logs_dir() -> anyhow::Result<PathBuf> {
    let logs = logs_dir().context("no user config directory")?;
    fs::create_dir_all(&logs)
        .with_context(|| format!("failed to create {}", logs.display()))?;
    Ok(logs)
}
