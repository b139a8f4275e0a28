//! Host extension configuration.
//!
//! Stored as RON next to the host's data. Every field has a default, so a
//! partial file (or no file at all) is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Master switch. When off, nothing subscribes and nothing runs.
    pub mod_enabled: bool,
    /// Level used for routine lifecycle messages.
    pub log_level: LogLevel,

    pub invite_code_enabled: bool,
    pub show_hud_notifications: bool,
    pub show_manual_copy_message: bool,

    pub auto_pause_enabled: bool,
    pub pause_method: PauseMethod,
    pub enable_manual_toggle: bool,
    pub pause_toggle_key: String,

    pub auto_configure_enabled: bool,
    pub sleep_announce_mode: SleepAnnounceMode,
    pub move_building_permission: MoveBuildingPermission,
    pub unban_all_enabled: bool,

    pub whitelist_enabled: bool,
    pub show_player_join_info: bool,
    /// Allow-list file name, relative to the host data directory. Changing
    /// it through `Orchestrator::apply_config` loads and watches the new file.
    pub allow_list_file: String,
    /// Delay between a file-change notification and the re-read. A change
    /// restarts a running watch.
    pub reload_settle_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mod_enabled: true,
            log_level: LogLevel::Info,
            invite_code_enabled: true,
            show_hud_notifications: true,
            show_manual_copy_message: true,
            auto_pause_enabled: true,
            pause_method: PauseMethod::Chatbox,
            enable_manual_toggle: true,
            pause_toggle_key: "P".into(),
            auto_configure_enabled: true,
            sleep_announce_mode: SleepAnnounceMode::All,
            move_building_permission: MoveBuildingPermission::Owned,
            unban_all_enabled: false,
            whitelist_enabled: true,
            show_player_join_info: true,
            allow_list_file: allowlist::DEFAULT_FILE_NAME.into(),
            reload_settle_ms: 100,
        }
    }
}

impl HostConfig {
    /// Reads the config file; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(ron::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// How the automatic pause is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseMethod {
    /// Pause the local simulation directly (not synchronized with peers).
    Direct,
    /// Submit a pause vote through chat (synchronized).
    Chatbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepAnnounceMode {
    Off,
    First,
    All,
}

impl SleepAnnounceMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            SleepAnnounceMode::Off => "off",
            SleepAnnounceMode::First => "first",
            SleepAnnounceMode::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveBuildingPermission {
    Off,
    Owned,
    On,
}

impl MoveBuildingPermission {
    pub fn as_arg(self) -> &'static str {
        match self {
            MoveBuildingPermission::Off => "off",
            MoveBuildingPermission::Owned => "owned",
            MoveBuildingPermission::On => "on",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = HostConfig::load(dir.path().join("config.ron")).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(&path, "(whitelist_enabled: false, pause_method: Direct)").unwrap();

        let config = HostConfig::load(&path).unwrap();
        assert!(!config.whitelist_enabled);
        assert_eq!(config.pause_method, PauseMethod::Direct);
        assert_eq!(config.allow_list_file, "whitelist.json");
        assert_eq!(config.reload_settle_ms, 100);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ron");
        let config = HostConfig {
            sleep_announce_mode: SleepAnnounceMode::First,
            unban_all_enabled: true,
            ..HostConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(HostConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        fs::write(&path, "(mod_enabled: maybe)").unwrap();
        assert!(matches!(HostConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn command_args() {
        assert_eq!(SleepAnnounceMode::First.as_arg(), "first");
        assert_eq!(MoveBuildingPermission::Owned.as_arg(), "owned");
    }
}
