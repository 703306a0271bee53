use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, Properties};
use log::warn;

use crate::monitor::PollIntervals;

const CONFIG_FILE: &str = "aether.ini";

/// Main window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 520,
            resizable: false,
        }
    }
}

/// Application configuration, read from `aether.ini`.
///
/// Every key is optional; anything missing or unparseable falls back to
/// its default. A missing or malformed file is never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub poll_intervals: PollIntervals,
}

impl AppConfig {
    /// Load from the first config file found, or defaults if none exists.
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let ini = match Ini::load_from_file(path) {
            Ok(ini) => ini,
            Err(e) => {
                warn!("could not read {}: {}, using defaults", path.display(), e);
                return Self::default();
            }
        };

        let mut config = Self::default();

        if let Some(section) = ini.section(Some("window")) {
            config.window.width = section
                .get("width")
                .and_then(|v| v.parse().ok())
                .unwrap_or(config.window.width);
            config.window.height = section
                .get("height")
                .and_then(|v| v.parse().ok())
                .unwrap_or(config.window.height);
            config.window.resizable = section
                .get("resizable")
                .and_then(|v| v.parse().ok())
                .unwrap_or(config.window.resizable);
        }

        if let Some(section) = ini.section(Some("poll_intervals")) {
            config.poll_intervals.cpu =
                seconds(section, "cpu").unwrap_or(config.poll_intervals.cpu);
            config.poll_intervals.ram =
                seconds(section, "ram").unwrap_or(config.poll_intervals.ram);
            config.poll_intervals.disk =
                seconds(section, "disk").unwrap_or(config.poll_intervals.disk);
        }

        config
    }
}

fn seconds(section: &Properties, key: &str) -> Option<Duration> {
    section
        .get(key)
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Check for a config file in order of preference:
/// 1. ./aether.ini (current directory)
/// 2. ~/.config/aether-monitor/aether.ini
fn config_file_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    let dirs = directories::ProjectDirs::from("", "", "aether-monitor")?;
    let user = dirs.config_dir().join(CONFIG_FILE);
    if user.exists() {
        return Some(user);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.ini"));

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn full_file_overrides_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[window]\nwidth = 400\nheight = 600\nresizable = true\n\
             [poll_intervals]\ncpu = 5\nram = 10\ndisk = 30\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path);

        assert_eq!(config.window.width, 400);
        assert_eq!(config.window.height, 600);
        assert!(config.window.resizable);
        assert_eq!(config.poll_intervals.cpu, Duration::from_secs(5));
        assert_eq!(config.poll_intervals.ram, Duration::from_secs(10));
        assert_eq!(config.poll_intervals.disk, Duration::from_secs(30));
    }

    #[test]
    fn partial_file_falls_back_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[window]\nwidth = 280\n[poll_intervals]\ncpu = 4\n").unwrap();

        let config = AppConfig::load_from(&path);

        assert_eq!(config.window.width, 280);
        assert_eq!(config.window.height, 520);
        assert!(!config.window.resizable);
        assert_eq!(config.poll_intervals.cpu, Duration::from_secs(4));
        assert_eq!(config.poll_intervals.ram, Duration::from_secs(5));
    }

    #[test]
    fn garbage_values_fall_back_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[window]\nwidth = wide\nresizable = maybe\n[poll_intervals]\ncpu = -3\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path);

        assert_eq!(config, AppConfig::default());
    }
}
