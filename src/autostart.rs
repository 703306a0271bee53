use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DESKTOP_FILE: &str = "aether-monitor.desktop";

#[derive(Debug)]
pub enum AutostartError {
    NoConfigDir,
    IoError(std::io::Error),
}

impl std::fmt::Display for AutostartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoConfigDir => write!(f, "could not determine the user config directory"),
            Self::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for AutostartError {}

impl From<std::io::Error> for AutostartError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Directory holding XDG autostart entries.
fn autostart_dir() -> Result<PathBuf, AutostartError> {
    let dirs = directories::BaseDirs::new().ok_or(AutostartError::NoConfigDir)?;
    Ok(dirs.config_dir().join("autostart"))
}

/// Register this executable to start on login. Returns the path of the
/// created desktop entry.
pub fn enable() -> Result<PathBuf, AutostartError> {
    let exe = env::current_exe()?;
    enable_in(&autostart_dir()?, &exe)
}

/// Remove the autostart entry. Returns whether one existed.
pub fn disable() -> Result<bool, AutostartError> {
    disable_in(&autostart_dir()?)
}

fn enable_in(dir: &Path, exe: &Path) -> Result<PathBuf, AutostartError> {
    fs::create_dir_all(dir)?;

    let entry = format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Aether Monitor\n\
         Comment=Lightweight system resource monitor\n\
         Exec={}\n\
         Icon=utilities-system-monitor\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        exe.display()
    );

    let path = dir.join(DESKTOP_FILE);
    fs::write(&path, entry)?;
    Ok(path)
}

fn disable_in(dir: &Path) -> Result<bool, AutostartError> {
    let path = dir.join(DESKTOP_FILE);
    if path.exists() {
        fs::remove_file(&path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
