//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Filename of the SQLite database inside the data folder
pub const DATABASE_FILENAME: &str = "plastopack.sqlite";

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = load_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(get_default_data_folder())
}

/// Full path of the SQLite database inside `data_folder`
pub fn database_path(data_folder: &Path) -> PathBuf {
    data_folder.join(DATABASE_FILENAME)
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/plastopack/config.toml first, then /etc/plastopack/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("plastopack").join("config.toml"));
        let system_config = PathBuf::from("/etc/plastopack/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let config_path = dirs::config_dir()
            .map(|d| d.join("plastopack").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

        if config_path.exists() {
            Ok(config_path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", config_path)))
        }
    }
}

/// Get OS-dependent default data folder path
fn get_default_data_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("plastopack"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\plastopack"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("plastopack"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/plastopack"))
    } else if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("plastopack"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/plastopack"))
    } else {
        PathBuf::from("./plastopack_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let folder = resolve_data_folder(Some("/tmp/pp-data"), "PLASTOPACK_TEST_UNSET").unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/pp-data"));
    }

    #[test]
    fn env_var_beats_default() {
        std::env::set_var("PLASTOPACK_TEST_DATA", "/tmp/pp-env");
        let folder = resolve_data_folder(None, "PLASTOPACK_TEST_DATA").unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/pp-env"));
        std::env::remove_var("PLASTOPACK_TEST_DATA");
    }

    #[test]
    fn database_path_appends_filename() {
        let path = database_path(Path::new("/data"));
        assert_eq!(path, PathBuf::from("/data").join(DATABASE_FILENAME));
    }
}
