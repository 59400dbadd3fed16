//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no command-line root is given.
pub const ROOT_FOLDER_ENV: &str = "PERMAT_ROOT_FOLDER";

/// Database file name inside the root folder.
pub const DATABASE_FILE: &str = "permat.db";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Get the configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/permat/config.toml first, then /etc/permat/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("permat").join("config.toml"));
        let system_config = PathBuf::from("/etc/permat/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("permat").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/permat (or /var/lib/permat for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("permat"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/permat"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/permat
        dirs::data_dir()
            .map(|d| d.join("permat"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/permat"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\permat
        dirs::data_local_dir()
            .map(|d| d.join("permat"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\permat"))
    } else {
        PathBuf::from("./permat_data")
    }
}

/// Create the root folder if it does not exist yet.
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
    }
    Ok(())
}

/// Path of the SQLite database inside the root folder.
pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cli_arg_wins() {
        std::env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
        let root = resolve_root_folder(Some("/tmp/from-cli")).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/from-cli"));
        std::env::remove_var(ROOT_FOLDER_ENV);
    }

    #[test]
    #[serial]
    fn test_env_var_used_without_cli_arg() {
        std::env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
        let root = resolve_root_folder(None).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/from-env"));
        std::env::remove_var(ROOT_FOLDER_ENV);
    }

    #[test]
    #[serial]
    fn test_fallback_resolves_to_some_path() {
        std::env::remove_var(ROOT_FOLDER_ENV);
        let root = resolve_root_folder(None).unwrap();
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn test_database_path_appends_file_name() {
        let path = database_path(Path::new("/data/permat"));
        assert_eq!(path, PathBuf::from("/data/permat/permat.db"));
    }

    #[test]
    fn test_ensure_root_folder_creates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        assert!(!nested.exists());
        ensure_root_folder(&nested).unwrap();
        assert!(nested.exists());
    }
}
