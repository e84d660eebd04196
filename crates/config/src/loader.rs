use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::BridgeConfig;

/// Standard config file name.
const CONFIG_FILENAME: &str = "pontoon.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(cfg)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./pontoon.toml` (project-local)
/// 2. `<user config dir>/pontoon/pontoon.toml` (user-global)
///
/// Returns `BridgeConfig::default()` if no config file is found or the file
/// fails to parse.
pub fn discover_and_load() -> BridgeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BridgeConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(dir) = config_dir() {
        let p = dir.join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

/// Returns the user-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pontoon").map(|d| d.config_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pontoon.toml");
        std::fs::write(&path, "bridge_id = \"wa-bridge\"\n[database]\npath = \"/var/lib/pontoon/wa.db\"\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.bridge_id, "wa-bridge");
        assert_eq!(cfg.database.path, "/var/lib/pontoon/wa.db");
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn load_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pontoon.toml");
        std::fs::write(&path, "bridge_id = [not toml").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
