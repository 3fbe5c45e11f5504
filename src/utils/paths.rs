use dirs::home_dir;
use std::{env, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".daily_checklist";
const HOME_ENV: &str = "DAILY_CHECKLIST_HOME";
const CONFIG_FILE: &str = "config.json";
const STORAGE_FILE: &str = "storage.json";
const EXPORTS_DIR: &str = "exports";

/// Resolves the on-disk layout of the application data directory.
pub struct PathResolver;

impl PathResolver {
    /// Returns the application data directory, defaulting to `~/.daily_checklist`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
        root.unwrap_or_else(Self::base_dir)
    }

    pub fn config_file_in(base: &std::path::Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    /// Local key-value storage file (custom items, cached entry records).
    pub fn storage_file_in(base: &std::path::Path) -> PathBuf {
        base.join(STORAGE_FILE)
    }

    pub fn exports_dir_in(base: &std::path::Path) -> PathBuf {
        base.join(EXPORTS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_wins_over_default() {
        let root = PathBuf::from("/tmp/checklist-root");
        assert_eq!(PathResolver::resolve_base(Some(root.clone())), root);
        assert_eq!(
            PathResolver::storage_file_in(&root),
            root.join("storage.json")
        );
    }
}
