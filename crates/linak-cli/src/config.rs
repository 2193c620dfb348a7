//! Settings file location.

use std::path::{Path, PathBuf};

use linak_core::JsonFileStore;

/// Directory under the platform config dir.
const APP_DIR: &str = "linak-desk";

/// Settings file name.
const FILE_NAME: &str = "linak_desk.json";

/// Default settings path, e.g. `~/.config/linak-desk/linak_desk.json`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(FILE_NAME)
}

/// Use the explicit path if given, otherwise the default.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(default_path)
}

/// Open the settings store.
pub fn open_store(explicit: Option<&Path>) -> JsonFileStore {
    let path = resolve_path(explicit);
    tracing::debug!("Using settings file {}", path.display());
    JsonFileStore::new(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_file_name() {
        let path = default_path();
        assert!(path.ends_with("linak-desk/linak_desk.json"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = Path::new("/tmp/desk.json");
        assert_eq!(resolve_path(Some(explicit)), PathBuf::from("/tmp/desk.json"));
        assert_eq!(resolve_path(None), default_path());
    }
}
