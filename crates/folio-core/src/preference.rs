//! Persistence of the user's message color.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::color::{self, ColorValue};
use crate::error::{FolioError, Result};

pub const MESSAGE_COLOR_KEY: &str = "message_color";
const PREFERENCES_FILE: &str = "preferences.json";

/// Key/value persistence collaborator.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Preferences kept as a JSON object on disk, rewritten on every `set`.
pub struct FilePreferenceStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    /// Open (or lazily create) the store at `path`. A missing or corrupt file
    /// starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unreadable preferences file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Store inside the application directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(PREFERENCES_FILE))
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let io_err = |source| FolioError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content).map_err(io_err)
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().ok()?;
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| FolioError::Config("preference store lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }
}

/// Ephemeral store, used when persistence is disabled and in tests.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| FolioError::Config("preference store lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreference {
    pub message_color: ColorValue,
}

impl UserPreference {
    /// Stored color, or `default` when nothing valid is stored.
    pub fn load(store: &dyn PreferenceStore, default: ColorValue) -> Self {
        let message_color = store
            .get(MESSAGE_COLOR_KEY)
            .and_then(|value| color::parse_stored(&value))
            .unwrap_or(default);
        Self { message_color }
    }

    pub fn save(&self, store: &dyn PreferenceStore) -> Result<()> {
        store.set(MESSAGE_COLOR_KEY, self.message_color.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> ColorValue {
        color::resolve("red").unwrap()
    }

    #[test]
    fn test_load_defaults_when_empty() {
        let store = MemoryPreferenceStore::new();
        let pref = UserPreference::load(&store, ColorValue::default());
        assert_eq!(pref.message_color.hex(), color::DEFAULT_HEX);
    }

    #[test]
    fn test_invalid_stored_value_uses_default() {
        let store = MemoryPreferenceStore::new();
        store.set(MESSAGE_COLOR_KEY, "#nothex").unwrap();
        let pref = UserPreference::load(&store, red());
        assert_eq!(pref.message_color, red());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FilePreferenceStore::in_dir(&dir.path().join("folio"));
            UserPreference { message_color: red() }.save(&store).unwrap();
        }
        let reopened = FilePreferenceStore::in_dir(&dir.path().join("folio"));
        assert_eq!(reopened.get(MESSAGE_COLOR_KEY).as_deref(), Some("#ff0000"));
        let pref = UserPreference::load(&reopened, ColorValue::default());
        assert_eq!(pref.message_color, red());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FilePreferenceStore::open(&path);
        assert_eq!(store.get(MESSAGE_COLOR_KEY), None);
        store.set(MESSAGE_COLOR_KEY, "#000000").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("#000000"));
    }

    #[test]
    fn test_unwritable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let store = FilePreferenceStore::open(blocker.join("preferences.json"));
        assert!(matches!(
            store.set(MESSAGE_COLOR_KEY, "#000000"),
            Err(FolioError::Io { .. })
        ));
    }
}
