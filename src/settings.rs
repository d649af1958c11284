use crate::constants::SETTINGS_FILE_EXTENSION;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// A settings API used to persist the override table.
///
/// Implementations hold the host's settings blob. The [`crate::OverrideStore`] reads the
/// value under its key once when it's built and writes the full table back on every mutation.
pub trait SettingsStore: Sync + Send {
    /// Gets the value stored under the given `key`.
    fn read(&self, key: &str) -> Option<String>;

    /// Writes the given `value` under the given `key`.
    ///
    /// # Errors
    ///
    /// Returns the reason of the failure when the value couldn't be persisted.
    fn write(&self, key: &str, value: &str) -> Result<(), String>;
}

impl<T: SettingsStore + ?Sized> SettingsStore for Arc<T> {
    fn read(&self, key: &str) -> Option<String> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).write(key, value)
    }
}

/// Settings store that keeps values in memory only.
///
/// # Examples
///
/// ```rust
/// use server_features::{InMemorySettings, SettingsStore};
///
/// let settings = InMemorySettings::new().with_value("ServerFeatures", r#"{"123":["HUB"]}"#);
/// assert_eq!(settings.read("ServerFeatures").unwrap(), r#"{"123":["HUB"]}"#);
/// ```
#[derive(Default)]
pub struct InMemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySettings {
    /// Creates an empty [`InMemorySettings`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an initial `value` for `key`.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        self
    }
}

impl SettingsStore for InMemorySettings {
    fn read(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Settings store that keeps each value in a `<key>.json` file inside a directory.
///
/// Writes go to a temporary file next to the target which is then renamed over it,
/// so a reader never sees a half-written value.
pub struct FileSettings {
    dir: PathBuf,
}

impl FileSettings {
    /// Creates a new [`FileSettings`] rooted at `dir`.
    ///
    /// # Errors
    ///
    /// This method fails if `dir` doesn't exist and can't be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use server_features::FileSettings;
    ///
    /// let settings = FileSettings::new("path/to/settings").unwrap();
    /// ```
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, String> {
        let dir = dir.as_ref();
        match fs::create_dir_all(dir) {
            Ok(()) => Ok(Self {
                dir: dir.to_path_buf(),
            }),
            Err(err) => Err(err.to_string()),
        }
    }

    /// Path of the file that holds the value of `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SETTINGS_FILE_EXTENSION}"))
    }
}

impl SettingsStore for FileSettings {
    fn read(&self, key: &str) -> Option<String> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                log_warn!(
                    event_id: crate::ErrorKind::MalformedState.as_u16(),
                    "Cannot read settings file '{}'. ({err})",
                    path.display()
                );
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), String> {
        let target = self.path(key);
        let tmp = target.with_extension(format!("{SETTINGS_FILE_EXTENSION}.tmp"));
        fs::write(&tmp, value).map_err(|err| format!("{}: {err}", tmp.display()))?;
        fs::rename(&tmp, &target).map_err(|err| format!("{}: {err}", target.display()))
    }
}
