use crate::constants::DEFAULT_SETTINGS_KEY;
use crate::errors::{ErrorKind, StoreError};
use crate::settings::InMemorySettings;
use crate::{OverrideStore, SettingsStore};
use std::borrow::Borrow;

pub struct Options {
    settings_key: String,
    settings: Box<dyn SettingsStore>,
}

impl Options {
    pub(crate) fn settings_key(&self) -> &str {
        &self.settings_key
    }

    pub(crate) fn settings(&self) -> &dyn SettingsStore {
        self.settings.borrow()
    }
}

/// Builder to create an [`OverrideStore`].
///
/// # Examples
///
/// ```rust
/// use server_features::{InMemorySettings, OverrideStore};
///
/// let store = OverrideStore::builder()
///     .settings(Box::new(InMemorySettings::new()))
///     .settings_key("ServerFeatures")
///     .build()
///     .unwrap();
/// ```
pub struct StoreBuilder {
    settings_key: Option<String>,
    settings: Option<Box<dyn SettingsStore>>,
}

impl StoreBuilder {
    pub(crate) fn new() -> Self {
        Self {
            settings_key: None,
            settings: None,
        }
    }

    /// Sets the [`SettingsStore`] implementation the override table is persisted to.
    /// Default value is an [`InMemorySettings`], which doesn't survive a restart.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use server_features::{OverrideStore, SettingsStore};
    ///
    /// let builder = OverrideStore::builder()
    ///     .settings(Box::new(HostSettings {}));
    ///
    /// struct HostSettings {}
    ///
    /// impl SettingsStore for HostSettings {
    ///     fn read(&self, key: &str) -> Option<String> {
    ///         // read from the host's settings
    ///         None
    ///     }
    ///
    ///     fn write(&self, key: &str, value: &str) -> Result<(), String> {
    ///         // write to the host's settings
    ///         Ok(())
    ///     }
    /// }
    /// ```
    pub fn settings(mut self, settings: Box<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the key the override table is stored under.
    /// Default value is `ServerFeatures`.
    pub fn settings_key(mut self, key: &str) -> Self {
        self.settings_key = Some(key.to_owned());
        self
    }

    /// Creates an [`OverrideStore`] and loads the persisted override table into it.
    ///
    /// A missing blob results in an empty table, so does a malformed one (after a warning is logged).
    ///
    /// # Errors
    ///
    /// This method fails if the configured settings key is empty or contains a path separator.
    pub fn build(self) -> Result<OverrideStore, StoreError> {
        Ok(OverrideStore::with_options(self.build_options()?))
    }

    pub(crate) fn build_options(self) -> Result<Options, StoreError> {
        let settings_key = self
            .settings_key
            .unwrap_or_else(|| DEFAULT_SETTINGS_KEY.to_owned());
        if settings_key.trim().is_empty() {
            return Err(StoreError::new(
                ErrorKind::InvalidSettingsKey,
                "Settings key cannot be empty".to_owned(),
            ));
        }
        if settings_key.contains(['/', '\\']) || settings_key == "." || settings_key == ".." {
            return Err(StoreError::new(
                ErrorKind::InvalidSettingsKey,
                format!("Settings key '{settings_key}' cannot contain path separators."),
            ));
        }
        Ok(Options {
            settings_key,
            settings: self
                .settings
                .unwrap_or_else(|| Box::new(InMemorySettings::new())),
        })
    }
}
