use crate::builder::{Options, StoreBuilder};
use crate::errors::{ErrorKind, StoreError};
use crate::model::table::{table_from_json, OverrideTable};
use crate::SettingsStore;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Keeps track of the features that are manually overridden per guild.
///
/// Every mutation is written to the configured [`SettingsStore`] before the method returns.
/// When the write fails the mutation is rolled back and a [`ErrorKind::PersistenceFailure`]
/// error is returned, so the in-memory table never gets ahead of the persisted one.
///
/// # Examples
///
/// ```rust
/// use server_features::{InMemorySettings, OverrideStore};
///
/// let store = OverrideStore::initialize(Box::new(InMemorySettings::new())).unwrap();
///
/// store.toggle("123", "COMMUNITY").unwrap();
/// assert!(store.has("123", "COMMUNITY"));
/// assert!(!store.has("123", "HUB"));
///
/// store.clear("123").unwrap();
/// assert!(!store.has("123", "COMMUNITY"));
/// ```
pub struct OverrideStore {
    options: Options,
    table: Mutex<OverrideTable>,
}

impl OverrideStore {
    pub(crate) fn with_options(options: Options) -> Self {
        let table = load_table(&options);
        Self {
            options,
            table: Mutex::new(table),
        }
    }

    /// Creates a new [`StoreBuilder`] used to build an [`OverrideStore`].
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Creates an [`OverrideStore`] persisting to `settings` under the default key and loads
    /// the override table already stored there.
    ///
    /// # Errors
    ///
    /// This method fails only if the store options are invalid, which the default ones never are.
    pub fn initialize(settings: Box<dyn SettingsStore>) -> Result<Self, StoreError> {
        StoreBuilder::new().settings(settings).build()
    }

    /// Returns `true` if `feature` is overridden for the guild identified by `guild_id`.
    ///
    /// Unknown guilds and features are reported as not overridden.
    pub fn has(&self, guild_id: &str, feature: &str) -> bool {
        self.lock().contains(guild_id, feature)
    }

    /// Returns `true` if the guild identified by `guild_id` has at least one override.
    pub fn has_overrides(&self, guild_id: &str) -> bool {
        self.lock().contains_guild(guild_id)
    }

    /// Returns the overridden features of the guild identified by `guild_id` in ascending order.
    pub fn overrides(&self, guild_id: &str) -> Vec<String> {
        self.lock()
            .get(guild_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns a copy of the current override table.
    pub fn snapshot(&self) -> OverrideTable {
        self.lock().clone()
    }

    /// Flips the override of `feature` for the guild identified by `guild_id`.
    ///
    /// Returns `true` if the feature is overridden after the call, `false` if the override was removed.
    ///
    /// # Errors
    ///
    /// This method fails if the updated table couldn't be persisted. The table is left unchanged in that case.
    pub fn toggle(&self, guild_id: &str, feature: &str) -> Result<bool, StoreError> {
        let overridden = self.mutate(|table| table.toggle(guild_id, feature))?;
        debug!("Override of '{feature}' for guild '{guild_id}' is now {overridden}.");
        Ok(overridden)
    }

    /// Removes every override of the guild identified by `guild_id`.
    ///
    /// Clearing a guild without overrides is not an error, the table is persisted either way.
    ///
    /// # Errors
    ///
    /// This method fails if the updated table couldn't be persisted. The table is left unchanged in that case.
    pub fn clear(&self, guild_id: &str) -> Result<(), StoreError> {
        let removed = self.mutate(|table| table.remove_guild(guild_id))?;
        debug!(
            "Cleared {} override(s) of guild '{guild_id}'.",
            removed.map(|set| set.len()).unwrap_or_default()
        );
        Ok(())
    }

    /// Removes the overrides of every guild.
    ///
    /// # Errors
    ///
    /// This method fails if the emptied table couldn't be persisted. The table is left unchanged in that case.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        let guilds = self.mutate(|table| {
            let guilds = table.len();
            table.clear();
            guilds
        })?;
        debug!("Cleared the overrides of {guilds} guild(s).");
        Ok(())
    }

    /// Tears the store down, removing every override from the persisted settings.
    ///
    /// # Errors
    ///
    /// This method fails if the emptied table couldn't be persisted. The store is handed back
    /// with the error, unchanged, so the shutdown can be retried.
    pub fn shutdown(self) -> Result<(), (Self, StoreError)> {
        match self.clear_all() {
            Ok(()) => Ok(()),
            Err(err) => Err((self, err)),
        }
    }

    fn mutate<R>(&self, op: impl FnOnce(&mut OverrideTable) -> R) -> Result<R, StoreError> {
        let table = self.lock();
        let mut pending = PendingChange {
            previous: Some(table.clone()),
            table,
        };
        let result = op(&mut *pending.table);
        self.persist(&pending.table)?;
        pending.commit();
        Ok(result)
    }

    fn persist(&self, table: &OverrideTable) -> Result<(), StoreError> {
        let key = self.options.settings_key();
        let write_result = match table.serialize() {
            Ok(json) => self.options.settings().write(key, json.as_str()),
            Err(err) => Err(err.to_string()),
        };
        write_result.map_err(|reason| {
            let err = StoreError::new(
                ErrorKind::PersistenceFailure,
                format!("Failed to persist feature overrides under '{key}'. ({reason})"),
            );
            log_err!(event_id: err.kind.as_u16(), "{}", err);
            err
        })
    }

    fn lock(&self) -> MutexGuard<'_, OverrideTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for OverrideStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideStore")
            .field("settings_key", &self.options.settings_key())
            .field("table", &*self.lock())
            .finish_non_exhaustive()
    }
}

// Restores the table it was created from when dropped before `commit`, which covers both a
// failed write and a panic unwinding out of the settings store.
struct PendingChange<'a> {
    table: MutexGuard<'a, OverrideTable>,
    previous: Option<OverrideTable>,
}

impl PendingChange<'_> {
    fn commit(mut self) {
        self.previous = None;
    }
}

impl Drop for PendingChange<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.table = previous;
        }
    }
}

fn load_table(options: &Options) -> OverrideTable {
    let key = options.settings_key();
    let blob = options.settings().read(key).unwrap_or_default();
    if blob.trim().is_empty() {
        return OverrideTable::default();
    }
    match table_from_json(blob.as_str()) {
        Ok(table) => {
            debug!("Loaded overrides of {} guild(s) from '{key}'.", table.len());
            table
        }
        Err(err) => {
            log_warn!(
                event_id: ErrorKind::MalformedState.as_u16(),
                "Ignoring malformed feature overrides stored under '{key}'. {err}"
            );
            OverrideTable::default()
        }
    }
}
