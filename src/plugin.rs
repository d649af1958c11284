use crate::errors::{ErrorKind, StoreError};
use crate::menu::{feature_entries, FeatureEntry, KnownFeatures};
use crate::{OverrideStore, SettingsStore, StoreBuilder};
use log::info;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

/// The host's side of the guild context menu.
pub trait MenuHost: Sync + Send {
    /// Requests the host to re-render the guild context menu.
    fn refresh(&self);
}

/// The Server Features plugin.
///
/// Adds a feature submenu to the guild context menu: [`ServerFeatures::menu`] answers the
/// host's menu-build event, [`ServerFeatures::toggle_feature`] and [`ServerFeatures::reset`]
/// handle the clicks on the entries. The display state is always derived from the
/// [`OverrideStore`], rendered nodes are never patched.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashSet;
/// use server_features::{InMemorySettings, MenuHost, ServerFeatures};
///
/// struct Host {}
///
/// impl MenuHost for Host {
///     fn refresh(&self) {
///         // re-render the context menu
///     }
/// }
///
/// let plugin = ServerFeatures::builder()
///     .settings(Box::new(InMemorySettings::new()))
///     .known_features(["COMMUNITY", "HUB"].into())
///     .menu_host(Box::new(Host {}))
///     .build()
///     .unwrap();
///
/// plugin.toggle_feature("123", "HUB").unwrap();
///
/// let reported = HashSet::from(["COMMUNITY".to_owned()]);
/// let entries = plugin.menu("123", &reported);
/// assert!(entries.iter().all(|entry| entry.checked));
///
/// plugin.stop().unwrap();
/// ```
pub struct ServerFeatures {
    store: OverrideStore,
    known_features: KnownFeatures,
    host: Box<dyn MenuHost>,
}

impl ServerFeatures {
    /// Creates a new [`PluginBuilder`] used to start the plugin.
    pub fn builder() -> PluginBuilder {
        PluginBuilder::new()
    }

    /// The store holding the overrides of the plugin.
    pub fn store(&self) -> &OverrideStore {
        &self.store
    }

    /// The features the submenu offers.
    pub fn known_features(&self) -> &KnownFeatures {
        &self.known_features
    }

    /// Builds the submenu entries of the guild identified by `guild_id`, given the features
    /// the server reports for it.
    pub fn menu(&self, guild_id: &str, reported: &HashSet<String>) -> Vec<FeatureEntry> {
        feature_entries(&self.store, &self.known_features, guild_id, reported)
    }

    /// Handles a click on a feature entry: flips the override and refreshes the menu.
    ///
    /// # Errors
    ///
    /// This method fails if the override couldn't be persisted. The menu isn't refreshed in that case.
    pub fn toggle_feature(&self, guild_id: &str, feature: &str) -> Result<(), StoreError> {
        self.store.toggle(guild_id, feature)?;
        self.host.refresh();
        Ok(())
    }

    /// Handles a click on the reset entry: removes the guild's overrides and refreshes the menu.
    ///
    /// # Errors
    ///
    /// This method fails if the cleared table couldn't be persisted. The menu isn't refreshed in that case.
    pub fn reset(&self, guild_id: &str) -> Result<(), StoreError> {
        self.store.clear(guild_id)?;
        self.host.refresh();
        Ok(())
    }

    /// Stops the plugin, leaving no override behind in the persisted settings.
    ///
    /// # Errors
    ///
    /// This method fails if the emptied table couldn't be persisted. The plugin is handed back
    /// with the error, still running, so stopping can be retried.
    pub fn stop(self) -> Result<(), (Self, StoreError)> {
        let Self {
            store,
            known_features,
            host,
        } = self;
        match store.shutdown() {
            Ok(()) => {
                info!("Server Features stopped.");
                Ok(())
            }
            Err((store, err)) => Err((
                Self {
                    store,
                    known_features,
                    host,
                },
                err,
            )),
        }
    }
}

/// Builder to start the [`ServerFeatures`] plugin.
pub struct PluginBuilder {
    store: StoreBuilder,
    known_features: Option<KnownFeatures>,
    host: Option<Box<dyn MenuHost>>,
}

impl PluginBuilder {
    pub(crate) fn new() -> Self {
        Self {
            store: OverrideStore::builder(),
            known_features: None,
            host: None,
        }
    }

    /// Sets the [`SettingsStore`] the overrides are persisted to.
    pub fn settings(mut self, settings: Box<dyn SettingsStore>) -> Self {
        self.store = self.store.settings(settings);
        self
    }

    /// Sets the key the overrides are stored under.
    pub fn settings_key(mut self, key: &str) -> Self {
        self.store = self.store.settings_key(key);
        self
    }

    /// Sets the features the submenu offers.
    pub fn known_features(mut self, known_features: KnownFeatures) -> Self {
        self.known_features = Some(known_features);
        self
    }

    /// Sets the [`MenuHost`] that re-renders the context menu.
    pub fn menu_host(mut self, host: Box<dyn MenuHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Starts the plugin and loads the persisted overrides.
    ///
    /// # Errors
    ///
    /// This method fails in the following cases:
    /// - No [`MenuHost`] or no [`KnownFeatures`] was supplied ([`ErrorKind::DependencyUnavailable`]).
    /// - The store options are invalid.
    pub fn build(self) -> Result<ServerFeatures, StoreError> {
        let host = match self.host {
            Some(host) => host,
            None => return Err(dependency_unavailable("menu host")),
        };
        let known_features = match self.known_features {
            Some(known_features) => known_features,
            None => return Err(dependency_unavailable("known feature list")),
        };
        let store = self.store.build()?;
        info!(
            "Server Features started with {} known feature(s).",
            known_features.len()
        );
        Ok(ServerFeatures {
            store,
            known_features,
            host,
        })
    }
}

fn dependency_unavailable(name: &str) -> StoreError {
    let err = StoreError::new(
        ErrorKind::DependencyUnavailable,
        format!("Server Features cannot start, the {name} is unavailable."),
    );
    log_err!(event_id: err.kind.as_u16(), "{}", err);
    err
}

impl Debug for ServerFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerFeatures")
            .field("known_features", &self.known_features)
            .finish_non_exhaustive()
    }
}
