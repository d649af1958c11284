//! Local per-guild feature overrides for the Server Features context menu plugin.
//!
//! The [`OverrideStore`] remembers which features a user flipped for which guild and
//! persists every change through a [`SettingsStore`]. The [`ServerFeatures`] plugin builds
//! the feature submenu entries from it and routes the menu clicks back into it.

#![warn(missing_docs)]

#[macro_use]
mod macros;
mod builder;
mod constants;
mod errors;
mod menu;
mod model;
mod plugin;
mod settings;
mod store;

pub use builder::StoreBuilder;
pub use constants::PKG_VERSION;
pub use errors::{ErrorKind, StoreError};
pub use menu::{FeatureEntry, Highlight, KnownFeatures};
pub use model::table::{OverrideSet, OverrideTable};
pub use plugin::{MenuHost, PluginBuilder, ServerFeatures};
pub use settings::{FileSettings, InMemorySettings, SettingsStore};
pub use store::OverrideStore;
