use serde::{Deserialize, Serialize};
use std::collections::btree_map::Iter;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// The set of feature names overridden for a single guild.
pub type OverrideSet = BTreeSet<String>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Override blob parsing failed. ({0})")]
    Parse(String),
    #[error("Override table serialization failed. ({0})")]
    Serialize(String),
}

/// Mapping of guild ids to the features that are overridden for them.
///
/// A guild is present in the table only while it has at least one override, so
/// [`OverrideTable::contains_guild`] answers whether a guild has any override at all.
///
/// # Examples
///
/// ```rust
/// use server_features::{InMemorySettings, OverrideStore};
///
/// let store = OverrideStore::initialize(Box::new(InMemorySettings::new())).unwrap();
/// store.toggle("123", "COMMUNITY").unwrap();
///
/// let table = store.snapshot();
/// assert!(table.contains_guild("123"));
/// assert!(table.contains("123", "COMMUNITY"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable {
    guilds: BTreeMap<String, OverrideSet>,
}

impl OverrideTable {
    /// Creates an empty [`OverrideTable`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `feature` is overridden for the guild identified by `guild_id`.
    pub fn contains(&self, guild_id: &str, feature: &str) -> bool {
        self.guilds
            .get(guild_id)
            .is_some_and(|set| set.contains(feature))
    }

    /// Returns `true` if the guild identified by `guild_id` has at least one override.
    pub fn contains_guild(&self, guild_id: &str) -> bool {
        self.guilds.contains_key(guild_id)
    }

    /// Gets the overridden features of the guild identified by `guild_id`.
    pub fn get(&self, guild_id: &str) -> Option<&OverrideSet> {
        self.guilds.get(guild_id)
    }

    /// Iterates over the guilds that have overrides, ordered by guild id.
    pub fn iter(&self) -> Iter<'_, String, OverrideSet> {
        self.guilds.iter()
    }

    /// Number of guilds with at least one override.
    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    /// Returns `true` if no guild has any override.
    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    /// Flips `feature` for `guild_id` and returns whether it is overridden afterwards.
    pub(crate) fn toggle(&mut self, guild_id: &str, feature: &str) -> bool {
        match self.guilds.get_mut(guild_id) {
            Some(set) => {
                if set.remove(feature) {
                    if set.is_empty() {
                        self.guilds.remove(guild_id);
                    }
                    false
                } else {
                    set.insert(feature.to_owned());
                    true
                }
            }
            None => {
                self.guilds.insert(
                    guild_id.to_owned(),
                    OverrideSet::from([feature.to_owned()]),
                );
                true
            }
        }
    }

    pub(crate) fn remove_guild(&mut self, guild_id: &str) -> Option<OverrideSet> {
        self.guilds.remove(guild_id)
    }

    pub(crate) fn clear(&mut self) {
        self.guilds.clear();
    }

    pub(crate) fn serialize(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|err| Error::Serialize(err.to_string()))
    }
}

pub fn table_from_json(json: &str) -> Result<OverrideTable, Error> {
    match serde_json::from_str::<OverrideTable>(json) {
        Ok(mut table) => {
            table.guilds.retain(|_, set| !set.is_empty());
            Ok(table)
        }
        Err(err) => Err(Error::Parse(err.to_string())),
    }
}
