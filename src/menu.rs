use crate::OverrideStore;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// The features a guild can have, as enumerated by the host.
///
/// The names are kept sorted and de-duplicated; that order is the order of the menu entries.
///
/// # Examples
///
/// ```rust
/// use server_features::KnownFeatures;
///
/// let features = KnownFeatures::from(["HUB", "COMMUNITY", "HUB"]);
/// assert_eq!(features.names(), ["COMMUNITY", "HUB"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownFeatures {
    names: Vec<String>,
}

impl KnownFeatures {
    /// The sorted feature names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of known features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the host enumerates no feature at all.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownFeatures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names = iter.into_iter().map(Into::into).collect::<Vec<String>>();
        names.sort();
        names.dedup();
        Self { names }
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for KnownFeatures {
    fn from(arr: [S; N]) -> Self {
        arr.into_iter().collect()
    }
}

impl From<Vec<String>> for KnownFeatures {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

/// Color the host uses to draw a feature entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Highlight {
    /// The entry is not overridden.
    Default,
    /// The entry is overridden locally.
    Brand,
}

impl Display for Highlight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Highlight::Default => f.write_str("colorDefault"),
            Highlight::Brand => f.write_str("colorBrand"),
        }
    }
}

/// Display state of one feature checkbox in the guild's feature submenu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEntry {
    /// Name of the feature.
    pub feature: String,
    /// Whether the checkbox is drawn checked.
    pub checked: bool,
    /// Whether the feature is overridden locally for the guild.
    pub overridden: bool,
}

impl FeatureEntry {
    /// Color of the entry.
    pub fn highlight(&self) -> Highlight {
        if self.overridden {
            Highlight::Brand
        } else {
            Highlight::Default
        }
    }
}

// An override flips the reported membership instead of replacing it. The whole menu is read from
// one snapshot so a concurrent click shows up in every entry or in none.
pub(crate) fn feature_entries(
    store: &OverrideStore,
    known: &KnownFeatures,
    guild_id: &str,
    reported: &HashSet<String>,
) -> Vec<FeatureEntry> {
    let table = store.snapshot();
    known
        .names()
        .iter()
        .map(|feature| {
            let overridden = table.contains(guild_id, feature);
            FeatureEntry {
                feature: feature.clone(),
                checked: reported.contains(feature) ^ overridden,
                overridden,
            }
        })
        .collect()
}
