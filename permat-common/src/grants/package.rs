//! Package to feature assignment operations

use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Package id -> set of assigned feature ids. One level deep, same pure
/// operation style as the role tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFeatureMap {
    pub(crate) entries: BTreeMap<String, BTreeSet<String>>,
}

impl PackageFeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_package(&self, package_id: &str) -> bool {
        self.entries.contains_key(package_id)
    }

    pub fn features_of(&self, package_id: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(package_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.entries.iter()
    }

    /// Align keys with the current package list; see
    /// [`super::RoleGrantMap::reconcile_roles`] for the trade-off on
    /// dropped keys.
    pub fn reconcile_packages(&self, package_ids: &[String]) -> Self {
        let mut next = self.clone();
        let dropped: Vec<String> = next
            .entries
            .keys()
            .filter(|key| !package_ids.contains(key))
            .cloned()
            .collect();
        for key in &dropped {
            next.entries.remove(key);
        }
        if !dropped.is_empty() {
            info!(
                "Dropped {} package assignment entr{} with no matching package",
                dropped.len(),
                if dropped.len() == 1 { "y" } else { "ies" }
            );
        }
        for id in package_ids {
            next.entries.entry(id.clone()).or_default();
        }
        next
    }

    /// Assign a feature to a package. Idempotent; creates the package key
    /// when absent.
    pub fn add_feature(&self, package_id: &str, feature_id: &str) -> Self {
        let mut next = self.clone();
        next.entries
            .entry(package_id.to_string())
            .or_default()
            .insert(feature_id.to_string());
        next
    }

    /// Withdraw one feature from a package. The package key stays even when
    /// its set empties.
    pub fn remove_feature(&self, package_id: &str, feature_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(features) = next.entries.get_mut(package_id) {
            features.remove(feature_id);
        }
        next
    }

    /// Empty a package's feature set, keeping the key. Unknown packages are
    /// left untouched.
    pub fn clear_package(&self, package_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(features) = next.entries.get_mut(package_id) {
            features.clear();
        }
        next
    }

    /// Rename a package key; on collision the two feature sets union.
    pub fn rekey_package(&self, old_id: &str, new_id: &str) -> Self {
        let mut next = self.clone();
        if old_id == new_id {
            return next;
        }
        if let Some(moved) = next.entries.remove(old_id) {
            next.entries.entry(new_id.to_string()).or_default().extend(moved);
        }
        next
    }

    /// Replace a feature id inside every set it occurs in.
    pub fn rekey_feature(&self, old_id: &str, new_id: &str) -> Self {
        let mut next = self.clone();
        if old_id == new_id {
            return next;
        }
        for features in next.entries.values_mut() {
            if features.remove(old_id) {
                features.insert(new_id.to_string());
            }
        }
        next
    }

    /// Remove a feature id from every set. Applied when the feature entity
    /// is deleted.
    pub fn purge_feature(&self, feature_id: &str) -> Self {
        let mut next = self.clone();
        for features in next.entries.values_mut() {
            features.remove(feature_id);
        }
        next
    }

    /// Flatten to (package, feature) pairs for export. Present-empty
    /// packages yield nothing.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for (package_id, features) in &self.entries {
            for feature_id in features {
                out.push((package_id.as_str(), feature_id.as_str()));
            }
        }
        out
    }
}
