//! Capability maps and the group allow-list.

use crate::CapabilityGroup;
use std::collections::{BTreeMap, HashSet};

/// Name -> value map of device capabilities.
///
/// Keys are case-sensitive. A map is built once per device during resolution
/// and not mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityMap {
    entries: BTreeMap<String, String>,
}

impl CapabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the capabilities of every allowed group. Later entries with the
    /// same name override earlier ones, matching document order.
    pub fn from_groups(groups: &[CapabilityGroup], allowed: &AllowedGroups) -> Self {
        let mut map = CapabilityMap::new();
        for group in groups.iter().filter(|g| allowed.contains(&g.id)) {
            for cap in &group.capabilities {
                map.entries.insert(cap.name.clone(), cap.value.clone());
            }
        }
        map
    }

    /// The parent's merged map overlaid by `own`. The result is an independent
    /// copy; nothing is shared with `parent`.
    pub fn overlay(parent: &CapabilityMap, own: CapabilityMap) -> Self {
        let mut entries = parent.entries.clone();
        entries.extend(own.entries);
        CapabilityMap { entries }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CapabilityMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        CapabilityMap { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Capability groups a load is allowed to merge.
///
/// Groups outside the list are skipped entirely, which keeps the memory
/// footprint proportional to what the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedGroups {
    groups: HashSet<String>,
}

impl AllowedGroups {
    /// Parse a comma-separated list such as `"product_info, display"`.
    pub fn from_csv(csv: &str) -> Self {
        csv.split(',').map(str::trim).filter(|g| !g.is_empty()).collect()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group names in sorted order, independent of how the list was written.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().cloned().collect();
        names.sort();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedGroups {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AllowedGroups { groups: iter.into_iter().map(Into::into).collect() }
    }
}
