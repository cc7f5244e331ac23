//! Resolved devices and the knowledge base that owns them.
//!
//! The knowledge base is filled once, by the resolver, and is read-only after
//! that. Registering after [`KnowledgeBase::compact`] is rejected: supporting
//! incremental registration would need a writer lock and a parent-existence
//! check made visible atomically to concurrent readers.

use crate::error::RegisterError;
use crate::{AllowedGroups, CapabilityMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Fixed projection of the capabilities most callers care about.
///
/// Missing capabilities project to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    pub brand_name: String,
    pub model_name: String,
    pub marketing_name: String,
    pub preferred_markup: String,
    pub resolution_width: String,
    pub resolution_height: String,
    pub device_os: String,
    pub device_os_version: String,
    pub mobile_browser: String,
    pub mobile_browser_version: String,
}

impl Properties {
    pub fn from_capabilities(caps: &CapabilityMap) -> Self {
        let get = |name: &str| caps.get(name).unwrap_or_default().to_string();
        Properties {
            brand_name: get("brand_name"),
            model_name: get("model_name"),
            marketing_name: get("marketing_name"),
            preferred_markup: get("preferred_markup"),
            resolution_width: get("resolution_width"),
            resolution_height: get("resolution_height"),
            device_os: get("device_os"),
            device_os_version: get("device_os_version"),
            mobile_browser: get("mobile_browser"),
            mobile_browser_version: get("mobile_browser_version"),
        }
    }
}

/// A resolved device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    pub user_agent: String,
    /// `None` for root devices.
    pub parent: Option<String>,
    /// Ids of devices that fall back to this one.
    pub children: BTreeSet<String>,
    pub actual_device_root: bool,
    pub properties: Properties,
    /// Merged capabilities; dropped by compaction and never persisted.
    #[serde(skip)]
    capabilities: Option<CapabilityMap>,
}

impl DeviceEntry {
    /// The merged capability map, or `None` once the entry has been compacted.
    pub fn capabilities(&self) -> Option<&CapabilityMap> {
        self.capabilities.as_ref()
    }

    pub fn capability(&self, name: &str) -> Option<&str> {
        self.capabilities.as_ref()?.get(name)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Device id -> resolved [`DeviceEntry`].
///
/// Entries keep registration order, which is also the order the
/// classification chain indexes them in.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<DeviceEntry>,
    by_id: HashMap<String, usize>,
    /// Sorted names of the capability groups the entries were resolved with.
    groups: Vec<String>,
    compacted: bool,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty knowledge base that records `allowed` as its group list.
    pub fn with_groups(allowed: &AllowedGroups) -> Self {
        KnowledgeBase { groups: allowed.names(), ..Self::default() }
    }

    /// Rebuild a knowledge base from already-compacted entries (a cache
    /// snapshot). Every non-root entry's parent must be present.
    pub fn from_entries(groups: Vec<String>, entries: Vec<DeviceEntry>) -> Result<Self, RegisterError> {
        let mut by_id = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if by_id.insert(entry.id.clone(), idx).is_some() {
                return Err(RegisterError::Duplicate(entry.id.clone()));
            }
        }
        for entry in &entries {
            if let Some(parent) = &entry.parent {
                if !by_id.contains_key(parent) {
                    return Err(RegisterError::UnregisteredParent {
                        device: entry.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(KnowledgeBase { entries, by_id, groups, compacted: true })
    }

    pub fn find(&self, id: &str) -> Option<&DeviceEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_compacted(&self) -> bool {
        self.compacted
    }

    /// Capability groups the entries were resolved with, sorted.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }

    pub(crate) fn entries(&self) -> &[DeviceEntry] {
        &self.entries
    }

    /// Children of `id`, or `None` if the device is unknown.
    pub fn children(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.find(id).map(|e| &e.children)
    }

    /// The device `id` followed by each ancestor up to its root.
    pub fn lineage(&self, id: &str) -> impl Iterator<Item = &DeviceEntry> {
        std::iter::successors(self.find(id), move |entry| entry.parent.as_deref().and_then(|p| self.find(p)))
    }

    /// Insert a device whose parent (if any) is already registered.
    ///
    /// `own` holds the device's own, group-filtered capabilities; the stored
    /// map is the parent's merged map overlaid by `own`.
    pub fn register(
        &mut self,
        id: &str,
        user_agent: &str,
        actual_device_root: bool,
        own: CapabilityMap,
        parent: Option<&str>,
    ) -> Result<&DeviceEntry, RegisterError> {
        if self.compacted {
            return Err(RegisterError::Compacted(id.to_string()));
        }
        if self.by_id.contains_key(id) {
            return Err(RegisterError::Duplicate(id.to_string()));
        }

        let capabilities = match parent {
            None => own,
            Some(parent_id) => {
                let parent_idx = *self.by_id.get(parent_id).ok_or_else(|| RegisterError::UnregisteredParent {
                    device: id.to_string(),
                    parent: parent_id.to_string(),
                })?;
                let inherited = self.entries[parent_idx]
                    .capabilities
                    .as_ref()
                    .ok_or_else(|| RegisterError::Compacted(id.to_string()))?;
                let merged = CapabilityMap::overlay(inherited, own);
                self.entries[parent_idx].children.insert(id.to_string());
                merged
            }
        };

        let entry = DeviceEntry {
            id: id.to_string(),
            user_agent: user_agent.to_string(),
            parent: parent.map(str::to_string),
            children: BTreeSet::new(),
            actual_device_root,
            properties: Properties::from_capabilities(&capabilities),
            capabilities: Some(capabilities),
        };

        let idx = self.entries.len();
        self.by_id.insert(entry.id.clone(), idx);
        self.entries.push(entry);
        Ok(&self.entries[idx])
    }

    /// Project properties from each capability map, then drop the maps.
    ///
    /// Idempotent; after this only [`Properties`] remain and no further
    /// registration is possible.
    pub fn compact(&mut self) {
        for entry in &mut self.entries {
            if let Some(caps) = entry.capabilities.take() {
                entry.properties = Properties::from_capabilities(&caps);
            }
        }
        self.compacted = true;
    }
}
