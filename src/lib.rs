//! Device detection over an inheritance-linked capability database.
//!
//! The crate has two halves:
//!
//! - The **hierarchy resolver** ([`resolver`]) turns a stream of
//!   [`DeviceRecord`]s, which may reference parents that appear later in the
//!   stream, into a [`KnowledgeBase`] of fully merged devices.
//! - The **classification chain** ([`Chain`]) indexes every known user-agent
//!   at load time and maps an arbitrary user-agent to the most specific known
//!   device id at query time. Matching is total: unknown input resolves to a
//!   generic device, never to an error.
//!
//! [`Repository`] ties the two together and is what most callers use:
//!
//! ```no_run
//! use handset::{AllowedGroups, Options, Repository, XmlFile};
//! use std::path::Path;
//!
//! let groups = AllowedGroups::from_csv("product_info,display");
//! let source = XmlFile::new("wurfl.xml");
//! let repo = Repository::build_or_load(&source, &groups, Some(Path::new("wurfl.bin")), &Options::default())?;
//!
//! if let Some(device) = repo.match_ua("Mozilla/5.0 (Linux; Android 9; Pixel 3)") {
//!     println!("{} {}", device.properties.brand_name, device.properties.model_name);
//! }
//! # Ok::<(), handset::Error>(())
//! ```

extern crate self as handset;

#[macro_use]
mod macros;
mod api;
pub mod cache;
mod capability;
mod chain;
mod error;
mod knowledge;
pub mod resolver;
mod source;

pub use api::{MatchDetails, Options, Repository};
pub use capability::{AllowedGroups, CapabilityMap};
pub use chain::{
    Chain, Hit, IndexPolicy, Indexed, MatchOutcome, MatchTrace, Matcher, MatcherStats, Normalizer, Reduction,
    RuleMatcher, SignatureIndex, Signals,
};
pub use error::{CacheError, Error, RegisterError, ResolveError, SourceError};
pub use knowledge::{DeviceEntry, KnowledgeBase, Properties};
pub use source::{RecordSource, XmlFile, parse_records};

/// Parent id used by the source format to mark a root device.
pub const ROOT_SENTINEL: &str = "root";

// --- Input records ----------------------------------------------------------

/// A single named capability as it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub value: String,
}

/// A named group of capabilities (`product_info`, `display`, ...).
///
/// Only groups listed in an [`AllowedGroups`] filter reach a device's merged
/// capability map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityGroup {
    pub id: String,
    pub capabilities: Vec<Capability>,
}

/// One device as delivered by a [`RecordSource`], before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceRecord {
    pub id: String,
    /// Parent ("fall back") id. Empty or [`ROOT_SENTINEL`] marks a root.
    pub fall_back: String,
    pub user_agent: String,
    pub actual_device_root: bool,
    pub groups: Vec<CapabilityGroup>,
}

impl DeviceRecord {
    /// Convenience constructor for a record without capability groups.
    pub fn new(id: impl Into<String>, fall_back: impl Into<String>, user_agent: impl Into<String>) -> Self {
        DeviceRecord {
            id: id.into(),
            fall_back: fall_back.into(),
            user_agent: user_agent.into(),
            actual_device_root: false,
            groups: Vec::new(),
        }
    }

    /// Append a capability to the group `group`, creating the group on first use.
    pub fn with_capability(mut self, group: &str, name: impl Into<String>, value: impl Into<String>) -> Self {
        let capability = Capability { name: name.into(), value: value.into() };
        match self.groups.iter_mut().find(|g| g.id == group) {
            Some(existing) => existing.capabilities.push(capability),
            None => self.groups.push(CapabilityGroup { id: group.to_string(), capabilities: vec![capability] }),
        }
        self
    }

    /// Mark the record as a concrete device (`actual_device_root`).
    pub fn actual_device(mut self) -> Self {
        self.actual_device_root = true;
        self
    }

    /// The parent id, or `None` for a root record.
    pub fn parent_id(&self) -> Option<&str> {
        match self.fall_back.as_str() {
            "" | ROOT_SENTINEL => None,
            parent => Some(parent),
        }
    }
}
