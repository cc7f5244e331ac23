use crate::cache;
use crate::chain::{Chain, IndexPolicy, MatchTrace, MatcherStats};
use crate::error::{CacheError, Error};
use crate::knowledge::{DeviceEntry, KnowledgeBase};
use crate::resolver;
use crate::source::RecordSource;
use crate::{AllowedGroups, DeviceRecord};
use std::path::Path;
use tracing::{info, warn};

/// Options that affect loading and indexing.
#[derive(Debug, Clone)]
pub struct Options {
    /// Drop capability maps once properties are projected. Always applied
    /// before a snapshot is written, whatever this says.
    pub compact: bool,
    /// Snapshots with this many devices or fewer are treated as truncated.
    pub min_cached_devices: usize,
    /// Which device keeps a signature key that several devices normalize to.
    pub index_policy: IndexPolicy,
    /// Device answered when nothing more specific matches. Must be loaded.
    pub generic_id: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            compact: true,
            min_cached_devices: cache::DEFAULT_MIN_DEVICES,
            index_policy: IndexPolicy::default(),
            generic_id: "generic".to_string(),
        }
    }
}

/// A match together with the chain's reasoning.
#[derive(Debug, Clone)]
pub struct MatchDetails<'a> {
    pub trace: MatchTrace,
    /// `None` only if the chain named a device the knowledge base lacks.
    pub device: Option<&'a DeviceEntry>,
}

/// Loaded knowledge base plus the classification chain indexed over it.
///
/// Read-only once built; share it across threads by reference or `Arc`.
#[derive(Debug)]
pub struct Repository {
    kb: KnowledgeBase,
    chain: Chain,
}

impl Repository {
    /// Resolve `records` and index every resolved device.
    pub fn build<I>(records: I, groups: &AllowedGroups, options: &Options) -> Result<Self, Error>
    where
        I: IntoIterator<Item = DeviceRecord>,
    {
        let kb = resolver::resolve(records, groups)?;
        Self::from_knowledge_base(kb, options)
    }

    /// Index an already resolved knowledge base, e.g. one read from a cache.
    ///
    /// Devices are indexed in registration order, so the same knowledge base
    /// always produces the same index.
    pub fn from_knowledge_base(mut kb: KnowledgeBase, options: &Options) -> Result<Self, Error> {
        if !kb.contains(&options.generic_id) {
            return Err(Error::MissingGeneric(options.generic_id.clone()));
        }

        let mut chain = Chain::with_default_matchers(options.generic_id.as_str()).with_policy(options.index_policy);
        let mut unclaimed = 0usize;
        for entry in kb.iter() {
            if chain.filter(&entry.user_agent, &entry.id).is_none() {
                unclaimed += 1;
            }
        }
        chain.prune_fallbacks(|id| kb.contains(id));

        if options.compact {
            kb.compact();
        }
        info!(devices = kb.len(), unindexed = unclaimed, compacted = kb.is_compacted(), "device repository ready");
        Ok(Repository { kb, chain })
    }

    /// Load from the snapshot at `cache_path` if it is usable and was
    /// resolved with the same `groups`, otherwise resolve `source` and write
    /// a fresh snapshot there.
    ///
    /// A bad or missing snapshot is never an error; neither is failing to
    /// write one. Source and resolution failures are.
    pub fn build_or_load<S>(
        source: &S,
        groups: &AllowedGroups,
        cache_path: Option<&Path>,
        options: &Options,
    ) -> Result<Self, Error>
    where
        S: RecordSource + ?Sized,
    {
        if let Some(path) = cache_path {
            if let Some(kb) = cache::load(path, groups, options.min_cached_devices) {
                match Self::from_knowledge_base(kb, options) {
                    Ok(repo) => return Ok(repo),
                    Err(err) => warn!(path = %path.display(), error = %err, "ignoring device cache"),
                }
            }
        }

        let records = source.records()?;
        let mut repo = Self::build(records, groups, options)?;

        if let Some(path) = cache_path {
            repo.kb.compact();
            if let Err(err) = repo.save(path) {
                warn!(path = %path.display(), error = %err, "failed to write device cache");
            }
        }
        Ok(repo)
    }

    /// The device for `ua`. Never `None` for a consistent repository: unknown
    /// input resolves to the generic device.
    pub fn match_ua(&self, ua: &str) -> Option<&DeviceEntry> {
        self.kb.find(self.chain.match_ua(ua))
    }

    pub fn explain(&self, ua: &str) -> MatchDetails<'_> {
        let trace = self.chain.explain(ua);
        let device = self.kb.find(&trace.device_id);
        MatchDetails { trace, device }
    }

    pub fn find(&self, id: &str) -> Option<&DeviceEntry> {
        self.kb.find(id)
    }

    /// Write the knowledge base as a cache snapshot.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        cache::save(path, &self.kb)
    }

    pub fn len(&self) -> usize {
        self.kb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kb.is_empty()
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn stats(&self) -> Vec<MatcherStats> {
        self.chain.stats()
    }
}
