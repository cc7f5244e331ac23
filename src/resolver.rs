//! Hierarchy and capability resolution.
//!
//! Records arrive in source order and may fall back to a parent that has not
//! been seen yet. Resolution runs in two phases:
//!
//! ```text
//! record ──┬─ root, or parent already registered ──▶ register
//!          └─ parent unknown ──▶ deferred (FIFO)
//!
//! deferred ── pop ──┬─ parent registered ──▶ register, progress
//!                   └─ otherwise ──▶ requeue
//!                        └─ a whole pass without progress ──▶ error
//! ```
//!
//! A pass over the deferred queue that registers nothing means every
//! remaining record waits on a parent that is absent from the source or that
//! (transitively) waits on the record itself. The resolver reports which one
//! instead of spinning.

use crate::error::ResolveError;
use crate::{AllowedGroups, CapabilityMap, DeviceRecord, KnowledgeBase};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Incremental resolver: feed records with [`Resolver::push`], then call
/// [`Resolver::finish`].
#[derive(Debug)]
pub struct Resolver<'a> {
    allowed: &'a AllowedGroups,
    kb: KnowledgeBase,
    /// Every id pushed so far (registered or deferred).
    seen: HashSet<String>,
    /// Records waiting for their parent, keyed by id.
    pending: HashMap<String, DeviceRecord>,
    deferred: VecDeque<String>,
    position: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(allowed: &'a AllowedGroups) -> Self {
        Resolver {
            allowed,
            kb: KnowledgeBase::with_groups(allowed),
            seen: HashSet::new(),
            pending: HashMap::new(),
            deferred: VecDeque::new(),
            position: 0,
        }
    }

    /// Register `record` now if its parent is known, otherwise defer it.
    pub fn push(&mut self, record: DeviceRecord) -> Result<(), ResolveError> {
        let position = self.position;
        self.position += 1;

        if record.id.is_empty() {
            return Err(ResolveError::EmptyId { position });
        }
        if !self.seen.insert(record.id.clone()) {
            return Err(ResolveError::DuplicateId(record.id));
        }

        let ready = match record.parent_id() {
            None => true,
            Some(parent) => self.kb.contains(parent),
        };
        if ready {
            self.register(&record)
        } else {
            debug!(device = %record.id, parent = %record.fall_back, "deferring device until parent is registered");
            self.deferred.push_back(record.id.clone());
            self.pending.insert(record.id.clone(), record);
            Ok(())
        }
    }

    /// Drain the deferred queue and return the finished knowledge base.
    pub fn finish(mut self) -> Result<KnowledgeBase, ResolveError> {
        let deferred_total = self.deferred.len();
        let mut stalled = 0usize;

        while let Some(id) = self.deferred.pop_front() {
            let Some(record) = self.pending.remove(&id) else {
                continue;
            };
            let parent_ready = record.parent_id().is_some_and(|parent| self.kb.contains(parent));

            if parent_ready {
                self.register(&record)?;
                stalled = 0;
            } else {
                self.pending.insert(id.clone(), record);
                self.deferred.push_back(id.clone());
                stalled += 1;
                if stalled >= self.deferred.len() {
                    return Err(self.diagnose(&id));
                }
            }
        }

        info!(devices = self.kb.len(), deferred = deferred_total, "resolved device hierarchy");
        Ok(self.kb)
    }

    fn register(&mut self, record: &DeviceRecord) -> Result<(), ResolveError> {
        let own = CapabilityMap::from_groups(&record.groups, self.allowed);
        self.kb.register(&record.id, &record.user_agent, record.actual_device_root, own, record.parent_id())?;
        Ok(())
    }

    /// Follow fall backs from a stuck record until they leave the source or
    /// loop back on themselves.
    fn diagnose(&self, start: &str) -> ResolveError {
        let mut path: Vec<String> = vec![start.to_string()];
        let mut current = start;

        loop {
            let Some(parent) = self.pending.get(current).and_then(DeviceRecord::parent_id) else {
                // Only records with an unresolved parent are pending.
                return ResolveError::MissingParent { device: current.to_string(), parent: String::new() };
            };
            if !self.seen.contains(parent) || !self.pending.contains_key(parent) {
                return ResolveError::MissingParent { device: current.to_string(), parent: parent.to_string() };
            }
            if let Some(pos) = path.iter().position(|id| id == parent) {
                let mut cycle = path.split_off(pos);
                cycle.push(parent.to_string());
                return ResolveError::CyclicParent { cycle };
            }
            path.push(parent.to_string());
            current = parent;
        }
    }
}

/// Resolve `records` into a knowledge base, merging only `allowed` groups.
pub fn resolve<I>(records: I, allowed: &AllowedGroups) -> Result<KnowledgeBase, ResolveError>
where
    I: IntoIterator<Item = DeviceRecord>,
{
    let mut resolver = Resolver::new(allowed);
    for record in records {
        resolver.push(record)?;
    }
    resolver.finish()
}
