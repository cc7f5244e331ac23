//! Classification chain.
//!
//! The chain is an ordered list of [`Matcher`]s. The same traversal serves
//! both phases:
//!
//! ```text
//! ua ── Signals::scan ──▶ first matcher whose signals admit it and whose
//!       (signals.rs)       predicate claims it
//!                                   │
//!                                   ▼
//!                          matcher.normalize(ua)   (normalize.rs)
//!                                   │
//!               ┌───────────────────┴───────────────────┐
//!          filter (load)                           match (query)
//!     index key -> device id                 exact / reduced / fallback
//!     (IndexPolicy decides                   (matcher.rs); no matcher or
//!      repeated keys)                        no hit -> generic device
//! ```
//!
//! A user-agent claimed by one matcher is never handed to a later one, so a
//! query is always answered by the same family that indexed equivalent known
//! devices.
//!
//! ## Totality
//!
//! `match_ua` never fails. If nothing claims the input, or the claiming
//! matcher has neither a close enough key nor a fallback of its own, the
//! chain answers with its generic device id. The repository refuses to start
//! when that id is not loaded.
//!
//! ## Responsibilities by module
//!
//! - `signals.rs`: coarse pre-scan used to skip matchers cheaply.
//! - `normalize.rs`: normalizer pipelines and their steps.
//! - `matcher.rs`: the `Matcher` trait, `RuleMatcher` and the ordered index.
//! - `catalog.rs`: the default, ordered matcher list.
//! - `trace.rs`: explain and statistics types.
//!
//! The chain is built once and only read afterwards; `match_ua` and
//! `explain` take `&self` and are safe to call from many threads.

#[path = "chain/catalog.rs"]
mod catalog;
#[path = "chain/matcher.rs"]
mod matcher;
#[path = "chain/normalize.rs"]
mod normalize;
#[path = "chain/signals.rs"]
mod signals;
#[path = "chain/trace.rs"]
mod trace;

#[cfg(test)]
#[path = "chain/tests.rs"]
mod tests;

pub use matcher::{Hit, IndexPolicy, Indexed, Matcher, Reduction, RuleMatcher, SignatureIndex};
pub use normalize::Normalizer;
pub use signals::Signals;
pub use trace::{MatchOutcome, MatchTrace, MatcherStats};

use tracing::debug;

/// Prefix marking catalog entries that must never be matched directly.
const DO_NOT_MATCH: &str = "DO_NOT_MATCH";

/// Ordered matcher list plus the generic device that makes matching total.
#[derive(Debug)]
pub struct Chain {
    matchers: Vec<Box<dyn Matcher>>,
    generic_id: String,
    policy: IndexPolicy,
}

impl Chain {
    /// An empty chain. Everything matches `generic_id` until matchers are added.
    pub fn new(generic_id: impl Into<String>) -> Self {
        Chain { matchers: Vec::new(), generic_id: generic_id.into(), policy: IndexPolicy::default() }
    }

    /// The default catalog, ending with the catch-all.
    pub fn with_default_matchers(generic_id: impl Into<String>) -> Self {
        let mut chain = Chain::new(generic_id);
        chain.matchers = catalog::default_matchers();
        chain
    }

    pub fn with_policy(mut self, policy: IndexPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append a matcher. Matchers added later have lower priority.
    pub fn push(&mut self, matcher: Box<dyn Matcher>) {
        self.matchers.push(matcher);
    }

    pub fn generic_id(&self) -> &str {
        &self.generic_id
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// The matcher that owns `ua`.
    fn select(&self, ua: &str, signals: Signals) -> Option<&dyn Matcher> {
        self.matchers.iter().map(|m| m.as_ref()).find(|m| signals.admits(m.signals()) && m.claims(ua))
    }

    /// Index a known device signature. Returns the owning matcher's name, or
    /// `None` if the signature is excluded or nothing claimed it.
    pub fn filter(&mut self, ua: &str, device_id: &str) -> Option<&'static str> {
        if ua.starts_with(DO_NOT_MATCH) {
            return None;
        }
        let signals = Signals::scan(ua);
        let policy = self.policy;
        let matcher = self.matchers.iter_mut().find(|m| signals.admits(m.signals()) && m.claims(ua))?;
        let key = matcher.normalize(ua);
        let indexed = matcher.index(key, device_id, policy);
        if indexed != Indexed::Inserted {
            debug!(matcher = matcher.name(), device = device_id, ?indexed, "signature key already indexed");
        }
        Some(matcher.name())
    }

    /// Drop matcher fallbacks that `exists` does not know about, so that every
    /// answer names a loaded device.
    pub fn prune_fallbacks(&mut self, exists: impl Fn(&str) -> bool) {
        for matcher in &mut self.matchers {
            matcher.prune_fallback(&exists);
        }
    }

    /// The most specific device id for `ua`.
    pub fn match_ua(&self, ua: &str) -> &str {
        let (_, _, hit) = self.classify(ua);
        hit.device_id
    }

    /// Like [`Chain::match_ua`], with the reasoning attached.
    pub fn explain(&self, ua: &str) -> MatchTrace {
        let (matcher, normalized, hit) = self.classify(ua);
        MatchTrace {
            matcher,
            signals: Signals::scan(ua),
            normalized,
            outcome: hit.outcome,
            device_id: hit.device_id.to_string(),
        }
    }

    fn classify(&self, ua: &str) -> (Option<&'static str>, String, Hit<'_>) {
        let generic = Hit { device_id: self.generic_id.as_str(), outcome: MatchOutcome::Fallback };
        let signals = Signals::scan(ua);

        let Some(matcher) = self.select(ua, signals) else {
            debug!(ua, "no matcher claimed user agent");
            return (None, ua.to_string(), generic);
        };
        let normalized = matcher.normalize(ua);
        let hit = matcher.lookup(&normalized).unwrap_or(generic);
        debug!(matcher = matcher.name(), device = hit.device_id, outcome = ?hit.outcome, "classified user agent");
        (Some(matcher.name()), normalized, hit)
    }

    pub fn stats(&self) -> Vec<MatcherStats> {
        self.matchers.iter().map(|m| m.stats()).collect()
    }
}
