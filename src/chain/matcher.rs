//! Matchers and their signature indexes.
//!
//! A matcher owns one vendor or browser family. It answers four questions:
//!
//! - does it claim a raw user-agent (`claims`, gated by `signals`),
//! - what is the canonical key of that user-agent (`normalize`),
//! - index a known `key -> device id` (`index`),
//! - which device does a query key map to (`lookup`).
//!
//! ## Lookup degradation
//!
//! ```text
//! key ──▶ exact hit? ──yes──▶ Exact
//!           │ no
//!           ▼
//!        nearest indexed neighbour with common prefix >= tolerance? ──yes──▶ Reduced
//!           │ no
//!           ▼
//!        own fallback device? ──yes──▶ Fallback
//!           │ no
//!           ▼
//!        None (the chain answers with its generic device)
//! ```
//!
//! The index is ordered, so the key sharing the longest prefix with a query
//! is always one of the query's two sorted neighbours. Reduction costs two
//! range lookups, not a scan.

use super::normalize::Normalizer;
use super::signals::Signals;
use super::trace::{MatchOutcome, MatcherStats};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

/// What happens when a second device normalizes to an indexed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Keep the device indexed first.
    #[default]
    FirstWins,
    /// Replace with the device indexed last.
    LastWins,
}

/// Result of indexing one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexed {
    Inserted,
    /// The key already existed and the earlier device was kept.
    Kept,
    Replaced,
}

/// How much of a normalized key must match before a near miss is accepted.
#[derive(Debug, Clone, Copy)]
pub enum Reduction {
    /// Exact keys only.
    Exact,
    /// Up to and including the first `/`.
    FirstSlash,
    /// Up to and including the second `/`.
    SecondSlash,
    /// Up to and including the first `;`.
    FirstSemicolon,
    /// Up to and including the first space.
    FirstSpace,
    /// Up to and including the first occurrence of the token.
    Through(&'static str),
    /// Custom tolerance function.
    Custom(fn(&str) -> Option<usize>),
}

impl Reduction {
    /// Required common-prefix length for `key`, or `None` when `key` cannot
    /// be reduced under this policy.
    pub fn tolerance(&self, key: &str) -> Option<usize> {
        let tolerance = match self {
            Reduction::Exact => None,
            Reduction::FirstSlash => key.find('/').map(|i| i + 1),
            Reduction::SecondSlash => key.match_indices('/').nth(1).map(|(i, _)| i + 1),
            Reduction::FirstSemicolon => key.find(';').map(|i| i + 1),
            Reduction::FirstSpace => key.find(' ').map(|i| i + 1),
            Reduction::Through(token) => key.find(token).map(|i| i + token.len()),
            Reduction::Custom(f) => f(key),
        };
        tolerance.filter(|&t| t > 0)
    }
}

/// A device id returned by [`Matcher::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit<'a> {
    pub device_id: &'a str,
    pub outcome: MatchOutcome,
}

/// One link of the classification chain.
pub trait Matcher: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Signals that must be present before `claims` is consulted. Empty means
    /// always consult.
    fn signals(&self) -> Signals {
        Signals::empty()
    }

    fn claims(&self, ua: &str) -> bool;

    fn normalize(&self, ua: &str) -> String;

    fn index(&mut self, key: String, device_id: &str, policy: IndexPolicy) -> Indexed;

    fn lookup(&self, key: &str) -> Option<Hit<'_>>;

    /// Drop the matcher's own fallback device if `exists` rejects it.
    fn prune_fallback(&mut self, _exists: &dyn Fn(&str) -> bool) {}

    fn stats(&self) -> MatcherStats;
}

// --- Signature index -------------------------------------------------------------

/// Ordered `canonical key -> device id` map.
#[derive(Debug, Clone, Default)]
pub struct SignatureIndex {
    entries: BTreeMap<String, String>,
    collisions: usize,
}

impl SignatureIndex {
    pub fn insert(&mut self, key: String, device_id: &str, policy: IndexPolicy) -> Indexed {
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, device_id.to_string());
                Indexed::Inserted
            }
            Some(existing) => {
                if existing != device_id {
                    self.collisions += 1;
                }
                match policy {
                    IndexPolicy::FirstWins => Indexed::Kept,
                    IndexPolicy::LastWins => {
                        *existing = device_id.to_string();
                        Indexed::Replaced
                    }
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The indexed entry sharing the longest prefix with `key`, if that
    /// prefix is at least `tolerance` bytes. Ties go to the smaller key.
    pub fn nearest(&self, key: &str, tolerance: usize) -> Option<(&str, usize)> {
        let below = self
            .entries
            .range::<str, _>((Bound::Unbounded, Bound::Included(key)))
            .next_back()
            .map(|(k, id)| (id.as_str(), common_prefix(k, key)));
        let above = self
            .entries
            .range::<str, _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, id)| (id.as_str(), common_prefix(k, key)));

        let best = match (below, above) {
            (Some(b), Some(a)) => Some(if a.1 > b.1 { a } else { b }),
            (b, a) => b.or(a),
        };
        best.filter(|&(_, len)| len >= tolerance)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

fn common_prefix(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

// --- Rule-driven matcher ---------------------------------------------------------

/// The standard [`Matcher`]: a predicate, a normalizer pipeline, a reduction
/// policy and an optional family fallback device. Usually built with the
/// `matcher!` macro.
pub struct RuleMatcher {
    name: &'static str,
    signals: Signals,
    claims: fn(&str) -> bool,
    normalizer: Normalizer,
    reduction: Reduction,
    fallback: Option<String>,
    index: SignatureIndex,
}

impl fmt::Debug for RuleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleMatcher")
            .field("name", &self.name)
            .field("signals", &self.signals)
            .field("claims", &"<function>")
            .field("normalizer", &self.normalizer)
            .field("reduction", &self.reduction)
            .field("fallback", &self.fallback)
            .field("indexed", &self.index.len())
            .finish()
    }
}

impl RuleMatcher {
    pub fn new(name: &'static str, claims: fn(&str) -> bool) -> Self {
        RuleMatcher {
            name,
            signals: Signals::empty(),
            claims,
            normalizer: Normalizer::generic(),
            reduction: Reduction::Exact,
            fallback: None,
            index: SignatureIndex::default(),
        }
    }

    pub fn signals(mut self, signals: Signals) -> Self {
        self.signals = signals;
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn fallback(mut self, device_id: impl Into<String>) -> Self {
        self.fallback = Some(device_id.into());
        self
    }
}

impl Matcher for RuleMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn signals(&self) -> Signals {
        self.signals
    }

    fn claims(&self, ua: &str) -> bool {
        (self.claims)(ua)
    }

    fn normalize(&self, ua: &str) -> String {
        self.normalizer.normalize(ua)
    }

    fn index(&mut self, key: String, device_id: &str, policy: IndexPolicy) -> Indexed {
        self.index.insert(key, device_id, policy)
    }

    fn lookup(&self, key: &str) -> Option<Hit<'_>> {
        if let Some(device_id) = self.index.get(key) {
            return Some(Hit { device_id, outcome: MatchOutcome::Exact });
        }
        if let Some(tolerance) = self.reduction.tolerance(key) {
            if let Some((device_id, common_prefix)) = self.index.nearest(key, tolerance) {
                return Some(Hit { device_id, outcome: MatchOutcome::Reduced { common_prefix } });
            }
        }
        self.fallback.as_deref().map(|device_id| Hit { device_id, outcome: MatchOutcome::Fallback })
    }

    fn prune_fallback(&mut self, exists: &dyn Fn(&str) -> bool) {
        if let Some(id) = &self.fallback {
            if !exists(id) {
                tracing::warn!(matcher = self.name, fallback = %id, "fallback device not loaded; using generic device");
                self.fallback = None;
            }
        }
    }

    fn stats(&self) -> MatcherStats {
        MatcherStats {
            name: self.name,
            indexed: self.index.len(),
            collisions: self.index.collisions(),
            fallback: self.fallback.clone(),
        }
    }
}
