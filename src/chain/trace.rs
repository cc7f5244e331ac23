//! Match traces and index statistics.
//!
//! Nothing here affects matching. [`MatchTrace`] explains a single decision
//! (which matcher claimed the input, what the input normalized to, how the
//! device was found); [`MatcherStats`] summarizes what each matcher indexed.

use super::signals::Signals;

/// How a matcher arrived at its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The normalized query is an indexed key.
    Exact,
    /// An indexed key shares `common_prefix` leading bytes with the query.
    Reduced { common_prefix: usize },
    /// Nothing indexed was close enough; a family or generic device was used.
    Fallback,
}

/// Full explanation of one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTrace {
    /// Name of the claiming matcher, `None` if no matcher claimed the input.
    pub matcher: Option<&'static str>,
    pub signals: Signals,
    pub normalized: String,
    pub outcome: MatchOutcome,
    pub device_id: String,
}

/// Index summary for one matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherStats {
    pub name: &'static str,
    /// Distinct canonical keys.
    pub indexed: usize,
    /// Keys that a second, different device also normalized to.
    pub collisions: usize,
    pub fallback: Option<String>,
}
