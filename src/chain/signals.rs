//! Signal scanning (user-agent pre-classification).
//!
//! Before any matcher predicate runs, the raw user-agent is scanned once for
//! coarse, case-insensitive needles. Each hit sets a bit in [`Signals`].
//! Matchers declare the signals they need; a matcher whose declared signals
//! do not intersect the scan is skipped without evaluating its predicate.
//!
//! ## Invariant
//!
//! Gating must never change which matcher claims a user-agent. Every matcher
//! that declares signals has a predicate that implies at least one of those
//! signals' needles. The chain tests check this against the scenario table.
//!
//! ## Design notes
//!
//! - False positives are fine: the predicate still decides.
//! - Needles are ASCII, so `to_ascii_lowercase` is enough. Predicates that
//!   match case-insensitively must fold ASCII only as well, or a non-ASCII
//!   case variant (`ſ` for `s`, `K` for `k`) would pass the predicate while
//!   missing the needle.
//! - Every bit gates at least one matcher.

bitflags::bitflags! {
    /// Coarse features of a user-agent string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Signals: u32 {
        const MIDLET        = 1 << 0;
        const TV            = 1 << 1;
        const KINDLE        = 1 << 2;
        const WINDOWS_PHONE = 1 << 3;
        const ANDROID       = 1 << 4;
        const APPLE         = 1 << 5;
        const NOKIA         = 1 << 6;
        const BLACKBERRY    = 1 << 7;
        const BOT           = 1 << 8;
        const CHROME        = 1 << 9;
        const FIREFOX       = 1 << 10;
        const MSIE          = 1 << 11;
        const OPERA         = 1 << 12;
        const SAFARI        = 1 << 13;
    }
}

const NEEDLES: &[(Signals, &[&str])] = &[
    (Signals::MIDLET, &["untrusted/"]),
    (Signals::TV, &["smarttv", "smart-tv", "googletv", "hbbtv", "appletv", "netcast", "crkey"]),
    (Signals::KINDLE, &["kindle", "silk/"]),
    (Signals::WINDOWS_PHONE, &["windows phone", "wpdesktop", "windows ce", "iemobile", "zunewp7"]),
    (Signals::ANDROID, &["android"]),
    (Signals::APPLE, &["iphone", "ipod", "ipad"]),
    (Signals::NOKIA, &["nokia", "s40ovibrowser", "series60", "symbian"]),
    (Signals::BLACKBERRY, &["blackberry", "bb10", "playbook"]),
    (Signals::BOT, &["bot", "crawl", "spider", "slurp", "archiver", "curl/", "wget/", "python-requests"]),
    (Signals::CHROME, &["chrome"]),
    (Signals::FIREFOX, &["firefox"]),
    (Signals::MSIE, &["msie", "trident/"]),
    (Signals::OPERA, &["opera", "opr/"]),
    (Signals::SAFARI, &["safari"]),
];

impl Signals {
    /// Scan `ua` for every known needle.
    pub fn scan(ua: &str) -> Self {
        let lower = ua.to_ascii_lowercase();
        let mut signals = Signals::empty();
        for (signal, needles) in NEEDLES {
            if needles.iter().any(|n| lower.contains(n)) {
                signals |= *signal;
            }
        }
        signals
    }

    /// True when a matcher requiring `required` may claim input with these
    /// signals. An empty requirement always passes.
    pub fn admits(self, required: Signals) -> bool {
        required.is_empty() || self.intersects(required)
    }
}
