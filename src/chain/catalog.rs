//! Default matcher catalog.
//!
//! Order is priority: the first matcher whose predicate accepts a user-agent
//! owns it, both when indexing and when matching. The list therefore runs
//! from the most specific families to the most generic, and ends with the
//! catch-all. Each entry notes what it must precede or follow.
//!
//! Case-insensitive predicates fold ASCII only (`(?i-u)`), the same folding
//! the signal scan uses.

use super::matcher::{Matcher, Reduction};
use super::normalize::{self, Normalizer};
use super::signals::Signals;

pub fn default_matchers() -> Vec<Box<dyn Matcher>> {
    let generic = Normalizer::generic;

    vec![
        // J2ME midlets embed a handset UA; the UNTRUSTED marker must win over it.
        // First, ahead of every handset family.
        Box::new(matcher! {
            name: "java_midlet",
            signals: Signals::MIDLET,
            claims: |ua| ua.contains("UNTRUSTED/1.0"),
            fallback: "generic_midp_midlet",
        }),
        // Google TV and Android TV carry "Android": before android.
        Box::new(matcher! {
            name: "smart_tv",
            signals: Signals::TV,
            claims: |ua| regex!(r"(?i-u)smart-?tv|googletv|hbbtv|appletv|netcast|crkey").is_match(ua),
            reduction: Reduction::Through(")"),
            fallback: "generic_smarttv_browser",
        }),
        // Kindle Fire reports Android: before android.
        Box::new(matcher! {
            name: "kindle",
            signals: Signals::KINDLE,
            claims: |ua| ua.contains("Kindle") || ua.contains("Silk/"),
            normalizer: generic().with("kindle", normalize::kindle),
            reduction: Reduction::Through(")"),
            fallback: "generic_amazon_kindle",
        }),
        // Windows Phone 8.1+ claims to be Android and iPhone: before both.
        Box::new(matcher! {
            name: "windows_phone",
            signals: Signals::WINDOWS_PHONE,
            claims: |ua| {
                ["Windows Phone", "WPDesktop", "Windows CE", "IEMobile", "ZuneWP7"].iter().any(|n| ua.contains(n))
            },
            reduction: Reduction::Through(")"),
            fallback: "generic_ms_phone_os7",
        }),
        // Android WebViews say "Chrome" and "Safari": before chrome and safari.
        Box::new(matcher! {
            name: "android",
            signals: Signals::ANDROID,
            claims: |ua| ua.contains("Android"),
            normalizer: generic().with("android", normalize::android),
            reduction: Reduction::Through(")"),
            fallback: "generic_android",
        }),
        // iOS browsers say "Safari" and, for CriOS/FxiOS, name desktop
        // families: before chrome, firefox and safari.
        Box::new(matcher! {
            name: "apple",
            signals: Signals::APPLE,
            claims: |ua| ua.contains("iPhone") || ua.contains("iPod") || ua.contains("iPad"),
            reduction: Reduction::FirstSemicolon,
            fallback: "apple_iphone_ver1",
        }),
        // Series 40 Ovi browser: before the general nokia family.
        Box::new(matcher! {
            name: "nokia_ovi",
            signals: Signals::NOKIA,
            claims: |ua| ua.contains("S40OviBrowser"),
            reduction: Reduction::FirstSlash,
            fallback: "nokia_generic_series40_ovibrosr",
        }),
        // After windows_phone (Lumia UAs say "NOKIA"); before opera_mini,
        // which also proxies Nokia handsets.
        Box::new(matcher! {
            name: "nokia",
            signals: Signals::NOKIA,
            claims: |ua| ua.contains("Nokia"),
            reduction: Reduction::FirstSlash,
            fallback: "nokia_generic_series40",
        }),
        // After android: Galaxy UAs may carry "SAMSUNG" next to "Android".
        Box::new(matcher! {
            name: "samsung",
            claims: |ua| {
                ua.contains("Samsung") || ua.contains("SAMSUNG") || ua.starts_with("SEC-") || ua.starts_with("SCH-")
            },
            reduction: Reduction::FirstSlash,
        }),
        // Before opera_mini and the desktop families.
        Box::new(matcher! {
            name: "blackberry",
            signals: Signals::BLACKBERRY,
            claims: |ua| ua.contains("BlackBerry") || ua.contains("BB10") || ua.contains("PlayBook"),
            reduction: Reduction::FirstSlash,
            fallback: "blackberry_generic_ver4",
        }),
        // After android: Xperia UAs carry "Sony" next to "Android".
        Box::new(matcher! {
            name: "sony_ericsson",
            claims: |ua| ua.contains("SonyEricsson") || ua.starts_with("Sony"),
            reduction: Reduction::FirstSlash,
        }),
        // After android: Moto UAs carry "moto" next to "Android".
        Box::new(matcher! {
            name: "motorola",
            claims: |ua| {
                ua.starts_with("Mot-") || ua.starts_with("MOT-") || ua.starts_with("moto") || ua.contains("Motorola")
            },
            reduction: Reduction::FirstSlash,
        }),
        // Opera Mini proxies any handset; must precede the desktop opera family.
        Box::new(matcher! {
            name: "opera_mini",
            signals: Signals::OPERA,
            claims: |ua| ua.contains("Opera Mini") || ua.contains("Opera Mobi"),
            fallback: "generic_opera_mini_version1",
        }),
        // Crawlers frequently pose as desktop browsers: before every desktop family.
        Box::new(matcher! {
            name: "bot",
            signals: Signals::BOT,
            claims: |ua| {
                regex!(r"(?i-u)bot|crawl|spider|slurp|archiver|curl/|wget/|python-requests").is_match(ua)
            },
            fallback: "generic_web_crawler",
        }),
        // Blink Opera and Edge also say "Chrome"; Chrome says "Safari":
        // before safari, after opera_mini.
        Box::new(matcher! {
            name: "chrome",
            signals: Signals::CHROME,
            claims: |ua| ua.contains("Chrome") && !ua.contains("OPR/") && !ua.contains("Edge/"),
            normalizer: generic().with("chrome", normalize::chrome),
            reduction: Reduction::FirstSlash,
            fallback: "google_chrome",
        }),
        // After bot (some crawlers say "Firefox"); no later family claims Gecko.
        Box::new(matcher! {
            name: "firefox",
            signals: Signals::FIREFOX,
            claims: |ua| ua.contains("Firefox"),
            normalizer: generic().with("firefox", normalize::firefox),
            reduction: Reduction::FirstSlash,
            fallback: "firefox",
        }),
        // After windows_phone, whose IEMobile UAs also say "MSIE"/"Trident".
        Box::new(matcher! {
            name: "msie",
            signals: Signals::MSIE,
            claims: |ua| ua.contains("MSIE") || ua.contains("Trident/"),
            normalizer: generic().with("msie", normalize::msie),
            reduction: Reduction::FirstSlash,
            fallback: "msie",
        }),
        // After opera_mini; old Presto UAs spoof "MSIE", so after msie too.
        Box::new(matcher! {
            name: "opera",
            signals: Signals::OPERA,
            claims: |ua| ua.contains("Opera") || ua.contains("OPR/"),
            normalizer: generic().with("opera", normalize::opera),
            reduction: Reduction::FirstSlash,
            fallback: "opera",
        }),
        // Nearly every WebKit browser says "Safari"; only desktop Safari reaches here.
        Box::new(matcher! {
            name: "safari",
            signals: Signals::SAFARI,
            claims: |ua| ua.contains("Safari") && (ua.contains("Macintosh") || ua.contains("Windows")),
            normalizer: generic().with("safari", normalize::safari),
            reduction: Reduction::FirstSlash,
            fallback: "safari",
        }),
        // Last named family; only the catch-all follows.
        Box::new(matcher! {
            name: "konqueror",
            claims: |ua| ua.contains("Konqueror"),
            normalizer: generic().with("konqueror", normalize::konqueror),
            reduction: Reduction::FirstSlash,
            fallback: "konqueror",
        }),
        // Accepts everything; the chain's generic device backs it. Always last.
        Box::new(matcher! {
            name: "catch_all",
            claims: |_| true,
            reduction: Reduction::Custom(catch_all_tolerance),
        }),
    ]
}

/// `Mozilla/...` user-agents must agree through the platform block; anything
/// else through its first slash.
fn catch_all_tolerance(key: &str) -> Option<usize> {
    if key.starts_with("Mozilla") {
        key.find(')').map(|i| i + 1)
    } else {
        key.find('/').map(|i| i + 1)
    }
}
