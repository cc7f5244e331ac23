use super::*;

const KNOWN: &[(&str, &str)] = &[
    ("", "generic"),
    (
        "Mozilla/5.0 (Linux; Android 4.1.2; GT-I9300 Build/JZO54K) AppleWebKit/535.19 (KHTML, like Gecko) Chrome/18.0.1025.166 Mobile Safari/535.19",
        "samsung_gt_i9300_ver1",
    ),
    (
        "Mozilla/5.0 (Linux; Android 9; Pixel 3 Build/PQ1A.181105.017.A1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.110 Mobile Safari/537.36",
        "google_pixel_3_ver1",
    ),
    (
        "Mozilla/5.0 (iPhone; CPU iPhone OS 10_3 like Mac OS X) AppleWebKit/603.1.30 (KHTML, like Gecko) Version/10.0 Mobile/14E277 Safari/602.1",
        "apple_iphone_ver10_3",
    ),
    ("Nokia6230/2.0 (03.14) Profile/MIDP-2.0 Configuration/CLDC-1.1", "nokia_6230_ver1"),
    (
        "Mozilla/5.0 (Mobile; Windows Phone 8.1; Android 4.0; ARM; Trident/7.0; Touch; rv:11.0; IEMobile/11.0; NOKIA; Lumia 635) like iPhone OS 7_0_3 Mac OS X AppleWebKit/537 (KHTML, like Gecko) Mobile Safari/537",
        "nokia_lumia_635_ver1",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/55.0.2883.95 Safari/537.36",
        "google_chrome_55",
    ),
    ("Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:52.0) Gecko/20100101 Firefox/52.0", "firefox_52"),
    ("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1; Trident/4.0)", "msie_8"),
    ("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)", "google_bot"),
    ("Lynx/2.8.9rel.1 libwww-FM/2.14", "lynx_browser"),
    ("DO_NOT_MATCH_GENERIC_SMARTPHONE", "generic_smartphone"),
];

fn indexed_chain() -> Chain {
    let mut chain = Chain::with_default_matchers("generic");
    for (ua, id) in KNOWN {
        chain.filter(ua, id);
    }
    chain
}

#[test]
fn classification_examples() {
    // (user agent, expected device, expected matcher)
    let cases: Vec<(&str, &str, &str)> = vec![
        (KNOWN[2].0, "google_pixel_3_ver1", "android"),
        (
            "Mozilla/5.0 (Linux; Android 9; Pixel 3 Build/PQ3A.190801.002) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/76.0.3809.89 Mobile Safari/537.36",
            "google_pixel_3_ver1",
            "android",
        ),
        (
            "Mozilla/5.0 (Linux; Android 4.1.2; en-gb; GT-I9300 Build/JZO54K) AppleWebKit/534.30 (KHTML, like Gecko) Version/4.0 Mobile Safari/534.30",
            "samsung_gt_i9300_ver1",
            "android",
        ),
        (
            "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.99 Mobile Safari/537.36",
            "generic_android",
            "android",
        ),
        (
            "Mozilla/5.0 (iPhone; CPU iPhone OS 12_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0 Mobile/15E148 Safari/604.1",
            "apple_iphone_ver10_3",
            "apple",
        ),
        (
            "Nokia6230/2.0 (04.44) Profile/MIDP-2.0 Configuration/CLDC-1.1 UP.Link/6.3.0.0.0",
            "nokia_6230_ver1",
            "nokia",
        ),
        ("Nokia3310/1.0 Profile/MIDP-1.0", "nokia_generic_series40", "nokia"),
        (KNOWN[5].0, "nokia_lumia_635_ver1", "windows_phone"),
        (
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/55.0.2883.87 Safari/537.36",
            "google_chrome_55",
            "chrome",
        ),
        (
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.51 Safari/537.36",
            "google_chrome_55",
            "chrome",
        ),
        ("Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:52.0) Gecko/20100101 Firefox/52.0", "firefox_52", "firefox"),
        (
            "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 5.1; Trident/4.0; .NET CLR 2.0.50727)",
            "msie_8",
            "msie",
        ),
        (KNOWN[9].0, "google_bot", "bot"),
        (
            "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
            "generic_web_crawler",
            "bot",
        ),
        ("Lynx/2.8.8dev.3 libwww-FM/2.14", "lynx_browser", "catch_all"),
        ("", "generic", "catch_all"),
        ("\u{1}\u{fffd}zz", "generic", "catch_all"),
    ];

    let chain = indexed_chain();
    for (ua, expected, matcher) in cases {
        let trace = chain.explain(ua);
        assert_eq!(trace.device_id, expected, "wrong device for '{}' (trace: {:#?})", ua, trace);
        assert_eq!(trace.matcher, Some(matcher), "wrong matcher for '{}'", ua);
        assert_eq!(chain.match_ua(ua), expected);
    }
}

#[test]
fn outcomes_describe_the_degradation_step() {
    let chain = indexed_chain();

    assert_eq!(chain.explain(KNOWN[4].0).outcome, MatchOutcome::Exact);
    assert!(matches!(
        chain.explain("Nokia6230/2.0 (04.44) Profile/MIDP-2.0").outcome,
        MatchOutcome::Reduced { common_prefix } if common_prefix >= "Nokia6230/".len()
    ));
    assert_eq!(chain.explain("Nokia3310/1.0").outcome, MatchOutcome::Fallback);
}

#[test]
fn signal_gating_never_changes_the_claimant() {
    let chain = indexed_chain();
    let inputs = KNOWN.iter().map(|(ua, _)| *ua).chain([
        "Mozilla/5.0 (Linux; Android 6.0; KFTT Build/IML74K) AppleWebKit/537.36 (KHTML, like Gecko) Silk/3.68 like Chrome/39.0 Safari/537.36",
        "Mozilla/5.0 (SMART-TV; Linux; Tizen 2.3) AppleWebKit/538.1 (KHTML, like Gecko) Version/2.3 TV Safari/538.1",
        "Opera/9.80 (J2ME/MIDP; Opera Mini/9.80 (S60; SymbOS; Opera Mobi/23.348; U; en) Presto/2.5.25 Version/10.54",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/56.0 Safari/537.36 OPR/43.0.2442.991",
        "BlackBerry9700/5.0.0.351 Profile/MIDP-2.1 Configuration/CLDC-1.1 VendorID/123",
        "Mozilla/5.0 (Series40; Nokia501/11.1.1/java_runtime_version=Nokia_Asha_1_1_1; Profile/MIDP-2.1 Configuration/CLDC-1.1) Gecko/20100401 S40OviBrowser/3.1.1.0.27",
        "curl/7.64.1",
        "SAMSUNG-SGH-E250/1.0 Profile/MIDP-2.0 Configuration/CLDC-1.1 UP.Browser/6.2.3.3.c.1.101 (GUI) MMP/2.0",
        "Nokia6230/2.0 UNTRUSTED/1.0",
        // Unicode case variants: long s for "s", Kelvin sign for "k".
        "Mozilla/5.0 (compatible; \u{17f}pider/1.0)",
        "Mozilla/5.0 (X11; Linux armv7l) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/60.0 Safari/537.36 CR\u{212a}ey/1.26",
    ]);

    for ua in inputs {
        let signals = Signals::scan(ua);
        let gated = chain.select(ua, signals).map(|m| m.name());
        let ungated = chain.matchers.iter().find(|m| m.claims(ua)).map(|m| m.name());
        assert_eq!(gated, ungated, "signal gating changed the claimant for '{}'", ua);
    }
}

#[test]
fn filter_is_idempotent() {
    let mut chain = indexed_chain();
    let before = chain.stats();

    let (ua, id) = KNOWN[6];
    assert_eq!(chain.filter(ua, id), Some("chrome"));

    assert_eq!(chain.stats(), before);
    assert_eq!(chain.match_ua(ua), id);
}

#[test]
fn first_registration_wins_for_shared_keys() {
    let mut chain = indexed_chain();
    // Normalizes to the same "Chrome/55" key as google_chrome_55.
    chain.filter(
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/55.0.2883.0 Safari/537.36",
        "google_chrome_55_linux",
    );

    assert_eq!(chain.match_ua(KNOWN[6].0), "google_chrome_55");
    let chrome = chain.stats().into_iter().find(|s| s.name == "chrome").unwrap();
    assert_eq!(chrome.indexed, 1);
    assert_eq!(chrome.collisions, 1);
}

#[test]
fn last_wins_policy_replaces_shared_keys() {
    let mut chain = Chain::with_default_matchers("generic").with_policy(IndexPolicy::LastWins);
    chain.filter(KNOWN[6].0, "google_chrome_55");
    chain.filter(
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/55.0.2883.0 Safari/537.36",
        "google_chrome_55_linux",
    );
    assert_eq!(chain.match_ua(KNOWN[6].0), "google_chrome_55_linux");
}

#[test]
fn claimed_input_does_not_fall_through_to_later_matchers() {
    let mut chain = indexed_chain();
    // The catch-all knows this exact string, but android claims it first.
    let ua = "Mozilla/5.0 (Linux; Android 11; Unknown Device) AppleWebKit/537.36";
    chain.matchers.last_mut().unwrap().index(ua.to_string(), "catch_all_device", IndexPolicy::FirstWins);

    let trace = chain.explain(ua);
    assert_eq!(trace.matcher, Some("android"));
    assert_eq!(trace.device_id, "generic_android");
}

#[test]
fn do_not_match_signatures_are_not_indexed() {
    let chain = indexed_chain();
    assert_ne!(chain.match_ua(KNOWN[11].0), "generic_smartphone");
}

#[test]
fn empty_chain_answers_generic() {
    let chain = Chain::new("generic");
    let trace = chain.explain("anything at all");
    assert_eq!(trace.matcher, None);
    assert_eq!(trace.device_id, "generic");
    assert_eq!(trace.outcome, MatchOutcome::Fallback);
}

#[test]
fn pruned_fallbacks_resolve_to_generic() {
    let mut chain = indexed_chain();
    chain.prune_fallbacks(|id| id == "generic");
    assert_eq!(chain.match_ua("Nokia3310/1.0"), "generic");
    assert!(chain.stats().iter().all(|s| s.fallback.is_none()));
}

#[test]
fn catalog_ends_with_catch_all() {
    let chain = Chain::with_default_matchers("generic");
    let names = chain.matcher_names();
    assert_eq!(names.last(), Some(&"catch_all"));
    let android = names.iter().position(|n| *n == "android").unwrap();
    let windows_phone = names.iter().position(|n| *n == "windows_phone").unwrap();
    assert!(windows_phone < android);
}

#[test]
fn catalog_orders_overlapping_families() {
    // (must come first, must come later)
    let pairs = [
        ("java_midlet", "nokia"),
        ("smart_tv", "android"),
        ("kindle", "android"),
        ("windows_phone", "android"),
        ("windows_phone", "apple"),
        ("windows_phone", "msie"),
        ("android", "samsung"),
        ("android", "sony_ericsson"),
        ("android", "motorola"),
        ("android", "chrome"),
        ("apple", "safari"),
        ("nokia_ovi", "nokia"),
        ("nokia", "opera_mini"),
        ("blackberry", "opera_mini"),
        ("opera_mini", "opera"),
        ("bot", "chrome"),
        ("bot", "firefox"),
        ("chrome", "safari"),
        ("msie", "opera"),
        ("konqueror", "catch_all"),
    ];

    let chain = Chain::with_default_matchers("generic");
    let names = chain.matcher_names();
    let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
    for (earlier, later) in pairs {
        assert!(position(earlier) < position(later), "'{}' must precede '{}'", earlier, later);
    }
}

#[test]
fn every_signal_gates_some_matcher() {
    let chain = Chain::with_default_matchers("generic");
    let declared = chain.matchers.iter().fold(Signals::empty(), |acc, m| acc | m.signals());
    assert_eq!(declared, Signals::all());
}

#[test]
fn unicode_case_variants_are_not_claimed() {
    let chain = indexed_chain();
    let trace = chain.explain("Mozilla/5.0 (compatible; \u{17f}pider/1.0)");
    assert_eq!(trace.matcher, Some("catch_all"));
    let tv = "Mozilla/5.0 (X11; Linux armv7l) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/60.0 Safari/537.36 CR\u{212a}ey/1.26";
    assert_eq!(chain.explain(tv).matcher, Some("chrome"));
}
