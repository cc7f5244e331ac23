//! User-agent normalization.
//!
//! A [`Normalizer`] is an ordered pipeline of pure string steps. The same
//! pipeline runs over known signatures at index time and over queries at
//! match time, so anything it strips (locales, serial numbers, proxy
//! boilerplate, patch versions) can never make two otherwise equal
//! user-agents miss each other.
//!
//! Every matcher starts from [`Normalizer::generic`]; vendor matchers append
//! their own steps with [`Normalizer::with`].

use regex::Captures;
use std::fmt;

/// A single normalization step.
pub type NormalizeFn = fn(&str) -> String;

#[derive(Clone, Default)]
pub struct Normalizer {
    steps: Vec<(&'static str, NormalizeFn)>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.step_names()).finish()
    }
}

impl Normalizer {
    /// The identity pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps shared by every matcher.
    pub fn generic() -> Self {
        Normalizer::new()
            .with("up_link", up_link)
            .with("blackberry", blackberry)
            .with("yes_wap", yes_wap)
            .with("babel_fish", babel_fish)
            .with("serial_number", serial_number)
            .with("novarra", novarra)
            .with("locale", locale)
            .with("ucweb", ucweb)
    }

    /// Append a step.
    pub fn with(mut self, name: &'static str, step: NormalizeFn) -> Self {
        self.steps.push((name, step));
        self
    }

    pub fn normalize(&self, ua: &str) -> String {
        let mut out = ua.trim().to_string();
        for (_, step) in &self.steps {
            out = step(&out);
        }
        out.trim().to_string()
    }

    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|(name, _)| *name)
    }
}

// --- Generic steps -------------------------------------------------------------

/// Drop the `UP.Link/x.y` gateway suffix.
pub fn up_link(ua: &str) -> String {
    regex!(r"\s*UP\.Link/.*$").replace(ua, "").into_owned()
}

/// Drop any carrier prefix in front of `BlackBerry`.
pub fn blackberry(ua: &str) -> String {
    match ua.find("BlackBerry") {
        Some(pos) if pos > 0 => ua[pos..].to_string(),
        _ => ua.to_string(),
    }
}

pub fn yes_wap(ua: &str) -> String {
    regex!(r"\s*Mozilla/4\.0 \(YesWAP mobile phone proxy\)").replace_all(ua, "").into_owned()
}

pub fn babel_fish(ua: &str) -> String {
    regex!(r"\s*\(via babelfish\.yahoo\.com\)\s*").replace_all(ua, "").into_owned()
}

/// Mask handset serial numbers so each unit maps to the same key.
pub fn serial_number(ua: &str) -> String {
    let masked = regex!(r"/SN[0-9A-Fa-fX]+").replace_all(ua, "/SNXXXXXXXXXXXXXXX");
    regex!(r"\[(?:NT|TF|FT|ST)[0-9X]+\]").replace_all(&masked, "").into_owned()
}

pub fn novarra(ua: &str) -> String {
    regex!(r"\s*Novarra-Vision.*$").replace(ua, "").into_owned()
}

/// Remove `; en-US` style locale tokens.
pub fn locale(ua: &str) -> String {
    regex!(r"; ?[a-z]{2}(?:[-_][A-Za-z]{2})?([;)])").replace_all(ua, "${1}").into_owned()
}

pub fn ucweb(ua: &str) -> String {
    regex!(r"^UCWEB[0-9./]*\s*").replace(ua, "").into_owned()
}

// --- Vendor steps --------------------------------------------------------------

/// Drop build ids and fold the OS version to `major.minor`.
pub fn android(ua: &str) -> String {
    let without_build = regex!(r"\s*Build/[^;)]*").replace_all(ua, "");
    regex!(r"Android (\d+)(?:\.(\d+))?(?:\.\d+)*")
        .replace_all(&without_build, |caps: &Captures| {
            format!("Android {}.{}", &caps[1], caps.get(2).map_or("0", |m| m.as_str()))
        })
        .into_owned()
}

/// Fold Silk and Kindle browser versions to their major version.
pub fn kindle(ua: &str) -> String {
    let silk = regex!(r"Silk/(\d+)[0-9.]*").replace_all(ua, "Silk/${1}");
    regex!(r"Kindle/(\d+)[0-9.]*").replace_all(&silk, "Kindle/${1}").into_owned()
}

/// `... Chrome/55.0.2883.95 ...` -> `Chrome/55`.
pub fn chrome(ua: &str) -> String {
    match regex!(r"Chrome/(\d+)").captures(ua) {
        Some(caps) => format!("Chrome/{}", &caps[1]),
        None => ua.to_string(),
    }
}

/// `... Firefox/52.0.1` -> `Firefox/52`.
pub fn firefox(ua: &str) -> String {
    match regex!(r"Firefox/(\d+)").captures(ua) {
        Some(caps) => format!("Firefox/{}", &caps[1]),
        None => ua.to_string(),
    }
}

/// `MSIE 9.0` stays `MSIE 9.0`; Trident 7 (`rv:11.0`) becomes `MSIE 11.0`.
pub fn msie(ua: &str) -> String {
    if let Some(caps) = regex!(r"MSIE (\d+)\.(\d+)").captures(ua) {
        return format!("MSIE {}.{}", &caps[1], &caps[2]);
    }
    match regex!(r"Trident/\d+.*rv:(\d+)").captures(ua) {
        Some(caps) => format!("MSIE {}.0", &caps[1]),
        None => ua.to_string(),
    }
}

/// Presto `Version/12.16` and Blink `OPR/43` both fold to `Opera/<version>`.
pub fn opera(ua: &str) -> String {
    if let Some(caps) = regex!(r"OPR/(\d+)").captures(ua) {
        return format!("Opera/{}", &caps[1]);
    }
    if ua.contains("Opera") {
        if let Some(caps) = regex!(r"Version/(\d+\.\d+)").captures(ua) {
            return format!("Opera/{}", &caps[1]);
        }
        if let Some(caps) = regex!(r"Opera[/ ](\d+\.\d+)").captures(ua) {
            return format!("Opera/{}", &caps[1]);
        }
    }
    ua.to_string()
}

/// `Version/10.0.2 Safari/602.3.12` -> `Safari/10.0`.
pub fn safari(ua: &str) -> String {
    match regex!(r"Version/(\d+)(?:\.(\d+))?.*Safari").captures(ua) {
        Some(caps) => format!("Safari/{}.{}", &caps[1], caps.get(2).map_or("0", |m| m.as_str())),
        None => ua.to_string(),
    }
}

pub fn konqueror(ua: &str) -> String {
    match regex!(r"Konqueror/(\d+)").captures(ua) {
        Some(caps) => format!("Konqueror/{}", &caps[1]),
        None => ua.to_string(),
    }
}
