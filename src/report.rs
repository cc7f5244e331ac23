use handset::{DeviceEntry, MatchDetails, MatchOutcome, MatcherStats, Repository};

/// What a piece of report text means; each maps to one SGR sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    /// Matched device ids.
    Device,
    /// Labels and secondary text.
    Faint,
    /// Degraded outcomes and inconsistencies.
    Warn,
    /// Signals and parent ids.
    Info,
    /// Headlines and matcher names.
    Accent,
    /// Section rules.
    Rule,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Device => "1;32",
            Tone::Faint => "2",
            Tone::Warn => "33",
            Tone::Info => "34",
            Tone::Accent => "1;36",
            Tone::Rule => "90",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Palette { enabled }
    }

    fn tint(self, tone: Tone, text: impl AsRef<str>) -> String {
        let text = text.as_ref();
        if self.enabled { format!("\x1b[{}m{text}\x1b[0m", tone.code()) } else { text.to_string() }
    }

    fn rule(self, title: &str) -> String {
        self.tint(Tone::Rule, format!("━━━ {title} ━━━"))
    }

    /// `  label: value`, with the label faint.
    fn field(self, label: &str, value: impl AsRef<str>) -> String {
        format!("  {} {}", self.tint(Tone::Faint, format!("{label}:")), value.as_ref())
    }
}

fn match_line(palette: Palette, device: Option<&DeviceEntry>) -> String {
    match device {
        Some(device) => {
            let label = format!("{} {}", device.properties.brand_name, device.properties.model_name);
            format!("{}  {}", palette.tint(Tone::Device, &device.id), palette.tint(Tone::Faint, label.trim()))
        }
        None => palette.tint(Tone::Warn, "<inconsistent catalog: matched device not loaded>"),
    }
}

fn outcome_text(palette: Palette, outcome: MatchOutcome) -> String {
    match outcome {
        MatchOutcome::Exact => palette.tint(Tone::Device, "exact"),
        MatchOutcome::Reduced { common_prefix } => {
            palette.tint(Tone::Warn, format!("reduced (common prefix {common_prefix})"))
        }
        MatchOutcome::Fallback => palette.tint(Tone::Warn, "fallback"),
    }
}

/// One line per user-agent: `device_id  brand model`.
pub fn print_match(repo: &Repository, ua: &str, color: bool) {
    println!("{}", match_line(Palette::new(color), repo.match_ua(ua)));
}

pub fn print_explain(ua: &str, details: &MatchDetails<'_>, color: bool) {
    let palette = Palette::new(color);
    let trace = &details.trace;
    println!("\n{}", palette.tint(Tone::Accent, format!("⚙  Matching: \"{ua}\"")));

    println!("\n{}", palette.rule("Classification"));
    println!("{}", palette.field("signals", palette.tint(Tone::Info, format!("{:?}", trace.signals))));
    println!("{}", palette.field("matcher", palette.tint(Tone::Accent, trace.matcher.unwrap_or("<none>"))));
    println!("{}", palette.field("normalized", &trace.normalized));
    println!("{}", palette.field("outcome", outcome_text(palette, trace.outcome)));

    println!("\n{}", palette.rule("Device"));
    let Some(device) = details.device else {
        println!("  {}\n", palette.tint(Tone::Faint, format!("'{}' is not loaded", trace.device_id)));
        return;
    };
    println!("{}", palette.field("id", palette.tint(Tone::Device, &device.id)));
    if let Some(parent) = &device.parent {
        println!("{}", palette.field("falls back to", palette.tint(Tone::Info, parent)));
    }
    let p = &device.properties;
    let fields = [
        ("brand_name", &p.brand_name),
        ("model_name", &p.model_name),
        ("marketing_name", &p.marketing_name),
        ("preferred_markup", &p.preferred_markup),
        ("resolution_width", &p.resolution_width),
        ("resolution_height", &p.resolution_height),
        ("device_os", &p.device_os),
        ("device_os_version", &p.device_os_version),
        ("mobile_browser", &p.mobile_browser),
        ("mobile_browser_version", &p.mobile_browser_version),
    ];
    for (name, value) in fields.into_iter().filter(|(_, v)| !v.is_empty()) {
        println!("{}", palette.field(name, value));
    }
    println!();
}

pub fn print_stats(stats: &[MatcherStats], devices: usize, color: bool) {
    let palette = Palette::new(color);
    println!("\n{}", palette.rule(&format!("Index ({devices} devices)")));
    for s in stats {
        // Pad before tinting so escape codes do not count toward the width.
        let name = format!("{:<14}", s.name);
        println!(
            "  {} {} {}  {} {}  {} {}",
            palette.tint(Tone::Accent, name),
            palette.tint(Tone::Faint, "keys:"),
            palette.tint(Tone::Device, s.indexed.to_string()),
            palette.tint(Tone::Faint, "collisions:"),
            palette.tint(Tone::Warn, s.collisions.to_string()),
            palette.tint(Tone::Faint, "fallback:"),
            s.fallback.as_deref().unwrap_or("-"),
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_palette_leaves_text_plain() {
        let palette = Palette::new(false);
        assert_eq!(palette.tint(Tone::Warn, "fallback"), "fallback");
        assert_eq!(palette.field("id", "generic"), "  id: generic");
        assert_eq!(outcome_text(palette, MatchOutcome::Reduced { common_prefix: 9 }), "reduced (common prefix 9)");
    }

    #[test]
    fn enabled_palette_wraps_and_resets() {
        let palette = Palette::new(true);
        assert_eq!(palette.tint(Tone::Device, "generic"), "\x1b[1;32mgeneric\x1b[0m");
        assert_eq!(palette.rule("Device"), "\x1b[90m━━━ Device ━━━\x1b[0m");
    }

    #[test]
    fn missing_device_is_reported() {
        assert_eq!(match_line(Palette::new(false), None), "<inconsistent catalog: matched device not loaded>");
    }
}
