mod report;

use handset::{AllowedGroups, Options, Repository, XmlFile};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB: &str = "wurfl.xml";
const DEFAULT_GROUPS: &str = "product_info,display";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_env("HANDSET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let groups = AllowedGroups::from_csv(&config.groups);
    let source = XmlFile::new(&config.db);
    let cache = config.cache_path();
    let repo = match Repository::build_or_load(&source, &groups, cache.as_deref(), &Options::default()) {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!("error: failed to load '{}': {err}", config.db.display());
            std::process::exit(1);
        }
    };

    if config.stats {
        report::print_stats(&repo.stats(), repo.len(), config.color);
    }
    for ua in &config.user_agents {
        if config.explain {
            report::print_explain(ua, &repo.explain(ua), config.color);
        } else {
            report::print_match(&repo, ua, config.color);
        }
    }
}

struct CliConfig {
    db: PathBuf,
    groups: String,
    cache: Option<PathBuf>,
    no_cache: bool,
    explain: bool,
    stats: bool,
    color: bool,
    user_agents: Vec<String>,
}

impl CliConfig {
    /// `--cache` if given, otherwise the database path with a `.bin` extension.
    fn cache_path(&self) -> Option<PathBuf> {
        if self.no_cache {
            return None;
        }
        Some(self.cache.clone().unwrap_or_else(|| self.db.with_extension("bin")))
    }
}

fn parse_args() -> Result<CliConfig, String> {
    let mut config = CliConfig {
        db: PathBuf::from(DEFAULT_DB),
        groups: DEFAULT_GROUPS.to_string(),
        cache: None,
        no_cache: false,
        explain: false,
        stats: false,
        color: io::stdout().is_terminal(),
        user_agents: Vec::new(),
    };
    let mut input: Option<String> = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("handset {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => config.color = true,
            "--no-color" => config.color = false,
            "--explain" => config.explain = true,
            "--stats" => config.stats = true,
            "--no-cache" => config.no_cache = true,
            "--db" => {
                config.db = args.next().ok_or_else(|| "error: --db expects a path".to_string())?.into();
            }
            "--groups" => {
                config.groups = args.next().ok_or_else(|| "error: --groups expects a value".to_string())?;
            }
            "--cache" => {
                let value = args.next().ok_or_else(|| "error: --cache expects a path".to_string())?;
                config.cache = Some(value.into());
            }
            "--" => {
                let rest = args.by_ref().collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--db=") => config.db = arg.trim_start_matches("--db=").into(),
            _ if arg.starts_with("--groups=") => config.groups = arg.trim_start_matches("--groups=").to_string(),
            _ if arg.starts_with("--cache=") => config.cache = Some(arg.trim_start_matches("--cache=").into()),
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                input = Some(std::iter::once(arg).chain(args.by_ref()).collect::<Vec<_>>().join(" "));
                break;
            }
        }
    }

    if config.no_cache && config.cache.is_some() {
        return Err("error: --cache and --no-cache are mutually exclusive".to_string());
    }

    config.user_agents = match input {
        Some(ua) => vec![ua],
        // One user-agent per line.
        None if !config.stats || !io::stdin().is_terminal() => {
            read_stdin_input()?.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
        }
        None => Vec::new(),
    };

    if config.user_agents.is_empty() && !config.stats {
        return Err(format!("error: no user-agent provided\n\n{}", help_text()));
    }

    Ok(config)
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "handset {version}

Device detection from user-agent strings.

Usage:
  handset [OPTIONS] [--] <user-agent...>
  handset [OPTIONS] < user-agents.txt

Options:
  --db <path>             Device catalog XML. Default: {default_db}
  --groups <csv>          Capability groups to load. Default: {default_groups}
  --cache <path>          Snapshot file. Default: the catalog path with .bin
  --no-cache              Always resolve from the catalog; write no snapshot.
  --explain               Show how each user-agent was classified.
  --stats                 Print per-matcher index statistics.
  --color                 Force ANSI color output.
  --no-color              Disable ANSI color output.
  -h, --help              Show this help message.
  -V, --version           Print version information.

Trailing arguments form a single user-agent. Without them, each non-empty
line of stdin is matched.

Environment:
  HANDSET_LOG             Log filter (e.g. debug, handset=info). Default: warn

Exit codes:
  0  Success.
  1  The catalog could not be loaded.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_db = DEFAULT_DB,
        default_groups = DEFAULT_GROUPS,
    )
}
