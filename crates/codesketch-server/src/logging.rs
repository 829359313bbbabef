//! Logging setup: a verbosity preset over the `codesketch::*` targets,
//! per-target `--log` overrides and the output format. `RUST_LOG` replaces
//! all of it when set.

use clap::{Args, ValueEnum};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const TARGET_PREFIX: &str = "codesketch::";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
    Trace,
}

/// Logging flags of the server binary.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Also log gateway calls and store writes
    #[arg(short, long)]
    pub verbose: bool,

    /// Debug level for codesketch targets and HTTP traces
    #[arg(short, long)]
    pub debug: bool,

    /// Trace everything, including per-stage timings and analyzer output
    #[arg(long)]
    pub trace: bool,

    /// Warnings and errors only; wins over the other flags
    #[arg(short, long)]
    pub quiet: bool,

    /// Per-target level, e.g. "gateway=debug". Repeatable or comma separated;
    /// bare targets get the "codesketch::" prefix.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    pub log_overrides: Vec<String>,

    #[arg(long = "log-format", value_enum, ignore_case = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl LogArgs {
    pub fn verbosity(&self) -> Verbosity {
        match (self.quiet, self.trace, self.debug, self.verbose) {
            (true, ..) => Verbosity::Quiet,
            (_, true, ..) => Verbosity::Trace,
            (_, _, true, _) => Verbosity::Debug,
            (_, _, _, true) => Verbosity::Verbose,
            _ => Verbosity::Normal,
        }
    }

    /// Parsed `--log` entries. Entries without a valid level are skipped.
    pub fn overrides(&self) -> Vec<(String, LevelFilter)> {
        self.log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(|part| {
                let (target, level) = part.split_once('=')?;
                let level = LevelFilter::from_str(level.trim()).ok()?;
                let target = target.trim();
                let target = if target.starts_with(TARGET_PREFIX) || target == "tower_http" {
                    target.to_string()
                } else {
                    format!("{TARGET_PREFIX}{target}")
                };
                Some((target, level))
            })
            .collect()
    }

    /// Filter directives, preset first so overrides take precedence.
    pub fn directives(&self) -> Vec<String> {
        let preset: &[&str] = match self.verbosity() {
            Verbosity::Quiet => &["codesketch=warn", "tower_http=error"],
            Verbosity::Normal => &[
                "codesketch=info",
                "codesketch::gateway=warn",
                "codesketch::analyzer=warn",
                "tower_http=warn",
            ],
            Verbosity::Verbose => &["codesketch=debug", "codesketch::analyzer=info", "tower_http=info"],
            Verbosity::Debug => &["codesketch=debug", "tower_http=debug"],
            Verbosity::Trace => &["codesketch=trace", "tower_http=trace"],
        };

        preset
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides()
                    .into_iter()
                    .map(|(target, level)| format!("{target}={level}")),
            )
            .collect()
    }

    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directives().join(",")))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber.
pub fn init(args: &LogArgs) {
    let (text, json) = match args.log_format {
        LogFormat::Text => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(args.filter())
        .with(text)
        .with(json)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        log: LogArgs,
    }

    fn parse(args: &[&str]) -> LogArgs {
        TestCli::parse_from(std::iter::once("codesketch-server").chain(args.iter().copied())).log
    }

    #[test]
    fn test_quiet_wins_then_most_detailed_flag() {
        assert_eq!(parse(&["-q", "-v", "--trace"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["-v", "-d", "--trace"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["-v", "-d"]).verbosity(), Verbosity::Debug);
        assert_eq!(parse(&["-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&[]).verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_log_format_flag() {
        assert_eq!(parse(&[]).log_format, LogFormat::Text);
        assert_eq!(parse(&["--log-format", "JSON"]).log_format, LogFormat::Json);
        assert!(TestCli::try_parse_from(["codesketch-server", "--log-format", "yaml"]).is_err());
    }

    #[test]
    fn test_overrides_prefix_bare_targets_and_skip_junk() {
        let args = parse(&[
            "--log",
            "gateway=debug",
            "--log",
            "store=trace,tower_http=info",
            "--log",
            "bogus",
            "--log",
            "ui=loud",
        ]);

        assert_eq!(
            args.overrides(),
            vec![
                ("codesketch::gateway".to_string(), LevelFilter::DEBUG),
                ("codesketch::store".to_string(), LevelFilter::TRACE),
                ("tower_http".to_string(), LevelFilter::INFO),
            ]
        );
    }

    #[test]
    fn test_overrides_come_after_preset() {
        let args = parse(&["-q", "--log", "codesketch::orchestrator=debug"]);
        let directives = args.directives();
        assert_eq!(directives.first().map(String::as_str), Some("codesketch=warn"));
        assert_eq!(
            directives.last(),
            Some(&format!("codesketch::orchestrator={}", LevelFilter::DEBUG))
        );
        assert!(EnvFilter::try_new(directives.join(",")).is_ok());
    }
}
