//! timex CLI - resolve symbolic time expressions and begin/end ranges
//!
//! Wraps the `timex` holders: `resolve` feeds one expression through a
//! [`DateHolder`], `range` feeds a begin/end pair through a [`RangeHolder`]
//! (which repairs inverted input) and prints the resolved range.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use timex::{
    Clock, DateHolder, Domain, EngineOptions, FixedClock, RangeHolder, SystemClock, TimePoint,
    TimeRange,
};
use tracing_subscriber::EnvFilter;

/// Symbolic time expressions: today+3, end-5, 2009-11-20
#[derive(Parser)]
#[command(name = "timex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Calendar domain (year, month, day, workweek, hour, minute, second,
    /// millisecond, microsecond, nanosecond)
    #[arg(long, global = true, default_value = "day")]
    domain: Domain,

    /// Pin the current instant (yyyy-mm-dd or yyyy-mm-ddThh:mm[:ss])
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<NaiveDateTime>,

    /// JSON file with engine options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single expression
    Resolve {
        /// Expression to resolve, e.g. "today-3" or "start+1"
        expr: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Set a begin/end pair and resolve the repaired range
    Range {
        /// Begin bound
        #[arg(long, allow_hyphen_values = true)]
        begin: String,

        /// End bound
        #[arg(long, allow_hyphen_values = true)]
        end: String,

        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(Args)]
struct ContextArgs {
    /// Lower bound of the context range (any expression without start/end)
    #[arg(long, requires = "context_end", allow_hyphen_values = true)]
    context_begin: Option<String>,

    /// Upper bound of the context range
    #[arg(long, requires = "context_begin", allow_hyphen_values = true)]
    context_end: Option<String>,
}

#[derive(Serialize)]
struct ResolveOutput {
    expression: String,
    domain: Domain,
    date: Option<TimePoint>,
}

#[derive(Serialize)]
struct RangeOutput {
    begin: String,
    end: String,
    domain: Domain,
    lower: Option<TimePoint>,
    upper: Option<TimePoint>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let options = load_options(cli.config.as_ref())?;
    let clock: Arc<dyn Clock> = match cli.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    let domain = cli.domain;

    match cli.command {
        Commands::Resolve { expr, context } => {
            let context = build_context(&context, domain, &clock, &options)?;
            let mut holder = DateHolder::new(domain, false)
                .with_clock(Arc::clone(&clock))
                .with_options(options);
            holder
                .set_date(&expr)
                .with_context(|| format!("invalid expression '{}'", expr))?;

            let date = match &context {
                Some(range) => holder.get_date_in(range),
                None => holder.get_date(domain),
            }
            .with_context(|| format!("cannot resolve '{}'", holder.text()))?;

            let output = ResolveOutput {
                expression: holder.text(),
                domain,
                date,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                match output.date {
                    Some(date) => println!("{}", date),
                    None => println!("(empty)"),
                }
            }
        }
        Commands::Range {
            begin,
            end,
            context,
        } => {
            let context = build_context(&context, domain, &clock, &options)?;
            let mut holder = RangeHolder::new(domain)
                .with_clock(Arc::clone(&clock))
                .with_options(options);
            holder
                .set_begin(&begin)
                .with_context(|| format!("invalid begin '{}'", begin))?;
            holder
                .set_end(&end)
                .with_context(|| format!("invalid end '{}'", end))?;

            let range = match &context {
                Some(context) => holder.get_range_in(context),
                None => holder.get_range(domain),
            }
            .context("cannot resolve range")?;

            let output = RangeOutput {
                begin: holder.begin_text(),
                end: holder.end_text(),
                domain: range.domain(),
                lower: range.lower(),
                upper: range.upper(),
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("begin: {}", output.begin);
                println!("end:   {}", output.end);
                println!("range: {}", range);
            }
        }
    }

    Ok(())
}

fn load_options(path: Option<&PathBuf>) -> Result<EngineOptions> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}

/// Resolve the optional context bounds through a range holder of their own.
fn build_context(
    args: &ContextArgs,
    domain: Domain,
    clock: &Arc<dyn Clock>,
    options: &EngineOptions,
) -> Result<Option<TimeRange>> {
    let (Some(begin), Some(end)) = (&args.context_begin, &args.context_end) else {
        return Ok(None);
    };
    let mut holder = RangeHolder::new(domain)
        .with_clock(Arc::clone(clock))
        .with_options(options.clone());
    holder
        .set_begin(begin)
        .with_context(|| format!("invalid context begin '{}'", begin))?;
    holder
        .set_end(end)
        .with_context(|| format!("invalid context end '{}'", end))?;
    if holder.need_context() {
        bail!("context bounds cannot use start/end");
    }
    let range = holder.get_range(domain).context("cannot resolve context")?;
    tracing::debug!(%range, "context range");
    Ok(Some(range))
}

fn parse_now(s: &str) -> std::result::Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| format!("'{}' is not a date or datetime", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_now_forms() {
        let noon = NaiveDate::from_ymd_opt(2009, 11, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(parse_now("2009-11-20T12:00:00").unwrap(), noon);
        assert_eq!(parse_now("2009-11-20T12:00").unwrap(), noon);
        assert_eq!(parse_now("2009-11-20 12:00").unwrap(), noon);
        assert_eq!(
            parse_now("2009-11-20").unwrap(),
            NaiveDate::from_ymd_opt(2009, 11, 20)
                .unwrap()
                .and_time(NaiveTime::MIN)
        );
        assert!(parse_now("yesterday").is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
