use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::render::Renderer;
use crate::view::Calendar;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: month grids with the events that fall on each day",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub overrides: Vec<KeyVal>,

    /// Event file: a JSON array or one JSON record per line.
    #[arg(long = "events")]
    pub events: Option<PathBuf>,

    /// Pretend today is this date.
    #[arg(long = "today")]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a month grid and the selected day's agenda.
    Month {
        /// `YYYY-MM` or any date inside the month.
        month: Option<String>,

        #[arg(long = "select")]
        select: Option<String>,
    },
    /// List the events on one day.
    Day { date: String },
    /// Page through months interactively, one command per line on stdin.
    Browse,
}

impl Default for Command {
    fn default() -> Self {
        Self::Month {
            month: None,
            select: None,
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// One line of input to the `browse` session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Select(String),
    Today,
    Quit,
}

impl BrowseCommand {
    /// Blank lines yield `None`.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Prev,
            "t" | "today" => Self::Today,
            "q" | "quit" => Self::Quit,
            "s" | "select" => {
                if rest.is_empty() {
                    return Err(anyhow!("select needs a date"));
                }
                Self::Select(rest.to_string())
            }
            other => return Err(anyhow!("unknown command: {other}")),
        };

        Ok(Some(command))
    }
}

/// Runs a browse session until `quit` or end of input, redrawing after
/// every accepted command.
#[tracing::instrument(skip_all)]
pub fn browse<R: BufRead, W: Write>(
    calendar: &mut Calendar,
    renderer: &Renderer,
    today: NaiveDate,
    now: DateTime<Utc>,
    input: R,
    mut output: W,
) -> anyhow::Result<()> {
    show(calendar, renderer, today, &mut output)?;

    for line in input.lines() {
        let line = line.context("failed reading browse input")?;
        let command = match BrowseCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                warn!(line = %line, error = %err, "ignored browse input");
                writeln!(output, "error: {err}")?;
                continue;
            }
        };

        debug!(?command, "browse command");
        let outcome = match command {
            BrowseCommand::Next => calendar.next_month().map(|_| ()),
            BrowseCommand::Prev => calendar.prev_month().map(|_| ()),
            BrowseCommand::Today => calendar.go_to_today(today),
            BrowseCommand::Select(raw) => calendar.select_date_input(&raw, now).map(|_| ()),
            BrowseCommand::Quit => break,
        };

        if let Err(err) = outcome {
            writeln!(output, "error: {err}")?;
            continue;
        }

        writeln!(output)?;
        show(calendar, renderer, today, &mut output)?;
    }

    Ok(())
}

fn show<W: Write>(
    calendar: &Calendar,
    renderer: &Renderer,
    today: NaiveDate,
    output: &mut W,
) -> anyhow::Result<()> {
    renderer.write_view(output, &calendar.view(today)?, &calendar.settings().normalizer)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::{NaiveDate, TimeZone, Utc};
    use clap::Parser;

    use super::{BrowseCommand, Command, GlobalCli, browse};
    use crate::config::CalendarSettings;
    use crate::event::Event;
    use crate::render::Renderer;
    use crate::view::Calendar;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_globals_and_month_command() {
        let cli = GlobalCli::try_parse_from([
            "almanac",
            "-vv",
            "--set",
            "week_start=monday",
            "--events",
            "/tmp/events.json",
            "month",
            "2024-02",
            "--select",
            "2024-02-14",
        ])
        .expect("valid args");

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides[0].key, "week_start");
        assert_eq!(cli.overrides[0].value, "monday");
        assert_eq!(
            cli.command,
            Some(Command::Month {
                month: Some("2024-02".to_string()),
                select: Some("2024-02-14".to_string()),
            })
        );
    }

    #[test]
    fn rejects_malformed_override() {
        assert!(GlobalCli::try_parse_from(["almanac", "--set", "week_start"]).is_err());
    }

    #[test]
    fn browse_reports_paging_past_the_last_month() {
        let today = ymd(9999, 12, 20);
        let now = Utc
            .with_ymd_and_hms(2024, 2, 14, 9, 0, 0)
            .single()
            .expect("valid now");
        let mut calendar =
            Calendar::new(CalendarSettings::default(), today).expect("calendar");

        let mut out = Vec::new();
        browse(
            &mut calendar,
            &Renderer::plain(3),
            today,
            now,
            Cursor::new("n\np\n"),
            &mut out,
        )
        .expect("session runs");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("error: invalid date input"));
        assert!(text.contains("year must be within 1..=9999"));
        assert!(text.contains("November 9999"));
        assert_eq!(calendar.state().current_month(), ymd(9999, 11, 1));
    }

    #[test]
    fn parses_browse_lines() {
        assert_eq!(BrowseCommand::parse("  ").expect("blank"), None);
        assert_eq!(
            BrowseCommand::parse("N").expect("next"),
            Some(BrowseCommand::Next)
        );
        assert_eq!(
            BrowseCommand::parse("s  2024-03-05 ").expect("select"),
            Some(BrowseCommand::Select("2024-03-05".to_string()))
        );
        assert!(BrowseCommand::parse("select").is_err());
        assert!(BrowseCommand::parse("jump").is_err());
    }

    #[test]
    fn browse_session_navigates_and_reports_errors() {
        let today = ymd(2024, 2, 14);
        let now = Utc
            .with_ymd_and_hms(2024, 2, 14, 9, 0, 0)
            .single()
            .expect("valid now");
        let mut calendar = Calendar::new(CalendarSettings::default(), today)
            .expect("calendar")
            .with_events(&[Event::new(ymd(2024, 3, 5), "Lambing check")]);

        let input = Cursor::new("next\ns 2024-03-05\ns 2024-02-31\nbogus\nq\nnext\n");
        let mut out = Vec::new();
        browse(&mut calendar, &Renderer::plain(3), today, now, input, &mut out)
            .expect("session runs");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("February 2024"));
        assert!(text.contains("March 2024"));
        assert!(text.contains("Lambing check"));
        assert!(text.contains("error: invalid date input '2024-02-31'"));
        assert!(text.contains("error: unknown command: bogus"));
        assert!(!text.contains("April 2024"));
        assert_eq!(calendar.state().current_month(), ymd(2024, 3, 1));
        assert_eq!(calendar.state().selected_date(), ymd(2024, 3, 5));
    }
}
