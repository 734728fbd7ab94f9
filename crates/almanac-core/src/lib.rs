pub mod cli;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod grid;
pub mod index;
pub mod render;
pub mod source;
pub mod state;
pub mod view;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::config::{
  CalendarConfig,
  CalendarSettings
};
pub use crate::datetime::DayNormalizer;
pub use crate::error::{
  CalendarError,
  CalendarResult
};
pub use crate::event::{
  Event,
  EventDate
};
pub use crate::grid::{
  MonthGrid,
  build_grid
};
pub use crate::index::EventIndex;
pub use crate::state::CalendarState;
pub use crate::view::{
  Calendar,
  MonthView
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );

  let mut cfg =
    config::CalendarConfig::load(
      cli.config.as_deref()
    )?;
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let settings = cfg.settings().context(
    "invalid calendar settings"
  )?;
  info!(
    week_start = datetime::weekday_key(
      settings.week_start
    ),
    timezone = %settings.normalizer.zone(),
    "resolved calendar settings"
  );

  let now = Utc::now();
  let today = match cli.today.as_deref() {
    | Some(raw) => {
      datetime::parse_date_input(
        raw,
        &settings.normalizer,
        now
      )
      .context("invalid --today value")?
    }
    | None => {
      settings.normalizer.today(now)
    }
  };

  let events = match cli
    .events
    .or_else(|| cfg.events_path())
  {
    | Some(path) => {
      source::load_events(&path)?
    }
    | None => {
      debug!(
        "no event file configured; \
         starting empty"
      );
      Vec::new()
    }
  };

  let mut calendar =
    view::Calendar::new(settings, today)?
      .with_events(&events);
  let renderer =
    render::Renderer::new(&cfg.display);

  match cli.command.unwrap_or_default() {
    | cli::Command::Month {
      month,
      select
    } => {
      if let Some(raw) = month.as_deref()
      {
        let first =
          datetime::parse_month_input(
            raw,
            &settings.normalizer,
            now
          )
          .context("invalid month")?;
        calendar.go_to_month(first)?;
      }
      if let Some(raw) = select.as_deref()
      {
        calendar
          .select_date_input(raw, now)
          .context(
            "invalid --select value"
          )?;
      }
      renderer.print_month(
        &calendar.view(today)?,
        &settings.normalizer
      )?;
    }
    | cli::Command::Day { date } => {
      let day =
        datetime::parse_date_input(
          &date,
          &settings.normalizer,
          now
        )
        .context("invalid day")?;
      renderer.print_agenda(
        day,
        calendar.events_on(day),
        &settings.normalizer
      )?;
    }
    | cli::Command::Browse => {
      cli::browse(
        &mut calendar,
        &renderer,
        today,
        now,
        io::stdin().lock(),
        io::stdout().lock()
      )?;
    }
  }

  info!("done");
  Ok(())
}
