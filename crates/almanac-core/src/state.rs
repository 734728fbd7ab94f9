use chrono::{
  DateTime,
  Datelike,
  NaiveDate,
  Utc
};

use crate::datetime::{
  DayNormalizer,
  check_supported,
  parse_date_input
};
use crate::error::{
  CalendarError,
  CalendarResult
};
use crate::grid::{
  first_day_of_month,
  shift_months
};

/// Which month is on screen and which
/// day is selected.
///
/// The two move independently: picking
/// a day from a neighbouring month's
/// leading or trailing cells does not
/// change the displayed month, and
/// paging through months keeps the
/// selection where it was. Both always
/// lie within the supported years; a
/// transition that would leave them
/// fails and changes nothing.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarState {
  current_month: NaiveDate,
  selected_date: NaiveDate
}

impl CalendarState {
  pub fn new(
    today: NaiveDate
  ) -> CalendarResult<Self> {
    Ok(Self {
      current_month: anchor(today)?,
      selected_date: today
    })
  }

  /// First day of the displayed month.
  pub fn current_month(
    &self
  ) -> NaiveDate {
    self.current_month
  }

  pub fn selected_date(
    &self
  ) -> NaiveDate {
    self.selected_date
  }

  pub fn next_month(
    &mut self
  ) -> CalendarResult<NaiveDate> {
    self.step_months(1)
  }

  pub fn prev_month(
    &mut self
  ) -> CalendarResult<NaiveDate> {
    self.step_months(-1)
  }

  pub fn select_date(
    &mut self,
    day: NaiveDate
  ) -> CalendarResult<()> {
    self.selected_date =
      check_supported(day)?;
    tracing::debug!(
      selected = %day,
      "selected date"
    );
    Ok(())
  }

  /// Parses `raw` and selects it. On
  /// error nothing changes.
  pub fn select_date_input(
    &mut self,
    raw: &str,
    normalizer: &DayNormalizer,
    now: DateTime<Utc>
  ) -> CalendarResult<NaiveDate> {
    let day = parse_date_input(
      raw, normalizer, now
    )
    .inspect_err(|err| {
      tracing::warn!(
        input = raw,
        error = %err,
        "rejected selection"
      );
    })?;
    self.select_date(day)?;
    Ok(day)
  }

  /// Shows the month containing `day`
  /// without touching the selection.
  pub fn go_to_month(
    &mut self,
    day: NaiveDate
  ) -> CalendarResult<()> {
    self.current_month = anchor(day)?;
    Ok(())
  }

  pub fn go_to_today(
    &mut self,
    today: NaiveDate
  ) -> CalendarResult<()> {
    *self = Self::new(today)?;
    Ok(())
  }

  pub fn is_selected(
    &self,
    day: NaiveDate
  ) -> bool {
    self.selected_date == day
  }

  fn step_months(
    &mut self,
    months: i32
  ) -> CalendarResult<NaiveDate> {
    let month =
      shift_months(self.current_month, months)
        .ok_or_else(|| {
          CalendarError::invalid_date(
            &self.current_month.to_string(),
            "no month beyond the \
             representable range"
          )
        })
        .and_then(check_supported)
        .inspect_err(|err| {
          tracing::warn!(
            month = %self.current_month.format("%Y-%m"),
            months,
            error = %err,
            "refused to change month"
          );
        })?;
    self.current_month = month;
    tracing::debug!(
      month = %month.format("%Y-%m"),
      months,
      "changed month"
    );
    Ok(month)
  }
}

fn anchor(
  day: NaiveDate
) -> CalendarResult<NaiveDate> {
  let day = check_supported(day)?;
  first_day_of_month(
    day.year(),
    day.month()
  )
  .ok_or_else(|| {
    CalendarError::invalid_date(
      &day.to_string(),
      "month out of range"
    )
  })
}
