use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

use crate::datetime::check_supported;
use crate::error::{
  CalendarError,
  CalendarResult
};

pub const DAYS_PER_WEEK: usize = 7;

/// The whole weeks needed to show one
/// month, leading and trailing days
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
  month_start: NaiveDate,
  month_end:   NaiveDate,
  days:        Vec<NaiveDate>
}

impl MonthGrid {
  pub fn month_start(&self) -> NaiveDate {
    self.month_start
  }

  pub fn month_end(&self) -> NaiveDate {
    self.month_end
  }

  pub fn grid_start(&self) -> NaiveDate {
    self.days[0]
  }

  pub fn grid_end(&self) -> NaiveDate {
    self.days[self.days.len() - 1]
  }

  pub fn days(&self) -> &[NaiveDate] {
    &self.days
  }

  pub fn weeks(
    &self
  ) -> impl Iterator<Item = &[NaiveDate]>
  {
    self.days.chunks(DAYS_PER_WEEK)
  }

  pub fn in_current_month(
    &self,
    day: NaiveDate
  ) -> bool {
    day >= self.month_start
      && day <= self.month_end
  }

  pub fn contains(
    &self,
    day: NaiveDate
  ) -> bool {
    day >= self.grid_start()
      && day <= self.grid_end()
  }
}

/// Lays out the month containing
/// `reference` as whole weeks that
/// begin on `week_start`.
///
/// The result always holds 28, 35 or
/// 42 consecutive days running from the
/// week-aligned day on or before the
/// 1st to the week-aligned day on or
/// after the last day of the month.
/// References outside the supported
/// years are rejected.
pub fn build_grid(
  reference: NaiveDate,
  week_start: Weekday
) -> CalendarResult<MonthGrid> {
  let reference =
    check_supported(reference)?;
  let out_of_range = || {
    CalendarError::invalid_date(
      &reference.to_string(),
      "grid leaves the representable \
       date range"
    )
  };

  let month_start = first_day_of_month(
    reference.year(),
    reference.month()
  )
  .ok_or_else(out_of_range)?;
  let month_end = last_day_of_month(
    reference.year(),
    reference.month()
  )
  .ok_or_else(out_of_range)?;
  let grid_start =
    start_of_week(month_start, week_start)
      .ok_or_else(out_of_range)?;
  let grid_end =
    end_of_week(month_end, week_start)
      .ok_or_else(out_of_range)?;

  let span = (grid_end - grid_start)
    .num_days()
    + 1;
  let days = grid_start
    .iter_days()
    .take(span as usize)
    .collect::<Vec<_>>();

  tracing::trace!(
    month = %month_start.format("%Y-%m"),
    week_start = %week_start,
    grid_start = %grid_start,
    grid_end = %grid_end,
    cells = days.len(),
    "built month grid"
  );

  Ok(MonthGrid {
    month_start,
    month_end,
    days
  })
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
}

pub fn last_day_of_month(
  year: i32,
  month: u32
) -> Option<NaiveDate> {
  let (next_year, next_month) =
    if month >= 12 {
      (year.checked_add(1)?, 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    )?,
    -1
  )
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> Option<u32> {
  last_day_of_month(year, month)
    .map(|day| day.day())
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  date.checked_add_signed(
    Duration::try_days(days)?
  )
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> Option<NaiveDate> {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

pub fn end_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> Option<NaiveDate> {
  add_days(
    start_of_week(day, week_start)?,
    6
  )
}

/// Moves by whole months and lands on
/// the 1st, so "Jan 31 + 1 month" is
/// simply February. `None` once the
/// result leaves chrono's range.
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> Option<NaiveDate> {
  let total = date.year() as i64 * 12
    + (date.month() as i64 - 1)
    + months as i64;
  let year =
    i32::try_from(total.div_euclid(12))
      .ok()?;
  let month =
    total.rem_euclid(12) as u32 + 1;

  NaiveDate::from_ymd_opt(year, month, 1)
}

/// Labels for the grid columns, in
/// display order.
pub fn weekday_order(
  week_start: Weekday
) -> [Weekday; DAYS_PER_WEEK] {
  let mut order = [week_start;
    DAYS_PER_WEEK];
  for idx in 1..DAYS_PER_WEEK {
    order[idx] = order[idx - 1].succ();
  }
  order
}
