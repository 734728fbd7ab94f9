use std::sync::OnceLock;

use chrono::{
  DateTime,
  Datelike,
  NaiveDate,
  NaiveDateTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{
  CalendarError,
  CalendarResult
};
use crate::event::EventDate;
use crate::grid::{
  add_days,
  first_day_of_month
};

pub const DEFAULT_TIMEZONE: &str =
  "UTC";
pub const MIN_SUPPORTED_YEAR: i32 = 1;
pub const MAX_SUPPORTED_YEAR: i32 =
  9999;

const LOCAL_DATETIME_FORMATS: [&str;
  4] = [
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%d %H:%M"
];

/// Maps timestamps onto calendar days
/// in one fixed zone.
///
/// Instants are converted into the
/// zone before their date is taken;
/// floating dates and wall-clock times
/// are already calendar days and pass
/// through untouched. The grid, the
/// event index and "today" all go
/// through the same normalizer, so an
/// event and the cell it lands on can
/// never disagree about midnight.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DayNormalizer {
  zone: Tz
}

impl Default for DayNormalizer {
  fn default() -> Self {
    Self::utc()
  }
}

impl DayNormalizer {
  pub fn utc() -> Self {
    Self {
      zone: chrono_tz::UTC
    }
  }

  pub fn from_id(
    raw: &str
  ) -> CalendarResult<Self> {
    let trimmed = raw.trim();
    match trimmed.parse::<Tz>() {
      | Ok(zone) => {
        tracing::debug!(
          timezone = %trimmed,
          "resolved normalization timezone"
        );
        Ok(Self { zone })
      }
      | Err(err) => {
        tracing::error!(
          timezone = %trimmed,
          error = %err,
          "failed to parse timezone id"
        );
        Err(
          CalendarError::InvalidTimezone(
            trimmed.to_string()
          )
        )
      }
    }
  }

  pub fn zone(&self) -> Tz {
    self.zone
  }

  #[must_use]
  pub fn day_of(
    &self,
    date: &EventDate
  ) -> NaiveDate {
    match date {
      | EventDate::Day(day) => *day,
      | EventDate::Local(local) => {
        local.date()
      }
      | EventDate::At(instant) => {
        instant
          .with_timezone(&self.zone)
          .date_naive()
      }
    }
  }

  #[must_use]
  pub fn today(
    &self,
    now: DateTime<Utc>
  ) -> NaiveDate {
    now.with_timezone(&self.zone)
      .date_naive()
  }
}

/// Parses a timestamp as it appears in
/// an event record.
pub fn parse_event_date(
  raw: &str
) -> CalendarResult<EventDate> {
  let token = raw.trim();
  if token.is_empty() {
    return Err(
      CalendarError::invalid_date(
        raw,
        "empty date"
      )
    );
  }

  if let Ok(day) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return ensure_supported(day, raw)
      .map(EventDate::Day);
  }

  if let Ok(instant) =
    DateTime::parse_from_rfc3339(token)
  {
    let instant =
      instant.with_timezone(&Utc);
    ensure_supported(
      instant.date_naive(),
      raw
    )?;
    return Ok(EventDate::At(instant));
  }

  for fmt in LOCAL_DATETIME_FORMATS {
    if let Ok(local) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      ensure_supported(
        local.date(),
        raw
      )?;
      return Ok(EventDate::Local(local));
    }
  }

  Err(CalendarError::invalid_date(
    raw,
    "expected YYYY-MM-DD, RFC 3339 or \
     YYYY-MM-DDTHH:MM[:SS]"
  ))
}

/// Parses a user-supplied day such as
/// `today`, `2024-02-14` or an RFC 3339
/// timestamp into a calendar day.
#[tracing::instrument(skip(normalizer, now))]
pub fn parse_date_input(
  raw: &str,
  normalizer: &DayNormalizer,
  now: DateTime<Utc>
) -> CalendarResult<NaiveDate> {
  let lower =
    raw.trim().to_ascii_lowercase();
  let today = normalizer.today(now);

  let offset = match lower.as_str() {
    | "today" => Some(0),
    | "tomorrow" => Some(1),
    | "yesterday" => Some(-1),
    | _ => None
  };
  if let Some(offset) = offset {
    let day = add_days(today, offset)
      .ok_or_else(|| {
        CalendarError::invalid_date(
          raw,
          "date out of range"
        )
      })?;
    return ensure_supported(day, raw);
  }

  let date = parse_event_date(raw)?;
  ensure_supported(
    normalizer.day_of(&date),
    raw
  )
}

/// Parses a month argument: `YYYY-MM`
/// or anything `parse_date_input`
/// accepts. Returns the 1st of that
/// month.
pub fn parse_month_input(
  raw: &str,
  normalizer: &DayNormalizer,
  now: DateTime<Utc>
) -> CalendarResult<NaiveDate> {
  let token = raw.trim();
  if let Some(caps) = month_token_regex()
    .and_then(|re| re.captures(token))
  {
    let year = caps["year"]
      .parse::<i32>()
      .map_err(|err| {
        CalendarError::invalid_date(
          raw,
          err.to_string()
        )
      })?;
    let month = caps["month"]
      .parse::<u32>()
      .map_err(|err| {
        CalendarError::invalid_date(
          raw,
          err.to_string()
        )
      })?;
    let first =
      NaiveDate::from_ymd_opt(
        year, month, 1
      )
      .ok_or_else(|| {
        CalendarError::invalid_date(
          raw,
          "month out of range"
        )
      })?;
    return ensure_supported(first, raw);
  }

  let day = parse_date_input(
    raw, normalizer, now
  )?;
  first_day_of_month(
    day.year(),
    day.month()
  )
  .ok_or_else(|| {
    CalendarError::invalid_date(
      raw,
      "month out of range"
    )
  })
}

pub fn parse_week_start(
  raw: &str
) -> CalendarResult<Weekday> {
  parse_weekday_name(
    &raw.trim().to_ascii_lowercase()
  )
  .ok_or_else(|| {
    CalendarError::InvalidWeekStart(
      raw.trim().to_string()
    )
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

pub fn weekday_key(
  day: Weekday
) -> &'static str {
  match day {
    | Weekday::Mon => "monday",
    | Weekday::Tue => "tuesday",
    | Weekday::Wed => "wednesday",
    | Weekday::Thu => "thursday",
    | Weekday::Fri => "friday",
    | Weekday::Sat => "saturday",
    | Weekday::Sun => "sunday"
  }
}

/// Rejects days outside
/// `MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR`.
pub fn check_supported(
  day: NaiveDate
) -> CalendarResult<NaiveDate> {
  ensure_supported(day, &day.to_string())
}

fn ensure_supported(
  day: NaiveDate,
  raw: &str
) -> CalendarResult<NaiveDate> {
  if (MIN_SUPPORTED_YEAR
    ..=MAX_SUPPORTED_YEAR)
    .contains(&day.year())
  {
    Ok(day)
  } else {
    Err(CalendarError::invalid_date(
      raw,
      format!(
        "year must be within \
         {MIN_SUPPORTED_YEAR}..={MAX_SUPPORTED_YEAR}"
      )
    ))
  }
}

fn month_token_regex()
-> Option<&'static Regex> {
  static MONTH_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  MONTH_RE
    .get_or_init(|| {
      Regex::new(
        r"^(?P<year>\d{4})-(?P<month>\d{1,2})$"
      )
      .inspect_err(|err| {
        tracing::error!(
          error = %err,
          "month pattern failed to compile"
        );
      })
      .ok()
    })
    .as_ref()
}
