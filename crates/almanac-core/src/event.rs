use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::datetime::parse_event_date;
use crate::error::CalendarError;

/// The timestamp attached to an event.
///
/// Only its calendar day matters to the grid; see
/// [`DayNormalizer`](crate::datetime::DayNormalizer) for how each variant
/// is reduced to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventDate {
    /// An all-day date with no time component.
    Day(NaiveDate),
    /// A wall-clock time with no offset, read in the calendar's zone.
    Local(NaiveDateTime),
    /// An absolute instant.
    At(DateTime<Utc>),
}

impl FromStr for EventDate {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_event_date(s)
    }
}

impl TryFrom<String> for EventDate {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventDate> for String {
    fn from(value: EventDate) -> Self {
        value.to_string()
    }
}

impl From<NaiveDate> for EventDate {
    fn from(value: NaiveDate) -> Self {
        Self::Day(value)
    }
}

impl From<DateTime<Utc>> for EventDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self::At(value)
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDate::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            EventDate::Local(local) => write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S")),
            EventDate::At(instant) => write!(f, "{}", instant.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub date: EventDate,
    pub title: String,
}

impl Event {
    pub fn new(date: impl Into<EventDate>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{Event, EventDate};

    #[test]
    fn deserializes_each_date_shape() {
        let raw = r#"[
            {"date": "2024-02-14", "title": "Sow barley"},
            {"date": "2024-02-14T06:30", "title": "Feed check"},
            {"date": "2024-02-14T22:00:00-05:00", "title": "Frost watch"}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(raw).expect("valid events");

        assert_eq!(
            events[0].date,
            EventDate::Day(NaiveDate::from_ymd_opt(2024, 2, 14).expect("valid date"))
        );
        assert!(matches!(events[1].date, EventDate::Local(_)));
        assert_eq!(
            events[2].date,
            EventDate::At(
                Utc.with_ymd_and_hms(2024, 2, 15, 3, 0, 0)
                    .single()
                    .expect("valid instant")
            )
        );
    }

    #[test]
    fn rejects_records_with_bad_dates() {
        let raw = r#"[{"date": "soon", "title": "Harvest"}]"#;
        let err = serde_json::from_str::<Vec<Event>>(raw).expect_err("bad date");
        assert!(err.to_string().contains("invalid date input 'soon'"));
    }

    #[test]
    fn serializes_back_to_text() {
        let event = Event::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
            "Shear sheep",
        );
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"date":"2024-03-01","title":"Shear sheep"}"#);
    }
}
