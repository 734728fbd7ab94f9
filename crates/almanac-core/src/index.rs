use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::datetime::DayNormalizer;
use crate::event::Event;

/// Events grouped by the calendar day
/// they fall on.
///
/// Built once per event list; a new
/// list means a new index.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
  by_day: BTreeMap<NaiveDate, Vec<Event>>,
  total:  usize
}

impl EventIndex {
  #[tracing::instrument(
    skip_all,
    fields(events = events.len(), zone = %normalizer.zone())
  )]
  pub fn build(
    events: &[Event],
    normalizer: &DayNormalizer
  ) -> Self {
    let mut by_day: BTreeMap<
      NaiveDate,
      Vec<Event>
    > = BTreeMap::new();

    for event in events {
      let day =
        normalizer.day_of(&event.date);
      by_day
        .entry(day)
        .or_default()
        .push(event.clone());
    }

    tracing::debug!(
      days = by_day.len(),
      "indexed events by day"
    );

    Self {
      by_day,
      total: events.len()
    }
  }

  /// Events on `day` in their original
  /// order; empty when there are none.
  pub fn lookup(
    &self,
    day: NaiveDate
  ) -> &[Event] {
    self
      .by_day
      .get(&day)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.total
  }

  pub fn is_empty(&self) -> bool {
    self.total == 0
  }

  pub fn days_with_events(
    &self
  ) -> impl Iterator<Item = NaiveDate> + '_
  {
    self.by_day.keys().copied()
  }

  /// Number of events on days within
  /// `start..=end`.
  pub fn count_between(
    &self,
    start: NaiveDate,
    end: NaiveDate
  ) -> usize {
    if end < start {
      return 0;
    }
    self
      .by_day
      .range(start..=end)
      .map(|(_, events)| events.len())
      .sum()
  }

  pub fn busy_days_between(
    &self,
    start: NaiveDate,
    end: NaiveDate
  ) -> usize {
    if end < start {
      return 0;
    }
    self.by_day.range(start..=end).count()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::EventIndex;
  use crate::datetime::DayNormalizer;
  use crate::event::Event;

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn titles(
    events: &[Event]
  ) -> Vec<&str> {
    events
      .iter()
      .map(|event| event.title.as_str())
      .collect()
  }

  #[test]
  fn same_day_events_keep_order() {
    let events = vec![
      Event::new(ymd(2024, 2, 14), "A"),
      Event::new(ymd(2024, 2, 14), "B"),
      Event::new(ymd(2024, 3, 1), "C"),
    ];
    let index = EventIndex::build(
      &events,
      &DayNormalizer::utc()
    );

    assert_eq!(
      titles(index.lookup(ymd(
        2024, 2, 14
      ))),
      vec!["A", "B"]
    );
    assert!(
      index
        .lookup(ymd(2024, 2, 15))
        .is_empty()
    );
    assert_eq!(
      titles(index.lookup(ymd(
        2024, 3, 1
      ))),
      vec!["C"]
    );
  }

  #[test]
  fn time_of_day_does_not_split_a_day() {
    let morning = Utc
      .with_ymd_and_hms(
        2024, 6, 3, 0, 0, 1
      )
      .single()
      .expect("valid instant");
    let night = Utc
      .with_ymd_and_hms(
        2024, 6, 3, 23, 59, 59
      )
      .single()
      .expect("valid instant");
    let events = vec![
      Event::new(night, "Close gates"),
      Event::new(morning, "Milking"),
    ];
    let index = EventIndex::build(
      &events,
      &DayNormalizer::utc()
    );

    assert_eq!(
      titles(index.lookup(ymd(
        2024, 6, 3
      ))),
      vec!["Close gates", "Milking"]
    );
  }

  #[test]
  fn empty_list_answers_every_lookup() {
    let index = EventIndex::build(
      &[],
      &DayNormalizer::utc()
    );
    assert!(index.is_empty());
    assert!(
      index
        .lookup(ymd(2024, 1, 1))
        .is_empty()
    );
    assert_eq!(
      index.count_between(
        ymd(2024, 1, 1),
        ymd(2024, 12, 31)
      ),
      0
    );
  }

  #[test]
  fn counts_within_a_window() {
    let events = vec![
      Event::new(ymd(2024, 1, 31), "x"),
      Event::new(ymd(2024, 2, 1), "a"),
      Event::new(ymd(2024, 2, 1), "b"),
      Event::new(ymd(2024, 2, 29), "c"),
      Event::new(ymd(2024, 3, 1), "y"),
    ];
    let index = EventIndex::build(
      &events,
      &DayNormalizer::utc()
    );

    assert_eq!(index.len(), 5);
    assert_eq!(
      index.count_between(
        ymd(2024, 2, 1),
        ymd(2024, 2, 29)
      ),
      3
    );
    assert_eq!(
      index.busy_days_between(
        ymd(2024, 2, 1),
        ymd(2024, 2, 29)
      ),
      2
    );
    assert_eq!(
      index
        .days_with_events()
        .collect::<Vec<_>>(),
      vec![
        ymd(2024, 1, 31),
        ymd(2024, 2, 1),
        ymd(2024, 2, 29),
        ymd(2024, 3, 1)
      ]
    );
  }
}
