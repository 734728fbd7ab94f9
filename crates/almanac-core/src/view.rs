use chrono::{DateTime, NaiveDate, Utc, Weekday};

use crate::config::CalendarSettings;
use crate::error::CalendarResult;
use crate::event::Event;
use crate::grid::{build_grid, weekday_order, DAYS_PER_WEEK};
use crate::index::EventIndex;
use crate::state::CalendarState;

/// Supplies the human-readable names a view shows.
///
/// The core only ships English; hosts with their own formatter implement
/// this instead.
pub trait CalendarLabels {
    fn month_label(&self, month: NaiveDate) -> String;
    fn weekday_label(&self, day: Weekday) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLabels;

impl CalendarLabels for EnglishLabels {
    fn month_label(&self, month: NaiveDate) -> String {
        month.format("%B %Y").to_string()
    }

    fn weekday_label(&self, day: Weekday) -> String {
        match day {
            Weekday::Mon => "Mo",
            Weekday::Tue => "Tu",
            Weekday::Wed => "We",
            Weekday::Thu => "Th",
            Weekday::Fri => "Fr",
            Weekday::Sat => "Sa",
            Weekday::Sun => "Su",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_selected: bool,
    pub is_today: bool,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthSummary {
    pub events_in_month: usize,
    pub busy_days: usize,
}

/// Everything a view layer needs to draw one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub month: NaiveDate,
    pub label: String,
    pub week_start: Weekday,
    pub weekday_labels: Vec<String>,
    pub cells: Vec<CalendarCell>,
    pub selected_date: NaiveDate,
    pub selected_events: Vec<Event>,
    pub summary: MonthSummary,
}

impl MonthView {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|cell| cell.date == date)
    }
}

#[tracing::instrument(skip(state, index, labels), fields(month = %state.current_month()))]
pub fn compose_month_view(
    state: &CalendarState,
    index: &EventIndex,
    week_start: Weekday,
    today: NaiveDate,
    labels: &dyn CalendarLabels,
) -> CalendarResult<MonthView> {
    let grid = build_grid(state.current_month(), week_start)?;

    let cells = grid
        .days()
        .iter()
        .map(|&date| CalendarCell {
            date,
            in_current_month: grid.in_current_month(date),
            is_selected: state.is_selected(date),
            is_today: date == today,
            events: index.lookup(date).to_vec(),
        })
        .collect::<Vec<_>>();

    let summary = MonthSummary {
        events_in_month: index.count_between(grid.month_start(), grid.month_end()),
        busy_days: index.busy_days_between(grid.month_start(), grid.month_end()),
    };

    tracing::debug!(
        cells = cells.len(),
        events_in_month = summary.events_in_month,
        "composed month view"
    );

    Ok(MonthView {
        month: grid.month_start(),
        label: labels.month_label(grid.month_start()),
        week_start,
        weekday_labels: weekday_order(week_start)
            .iter()
            .map(|day| labels.weekday_label(*day))
            .collect(),
        cells,
        selected_date: state.selected_date(),
        selected_events: index.lookup(state.selected_date()).to_vec(),
        summary,
    })
}

/// One open calendar: its settings, navigation state and indexed events.
#[derive(Debug, Clone)]
pub struct Calendar {
    settings: CalendarSettings,
    state: CalendarState,
    index: EventIndex,
}

impl Calendar {
    pub fn new(settings: CalendarSettings, today: NaiveDate) -> CalendarResult<Self> {
        Ok(Self {
            settings,
            state: CalendarState::new(today)?,
            index: EventIndex::default(),
        })
    }

    pub fn with_events(mut self, events: &[Event]) -> Self {
        self.set_events(events);
        self
    }

    /// Replaces the event list and rebuilds the index from scratch.
    pub fn set_events(&mut self, events: &[Event]) {
        self.index = EventIndex::build(events, &self.settings.normalizer);
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn index(&self) -> &EventIndex {
        &self.index
    }

    pub fn next_month(&mut self) -> CalendarResult<NaiveDate> {
        self.state.next_month()
    }

    pub fn prev_month(&mut self) -> CalendarResult<NaiveDate> {
        self.state.prev_month()
    }

    pub fn select_date(&mut self, day: NaiveDate) -> CalendarResult<()> {
        self.state.select_date(day)
    }

    pub fn select_date_input(&mut self, raw: &str, now: DateTime<Utc>) -> CalendarResult<NaiveDate> {
        self.state
            .select_date_input(raw, &self.settings.normalizer, now)
    }

    pub fn go_to_month(&mut self, day: NaiveDate) -> CalendarResult<()> {
        self.state.go_to_month(day)
    }

    pub fn go_to_today(&mut self, today: NaiveDate) -> CalendarResult<()> {
        self.state.go_to_today(today)
    }

    pub fn events_on(&self, day: NaiveDate) -> &[Event] {
        self.index.lookup(day)
    }

    pub fn view(&self, today: NaiveDate) -> CalendarResult<MonthView> {
        self.view_with(today, &EnglishLabels)
    }

    pub fn view_with(
        &self,
        today: NaiveDate,
        labels: &dyn CalendarLabels,
    ) -> CalendarResult<MonthView> {
        compose_month_view(
            &self.state,
            &self.index,
            self.settings.week_start,
            today,
            labels,
        )
    }
}
