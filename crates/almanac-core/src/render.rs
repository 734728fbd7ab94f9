use std::io::{self, IsTerminal, Write};

use chrono::Datelike;
use unicode_width::UnicodeWidthStr;

use crate::config::DisplayConfig;
use crate::datetime::DayNormalizer;
use crate::event::{Event, EventDate};
use crate::view::{CalendarCell, MonthView};

const MARKER: &str = "•";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    max_markers: usize,
}

impl Renderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            color: display.color && io::stdout().is_terminal(),
            max_markers: display.max_markers,
        }
    }

    pub fn plain(max_markers: usize) -> Self {
        Self {
            color: false,
            max_markers,
        }
    }

    #[tracing::instrument(skip(self, view, normalizer), fields(month = %view.month))]
    pub fn print_month(&self, view: &MonthView, normalizer: &DayNormalizer) -> anyhow::Result<()> {
        self.write_view(io::stdout().lock(), view, normalizer)
    }

    /// Month grid followed by the selected day's agenda.
    pub fn write_view<W: Write>(
        &self,
        mut writer: W,
        view: &MonthView,
        normalizer: &DayNormalizer,
    ) -> anyhow::Result<()> {
        self.write_month(&mut writer, view)?;
        writeln!(writer)?;
        self.write_agenda(&mut writer, view.selected_date, &view.selected_events, normalizer)
    }

    #[tracing::instrument(skip(self, events, normalizer))]
    pub fn print_agenda(
        &self,
        day: chrono::NaiveDate,
        events: &[Event],
        normalizer: &DayNormalizer,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_agenda(&mut out, day, events, normalizer)
    }

    pub fn write_month<W: Write>(&self, mut writer: W, view: &MonthView) -> anyhow::Result<()> {
        writeln!(writer, "{}", self.paint(&view.label, "1"))?;

        let rows = view
            .weeks()
            .map(|week| week.iter().map(|cell| self.format_cell(cell)).collect())
            .collect::<Vec<Vec<String>>>();

        write_table(&mut writer, view.weekday_labels.clone(), rows)?;

        writeln!(
            writer,
            "{} event(s) on {} day(s) this month",
            view.summary.events_in_month, view.summary.busy_days
        )?;
        Ok(())
    }

    pub fn write_agenda<W: Write>(
        &self,
        mut writer: W,
        day: chrono::NaiveDate,
        events: &[Event],
        normalizer: &DayNormalizer,
    ) -> anyhow::Result<()> {
        writeln!(writer, "{}", self.paint(&day.format("%A, %Y-%m-%d").to_string(), "1"))?;

        if events.is_empty() {
            writeln!(writer, "no events")?;
            return Ok(());
        }

        let headers = vec!["#".to_string(), "When".to_string(), "Title".to_string()];
        let rows = events
            .iter()
            .enumerate()
            .map(|(idx, event)| {
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    describe_time(&event.date, normalizer),
                    event.title.clone(),
                ]
            })
            .collect();

        write_table(&mut writer, headers, rows)
    }

    fn format_cell(&self, cell: &CalendarCell) -> String {
        let day = format!("{:>2}", cell.date.day());
        let framed = if cell.is_selected {
            format!("[{day}]")
        } else if cell.is_today {
            format!("({day})")
        } else {
            format!(" {day} ")
        };

        let framed = if cell.in_current_month {
            framed
        } else {
            self.paint(&framed, "2")
        };

        let count = cell.events.len();
        if count == 0 {
            return framed;
        }

        let shown = count.min(self.max_markers);
        let overflow = count - shown;
        let mut markers = MARKER.repeat(shown);
        if overflow > 0 {
            markers.push_str(&format!("+{overflow}"));
        }

        format!("{framed}{}", self.paint(&markers, "33"))
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn describe_time(date: &EventDate, normalizer: &DayNormalizer) -> String {
    match date {
        EventDate::Day(_) => "all day".to_string(),
        EventDate::Local(local) => local.format("%H:%M").to_string(),
        EventDate::At(instant) => instant
            .with_timezone(&normalizer.zone())
            .format("%H:%M %Z")
            .to_string(),
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{:width$} ", header, width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{strip_ansi, Renderer};
    use crate::config::CalendarSettings;
    use crate::datetime::DayNormalizer;
    use crate::event::Event;
    use crate::view::Calendar;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn render(calendar: &Calendar, today: NaiveDate, max_markers: usize) -> String {
        let mut out = Vec::new();
        Renderer::plain(max_markers)
            .write_month(&mut out, &calendar.view(today).expect("view"))
            .expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn grid_shows_label_selection_and_markers() {
        let calendar = Calendar::new(CalendarSettings::default(), ymd(2024, 2, 14))
            .expect("calendar")
            .with_events(&[
                Event::new(ymd(2024, 2, 14), "A"),
                Event::new(ymd(2024, 2, 14), "B"),
            ]);
        let text = render(&calendar, ymd(2024, 2, 14), 3);
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "February 2024");
        assert!(lines[1].starts_with("Su"));
        assert!(text.contains("[14]••"));
        assert!(text.contains(" 28 "));
        assert!(text.contains("2 event(s) on 1 day(s) this month"));
        // label, header, separator, five weeks, summary
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn markers_overflow_past_the_cap() {
        let events = (0..5)
            .map(|n| Event::new(ymd(2024, 2, 20), format!("task {n}")))
            .collect::<Vec<_>>();
        let calendar = Calendar::new(CalendarSettings::default(), ymd(2024, 2, 1))
            .expect("calendar")
            .with_events(&events);
        let text = render(&calendar, ymd(2024, 2, 2), 2);

        assert!(text.contains(" 20 ••+3"));
        assert!(text.contains("( 2)"));
    }

    #[test]
    fn agenda_lists_titles_with_times() {
        let events = vec![
            Event::new(ymd(2024, 2, 14), "Walk fences"),
            Event::new(
                Utc.with_ymd_and_hms(2024, 2, 14, 6, 15, 0)
                    .single()
                    .expect("valid instant"),
                "Vet visit",
            ),
        ];
        let mut out = Vec::new();
        Renderer::plain(3)
            .write_agenda(&mut out, ymd(2024, 2, 14), &events, &DayNormalizer::utc())
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.starts_with("Wednesday, 2024-02-14"));
        assert!(text.contains("all day"));
        assert!(text.contains("06:15 UTC"));
        assert!(text.contains("Vet visit"));
    }

    #[test]
    fn empty_agenda_says_so() {
        let mut out = Vec::new();
        Renderer::plain(3)
            .write_agenda(&mut out, ymd(2024, 2, 15), &[], &DayNormalizer::utc())
            .expect("render");
        assert!(String::from_utf8(out).expect("utf8").ends_with("no events\n"));
    }

    #[test]
    fn strip_ansi_removes_escapes() {
        assert_eq!(strip_ansi("\x1b[33mhi\x1b[0m"), "hi");
    }
}
