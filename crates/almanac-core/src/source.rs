use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::event::Event;

/// Reads the events a host hands to the calendar.
///
/// Accepts either a JSON array of `{ "date", "title" }` records or one
/// record per line. Any record with a malformed date fails the whole load.
#[tracing::instrument(skip(path), fields(file = %path.display()))]
pub fn load_events(path: &Path) -> anyhow::Result<Vec<Event>> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let events = read_events(BufReader::new(file))
        .with_context(|| format!("failed to load events from {}", path.display()))?;
    info!(count = events.len(), "loaded events");
    Ok(events)
}

pub fn read_events<R: BufRead>(mut reader: R) -> anyhow::Result<Vec<Event>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    if text.trim_start().starts_with('[') {
        let events: Vec<Event> =
            serde_json::from_str(&text).context("failed parsing event array")?;
        debug!(count = events.len(), "parsed event array");
        return Ok(events);
    }

    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing event on line {}", idx + 1))?;
        out.push(event);
    }

    debug!(count = out.len(), "parsed event lines");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::read_events;

    #[test]
    fn reads_an_array() {
        let raw = r#"[{"date":"2024-04-02","title":"Drill wheat"}]"#;
        let events = read_events(Cursor::new(raw)).expect("valid array");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Drill wheat");
    }

    #[test]
    fn reads_one_record_per_line() {
        let raw = "{\"date\":\"2024-04-02\",\"title\":\"a\"}\n\n{\"date\":\"2024-04-03T05:00:00Z\",\"title\":\"b\"}\n";
        let events = read_events(Cursor::new(raw)).expect("valid lines");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].title, "b");
    }

    #[test]
    fn reports_the_failing_line() {
        let raw = "{\"date\":\"2024-04-02\",\"title\":\"a\"}\n{\"date\":\"2024-04-31\",\"title\":\"b\"}\n";
        let err = read_events(Cursor::new(raw)).expect_err("bad date");
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn empty_input_is_an_empty_list() {
        let events = read_events(Cursor::new("")).expect("empty");
        assert!(events.is_empty());
    }
}
