//! Timestamped progress lines on stdout.

use std::io::{self, Write};

use chrono::{DateTime, Local, TimeZone};

use crate::watcher::{EventLevel, Progress, WatchEvent};

/// Render one line.
///
/// ```text
/// [2026-05-04 12:00:03] [INFO] [2/10] Trigger not present yet
/// [2026-05-04 12:00:00] [INFO] Watching /srv/drop/trigger.txt (...)
/// ```
pub fn format_line<Tz>(at: &DateTime<Tz>, level: EventLevel, progress: Option<Progress>, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let timestamp = at.format("%Y-%m-%d %H:%M:%S");
    match progress {
        Some(progress) => format!("[{}] [{}] [{}] {}", timestamp, level, progress, message),
        None => format!("[{}] [{}] {}", timestamp, level, message),
    }
}

/// Render an event with the given timestamp.
pub fn format_event<Tz>(at: &DateTime<Tz>, event: &WatchEvent) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format_line(at, event.level(), event.progress(), &event.to_string())
}

/// Print an event line stamped with local time.
pub fn print_event(event: &WatchEvent) {
    let line = format_event(&Local::now(), event);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line).ok();
    stdout.flush().ok();
}
