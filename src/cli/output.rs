//! Text formatting for command results.

use serde_json::{Map, Value};

use crate::tracker::store::entities::{ActivitySnapshot, CategorySummary, parse_timestamp};

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Renders a duration in seconds the way every command reports it.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remainder = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {remainder}s")
    } else {
        format!("{remainder}s")
    }
}

pub fn format_category_summary(summary: &CategorySummary) -> String {
    format!(
        "{}: {} activities, {} total ({} uses)",
        summary.name,
        summary.activity_count,
        format_duration(summary.total_duration),
        summary.usage_count
    )
}

pub fn format_activity(activity: &ActivitySnapshot) -> String {
    let duration = match activity.duration {
        Some(seconds) => format_duration(seconds),
        None => "In progress".to_string(),
    };
    format!(
        "{}: {} ({duration})",
        activity.start_time.format(DISPLAY_TIME_FORMAT),
        activity.name
    )
}

/// Renders one row from a `tell` query. Aggregate rows (anything carrying a
/// `total_duration` column) print as `category: duration`; rows that look
/// like individual activities print as `timestamp: name (duration)`. Rows
/// matching neither shape fall back to plain column listing.
pub fn format_query_row(row: &Map<String, Value>) -> String {
    if let Some(total) = row.get("total_duration") {
        let category = row
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("Uncategorized");
        let seconds = total
            .as_i64()
            .or_else(|| total.as_f64().map(|v| v as i64))
            .unwrap_or(0);
        return format!("{category}: {}", format_duration(seconds));
    }

    let start_time = row
        .get("start_time")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    if let Some(start_time) = start_time {
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown activity");
        let duration = match row.get("duration").and_then(Value::as_i64) {
            Some(seconds) => format_duration(seconds),
            None => "In progress".to_string(),
        };
        return format!(
            "{}: {name} ({duration})",
            start_time.format(DISPLAY_TIME_FORMAT)
        );
    }

    row.iter()
        .map(|(column, value)| format!("{column}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
