use chrono::NaiveDateTime;

/// Timestamps are persisted as local-naive text in this format so SQLite's
/// date functions keep working on them in generated queries.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIME_FORMAT).ok()
}

/// One completed or in-progress row from the activities table.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySnapshot {
    pub name: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    /// Seconds. None while the activity is still in progress.
    pub duration: Option<i64>,
}

/// Aggregate line for `category list`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub name: String,
    pub usage_count: i64,
    pub activity_count: i64,
    pub total_duration: i64,
}
