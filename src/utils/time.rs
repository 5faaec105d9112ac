use chrono::NaiveDate;

const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// This is the standard way of naming a daily usage record in sitetally.
pub fn date_to_record_name(date: NaiveDate) -> String {
    format!("{}.json", date.format("%Y-%m-%d"))
}

/// Renders an amount of active time. Hours are only shown once there is at least one, seconds
/// are never shown.
pub fn format_duration(ms: u64) -> String {
    let minutes = ms / MS_PER_MINUTE;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// Weekly totals always show hours, even when there are none.
pub fn format_report_total(ms: u64) -> String {
    format!("{}h {}m", ms / MS_PER_HOUR, (ms % MS_PER_HOUR) / MS_PER_MINUTE)
}
