use chrono::{DateTime, Local, Utc};

pub fn snapshot_timestamp_slug() -> String {
    Local::now().format("%Y_%m_%d_%H_%M").to_string()
}

/// Render a provider epoch-seconds timestamp as `YYYY-MM-DD HH:MM:SS` UTC.
pub fn format_unix_timestamp(seconds: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
}
