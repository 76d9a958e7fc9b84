pub mod text;
pub mod time;

pub use text::file_slug;
pub use time::{format_unix_timestamp, snapshot_timestamp_slug};
