use chrono::TimeDelta;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Formats a duration as `D days H hours M minutes S seconds`.
///
/// Each unit is truncated, sub-second precision is dropped and negative
/// durations (clock skew across restarts) render as zero.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    format_elapsed_secs(elapsed.num_seconds().max(0) as u64)
}

pub fn format_elapsed_secs(total: u64) -> String {
    let total = total as i64;
    let days = total / SECS_PER_DAY;
    let hours = (total % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (total % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;
    format!("{days} days {hours} hours {minutes} minutes {seconds} seconds")
}
