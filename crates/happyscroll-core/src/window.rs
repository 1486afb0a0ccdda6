//! Civil-date window keys for the rate-limit counters (§3, §4.7).
//!
//! Generalizes this codebase's `current_month_key()` idiom (a plain string
//! key derived from the wall-clock date) from a monthly to a daily window,
//! and from naive UTC to a configurable designated timezone so the "today"
//! boundary doesn't depend on the host machine's locale.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

/// Default designated timezone when none is configured (§4.7: default UTC).
pub const DEFAULT_WINDOW_TZ: Tz = chrono_tz::UTC;

/// Compute today's window key (`YYYY-MM-DD`) in `tz`.
pub fn today_window_key(tz: Tz) -> String {
    let now = Utc::now().with_timezone(&tz);
    now.format("%Y-%m-%d").to_string()
}

/// Compute the window key for an arbitrary UTC instant, for testing window
/// rollover without depending on the real clock.
pub fn window_key_for(instant: chrono::DateTime<Utc>, tz: Tz) -> String {
    let local = tz.from_utc_datetime(&instant.naive_utc());
    local.format("%Y-%m-%d").to_string()
}
