//! Small shared helpers.

use chrono::Utc;

/// Current wall-clock time as epoch milliseconds, the timestamp unit used by
/// every entity.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
