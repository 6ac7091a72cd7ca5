//! Snapshot identifiers derived from wall-clock time
//!
//! A snapshot id names one backup cycle and doubles as the staging
//! directory name and the archive/screenshot base name, so it has to be
//! filesystem-safe and lexically sortable.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fmt;

/// Timestamp layout: second resolution, sorts lexically, no characters
/// that are illegal in file names on any supported platform.
const STAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// Identifier for one backup cycle, e.g. `2024-01-01 12-00-00`.
///
/// When two cycles start within the same clock second the namer appends
/// a counter (`2024-01-01 12-00-00-2`), so ids stay unique per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format a moment as a snapshot timestamp.
fn format_stamp(moment: DateTime<Local>) -> String {
    moment.format(STAMP_FORMAT).to_string()
}

/// Issues snapshot ids from the current moment.
///
/// Remembers the last issued timestamp so that a second cycle within the
/// same clock second gets a disambiguating suffix instead of colliding
/// with the previous cycle's artifacts.
#[derive(Debug, Default)]
pub struct SnapshotNamer {
    last: Mutex<Option<(String, u32)>>,
}

impl SnapshotNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue an id for a cycle starting now.
    pub fn next(&self) -> SnapshotId {
        self.next_for(format_stamp(Local::now()))
    }

    fn next_for(&self, stamp: String) -> SnapshotId {
        let mut last = self.last.lock();
        match last.as_mut() {
            Some((prev, count)) if *prev == stamp => {
                *count += 1;
                SnapshotId(format!("{stamp}-{count}"))
            }
            _ => {
                *last = Some((stamp.clone(), 1));
                SnapshotId(stamp)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamp_format_is_filesystem_safe_and_sortable() {
        let moment = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_stamp(moment), "2024-01-01 12-00-00");

        let earlier = Local.with_ymd_and_hms(2024, 1, 1, 9, 59, 59).unwrap();
        assert!(format_stamp(earlier) < format_stamp(moment));
    }

    #[test]
    fn distinct_seconds_produce_distinct_ids() {
        let namer = SnapshotNamer::new();
        let a = namer.next_for("2024-01-01 12-00-00".to_string());
        let b = namer.next_for("2024-01-01 12-00-01".to_string());
        assert_eq!(a.as_str(), "2024-01-01 12-00-00");
        assert_eq!(b.as_str(), "2024-01-01 12-00-01");
    }

    #[test]
    fn same_second_ids_get_a_counter_suffix() {
        let namer = SnapshotNamer::new();
        let a = namer.next_for("2024-01-01 12-00-00".to_string());
        let b = namer.next_for("2024-01-01 12-00-00".to_string());
        let c = namer.next_for("2024-01-01 12-00-00".to_string());
        assert_eq!(a.as_str(), "2024-01-01 12-00-00");
        assert_eq!(b.as_str(), "2024-01-01 12-00-00-2");
        assert_eq!(c.as_str(), "2024-01-01 12-00-00-3");

        // Counter resets once the clock moves on
        let d = namer.next_for("2024-01-01 12-00-01".to_string());
        assert_eq!(d.as_str(), "2024-01-01 12-00-01");
    }

    #[test]
    fn ids_display_as_their_raw_string() {
        let id = SnapshotId::new("2024-01-01 12-00-00");
        assert_eq!(id.to_string(), "2024-01-01 12-00-00");
    }
}
