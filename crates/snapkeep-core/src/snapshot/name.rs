//! Snapshot file name format: `webui_bk_<YYYYMMDD>_<HHMMSS>.db`.

use chrono::{NaiveDateTime, Timelike};

/// Prefix shared by every snapshot file.
pub const SNAPSHOT_PREFIX: &str = "webui_bk_";
/// Extension shared by every snapshot file.
pub const SNAPSHOT_SUFFIX: &str = ".db";

/// Format of the embedded timestamp as written into names.
const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Fixed-width format the date and time fields are parsed back with.
const PARSE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const DATE_DIGITS: usize = 8;
const TIME_DIGITS: usize = 6;

/// Outcome of classifying a directory entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// Not a snapshot name at all; callers ignore it.
    Foreign,
    /// Has the snapshot prefix and suffix but no valid embedded timestamp.
    Malformed(String),
    /// A well-formed snapshot name.
    Snapshot(SnapshotName),
}

/// A parsed snapshot file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotName {
    taken_at: NaiveDateTime,
}

impl SnapshotName {
    /// Name for a snapshot taken at `taken_at`. Sub-second precision is dropped.
    pub fn new(taken_at: NaiveDateTime) -> Self {
        let taken_at = taken_at.with_nanosecond(0).unwrap_or(taken_at);
        Self { taken_at }
    }

    pub fn taken_at(&self) -> NaiveDateTime {
        self.taken_at
    }

    /// Classify `name`: foreign, malformed (right prefix/suffix, bad stamp), or a snapshot.
    pub fn classify(name: &str) -> NameMatch {
        let Some(stamp) = name
            .strip_prefix(SNAPSHOT_PREFIX)
            .and_then(|rest| rest.strip_suffix(SNAPSHOT_SUFFIX))
        else {
            return NameMatch::Foreign;
        };
        match parse_stamp(stamp) {
            Some(taken_at) => NameMatch::Snapshot(SnapshotName { taken_at }),
            None => NameMatch::Malformed(stamp.to_string()),
        }
    }

    /// Parse a well-formed snapshot name; `None` for foreign or malformed names.
    pub fn parse(name: &str) -> Option<Self> {
        match Self::classify(name) {
            NameMatch::Snapshot(s) => Some(s),
            NameMatch::Foreign | NameMatch::Malformed(_) => None,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}{}{}",
            SNAPSHOT_PREFIX,
            self.taken_at.format(NAME_TIMESTAMP_FORMAT),
            SNAPSHOT_SUFFIX
        )
    }
}

impl std::fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// `YYYYMMDD_HHMMSS` with exactly 8 + 6 ASCII digits, and a real calendar date/time.
fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    let (date, time) = stamp.split_once('_')?;
    if date.len() != DATE_DIGITS || time.len() != TIME_DIGITS {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(date) || !all_digits(time) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), PARSE_TIMESTAMP_FORMAT).ok()
}
