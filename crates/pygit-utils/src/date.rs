use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::{DateTime, FixedOffset, Local, TimeZone};

use crate::error::UtilError;
use crate::Result;

/// A parsed author/committer date with timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    /// Seconds since Unix epoch.
    pub timestamp: i64,
    /// Timezone offset in minutes from UTC (e.g., -300 for EST).
    pub tz_offset: i32,
}

/// Output formats for displaying a date (`log`/`show`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// "1736942400 +0000" — the on-disk commit/tag header format.
    Raw,
    /// "Thu Feb 13 23:31:30 2009 +0000", using the date's own stored offset.
    Default,
    /// "2025-01-15 12:00:00 +0000"
    Iso,
    /// "2025-01-15"
    Short,
}

/// Git timezone offset stored as a decimal integer (e.g. -0500 for EST).
/// This is the same format C git uses: the "decimal parse" where -0100 => -100.
fn tz_offset_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    let hours = abs / 100;
    let mins = abs % 100;
    sign * (hours * 60 + mins)
}

/// Convert minutes offset to the git-style decimal representation.
fn minutes_to_tz_offset(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.unsigned_abs() as i32;
    let hours = abs / 60;
    let mins = abs % 60;
    sign * (hours * 100 + mins)
}

impl GitDate {
    /// Create a GitDate from a Unix timestamp and timezone offset in minutes.
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// Get the current time as a GitDate with local timezone.
    pub fn now() -> Self {
        let now = Local::now();
        let offset_minutes = now.offset().local_minus_utc() / 60;
        Self {
            timestamp: now.timestamp(),
            tz_offset: offset_minutes,
        }
    }

    /// Parse raw commit/tag header format: "timestamp +/-offset" or just "timestamp".
    pub fn parse_raw(input: &str) -> Result<Self> {
        let input = input.trim();
        let parts: Vec<&str> = input.splitn(2, ' ').collect();

        let timestamp: i64 = parts[0]
            .parse()
            .map_err(|_| UtilError::DateParse(format!("invalid timestamp: '{}'", parts[0])))?;

        let tz_offset = if parts.len() > 1 {
            let tz_str = parts[1].trim();
            let tz_int: i32 = tz_str
                .parse()
                .map_err(|_| UtilError::DateParse(format!("invalid timezone: '{}'", tz_str)))?;
            tz_offset_to_minutes(tz_int)
        } else {
            0
        };

        Ok(Self {
            timestamp,
            tz_offset,
        })
    }

    /// Format in the given style.
    pub fn format(&self, fmt: DateFormat) -> String {
        match fmt {
            DateFormat::Raw => {
                let tz = minutes_to_tz_offset(self.tz_offset);
                format!("{} {:+05}", self.timestamp, tz)
            }
            DateFormat::Default | DateFormat::Iso | DateFormat::Short => {
                let offset = FixedOffset::east_opt(self.tz_offset * 60)
                    .unwrap_or(FixedOffset::east_opt(0).unwrap());
                let dt = DateTime::from_timestamp(self.timestamp, 0)
                    .unwrap_or(DateTime::UNIX_EPOCH)
                    .with_timezone(&offset);
                match fmt {
                    DateFormat::Default => dt.format("%a %b %e %H:%M:%S %Y %z").to_string(),
                    DateFormat::Iso => dt.format("%Y-%m-%d %H:%M:%S %z").to_string(),
                    DateFormat::Short => dt.format("%Y-%m-%d").to_string(),
                    DateFormat::Raw => unreachable!(),
                }
            }
        }
    }

    /// Convert to a chrono DateTime with the stored timezone.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset * 60)?;
        DateTime::from_timestamp(self.timestamp, 0).map(|dt| dt.with_timezone(&offset))
    }
}

/// Author/committer identity with timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    /// Parse from the commit/tag header format: `Name <email> timestamp tz`
    ///
    /// Example: "John Doe <john@example.com> 1234567890 +0000"
    pub fn parse(input: &BStr) -> Result<Self> {
        let input = input.as_bytes();

        // Find the last '>' to split off the date portion; this is robust
        // to a name that itself contains '<'/'>'.
        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::DateParse("missing '>' in signature".into()))?;

        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::DateParse("missing '<' in signature".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];

        let date_str = input[gt_pos + 1..].trim();
        let date_str = std::str::from_utf8(date_str)
            .map_err(|_| UtilError::DateParse("non-UTF-8 date in signature".into()))?;

        let date = GitDate::parse_raw(date_str)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date,
        })
    }

    /// Format in the canonical header format: `Name <email> timestamp tz`
    pub fn to_bytes(&self) -> BString {
        let tz = minutes_to_tz_offset(self.date.tz_offset);
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(format!("{} {:+05}", self.date.timestamp, tz).as_bytes());
        out
    }
}
