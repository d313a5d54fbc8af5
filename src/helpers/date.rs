//! Date helper functions and the site timezone

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Civil timezone of the site.
///
/// Scheduling input and every calendar date shown to readers are
/// interpreted in this zone. A fixed offset never observes daylight
/// saving; a named zone does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteZone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl Default for SiteZone {
    /// Eastern Standard Time, without DST
    fn default() -> Self {
        SiteZone::Fixed(FixedOffset::west_opt(5 * 3600).expect("valid offset"))
    }
}

impl FromStr for SiteZone {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(SiteZone::default());
        }
        if let Some(offset) = parse_offset(s) {
            return Ok(SiteZone::Fixed(offset));
        }
        s.parse::<Tz>()
            .map(SiteZone::Named)
            .map_err(|_| ScheduleError::InvalidZone(s.to_string()))
    }
}

impl fmt::Display for SiteZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteZone::Fixed(offset) => write!(f, "{}", offset),
            SiteZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl SiteZone {
    /// Convert a local date and time in this zone to an absolute instant.
    ///
    /// An ambiguous local time (clocks falling back) resolves to the
    /// earlier instant. A local time skipped by a DST transition is an
    /// error rather than being shifted silently.
    pub fn to_utc(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let naive = NaiveDateTime::new(date, time);
        let resolved = match self {
            SiteZone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .map(|dt| dt.with_timezone(&Utc)),
            SiteZone::Named(tz) => tz
                .from_local_datetime(&naive)
                .map(|dt| dt.with_timezone(&Utc)),
        };

        match resolved {
            LocalResult::Single(dt) => Ok(dt),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest),
            LocalResult::None => Err(ScheduleError::NonexistentLocalTime(
                naive.format("%Y-%m-%d %H:%M").to_string(),
            )),
        }
    }

    /// View an instant as a date-time carrying this zone's offset
    pub fn localize(&self, instant: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            SiteZone::Fixed(offset) => instant.with_timezone(offset),
            SiteZone::Named(tz) => {
                let local = instant.with_timezone(tz);
                local.with_timezone(&local.offset().fix())
            }
        }
    }

    /// Calendar date of an instant in this zone
    pub fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        self.localize(instant).date_naive()
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `Z`
fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(s.to_string()))
}

/// Parse an `HH:MM` or `HH:MM:SS` time
pub fn parse_time(s: &str) -> Result<NaiveTime, ScheduleError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ScheduleError::InvalidTime(s.to_string()))
}

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, format: &str) -> String
where
    Tz2::Offset: fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format date and time for admin listings (like "Jan 5, 2024, 9:00 AM")
pub fn format_date_time<Tz2: TimeZone>(date: &DateTime<Tz2>) -> String
where
    Tz2::Offset: fmt::Display,
{
    date.format("%b %-d, %Y, %-I:%M %p").to_string()
}

/// Label of a calendar month (like "January 2024")
pub fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month))
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("D", "%-d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
