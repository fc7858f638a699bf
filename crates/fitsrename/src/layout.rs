//! Timestamp parsing and date layouts for `date…` format specifiers.
//!
//! Header timestamps are ISO-8601 without a zone and are always treated as
//! UTC. A layout containing `%` is a strftime layout; any other layout is a
//! reference-date layout built from the components of
//! `Mon Jan 2 15:04:05 MST 2006` (`2006-01-02`, `15h04`, `Jan _2` ...).

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Parse a header timestamp such as `2023-05-01T21:14:09.123`.
///
/// Fractional seconds are optional and a trailing `Z` is accepted.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.fZ")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format `ts` with either layout flavour.
pub fn format_timestamp(ts: &DateTime<Utc>, layout: &str) -> Result<String, String> {
    if layout.contains('%') {
        format_strftime(ts, layout)
    } else {
        Ok(format_reference(ts, layout))
    }
}

/// strftime formatting; rejects unknown or truncated conversions up front so
/// formatting never fails halfway.
pub fn format_strftime(ts: &DateTime<Utc>, layout: &str) -> Result<String, String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(layout).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid strftime layout {layout:?}"));
    }
    let mut out = String::new();
    write!(out, "{}", ts.format_with_items(items.iter()))
        .map_err(|_| format!("cannot format timestamp with {layout:?}"))?;
    Ok(out)
}

/// Format with a reference-date layout. Text that is not a layout component
/// is copied through unchanged.
pub fn format_reference(ts: &DateTime<Utc>, layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() + 8);
    let mut rest = layout;

    while let Some(c) = rest.chars().next() {
        if let Some(consumed) = fraction(ts, rest, &mut out) {
            rest = &rest[consumed..];
            continue;
        }
        match component(rest) {
            Some((len, std)) => {
                push_component(ts, std, &mut out);
                rest = &rest[len..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Std {
    LongMonth,
    Month,
    NumMonth,
    ZeroMonth,
    LongWeekDay,
    WeekDay,
    Day,
    UnderDay,
    ZeroDay,
    ZeroYearDay,
    Hour,
    Hour12,
    ZeroHour12,
    Minute,
    ZeroMinute,
    Second,
    ZeroSecond,
    LongYear,
    Year,
    UpperPm,
    LowerPm,
    ZoneName,
    NumZone(&'static str),
    IsoZone,
}

/// Components in match order: longer spellings come before their prefixes.
const COMPONENTS: &[(&str, Std)] = &[
    ("January", Std::LongMonth),
    ("Jan", Std::Month),
    ("Monday", Std::LongWeekDay),
    ("Mon", Std::WeekDay),
    ("MST", Std::ZoneName),
    ("2006", Std::LongYear),
    ("002", Std::ZeroYearDay),
    ("01", Std::ZeroMonth),
    ("02", Std::ZeroDay),
    ("03", Std::ZeroHour12),
    ("04", Std::ZeroMinute),
    ("05", Std::ZeroSecond),
    ("06", Std::Year),
    ("15", Std::Hour),
    ("1", Std::NumMonth),
    ("2", Std::Day),
    ("_2", Std::UnderDay),
    ("3", Std::Hour12),
    ("4", Std::Minute),
    ("5", Std::Second),
    ("PM", Std::UpperPm),
    ("pm", Std::LowerPm),
    ("-07:00:00", Std::NumZone("+00:00:00")),
    ("-070000", Std::NumZone("+000000")),
    ("-07:00", Std::NumZone("+00:00")),
    ("-0700", Std::NumZone("+0000")),
    ("-07", Std::NumZone("+00")),
    ("Z07:00:00", Std::IsoZone),
    ("Z070000", Std::IsoZone),
    ("Z07:00", Std::IsoZone),
    ("Z0700", Std::IsoZone),
    ("Z07", Std::IsoZone),
];

fn component(rest: &str) -> Option<(usize, Std)> {
    // `_2006` is a literal underscore followed by the year.
    if rest.starts_with("_2006") {
        return None;
    }
    COMPONENTS
        .iter()
        .find(|(spelling, _)| rest.starts_with(spelling))
        .map(|(spelling, std)| (spelling.len(), *std))
}

fn push_component(ts: &DateTime<Utc>, std: Std, out: &mut String) {
    let month = ts.month0() as usize;
    let weekday = ts.weekday().num_days_from_monday() as usize;
    let hour12 = match ts.hour() % 12 {
        0 => 12,
        h => h,
    };
    // Writing into a String cannot fail.
    let _ = match std {
        Std::LongMonth => write!(out, "{}", MONTHS[month]),
        Std::Month => write!(out, "{}", &MONTHS[month][..3]),
        Std::NumMonth => write!(out, "{}", ts.month()),
        Std::ZeroMonth => write!(out, "{:02}", ts.month()),
        Std::LongWeekDay => write!(out, "{}", WEEKDAYS[weekday]),
        Std::WeekDay => write!(out, "{}", &WEEKDAYS[weekday][..3]),
        Std::Day => write!(out, "{}", ts.day()),
        Std::UnderDay => write!(out, "{:>2}", ts.day()),
        Std::ZeroDay => write!(out, "{:02}", ts.day()),
        Std::ZeroYearDay => write!(out, "{:03}", ts.ordinal()),
        Std::Hour => write!(out, "{:02}", ts.hour()),
        Std::Hour12 => write!(out, "{hour12}"),
        Std::ZeroHour12 => write!(out, "{hour12:02}"),
        Std::Minute => write!(out, "{}", ts.minute()),
        Std::ZeroMinute => write!(out, "{:02}", ts.minute()),
        Std::Second => write!(out, "{}", ts.second()),
        Std::ZeroSecond => write!(out, "{:02}", ts.second()),
        Std::LongYear => write!(out, "{:04}", ts.year()),
        Std::Year => write!(out, "{:02}", ts.year().rem_euclid(100)),
        Std::UpperPm => out.write_str(if ts.hour() >= 12 { "PM" } else { "AM" }),
        Std::LowerPm => out.write_str(if ts.hour() >= 12 { "pm" } else { "am" }),
        Std::ZoneName => out.write_str("UTC"),
        Std::NumZone(text) => out.write_str(text),
        Std::IsoZone => out.write_str("Z"),
    };
}

/// Fractional seconds: `.000` prints a fixed number of digits, `.999` trims
/// trailing zeros (and the separator when nothing is left). `,` works as
/// separator too. Returns the number of layout bytes consumed.
fn fraction(ts: &DateTime<Utc>, rest: &str, out: &mut String) -> Option<usize> {
    let bytes = rest.as_bytes();
    let separator = *bytes.first()?;
    if separator != b'.' && separator != b',' {
        return None;
    }
    let digit = *bytes.get(1)?;
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let n = bytes[1..].iter().take_while(|&&b| b == digit).count();
    // `.0001` is not a fraction component: the run must not be followed by
    // another digit.
    if bytes.get(1 + n).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let nanos = format!("{:09}", ts.nanosecond() % 1_000_000_000);
    let width = n.min(9);
    let mut frac = String::from(&nanos[..width]);
    frac.extend(std::iter::repeat('0').take(n - width));
    if digit == b'9' {
        while frac.ends_with('0') {
            frac.pop();
        }
        if frac.is_empty() {
            return Some(1 + n);
        }
    }
    out.push(separator as char);
    out.push_str(&frac);
    Some(1 + n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    // ---- Parsing ----

    #[test]
    fn parses_with_and_without_fraction() {
        let a = ts("2023-05-01T21:14:09");
        assert_eq!(a.timestamp(), 1_682_975_649);
        let b = ts("2023-05-01T21:14:09.250");
        assert_eq!(b.timestamp_subsec_millis(), 250);
        let c = ts("2023-05-01T21:14:09.123456789Z");
        assert_eq!(c.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn rejects_non_timestamps() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2023-05-01").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2023-13-01T00:00:00").is_none());
        assert!(parse_timestamp("2023-05-01T21:14:09+02:00").is_none());
    }

    // ---- Reference layouts ----

    #[test]
    fn reference_date_components() {
        let t = ts("2023-05-01T21:14:09");
        assert_eq!(format_reference(&t, "2006-01-02"), "2023-05-01");
        assert_eq!(format_reference(&t, "20060102"), "20230501");
        assert_eq!(format_reference(&t, "06/1/2"), "23/5/1");
        assert_eq!(format_reference(&t, "Jan _2"), "May  1");
        assert_eq!(format_reference(&t, "Monday January 2"), "Monday May 1");
        assert_eq!(format_reference(&t, "Mon"), "Mon");
        assert_eq!(format_reference(&t, "002"), "121");
    }

    #[test]
    fn reference_time_components() {
        let t = ts("2023-05-01T09:04:07");
        assert_eq!(format_reference(&t, "15-04-05"), "09-04-07");
        assert_eq!(format_reference(&t, "3:4:5 PM"), "9:4:7 AM");
        assert_eq!(format_reference(&t, "03pm"), "09am");
        let t = ts("2023-05-01T00:30:00");
        assert_eq!(format_reference(&t, "3pm"), "12am");
    }

    #[test]
    fn reference_zone_is_utc() {
        let t = ts("2023-05-01T21:14:09");
        assert_eq!(format_reference(&t, "15:04 MST"), "21:14 UTC");
        assert_eq!(format_reference(&t, "-0700"), "+0000");
        assert_eq!(format_reference(&t, "-07:00"), "+00:00");
        assert_eq!(format_reference(&t, "15:04Z07:00"), "21:14Z");
    }

    #[test]
    fn reference_fractional_seconds() {
        let t = ts("2023-05-01T21:14:09.120");
        assert_eq!(format_reference(&t, "05.000"), "09.120");
        assert_eq!(format_reference(&t, "05.999"), "09.12");
        assert_eq!(format_reference(&t, "05,000000"), "09,120000");
        let whole = ts("2023-05-01T21:14:09");
        assert_eq!(format_reference(&whole, "05.999"), "09");
    }

    #[test]
    fn underscore_before_year_is_literal() {
        let t = ts("2023-05-01T21:14:09");
        assert_eq!(format_reference(&t, "night_2006"), "night_2023");
    }

    #[test]
    fn plain_text_passes_through() {
        let t = ts("2023-05-01T21:14:09");
        assert_eq!(format_reference(&t, "night"), "night");
        assert_eq!(format_reference(&t, ""), "");
        assert_eq!(format_reference(&t, "Ωx"), "Ωx");
    }

    // ---- strftime ----

    #[test]
    fn strftime_layouts() {
        let t = ts("2023-05-01T21:14:09");
        assert_eq!(format_timestamp(&t, "%Y%m%d").unwrap(), "20230501");
        assert_eq!(format_timestamp(&t, "%H%M%S").unwrap(), "211409");
        assert_eq!(format_timestamp(&t, "%Y-%j").unwrap(), "2023-121");
    }

    #[test]
    fn strftime_rejects_bad_conversion() {
        let t = ts("2023-05-01T21:14:09");
        assert!(format_timestamp(&t, "%Q").is_err());
        assert!(format_timestamp(&t, "%").is_err());
    }

    #[test]
    fn dispatch_on_percent() {
        let t = ts("2023-05-01T21:14:09");
        assert_eq!(format_timestamp(&t, "2006").unwrap(), "2023");
        assert_eq!(format_timestamp(&t, "%Y").unwrap(), "2023");
    }
}
