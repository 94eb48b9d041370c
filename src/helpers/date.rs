//! Date helper functions

use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;

use crate::error::ContentError;

/// Default display pattern, e.g. "19 Jan 2024"
pub const DEFAULT_DATE_FORMAT: &str = "dd LLL yyyy";

/// Parse a CMS timestamp.
///
/// Accepts RFC 3339 as well as the `+0000` offset form the content service
/// emits (`2021-03-25T19:25:28+0000`).
pub fn parse_timestamp(iso: &str) -> Result<DateTime<FixedOffset>, ContentError> {
    DateTime::parse_from_rfc3339(iso)
        .or_else(|_| DateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|_| ContentError::InvalidDate(iso.to_string()))
}

/// Format a CMS timestamp using a date-fns compatible pattern
///
/// # Examples
/// ```ignore
/// format_date("2024-01-19T00:00:00+0000", "dd LLL yyyy", chrono_tz::UTC) // -> "19 Jan 2024"
/// ```
pub fn format_date(iso: &str, pattern: &str, tz: Tz) -> Result<String, ContentError> {
    let date = parse_timestamp(iso)?;
    Ok(format_datetime(&date.with_timezone(&tz), pattern))
}

/// Like [`format_date`], passing an absent timestamp through unchanged
pub fn format_optional_date(
    iso: Option<&str>,
    pattern: &str,
    tz: Tz,
) -> Result<Option<String>, ContentError> {
    iso.map(|s| format_date(s, pattern, tz)).transpose()
}

/// Format an already parsed date with a date-fns pattern
pub fn format_datetime<T: TimeZone>(date: &DateTime<T>, pattern: &str) -> String
where
    T::Offset: std::fmt::Display,
{
    let chrono_format = date_fns_to_chrono_format(pattern);
    date.format(&chrono_format).to_string()
}

/// Convert a date-fns format string to a chrono format string
///
/// Works on runs of the same letter, so `dd LLL yyyy` becomes `%d %b %Y`.
/// Text inside single quotes is copied literally.
fn date_fns_to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // quoted literal; '' is an escaped quote
            let mut j = i + 1;
            if j < chars.len() && chars[j] == '\'' {
                out.push('\'');
                i = j + 1;
                continue;
            }
            while j < chars.len() && chars[j] != '\'' {
                push_literal(&mut out, chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let token = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M' | 'L', 1) => "%-m",
            ('M' | 'L', 2) => "%m",
            ('M' | 'L', 3) => "%b",
            ('M' | 'L', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('E', 4) => "%A",
            ('E', _) => "%a",
            ('a', _) => "%p",
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
                i += run;
                continue;
            }
        };

        out.push_str(token);
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
