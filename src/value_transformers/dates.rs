//! Date transformers.
//!
//! Capture time is stored as ISO text and compared through SQLite's
//! `DATE(...)` truncation; modification and publish times are stored as
//! seconds since the Lightroom epoch (2001-01-01 00:00:00 UTC) and compared
//! numerically after conversion.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::{split_operator, TransformError};

/// LR epoch: 2001-01-01 00:00:00 UTC.
fn lr_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedDate {
    Year(i32),
    YearMonth(i32, u32),
    Day(NaiveDate),
    Timestamp(NaiveDateTime),
}

fn parse_date(text: &str, day_first: bool) -> Result<ParsedDate, String> {
    let text = text.trim();
    if text.contains(':') {
        let normalized = text.replacen('T', " ", 1);
        for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
                return Ok(ParsedDate::Timestamp(dt));
            }
        }
        return Err(format!("unrecognized timestamp \"{}\"", text));
    }

    let sep = if text.contains('-') {
        Some('-')
    } else if text.contains('/') {
        Some('/')
    } else {
        None
    };

    let parts: Vec<&str> = match sep {
        Some(s) => text.split(s).collect(),
        None => vec![text],
    };

    let to_i32 = |s: &str| s.parse::<i32>().map_err(|_| format!("invalid date \"{}\"", text));
    let to_u32 = |s: &str| s.parse::<u32>().map_err(|_| format!("invalid date \"{}\"", text));

    match parts.len() {
        1 => Ok(ParsedDate::Year(to_i32(parts[0])?)),
        2 => Ok(ParsedDate::YearMonth(to_i32(parts[0])?, to_u32(parts[1])?)),
        3 => {
            let (y, m, d) = if sep == Some('-') {
                (to_i32(parts[0])?, to_u32(parts[1])?, to_u32(parts[2])?)
            } else if day_first {
                (to_i32(parts[2])?, to_u32(parts[1])?, to_u32(parts[0])?)
            } else {
                (to_i32(parts[2])?, to_u32(parts[0])?, to_u32(parts[1])?)
            };
            NaiveDate::from_ymd_opt(y, m, d)
                .map(ParsedDate::Day)
                .ok_or_else(|| format!("invalid date \"{}\"", text))
        }
        _ => Err(format!("invalid date \"{}\"", text)),
    }
}

/// `datecapt` criterion: lift 1-3 component dates to `DATE(i.captureTime,
/// 'start of ...')`; a full timestamp compares against `i.captureTime`
/// directly. Returns the single, complete WHERE fragment.
pub fn date_capture_clause(value: &str, day_first: bool) -> Result<Vec<String>, TransformError> {
    let (oper, date_text) = split_operator(value);
    let parsed =
        parse_date(date_text, day_first).map_err(|e| TransformError::new("datecapt", e))?;
    let frag = match parsed {
        ParsedDate::Year(y) => format!(
            "DATE(i.captureTime, 'start of year') {} \"{:04}-01-01\"",
            oper.as_sql(),
            y
        ),
        ParsedDate::YearMonth(y, m) => format!(
            "DATE(i.captureTime, 'start of month') {} \"{:04}-{:02}-01\"",
            oper.as_sql(),
            y,
            m
        ),
        ParsedDate::Day(d) => format!(
            "DATE(i.captureTime, 'start of day') {} \"{}\"",
            oper.as_sql(),
            d.format("%Y-%m-%d")
        ),
        ParsedDate::Timestamp(dt) => format!(
            "i.captureTime {} \"{}\"",
            oper.as_sql(),
            dt.format("%Y-%m-%dT%H:%M:%S")
        ),
    };
    Ok(vec![frag])
}

fn to_naive_datetime(parsed: ParsedDate) -> NaiveDateTime {
    match parsed {
        ParsedDate::Year(y) => NaiveDate::from_ymd_opt(y, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        ParsedDate::YearMonth(y, m) => NaiveDate::from_ymd_opt(y, m, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        ParsedDate::Day(d) => d.and_hms_opt(0, 0, 0).unwrap(),
        ParsedDate::Timestamp(dt) => dt,
    }
}

/// Convert a date string to seconds since the LR epoch. `local` applies the
/// process timezone before subtracting, matching `dateloc` vs `dateutc`.
pub fn date_to_lrstamp(text: &str, day_first: bool, local: bool) -> Result<f64, TransformError> {
    let parsed = parse_date(text, day_first).map_err(|e| TransformError::new("date", e))?;
    let naive = to_naive_datetime(parsed);
    let utc_naive = if local {
        match Local.from_local_datetime(&naive).single() {
            Some(dt) => dt.with_timezone(&Utc).naive_utc(),
            None => {
                return Err(TransformError::new(
                    "date",
                    format!("ambiguous or invalid local time \"{}\"", text),
                ))
            }
        }
    } else {
        naive
    };
    let delta = utc_naive - lr_epoch();
    Ok(delta.num_milliseconds() as f64 / 1000.0)
}

fn oper_date_to_lrstamp(
    criterion: &'static str,
    value: &str,
    day_first: bool,
    local: bool,
) -> Result<Vec<String>, TransformError> {
    let (oper, date_text) = split_operator(value);
    let stamp = date_to_lrstamp(date_text, day_first, local)
        .map_err(|e| TransformError::new(criterion, e.reason))?;
    Ok(vec![oper.as_sql().to_string(), format!("{}", stamp)])
}

/// `datemod` criterion: local modification date compared in LR-epoch seconds.
pub fn oper_localdate_to_lrstamp(
    value: &str,
    day_first: bool,
) -> Result<Vec<String>, TransformError> {
    oper_date_to_lrstamp("datemod", value, day_first, true)
}

/// `pubtime` criterion: publish date compared in LR-epoch seconds, UTC.
pub fn oper_utcdate_to_lrstamp(
    value: &str,
    day_first: bool,
) -> Result<Vec<String>, TransformError> {
    oper_date_to_lrstamp("pubtime", value, day_first, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_only_lifts_to_start_of_year() {
        let frag = date_capture_clause(">2020", false).unwrap();
        assert_eq!(
            frag,
            vec!["DATE(i.captureTime, 'start of year') > \"2020-01-01\"".to_string()]
        );
    }

    #[test]
    fn year_month_lifts_to_start_of_month() {
        let frag = date_capture_clause(">=2020-05", false).unwrap();
        assert_eq!(
            frag,
            vec!["DATE(i.captureTime, 'start of month') >= \"2020-05-01\"".to_string()]
        );
    }

    #[test]
    fn full_day_compares_against_start_of_day() {
        let frag = date_capture_clause("<2020-05-18", false).unwrap();
        assert_eq!(
            frag,
            vec!["DATE(i.captureTime, 'start of day') < \"2020-05-18\"".to_string()]
        );
    }

    #[test]
    fn full_timestamp_compares_directly() {
        let frag = date_capture_clause("==2020-05-18T10:00:00", false).unwrap();
        assert_eq!(
            frag,
            vec!["i.captureTime = \"2020-05-18T10:00:00\"".to_string()]
        );
    }

    #[test]
    fn day_first_flips_ambiguous_slash_dates() {
        let frag = date_capture_clause("=18/05/2020", true).unwrap();
        assert_eq!(
            frag,
            vec!["DATE(i.captureTime, 'start of day') = \"2020-05-18\"".to_string()]
        );
    }

    #[test]
    fn lrstamp_of_epoch_is_zero() {
        let stamp = date_to_lrstamp("2001-01-01", false, false).unwrap();
        assert_eq!(stamp, 0.0);
    }

    #[test]
    fn oper_and_lrstamp_round_trip() {
        let out = oper_utcdate_to_lrstamp(">2001-01-02", false).unwrap();
        assert_eq!(out[0], ">");
        assert_eq!(out[1].parse::<f64>().unwrap(), 86400.0);
    }
}
