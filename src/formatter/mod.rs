//! Result formatter: turns raw SQL rows into an aligned, human-readable
//! table. A per-column-name table supplies default widths and display
//! transforms (apertures back to F-numbers, epoch seconds to local time,
//! pick values to flag labels, ...), `raw_print` bypasses every transform,
//! and the `filesize` pseudo-column is computed here by `stat()`ing each
//! row's full path rather than in SQL.

use std::fmt::Write as _;
use std::fs;

use chrono::{Local, NaiveDate, TimeZone};
use rusqlite::types::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("filesize column requires \"name=full\" to also be selected")]
    MissingFullName,
    #[error("could not stat \"{path}\": {source}")]
    Stat { path: String, source: std::io::Error },
}

/// Layout and transform switches.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// `0` prints nothing, negative prints every row, positive caps it.
    pub max_lines: i64,
    pub header: bool,
    pub indent: usize,
    /// Per-position width override; shorter than the column list is fine,
    /// the remaining columns keep their default width.
    pub widths: Vec<usize>,
    pub separator: String,
    pub raw_print: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            max_lines: 0,
            header: true,
            indent: 4,
            widths: Vec::new(),
            separator: " | ".to_string(),
            raw_print: false,
        }
    }
}

fn default_width(name: &str) -> usize {
    match name {
        "name" => 20,
        "name=full" => 60,
        "name=base" => 20,
        "id" => 8,
        "uuid" => 38,
        "rating" => 1,
        "colorlabel" => 8,
        "datemod" | "datecapt" | "datehist" => 19,
        "modcount" => 2,
        "master" | "vname" => 10,
        "stackpos" => 3,
        "keywords" | "collections" | "caption" => 30,
        "camera" => 15,
        "lens" => 25,
        "iso" => 5,
        "focal" => 6,
        "aperture" => 5,
        "speed" => 6,
        "creator" => 18,
        "dims" => 10,
        "flag" => 10,
        "hasgps" | "monochrome" | "flash" => 3,
        "duration" => 10,
        "filesize" => 10,
        _ => 12,
    }
}

fn lr_epoch() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(f) => Some(*f),
        Value::Text(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

/// Reverse of `optics::aperture_clause`'s `2*log2(N)`.
fn display_aperture(value: &Value) -> String {
    match value_as_f64(value) {
        Some(av) => format!("F{:.1}", 2f64.powf(av / 2.0)),
        None => value_as_text(value),
    }
}

/// Reverse of `optics::speed_clause`'s `log2(1/seconds)`.
fn display_speed(value: &Value) -> String {
    match value_as_f64(value) {
        Some(av) => {
            let inv = 2f64.powf(av);
            if inv > 1.0 {
                format!("1/{:.0}", inv)
            } else {
                format!("{:.0} s", 1.0 / inv)
            }
        }
        None => value_as_text(value),
    }
}

fn display_iso(value: &Value) -> String {
    match value_as_f64(value) {
        Some(n) => format!("{:.0}", n),
        None => value_as_text(value),
    }
}

/// Capture time is stored as ISO text; display drops the sub-second part.
fn display_capture_date(value: &Value) -> String {
    let text = value_as_text(value);
    if text.len() > 19 {
        text[..19].to_string()
    } else {
        text
    }
}

/// LR-epoch seconds to a local timestamp, truncated to whole seconds.
fn display_lrstamp(value: &Value) -> String {
    match value_as_f64(value) {
        Some(seconds) => {
            let naive = lr_epoch() + chrono::Duration::seconds(seconds.trunc() as i64);
            match Local.from_local_datetime(&naive).single() {
                Some(local) => local.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            }
        }
        None => value_as_text(value),
    }
}

fn display_bool(value: &Value) -> String {
    match value_as_f64(value) {
        Some(n) if n == 1.0 => "yes".to_string(),
        Some(n) if n == 0.0 => "no".to_string(),
        _ => "?".to_string(),
    }
}

/// `i.pick` values: `1` flagged, `0` unflagged, `-1` rejected.
fn display_flag(value: &Value) -> String {
    match value_as_f64(value) {
        Some(n) if n > 0.0 => "flagged".to_string(),
        Some(n) if n < 0.0 => "rejected".to_string(),
        Some(_) => "unflagged".to_string(),
        None => "?".to_string(),
    }
}

fn display_keywords(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => value_as_text(other),
    }
}

/// `duration` is stored as a hex-encoded `num/den` ratio (e.g.
/// `"012C/0064"`); rendered as `[H:]MM:SS.d`. Anything that doesn't parse
/// that way passes through unchanged rather than erroring — a formatter
/// shouldn't fail a whole row over one odd value.
fn display_duration(value: &Value) -> String {
    let text = value_as_text(value);
    let Some((num_hex, den_hex)) = text.split_once('/') else {
        return text;
    };
    let (Ok(num), Ok(den)) = (u32::from_str_radix(num_hex.trim(), 16), u32::from_str_radix(den_hex.trim(), 16)) else {
        return text;
    };
    if den == 0 {
        return text;
    }
    let total_tenths = (num as f64 / den as f64 * 10.0).round() as i64;
    let (whole, tenths) = (total_tenths / 10, total_tenths % 10);
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}.{}", hours, minutes, secs, tenths)
    } else {
        format!("{:02}:{:02}.{}", minutes, secs, tenths)
    }
}

fn transform_for(name: &str) -> Option<fn(&Value) -> String> {
    match name {
        "aperture" => Some(display_aperture),
        "speed" => Some(display_speed),
        "iso" => Some(display_iso),
        "datecapt" => Some(display_capture_date),
        "datemod" | "datehist" => Some(display_lrstamp),
        "hasgps" | "monochrome" => Some(display_bool),
        "flag" => Some(display_flag),
        "keywords" => Some(display_keywords),
        "duration" => Some(display_duration),
        _ => None,
    }
}

fn render_cell(name: &str, value: &Value, raw_print: bool) -> String {
    if raw_print {
        return value_as_text(value);
    }
    if matches!(value, Value::Null) {
        return String::new();
    }
    match transform_for(name) {
        Some(f) => f(value),
        None => value_as_text(value),
    }
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let fill = " ".repeat(width - text.len());
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

/// SI-suffix size (base 1000), matching the `filesize` pseudo-column total.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Formats a result set into an aligned table.
///
/// `columns` is the user's requested column list in display order; when it
/// contains `filesize`, `name` (ideally `name=full`) must also be present in
/// `sql_columns` so each row's path can be `stat()`'d — callers should add
/// `name=full` to the compiled query themselves via
/// [`ensure_name_full_for_filesize`] before executing.
pub fn format_table(
    columns: &[String],
    sql_columns: &[String],
    rows: &[Vec<Value>],
    options: &FormatOptions,
) -> Result<String, FormatError> {
    let mut out = String::new();

    let wants_filesize = columns.iter().any(|c| c == "filesize");
    let name_index = sql_columns.iter().position(|c| c == "name");
    if wants_filesize && name_index.is_none() {
        return Err(FormatError::MissingFullName);
    }

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| options.widths.get(i).copied().unwrap_or_else(|| default_width(name)))
        .collect();

    if options.header && options.max_lines != 0 {
        let mut header_cells = Vec::with_capacity(columns.len());
        for (name, width) in columns.iter().zip(&widths) {
            header_cells.push(pad(&name[..name.len().min(*width)], *width, false));
        }
        writeln!(out, "{}{}", " ".repeat(options.indent), header_cells.join(&options.separator)).unwrap();
        let total_width = widths.iter().sum::<usize>() + options.separator.len() * widths.len().saturating_sub(1);
        writeln!(out, "{}{}", " ".repeat(options.indent), "=".repeat(total_width)).unwrap();
    }

    // max_lines = 0 prints no rows, but a filesize total still covers the
    // whole result set — that combination is how "only the total" is asked
    // for.
    let limit = if options.max_lines < 0 { rows.len() } else { (options.max_lines as usize).min(rows.len()) };

    let mut total_bytes: u64 = 0;
    for (row_index, row) in rows.iter().enumerate() {
        let printed = row_index < limit;
        let mut cells = Vec::with_capacity(columns.len());
        for (name, width) in columns.iter().zip(&widths) {
            if name == "filesize" {
                let path = value_as_text(&row[name_index.unwrap()]);
                let size = fs::metadata(&path).map_err(|e| FormatError::Stat { path: path.clone(), source: e })?.len();
                total_bytes += size;
                if printed {
                    cells.push(pad(&human_size(size), *width, true));
                }
                continue;
            }
            if !printed {
                continue;
            }
            let sql_index = sql_columns.iter().position(|c| c == name);
            let text = match sql_index {
                Some(idx) => render_cell(name, &row[idx], options.raw_print),
                None => String::new(),
            };
            cells.push(pad(&text, *width, false));
        }
        if printed {
            writeln!(out, "{}{}", " ".repeat(options.indent), cells.join(&options.separator)).unwrap();
        } else if !wants_filesize {
            break;
        }
    }

    if wants_filesize {
        writeln!(out, "{}Total filesize: {}", " ".repeat(options.indent), human_size(total_bytes)).unwrap();
    }

    Ok(out)
}

/// Requesting `filesize` implicitly requests `name=full` if the caller
/// didn't already ask for a `name` column. Applied to the *compiled*
/// columns string before it reaches `Compiler::compile`.
pub fn ensure_name_full_for_filesize(columns: &str) -> String {
    if !columns.split(',').map(str::trim).any(|c| c == "filesize") {
        return columns.to_string();
    }
    let has_name = columns.split(',').map(str::trim).any(|c| c == "name" || c.starts_with("name="));
    let without_filesize: Vec<&str> =
        columns.split(',').map(str::trim).filter(|c| *c != "filesize").collect();
    let mut rebuilt = without_filesize.join(", ");
    if !has_name {
        if rebuilt.is_empty() {
            rebuilt = "name=full".to_string();
        } else {
            rebuilt = format!("name=full, {}", rebuilt);
        }
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aperture_round_trips_through_display() {
        let av = 2.0 * 5.6f64.log2();
        assert_eq!(display_aperture(&Value::Real(av)), "F5.6");
    }

    #[test]
    fn speed_displays_fast_shutter_as_a_fraction() {
        let av = (1.0f64 / (1.0 / 1000.0)).log2();
        assert_eq!(display_speed(&Value::Real(av)), "1/1000");
    }

    #[test]
    fn speed_displays_slow_shutter_in_seconds() {
        let av = (1.0f64 / 5.0).log2();
        assert_eq!(display_speed(&Value::Real(av)), "5 s");
    }

    #[test]
    fn capture_date_drops_subseconds() {
        let v = Value::Text("2020-05-18T10:00:00.123".to_string());
        assert_eq!(display_capture_date(&v), "2020-05-18T10:00:00");
    }

    #[test]
    fn flag_maps_pick_values() {
        assert_eq!(display_flag(&Value::Integer(1)), "flagged");
        assert_eq!(display_flag(&Value::Integer(0)), "unflagged");
        assert_eq!(display_flag(&Value::Integer(-1)), "rejected");
    }

    #[test]
    fn keywords_null_becomes_empty_not_the_word_none() {
        assert_eq!(display_keywords(&Value::Null), "");
    }

    #[test]
    fn duration_formats_a_hex_ratio_under_an_hour() {
        assert_eq!(display_duration(&Value::Text("0046/0002".to_string())), "00:35.0");
    }

    #[test]
    fn duration_includes_hours_when_long_enough() {
        // 7200s exactly, encoded as 0x1C20/1
        assert_eq!(display_duration(&Value::Text("1C20/0001".to_string())), "2:00:00.0");
    }

    #[test]
    fn ensure_name_full_adds_it_when_missing() {
        assert_eq!(ensure_name_full_for_filesize("rating, filesize"), "name=full, rating");
    }

    #[test]
    fn ensure_name_full_leaves_an_existing_name_column_alone() {
        assert_eq!(ensure_name_full_for_filesize("name, filesize"), "name");
    }

    #[test]
    fn max_lines_zero_prints_nothing() {
        let options = FormatOptions { max_lines: 0, ..Default::default() };
        let out = format_table(
            &["name".to_string()],
            &["name".to_string()],
            &[vec![Value::Text("a.jpg".to_string())]],
            &options,
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn max_lines_zero_still_totals_filesize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, [0u8; 1500]).unwrap();
        let rows = vec![vec![Value::Text(path.to_string_lossy().into_owned())]];
        let options = FormatOptions { max_lines: 0, header: false, ..Default::default() };
        let out = format_table(
            &["filesize".to_string()],
            &["name".to_string()],
            &rows,
            &options,
        )
        .unwrap();
        assert_eq!(out.trim(), "Total filesize: 1.5 KB");
    }

    #[test]
    fn header_is_underlined_to_total_width() {
        let options = FormatOptions { max_lines: -1, widths: vec![4], ..Default::default() };
        let out = format_table(&["id".to_string()], &["id".to_string()], &[], &options).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "    ====");
    }
}
