// Scalar coercion for raw spreadsheet cells.
//
// This module centralizes all the "dirty" cell/number/date handling so the
// rest of the code can assume clean, typed values. The source workbooks are
// hand-maintained: the same column may hold native dates, serial day numbers
// or delimited strings depending on who exported the file.
use calamine::{Data, DataType};
use chrono::{Datelike, Duration, NaiveDate, Timelike};

/// Coerce any cell into an `f64` while being forgiving about formatting
/// issues common in operational exports (decimal commas, currency symbols,
/// stray text).
///
/// - Empty cells map to 0.
/// - Already-numeric cells pass through.
/// - Date cells map to their serial value.
/// - Anything else is stringified, the decimal comma is replaced with a dot,
///   every character that is not a digit, `.` or `-` is stripped, and the
///   longest leading numeric prefix is parsed.
/// - Unparsable input maps to 0. The function is total and never panics.
///
/// Note the comma replacement happens *before* the strip, so a value with
/// both separators ("1.234,56") collapses to "1.234.56" and parses as 1.234.
/// That order is part of the ingestion contract; see the fixture test.
pub fn coerce_number(cell: &Data) -> f64 {
    match cell {
        Data::Empty => 0.0,
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::DateTime(dt) => dt.as_f64(),
        other => clean_numeric_text(&other.to_string()),
    }
}

fn clean_numeric_text(raw: &str) -> f64 {
    let replaced = raw.replace(',', ".");
    let cleaned: String = replaced
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_float_prefix(&cleaned).unwrap_or(0.0)
}

/// Parse the longest leading prefix of `s` that forms a valid decimal
/// number: optional leading `-`, digits, at most one `.`.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

/// Coerce a cell into a time of day expressed as decimal hours.
///
/// - A date-time cell yields hours + minutes/60 + seconds/3600 of its time
///   component.
/// - A plain number is a spreadsheet day fraction and is multiplied by 24.
/// - A colon-delimited string ("H:M" or "H:M:S") is parsed positionally;
///   segments that do not start with a digit count as 0.
/// - Everything else yields 0. Values are not clamped to [0, 24).
pub fn coerce_time_of_day(cell: &Data) -> f64 {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(t) => {
                f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + f64::from(t.second()) / 3600.0
            }
            None => 0.0,
        },
        Data::Float(f) => *f * 24.0,
        Data::Int(i) => *i as f64 * 24.0,
        Data::String(s) => {
            let parts: Vec<&str> = s.trim().split(':').collect();
            if parts.len() < 2 {
                return 0.0;
            }
            let h = parse_int_prefix(parts[0]);
            let m = parse_int_prefix(parts[1]);
            let s = if parts.len() > 2 {
                parse_int_prefix(parts[2])
            } else {
                0.0
            };
            h + m / 60.0 + s / 3600.0
        }
        _ => 0.0,
    }
}

fn parse_int_prefix(s: &str) -> f64 {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Coerce a cell into a calendar date. Returns `None` when no date can be
/// determined, which is the row-rejection signal for the normalizer.
///
/// - A date-time cell yields its calendar date.
/// - A plain number is a serial day count since 1899-12-30 (the usual Excel
///   epoch, 25569 days behind the Unix epoch); fractional parts are the time
///   of day and are dropped.
/// - A `/` or `-` delimited string with exactly three parts is read as
///   `Y-M-D` when the first part has four digits, `D-M-Y` otherwise.
pub fn coerce_calendar_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell.as_datetime().map(|t| t.date()),
        Data::Float(f) => serial_to_date(*f),
        Data::Int(i) => serial_to_date(*i as f64),
        Data::String(s) => parse_date_text(s),
        _ => None,
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = Duration::try_days(serial.floor() as i64)?;
    epoch.checked_add_signed(days)
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split(['/', '-']).collect();
    if parts.len() != 3 {
        return None;
    }
    let (y, m, d) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        (parts[2], parts[1], parts[0])
    };
    let year = y.trim().parse::<i32>().ok()?;
    let month = m.trim().parse::<u32>().ok()?;
    let day = d.trim().parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format decimal hours as an `H:MM` clock string. Non-finite or
/// non-positive values render as "0:00".
pub fn format_hours_to_clock(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0:00".to_string();
    }
    let h = hours.floor();
    let m = ((hours - h) * 60.0).round();
    format!("{}:{:02}", h as i64, m as i64)
}

/// Display form for report dates, Chilean convention (`DD-MM-YYYY`).
pub fn format_date_cl(date: NaiveDate) -> String {
    format!(
        "{:02}-{:02}-{:04}",
        date.day(),
        date.month(),
        date.year()
    )
}
