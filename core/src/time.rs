use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
    Weekday,
};

use crate::error::{Result, TaskError};

/// Midnight at the start of `now`'s calendar day, in `now`'s zone.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    local_to_zone(&now.timezone(), now.date_naive().and_time(chrono::NaiveTime::MIN))
        .unwrap_or_else(|| now.clone())
}

/// Parses a due date as typed by a person. Bare dates resolve to the end of that local day.
pub fn parse_human_date(input: &str) -> Result<DateTime<Utc>> {
    parse_relative(input, Local::now(), DayAnchor::End)
}

/// Parses a listing bound. Bare dates resolve to the start of that local day,
/// which keeps `[from, to)` windows half-open on day boundaries.
pub fn parse_bound(input: &str) -> Result<DateTime<Utc>> {
    parse_relative(input, Local::now(), DayAnchor::Start)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DayAnchor {
    Start,
    End,
}

fn parse_relative<Tz: TimeZone>(input: &str, now: DateTime<Tz>, anchor: DayAnchor) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let zone = now.timezone();
    let today = now.date_naive();
    let at = |date: NaiveDate| anchor_date(&zone, date, anchor, input);

    match input.to_lowercase().as_str() {
        "" => return Err(TaskError::InvalidDate(input.to_string())),
        "today" | "tod" => return at(today),
        "tomorrow" | "tom" => return at(today + Duration::days(1)),
        "eow" => {
            // Sunday of the current week
            let days_to_sunday = 6 - today.weekday().num_days_from_monday() as i64;
            return at(today + Duration::days(days_to_sunday));
        }
        "eom" => return at(last_day_of_month(today.year(), today.month())),
        _ => {}
    }

    if let Some(rest) = input.strip_prefix('+') {
        return at(offset_date(today, rest).ok_or_else(|| TaskError::InvalidDate(input.to_string()))?);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return local_to_zone(&zone, dt)
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| TaskError::InvalidDate(input.to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return at(date);
    }

    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Some(target) = parse_weekday_str(day_str) {
            let mut days_needed = target.num_days_from_sunday() as i64
                - today.weekday().num_days_from_sunday() as i64;
            if days_needed <= 0 {
                days_needed += 7;
            }
            // 1:fri is the next Friday, 2:fri the one after.
            let target_date = (count - 1)
                .checked_mul(7)
                .and_then(|extra| extra.checked_add(days_needed))
                .and_then(Duration::try_days)
                .and_then(|delta| today.checked_add_signed(delta))
                .ok_or_else(|| TaskError::InvalidDate(input.to_string()))?;
            return at(target_date);
        }
    }

    Err(TaskError::InvalidDate(input.to_string()))
}

fn anchor_date<Tz: TimeZone>(zone: &Tz, date: NaiveDate, anchor: DayAnchor, input: &str) -> Result<DateTime<Utc>> {
    let time = match anchor {
        DayAnchor::Start => chrono::NaiveTime::MIN,
        DayAnchor::End => chrono::NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(chrono::NaiveTime::MIN),
    };
    local_to_zone(zone, date.and_time(time))
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TaskError::InvalidDate(input.to_string()))
}

fn local_to_zone<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        // Inside a DST gap; shift forward past it.
        LocalResult::None => zone
            .from_local_datetime(&naive.checked_add_signed(Duration::hours(1))?)
            .earliest(),
    }
}

fn offset_date(today: NaiveDate, token: &str) -> Option<NaiveDate> {
    if token.len() < 2 || !token.is_ascii() {
        return None;
    }
    let (num_str, unit) = token.split_at(token.len() - 1);
    let count: i64 = num_str.parse().ok()?;
    match unit {
        "d" => today.checked_add_signed(Duration::try_days(count)?),
        "w" => today.checked_add_signed(Duration::try_weeks(count)?),
        "m" => {
            let months = (today.year() as i64 * 12 + today.month0() as i64).checked_add(count)?;
            let year = i32::try_from(months.div_euclid(12)).ok()?;
            let month = months.rem_euclid(12) as u32 + 1;
            NaiveDate::from_ymd_opt(year, month, 1)?;
            // Jan 31 + 1m clamps to the end of February.
            NaiveDate::from_ymd_opt(year, month, today.day())
                .or_else(|| Some(last_day_of_month(year, month)))
        }
        _ => None,
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    match input.split_once(':') {
        Some((count, day)) => count.parse::<i64>().ok().filter(|c| *c > 0).map(|c| (c, day)),
        // Just "fri" means 1:fri
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
