use crate::error::{config_error, DigestResult};
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The `{start, end}` pair bounding which calendar events are summarized.
///
/// Serializes with the `startDate`/`endDate` parameter names used for a
/// pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(rename = "startDate")]
    pub start: DateTime<Utc>,
    #[serde(rename = "endDate")]
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Build a window from two ISO-8601 timestamps
    pub fn parse(start: &str, end: &str) -> DigestResult<Self> {
        let start = DateTime::parse_from_rfc3339(start)
            .map_err(|e| config_error(&format!("Invalid window start '{}': {}", start, e)))?;
        let end = DateTime::parse_from_rfc3339(end)
            .map_err(|e| config_error(&format!("Invalid window end '{}': {}", end, e)))?;

        Ok(Self::new(start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }

    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// When the weekly digest fires, in a specific timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSchedule {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
    pub timezone: Tz,
}

impl TriggerSchedule {
    /// Parse the weekday name, `HH:MM` time and IANA timezone name
    pub fn parse(weekday: &str, time: &str, timezone: &str) -> DigestResult<Self> {
        let weekday = weekday
            .trim()
            .parse::<Weekday>()
            .map_err(|_| config_error(&format!("Invalid weekday: {}", weekday)))?;
        let (hour, minute) =
            parse_time(time).ok_or_else(|| config_error(&format!("Invalid time format: {}", time)))?;
        let timezone = parse_timezone(timezone)?;

        Ok(Self {
            weekday,
            hour,
            minute,
            timezone,
        })
    }
}

/// Parse an IANA timezone name such as `Europe/Helsinki`
pub fn parse_timezone(name: &str) -> DigestResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))
}

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Compute the reporting window for a run started at `now`.
///
/// The window starts at midnight of the most recent Sunday in `timezone`
/// (today, if today is Sunday) and ends at `now`.
pub fn reporting_window(now: DateTime<Utc>, timezone: Tz) -> TimeWindow {
    let local = now.with_timezone(&timezone);
    let days_since_sunday = local.weekday().num_days_from_sunday() as i64;
    let sunday = local.date_naive() - Duration::days(days_since_sunday);

    let start = local_midnight(sunday, timezone).unwrap_or(now);
    TimeWindow::new(start, now)
}

/// Resolve local midnight, stepping past a DST gap if midnight does not exist
fn local_midnight(date: NaiveDate, timezone: Tz) -> Option<DateTime<Utc>> {
    resolve_local(date.and_time(NaiveTime::MIN), timezone)
}

/// Calculate the next weekly trigger strictly after `now`
pub fn next_weekly_time(now: DateTime<Utc>, schedule: &TriggerSchedule) -> Option<DateTime<Utc>> {
    let tz = schedule.timezone;
    let local = now.with_timezone(&tz);

    let days_until = (7 + schedule.weekday.num_days_from_monday() as i64
        - local.weekday().num_days_from_monday() as i64)
        % 7;
    let date = local
        .date_naive()
        .checked_add_signed(Duration::days(days_until))?;

    let candidate = at_local_time(date, schedule)?;
    if candidate > now {
        return Some(candidate);
    }

    // Already passed this week's slot, move to next week
    at_local_time(date.checked_add_signed(Duration::days(7))?, schedule)
}

/// Resolve the trigger time on `date`, stepping past a DST gap like [`local_midnight`]
fn at_local_time(date: NaiveDate, schedule: &TriggerSchedule) -> Option<DateTime<Utc>> {
    let naive: NaiveDateTime = date.and_hms_opt(schedule.hour, schedule.minute, 0)?;
    resolve_local(naive, schedule.timezone)
}

fn resolve_local(naive: NaiveDateTime, timezone: Tz) -> Option<DateTime<Utc>> {
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| timezone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calculate the wait duration until the next trigger
pub fn calculate_wait_duration(now: DateTime<Utc>, next_time: DateTime<Utc>) -> std::time::Duration {
    // A slot that is already due still waits a second so the loop cannot spin
    (next_time - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(1))
        .max(std::time::Duration::from_secs(1))
}
