use chrono::{DateTime, Days, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Closed interval of author timestamps a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl Window {
    /// Every calendar day of the window, ascending, both ends included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day;
        self.first_day.iter_days().take_while(move |d| *d <= last)
    }

    pub fn since_param(&self) -> String {
        iso(&self.since)
    }

    pub fn until_param(&self) -> String {
        iso(&self.until)
    }
}

fn iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// From 00:00:00.000 to 23:59:59.999 of `date` in `tz`.
pub fn day_window<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Window {
    span(date, date, tz)
}

/// `weeks * 7` whole days before `today` through the end of `today`.
pub fn contribution_window<Tz: TimeZone>(today: NaiveDate, weeks: u32, tz: &Tz) -> Window {
    let first = today
        .checked_sub_days(Days::new(u64::from(weeks) * 7))
        .unwrap_or(NaiveDate::MIN);
    span(first, today, tz)
}

fn span<Tz: TimeZone>(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Window {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Window {
        since: local_instant(tz, first, NaiveTime::MIN),
        until: local_instant(tz, last, end_of_day),
        first_day: first,
        last_day: last,
    }
}

// DST gaps have no local midnight; fall back to reading the wall time as UTC.
fn local_instant<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
