use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};

/// This is the standard way of turning a calendar date into a record key in daykeeper.
/// Every date-keyed persisted structure uses this format.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Older activity logs were keyed with locale date strings like "Mon Jan 01 2024".
/// Parsing them lets the streak engine migrate those entries to [day_key] form.
pub fn parse_legacy_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%a %b %d %Y").ok()
}

/// Lowercase weekday name used as the bucket key of the recurring task template.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parses free-form item times ("9:00 AM", "14:30") into a minute-of-day value.
/// Sorting by this instead of the raw string avoids "10:00 AM" ordering before
/// "9:00 AM" the way a lexical compare would.
pub fn clock_minutes(time: &str) -> Option<u32> {
    let time = time.trim();
    let parsed = NaiveTime::parse_from_str(time, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()?;
    Some(parsed.hour() * 60 + parsed.minute())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{clock_minutes, day_key, parse_day_key, parse_legacy_day_key};

    #[test]
    fn day_key_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(day_key(date), "2024-02-29");
        assert_eq!(parse_day_key("2024-02-29"), Some(date));
        assert_eq!(parse_day_key("Mon Jan 01 2024"), None);
    }

    #[test]
    fn legacy_key_parsing() {
        assert_eq!(
            parse_legacy_day_key("Mon Jan 01 2024"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(parse_legacy_day_key("2024-01-01"), None);
    }

    #[test]
    fn clock_minutes_orders_twelve_hour_times() {
        assert_eq!(clock_minutes("9:00 AM"), Some(9 * 60));
        assert_eq!(clock_minutes("10:00 AM"), Some(10 * 60));
        assert_eq!(clock_minutes("2:30 PM"), Some(14 * 60 + 30));
        assert_eq!(clock_minutes("12:15 AM"), Some(15));
        assert_eq!(clock_minutes("14:30"), Some(14 * 60 + 30));
        assert_eq!(clock_minutes("soonish"), None);
        assert!(clock_minutes("9:00 AM") < clock_minutes("10:00 AM"));
    }
}
