use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike};

/// Time of day as fractional hours, 09:30 is 9.5.
pub fn hours_of_day(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 / 3600.
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.day0() as u64)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{hours_of_day, month_start, week_start};

    #[test]
    fn test_hours_of_day() {
        assert_eq!(hours_of_day(NaiveTime::MIN), 0.);
        assert_eq!(hours_of_day(NaiveTime::from_hms_opt(9, 30, 0).unwrap()), 9.5);
        assert_eq!(hours_of_day(NaiveTime::from_hms_opt(23, 45, 0).unwrap()), 23.75);
    }

    #[test]
    fn test_week_start() {
        // 2024-01-03 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(week_start(wednesday), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(month_start(first), first);
    }
}
