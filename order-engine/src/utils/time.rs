//! 时间工具函数 — 业务时区日期计算
//!
//! 时间段过滤统一基于业务时区的日历日期 (`NaiveDate`)，
//! 比较时忽略一天内的具体时刻。周从周一开始。

use chrono::{Datelike, Duration, Months, NaiveDate};
use chrono_tz::Tz;

use crate::filters::TimePeriod;
use crate::utils::{EngineError, EngineResult};

/// 今天的日期 (业务时区)
pub fn today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| EngineError::validation(format!("Invalid date format: {}", date)))
}

/// `anchor` 所在周的起止日期 (周一..周日, 双端含)
pub fn week_range(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = anchor.weekday().num_days_from_monday();
    let start = anchor - Duration::days(weekday as i64);
    (start, start + Duration::days(6))
}

/// `anchor` 所在月的起止日期 (双端含)
pub fn month_range(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = anchor.with_day(1).unwrap_or(anchor);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(anchor);
    (start, end)
}

/// 当前周范围 (业务时区)
pub fn current_week_range(tz: Tz) -> (NaiveDate, NaiveDate) {
    week_range(today(tz))
}

/// 当前月范围 (业务时区)
pub fn current_month_range(tz: Tz) -> (NaiveDate, NaiveDate) {
    month_range(today(tz))
}

/// 日期是否落在 [start, end] 内 (双端含, 忽略时刻)
pub fn is_in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

/// Human label for a filter period anchored at `anchor`
pub fn period_label(period: TimePeriod, anchor: NaiveDate) -> String {
    match period {
        TimePeriod::Daily => anchor.format("%Y-%m-%d").to_string(),
        TimePeriod::Weekly => {
            let (start, end) = week_range(anchor);
            format!(
                "{} to {}",
                start.format("%b %d"),
                end.format("%b %d, %Y")
            )
        }
        TimePeriod::Monthly => anchor.format("%B %Y").to_string(),
        TimePeriod::Total => "All Time".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_range_starts_monday() {
        // 2024-05-01 is a Wednesday
        let (start, end) = week_range(date(2024, 5, 1));
        assert_eq!(start, date(2024, 4, 29));
        assert_eq!(end, date(2024, 5, 5));
    }

    #[test]
    fn test_week_range_on_monday_is_identity_start() {
        let (start, end) = week_range(date(2024, 4, 29));
        assert_eq!(start, date(2024, 4, 29));
        assert_eq!(end, date(2024, 5, 5));
    }

    #[test]
    fn test_month_range_regular_month() {
        let (start, end) = month_range(date(2024, 5, 17));
        assert_eq!(start, date(2024, 5, 1));
        assert_eq!(end, date(2024, 5, 31));
    }

    #[test]
    fn test_month_range_leap_february() {
        let (start, end) = month_range(date(2024, 2, 10));
        assert_eq!(start, date(2024, 2, 1));
        assert_eq!(end, date(2024, 2, 29));
    }

    #[test]
    fn test_month_range_december_wraps_year() {
        let (start, end) = month_range(date(2024, 12, 25));
        assert_eq!(start, date(2024, 12, 1));
        assert_eq!(end, date(2024, 12, 31));
    }

    #[test]
    fn test_is_in_range_inclusive_both_ends() {
        let start = date(2024, 5, 1);
        let end = date(2024, 5, 7);
        assert!(is_in_range(start, start, end));
        assert!(is_in_range(end, start, end));
        assert!(is_in_range(date(2024, 5, 3), start, end));
        assert!(!is_in_range(date(2024, 4, 30), start, end));
        assert!(!is_in_range(date(2024, 5, 8), start, end));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-05-01").unwrap(), date(2024, 5, 1));
        assert!(parse_date("05/01/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_period_labels() {
        let anchor = date(2024, 5, 1);
        assert_eq!(period_label(TimePeriod::Daily, anchor), "2024-05-01");
        assert_eq!(
            period_label(TimePeriod::Weekly, anchor),
            "Apr 29 to May 05, 2024"
        );
        assert_eq!(period_label(TimePeriod::Monthly, anchor), "May 2024");
        assert_eq!(period_label(TimePeriod::Total, anchor), "All Time");
    }
}
