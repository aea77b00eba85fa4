use crate::domain::model::{Granularity, PeriodRange};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

/// 無法解析日期時使用的分組鍵
pub const UNKNOWN_PERIOD: &str = "unknown";

/// 解析 `YYYY-MM-DD`、RFC 3339 或 `YYYY-MM-DDTHH:MM:SS`
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(parsed);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.date_naive());
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// 產生期間鍵。日期無效時回傳 [`UNKNOWN_PERIOD`]，整批彙總不會因單筆壞資料而失敗
pub fn period_key(date: &str, granularity: Granularity) -> String {
    match parse_date(date) {
        Some(parsed) => period_key_for(parsed, granularity),
        None => {
            tracing::warn!(
                "Invalid date '{}', grouping under '{}'",
                date,
                UNKNOWN_PERIOD
            );
            UNKNOWN_PERIOD.to_string()
        }
    }
}

/// 月份一律補零，鍵值的字串排序才會等於時間排序
pub fn period_key_for(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        // 月內第幾週 (ceil(day / 7))，不是 ISO 週；29-31 日為第 5 週
        Granularity::Weekly => format!(
            "{:04}-{:02}-W{}",
            date.year(),
            date.month(),
            week_of_month(date)
        ),
        Granularity::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        Granularity::Quarterly => format!("{:04}-Q{}", date.year(), quarter_of(date)),
        Granularity::Yearly => format!("{:04}", date.year()),
    }
}

fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() + 6) / 7
}

fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() + 2) / 3
}

/// 期間的起訖日期，只用於比較視窗
pub fn period_range(date: &str, granularity: Granularity) -> Option<PeriodRange> {
    parse_date(date).and_then(|parsed| period_range_for(parsed, granularity))
}

pub fn period_range_for(date: NaiveDate, granularity: Granularity) -> Option<PeriodRange> {
    let year = date.year();
    match granularity {
        Granularity::Weekly => {
            // 週從星期日開始
            let offset = date.weekday().num_days_from_sunday() as u64;
            let start = date.checked_sub_days(Days::new(offset))?;
            let end = start.checked_add_days(Days::new(6))?;
            Some(PeriodRange { start, end })
        }
        Granularity::Monthly => Some(PeriodRange {
            start: NaiveDate::from_ymd_opt(year, date.month(), 1)?,
            end: last_day_of_month(year, date.month())?,
        }),
        Granularity::Quarterly => {
            let first_month = (quarter_of(date) - 1) * 3 + 1;
            Some(PeriodRange {
                start: NaiveDate::from_ymd_opt(year, first_month, 1)?,
                end: last_day_of_month(year, first_month + 2)?,
            })
        }
        Granularity::Yearly => Some(PeriodRange {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        }),
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
