use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, Utc};

use crate::models::{Invoice, Period};

/// Millisecond timestamp id, bumped until it doesn't collide with `existing`.
pub fn timestamp_id(existing: &[Invoice]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while existing.iter().any(|inv| inv.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn parse_decimal(value: &str) -> Result<f64> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| anyhow!("Parse decimal: {}", e))
}

pub fn normalize_date(value: Option<String>) -> Option<String> {
    let raw = value?.trim().to_string();
    if raw.is_empty() {
        return None;
    }

    let formats = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d", "%Y.%m.%d"];
    for fmt in formats.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(&raw, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    Some(raw)
}

pub fn days_in_month(period: Period) -> u32 {
    let first = NaiveDate::from_ymd_opt(period.year, period.month, 1);
    let next = if period.month == 12 {
        period
            .year
            .checked_add(1)
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(period.year, period.month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 31,
    }
}

/// ISO date for `day` within `period`, clamping the day into the month.
pub fn period_date(period: Period, day: u32) -> String {
    let day = day.clamp(1, days_in_month(period));
    NaiveDate::from_ymd_opt(period.year, period.month, day)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{}-{:02}-{:02}", period.year, period.month, day))
}

pub fn date_in_period(date: &str, period: Period) -> bool {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.year() == period.year && d.month() == period.month)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(Period::new(2024, 2)), 29);
        assert_eq!(days_in_month(Period::new(2025, 2)), 28);
        assert_eq!(days_in_month(Period::new(2025, 12)), 31);
    }

    #[test]
    fn out_of_range_years_do_not_overflow() {
        assert_eq!(days_in_month(Period::new(i32::MAX, 12)), 31);
        assert_eq!(period_date(Period::new(i32::MAX, 12), 15), format!("{}-12-15", i32::MAX));
    }

    #[test]
    fn period_date_clamps_day() {
        assert_eq!(period_date(Period::new(2025, 4), 31), "2025-04-30");
        assert_eq!(period_date(Period::new(2025, 4), 0), "2025-04-01");
    }

    #[test]
    fn normalize_date_accepts_portuguese_format() {
        assert_eq!(normalize_date(Some("03/02/2025".into())).as_deref(), Some("2025-02-03"));
        assert_eq!(normalize_date(Some("  ".into())), None);
    }

    #[test]
    fn parse_decimal_accepts_comma() {
        assert_eq!(parse_decimal("12,50").unwrap(), 12.5);
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn timestamp_id_avoids_collisions() {
        let first = timestamp_id(&[]);
        let taken = Invoice {
            id: first.clone(),
            number: "A1".into(),
            atcud: "B1".into(),
            nif: String::new(),
            date: "2025-01-01".into(),
            amount: 1.0,
        };
        let second = timestamp_id(&[taken]);
        assert_ne!(first, second);
    }
}
