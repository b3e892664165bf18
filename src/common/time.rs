// src/common/time.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::common::error::AppError;
use crate::models::movement::DateRange;

// Ponta de um intervalo de datas vindo da query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Aceita RFC 3339 ("2026-10-16T08:30:00Z") ou só a data ("2026-10-16").
/// Uma data pura como limite final cobre o dia inteiro.
pub fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(raw.to_string()))?;

    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| AppError::InvalidDate(raw.to_string()))?,
    };
    Ok(date.and_time(time).and_utc())
}

pub fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange, AppError> {
    let from = from.map(|raw| parse_bound(raw, Bound::Start)).transpose()?;
    let to = to.map(|raw| parse_bound(raw, Bound::End)).transpose()?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::InvalidDateRange);
        }
    }
    Ok(DateRange { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_dates_cover_the_whole_day() {
        let range = parse_range(Some("2026-10-01"), Some("2026-10-01")).unwrap();
        let late = DateTime::parse_from_rfc3339("2026-10-01T23:59:59.5Z").unwrap().with_timezone(&Utc);
        assert!(range.contains(late));
        assert_eq!(range.from.unwrap().to_rfc3339(), "2026-10-01T00:00:00+00:00");
    }

    #[test]
    fn timestamps_are_taken_as_given() {
        let start = parse_bound("2026-10-16T08:30:00-03:00", Bound::Start).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-10-16T11:30:00+00:00");
    }

    #[test]
    fn garbage_and_inverted_ranges_are_rejected() {
        assert!(matches!(parse_bound("yesterday", Bound::Start), Err(AppError::InvalidDate(_))));
        assert!(matches!(
            parse_range(Some("2026-10-02"), Some("2026-10-01")),
            Err(AppError::InvalidDateRange)
        ));
        assert_eq!(parse_range(None, None).unwrap(), DateRange::default());
    }
}
