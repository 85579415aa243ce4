//! Calendar month keys and date-range helpers.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month, stored as `(year, month)` so the derived ordering is chronological.
///
/// `Month` is the column key of the result table. It displays as `YYYY-MM`.
///
/// # Examples
///
/// ```
/// use geotemp::Month;
///
/// let july = Month::new(7, 2023);
/// assert_eq!(july.to_string(), "2023-07");
/// assert!(Month::new(12, 2022) < july);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date.year(), date.month())
    }

    /// Whether `date` falls inside this month.
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.0 && date.month() == self.1
    }

    /// Compact `YYYYMM` form, used to name downloaded archives and their extraction directories.
    pub fn compact(self) -> String {
        format!("{:04}{:02}", self.0, self.1)
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

/// Parses `YYYY-MM` or `YYYYMM`.
impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = match s.split_once('-') {
            Some((y, m)) => (y, m),
            None if s.len() == 6 => s.split_at(4),
            None => return Err(format!("'{}' is not a YYYY-MM month", s)),
        };
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range in '{}'", s));
        }
        Ok(Month(year, month))
    }
}

/// Groups the inclusive range `start..=end` into day-of-month lists per month.
///
/// Returns `None` when `start` is after `end`.
pub fn days_by_month(start: NaiveDate, end: NaiveDate) -> Option<BTreeMap<Month, Vec<u32>>> {
    if start > end {
        return None;
    }
    let mut grouped: BTreeMap<Month, Vec<u32>> = BTreeMap::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        grouped.entry(Month::of(date)).or_default().push(date.day());
    }
    Some(grouped)
}

/// Finds the first `YYYYMMDD` token in a grid file name.
///
/// Tokens are separated by `_`, `-` or `.`, e.g.
/// `Temperature-Air-2m-Mean-24h_C3S-glob-agric_AgERA5_20230701_final-v1.nc`.
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    name.split(['_', '-', '.'])
        .filter(|token| token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit()))
        .find_map(|token| NaiveDate::parse_from_str(token, "%Y%m%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_by_month_spans_year_boundary() {
        let grouped = days_by_month(date(2022, 12, 30), date(2023, 2, 2)).unwrap();
        let months: Vec<Month> = grouped.keys().copied().collect();
        assert_eq!(
            months,
            vec![Month(2022, 12), Month(2023, 1), Month(2023, 2)]
        );
        assert_eq!(grouped[&Month(2022, 12)], vec![30, 31]);
        assert_eq!(grouped[&Month(2023, 1)].len(), 31);
        assert_eq!(grouped[&Month(2023, 2)], vec![1, 2]);
    }

    #[test]
    fn test_days_by_month_single_day_and_reversed() {
        let grouped = days_by_month(date(2024, 2, 29), date(2024, 2, 29)).unwrap();
        assert_eq!(grouped[&Month(2024, 2)], vec![29]);
        assert!(days_by_month(date(2024, 3, 1), date(2024, 2, 1)).is_none());
    }

    #[test]
    fn test_month_parse_and_display() {
        assert_eq!("2023-07".parse::<Month>().unwrap(), Month(2023, 7));
        assert_eq!("202301".parse::<Month>().unwrap(), Month(2023, 1));
        assert!("2023-13".parse::<Month>().is_err());
        assert!("July".parse::<Month>().is_err());
        assert_eq!(Month(2023, 1).compact(), "202301");
    }

    #[test]
    fn test_date_from_agera5_file_name() {
        let name = "Temperature-Air-2m-Mean-24h_C3S-glob-agric_AgERA5_20230701_final-v1.nc";
        assert_eq!(date_from_file_name(name), Some(date(2023, 7, 1)));
        assert_eq!(date_from_file_name("no_date_here.nc"), None);
        // 8 digits that are not a valid date are skipped.
        assert_eq!(date_from_file_name("x_20231340_20230102.nc"), Some(date(2023, 1, 2)));
    }
}
