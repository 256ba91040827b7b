//! Solar Hijri (Jalali) calendar arithmetic.
//!
//! Dates are converted through a day count anchored at 1 Farvardin 979, which
//! falls on 20 March 1600 in the proleptic Gregorian calendar. Leap years
//! follow the 33-year arithmetic cycle.

use std::{fmt, str::FromStr};

use anyhow::{Context, bail, ensure};
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

const EPOCH_YEAR: i32 = 979;
/// Gregorian day-of-1600 on which the epoch year starts.
const EPOCH_OFFSET: i64 = 79;
const DAYS_PER_CYCLE: i64 = 12053;
const DAYS_PER_QUAD: i64 = 1461;

/// Years the calendar accepts from input and settings.
pub const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

const MONTH_NAMES: [&str; 12] = [
    "Farvardin",
    "Ordibehesht",
    "Khordad",
    "Tir",
    "Mordad",
    "Shahrivar",
    "Mehr",
    "Aban",
    "Azar",
    "Dey",
    "Bahman",
    "Esfand",
];

pub const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];
pub const WEEKDAYS_SHORT: [&str; 7] = ["S", "S", "M", "T", "W", "T", "F"];

pub fn is_leap_year(year: i32) -> bool {
    matches!(year.rem_euclid(33), 1 | 5 | 9 | 13 | 17 | 22 | 26 | 30)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1..=6 => 31,
        7..=11 => 30,
        _ if is_leap_year(year) => 30,
        _ => 29,
    }
}

/// English transliteration of the month name. `month` must be in 1..=12.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month.clamp(1, 12) - 1) as usize]
}

fn check_year(year: i32) -> anyhow::Result<()> {
    ensure!(
        YEARS.contains(&year),
        "Year must be between {} and {}, got {year}",
        YEARS.start(),
        YEARS.end()
    );
    Ok(())
}

fn gregorian_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1600, 1, 1).expect("1600-01-01 is a valid date")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    pub fn new(year: i32, month: u32, day: u32) -> anyhow::Result<Self> {
        check_year(year)?;
        ensure!(
            (1..=12).contains(&month),
            "Month must be between 1 and 12, got {month}"
        );
        let max = days_in_month(year, month);
        ensure!(
            (1..=max).contains(&day),
            "Day must be between 1 and {max} for {} {year}, got {day}",
            month_name(month)
        );
        Ok(Self { year, month, day })
    }

    pub fn today() -> Self {
        Self::from_gregorian(Local::now().date_naive())
    }

    /// Days elapsed since 1 Farvardin of the epoch year.
    fn day_number(&self) -> i64 {
        let jy = (self.year - EPOCH_YEAR) as i64;
        let mut days = 365 * jy + 8 * jy.div_euclid(33) + (jy.rem_euclid(33) + 3) / 4;
        days += (1..self.month)
            .map(|m| days_in_month(self.year, m) as i64)
            .sum::<i64>();
        days + self.day as i64 - 1
    }

    fn from_day_number(days: i64) -> Self {
        let cycles = days.div_euclid(DAYS_PER_CYCLE);
        let mut rest = days.rem_euclid(DAYS_PER_CYCLE);
        let mut year = EPOCH_YEAR as i64 + 33 * cycles + 4 * (rest / DAYS_PER_QUAD);
        rest %= DAYS_PER_QUAD;
        if rest >= 366 {
            year += (rest - 1) / 365;
            rest = (rest - 1) % 365;
        }
        let year = year as i32;

        let mut month = 1;
        while month < 12 {
            let len = days_in_month(year, month) as i64;
            if rest < len {
                break;
            }
            rest -= len;
            month += 1;
        }
        Self {
            year,
            month,
            day: rest as u32 + 1,
        }
    }

    /// Saturates at chrono's date range for years far outside [`YEARS`].
    pub fn to_gregorian(&self) -> NaiveDate {
        let offset = self.day_number() + EPOCH_OFFSET;
        let epoch = gregorian_epoch();
        if offset >= 0 {
            epoch
                .checked_add_days(Days::new(offset as u64))
                .unwrap_or(NaiveDate::MAX)
        } else {
            epoch
                .checked_sub_days(Days::new(offset.unsigned_abs()))
                .unwrap_or(NaiveDate::MIN)
        }
    }

    pub fn from_gregorian(date: NaiveDate) -> Self {
        let days = date.signed_duration_since(gregorian_epoch()).num_days();
        Self::from_day_number(days - EPOCH_OFFSET)
    }

    /// Column in a Saturday-first week (Saturday = 0, Friday = 6).
    pub fn weekday_column(&self) -> usize {
        (self.to_gregorian().weekday().num_days_from_monday() as usize + 2) % 7
    }

    /// Storage key, `Y-M-D` without padding.
    pub fn to_key(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.day, self.month, self.year)
    }
}

impl FromStr for JalaliDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Leading '-' belongs to the year.
        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let parts: Vec<&str> = body.split('-').collect();
        let [year, month, day] = parts.as_slice() else {
            bail!("Expected a Y-M-D date key, got {s:?}");
        };
        let year: i32 = year
            .trim()
            .parse()
            .with_context(|| format!("Invalid year in date key {s:?}"))?;
        let month = month
            .trim()
            .parse()
            .with_context(|| format!("Invalid month in date key {s:?}"))?;
        let day = day
            .trim()
            .parse()
            .with_context(|| format!("Invalid day in date key {s:?}"))?;
        Self::new(sign * year, month, day)
    }
}

impl Serialize for JalaliDate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_key())
    }
}

impl<'de> Deserialize<'de> for JalaliDate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// The month currently shown by the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> anyhow::Result<Self> {
        check_year(year)?;
        ensure!((1..=12).contains(&month), "Month must be between 1 and 12.");
        Ok(Self { year, month })
    }

    pub fn parse(year: &str, month: &str) -> anyhow::Result<Self> {
        let year = year
            .trim()
            .parse()
            .with_context(|| format!("{year:?} is not a valid year"))?;
        let month = month
            .trim()
            .parse()
            .with_context(|| format!("{month:?} is not a valid month"))?;
        Self::new(year, month)
    }

    /// Moves by `delta` months, stopping at the ends of [`YEARS`].
    pub fn shift(&self, delta: i32) -> Self {
        let first = *YEARS.start() as i64 * 12;
        let last = *YEARS.end() as i64 * 12 + 11;
        let index = (self.year as i64 * 12 + self.month as i64 - 1 + delta as i64)
            .clamp(first, last);
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn first_day(&self) -> JalaliDate {
        JalaliDate {
            year: self.year,
            month: self.month,
            day: 1,
        }
    }

    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    /// Lays the month out on a Saturday-first grid.
    pub fn grid(&self) -> Vec<GridCell> {
        let offset = self.first_day().weekday_column();
        let first_gregorian = self.first_day().to_gregorian();
        (1..=self.days())
            .map(|day| {
                let pos = offset + day as usize - 1;
                GridCell {
                    date: JalaliDate {
                        year: self.year,
                        month: self.month,
                        day,
                    },
                    gregorian: first_gregorian
                        .checked_add_days(Days::new(day as u64 - 1))
                        .unwrap_or(NaiveDate::MAX),
                    row: pos / 7,
                    column: pos % 7,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub date: JalaliDate,
    pub gregorian: NaiveDate,
    pub row: usize,
    pub column: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn j(y: i32, m: u32, d: u32) -> JalaliDate {
        JalaliDate::new(y, m, d).unwrap()
    }

    #[test]
    fn leap_years_follow_the_33_year_cycle() {
        let leaps: Vec<i32> = (1395..=1412).filter(|&y| is_leap_year(y)).collect();
        assert_eq!(leaps, vec![1395, 1399, 1403, 1408, 1412]);
        assert!(!is_leap_year(1402));
    }

    #[test]
    fn esfand_length_depends_on_leap_year() {
        assert_eq!(days_in_month(1403, 12), 30);
        assert_eq!(days_in_month(1402, 12), 29);
        assert_eq!(days_in_month(1402, 6), 31);
        assert_eq!(days_in_month(1402, 7), 30);
    }

    #[test]
    fn known_nowruz_dates() {
        assert_eq!(j(1403, 1, 1).to_gregorian(), g(2024, 3, 20));
        assert_eq!(j(1402, 1, 1).to_gregorian(), g(2023, 3, 21));
        assert_eq!(j(1400, 1, 1).to_gregorian(), g(2021, 3, 21));
        assert_eq!(j(979, 1, 1).to_gregorian(), g(1600, 3, 20));
    }

    #[test]
    fn converts_from_gregorian() {
        assert_eq!(JalaliDate::from_gregorian(g(2024, 3, 19)), j(1402, 12, 29));
        assert_eq!(JalaliDate::from_gregorian(g(2025, 3, 20)), j(1403, 12, 30));
        assert_eq!(JalaliDate::from_gregorian(g(2025, 3, 21)), j(1404, 1, 1));
        assert_eq!(JalaliDate::from_gregorian(g(1979, 2, 11)), j(1357, 11, 22));
    }

    #[test]
    fn conversion_is_inverse_over_a_long_range() {
        let mut date = g(1900, 1, 1);
        let end = g(2100, 12, 31);
        let mut previous: Option<JalaliDate> = None;
        while date <= end {
            let jalali = JalaliDate::from_gregorian(date);
            assert!(JalaliDate::new(jalali.year, jalali.month, jalali.day).is_ok());
            assert_eq!(jalali.to_gregorian(), date, "round trip of {date}");
            if let Some(prev) = previous {
                assert!(prev < jalali);
            }
            previous = Some(jalali);
            date = date + Days::new(1);
        }
    }

    #[test]
    fn weekday_column_is_saturday_first() {
        // 1 Farvardin 1403 was a Wednesday.
        assert_eq!(j(1403, 1, 1).weekday_column(), 4);
        // 4 Farvardin 1403 was a Saturday.
        assert_eq!(j(1403, 1, 4).weekday_column(), 0);
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(JalaliDate::new(1402, 12, 30).is_err());
        assert!(JalaliDate::new(1402, 13, 1).is_err());
        assert!(JalaliDate::new(1402, 7, 31).is_err());
        assert!(JalaliDate::new(1402, 1, 0).is_err());
    }

    #[test]
    fn date_keys_are_unpadded() {
        let date = j(1403, 1, 5);
        assert_eq!(date.to_key(), "1403-1-5");
        assert_eq!("1403-1-5".parse::<JalaliDate>().unwrap(), date);
        assert_eq!("1403-01-05".parse::<JalaliDate>().unwrap(), date);
        assert!("1403-1".parse::<JalaliDate>().is_err());
        assert!("1403-x-5".parse::<JalaliDate>().is_err());
        assert!("1402-12-30".parse::<JalaliDate>().is_err());
        assert_eq!(date.to_string(), "5/1/1403");
    }

    #[test]
    fn shifting_wraps_years() {
        let ym = YearMonth::new(1403, 1).unwrap();
        assert_eq!(ym.shift(-1), YearMonth::new(1402, 12).unwrap());
        assert_eq!(ym.shift(12), YearMonth::new(1404, 1).unwrap());
        assert_eq!(
            YearMonth::new(1403, 12).unwrap().shift(1),
            YearMonth::new(1404, 1).unwrap()
        );
        assert_eq!(ym.shift(-25), YearMonth::new(1400, 12).unwrap());
    }

    #[test]
    fn years_outside_the_range_are_rejected() {
        assert!(YearMonth::parse("300000", "1").is_err());
        assert!(YearMonth::parse("0", "1").is_err());
        assert!(YearMonth::parse("-5", "1").is_err());
        assert!(YearMonth::new(9999, 12).is_ok());
        assert!(JalaliDate::new(10000, 1, 1).is_err());
        assert!("300000-1-1".parse::<JalaliDate>().is_err());
        assert_eq!(YearMonth::new(9999, 12).unwrap().grid().len(), 29);
    }

    #[test]
    fn shifting_stops_at_the_year_limits() {
        let last = YearMonth::new(9999, 12).unwrap();
        assert_eq!(last.shift(1), last);
        assert_eq!(last.shift(i32::MAX), last);
        let first = YearMonth::new(1, 1).unwrap();
        assert_eq!(first.shift(-1), first);
        assert_eq!(first.shift(i32::MIN), first);
    }

    #[test]
    fn far_dates_saturate_instead_of_panicking() {
        let far = JalaliDate {
            year: 300_000,
            month: 1,
            day: 1,
        };
        assert_eq!(far.to_gregorian(), NaiveDate::MAX);
        let early = JalaliDate {
            year: -300_000,
            month: 1,
            day: 1,
        };
        assert_eq!(early.to_gregorian(), NaiveDate::MIN);
    }

    #[test]
    fn parses_toolbar_input() {
        assert_eq!(
            YearMonth::parse(" 1403 ", "7").unwrap(),
            YearMonth::new(1403, 7).unwrap()
        );
        assert!(YearMonth::parse("1403", "13").is_err());
        assert!(YearMonth::parse("abc", "1").is_err());
        assert!(YearMonth::parse("1403", "").is_err());
    }

    #[test]
    fn month_grid_starts_at_first_weekday() {
        let ym = YearMonth::new(1403, 1).unwrap();
        let grid = ym.grid();
        assert_eq!(grid.len(), 31);
        assert_eq!((grid[0].row, grid[0].column), (0, 4));
        assert_eq!(grid[0].gregorian, g(2024, 3, 20));
        // Day 4 is the first Saturday and wraps onto the next row.
        assert_eq!((grid[3].row, grid[3].column), (1, 0));
        assert_eq!(grid[30].gregorian, g(2024, 4, 19));
        assert_eq!(ym.title(), "Farvardin 1403");
    }
}
