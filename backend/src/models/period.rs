//! Calendar periods and the arithmetic between frequencies.
//!
//! A [`Period`] is a calendar interval tagged with its [`Frequency`]. Every
//! period has a well-defined, calendar-ordered set of children at any finer
//! frequency and exactly one parent at any coarser frequency:
//!
//! ```text
//! 2020 ──┬── 2020Q1 ──┬── 2020M1 ── 2020-01-01 .. 2020-01-31
//!        │            ├── 2020M2
//!        │            └── 2020M3
//!        ├── 2020Q2
//!        ├── 2020Q3
//!        └── 2020Q4
//! ```
//!
//! Only the Gregorian calendar is modelled; quarters end in March, June,
//! September and December.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::frequency::Frequency;
use crate::error::{ConversionError, ConversionResult};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})$").unwrap());
static QUARTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-?[Qq]([1-4])$").unwrap());
static MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:[Mm]|-)(\d{1,2})$").unwrap());
static DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());

/// A calendar interval at a given frequency.
///
/// Periods of the same frequency order chronologically. Comparing periods of
/// different frequencies is well-defined but meaningless; tables never mix
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl Period {
    /// Calendar year.
    pub fn year(year: i32) -> Self {
        Period::Year(year)
    }

    /// Calendar quarter (`1..=4`).
    pub fn quarter(year: i32, quarter: u32) -> ConversionResult<Self> {
        if (1..=4).contains(&quarter) {
            Ok(Period::Quarter { year, quarter })
        } else {
            Err(ConversionError::MalformedIndex(format!(
                "quarter {} out of range 1..=4",
                quarter
            )))
        }
    }

    /// Calendar month (`1..=12`).
    pub fn month(year: i32, month: u32) -> ConversionResult<Self> {
        if (1..=12).contains(&month) {
            Ok(Period::Month { year, month })
        } else {
            Err(ConversionError::MalformedIndex(format!(
                "month {} out of range 1..=12",
                month
            )))
        }
    }

    /// Calendar day.
    pub fn day(year: i32, month: u32, day: u32) -> ConversionResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Period::Day)
            .ok_or_else(|| {
                ConversionError::MalformedIndex(format!(
                    "{:04}-{:02}-{:02} is not a calendar date",
                    year, month, day
                ))
            })
    }

    /// Frequency tag of this period.
    pub fn frequency(&self) -> Frequency {
        match self {
            Period::Day(_) => Frequency::Day,
            Period::Month { .. } => Frequency::Month,
            Period::Quarter { .. } => Frequency::Quarter,
            Period::Year(_) => Frequency::Year,
        }
    }

    /// Check the quarter or month number of a period built from a variant
    /// literal rather than through [`Period::quarter`] / [`Period::month`].
    pub fn validate(&self) -> ConversionResult<()> {
        match *self {
            Period::Quarter { year, quarter } => Period::quarter(year, quarter).map(|_| ()),
            Period::Month { year, month } => Period::month(year, month).map(|_| ()),
            Period::Day(_) | Period::Year(_) => Ok(()),
        }
    }

    /// First day of the period, `None` outside chrono's date range or for an
    /// invalid period.
    pub fn first_day(&self) -> Option<NaiveDate> {
        self.validate().ok()?;
        match *self {
            Period::Day(d) => Some(d),
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            Period::Quarter { year, quarter } => {
                NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
            }
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }

    /// Last day of the period, `None` outside chrono's date range.
    pub fn last_day(&self) -> Option<NaiveDate> {
        match self {
            Period::Day(d) => Some(*d),
            _ => self.succ()?.first_day()?.pred_opt(),
        }
    }

    /// The period immediately following this one at the same frequency.
    pub fn succ(&self) -> Option<Period> {
        match *self {
            Period::Day(d) => d.succ_opt().map(Period::Day),
            Period::Month { year, month } if month == 12 => Some(Period::Month {
                year: year.checked_add(1)?,
                month: 1,
            }),
            Period::Month { year, month } => Some(Period::Month {
                year,
                month: month + 1,
            }),
            Period::Quarter { year, quarter } if quarter == 4 => Some(Period::Quarter {
                year: year.checked_add(1)?,
                quarter: 1,
            }),
            Period::Quarter { year, quarter } => Some(Period::Quarter {
                year,
                quarter: quarter + 1,
            }),
            Period::Year(year) => year.checked_add(1).map(Period::Year),
        }
    }

    /// Exhaustive, calendar-ordered child periods at a strictly finer frequency.
    pub fn children_of(&self, target: Frequency) -> ConversionResult<Vec<Period>> {
        self.validate()?;
        let source = self.frequency();
        if !target.is_finer_than(source) {
            return Err(ConversionError::UnsupportedFrequencyPair {
                from: source,
                to: target,
                reason: "children require a strictly finer frequency",
            });
        }

        let children = match (*self, target) {
            (Period::Year(year), Frequency::Quarter) => {
                (1..=4).map(|quarter| Period::Quarter { year, quarter }).collect()
            }
            (Period::Year(year), Frequency::Month) => {
                (1..=12).map(|month| Period::Month { year, month }).collect()
            }
            (Period::Quarter { year, quarter }, Frequency::Month) => {
                let first = (quarter - 1) * 3 + 1;
                (first..first + 3)
                    .map(|month| Period::Month { year, month })
                    .collect()
            }
            (_, Frequency::Day) => self.days()?,
            // Every other finer pair has been handled above.
            _ => {
                return Err(ConversionError::UnsupportedFrequencyPair {
                    from: source,
                    to: target,
                    reason: "children require a strictly finer frequency",
                })
            }
        };
        Ok(children)
    }

    /// The unique enclosing period at a strictly coarser frequency.
    pub fn parent_of(&self, target: Frequency) -> ConversionResult<Period> {
        self.validate()?;
        let source = self.frequency();
        if !target.is_coarser_than(source) {
            return Err(ConversionError::UnsupportedFrequencyPair {
                from: source,
                to: target,
                reason: "parent requires a strictly coarser frequency",
            });
        }

        let (year, month) = match *self {
            Period::Day(d) => (d.year(), d.month()),
            Period::Month { year, month } => (year, month),
            Period::Quarter { year, quarter } => (year, (quarter - 1) * 3 + 1),
            Period::Year(year) => (year, 1),
        };

        Ok(match target {
            Frequency::Year => Period::Year(year),
            Frequency::Quarter => Period::Quarter {
                year,
                quarter: (month - 1) / 3 + 1,
            },
            Frequency::Month => Period::Month { year, month },
            Frequency::Day => {
                return Err(ConversionError::UnsupportedFrequencyPair {
                    from: source,
                    to: target,
                    reason: "parent requires a strictly coarser frequency",
                })
            }
        })
    }

    /// Number of children at `child` frequency; used for completeness checks.
    pub fn expected_children(&self, child: Frequency) -> ConversionResult<usize> {
        self.validate()?;
        match (*self, child) {
            (Period::Year(_), Frequency::Quarter) => Ok(4),
            (Period::Year(_), Frequency::Month) => Ok(12),
            (Period::Quarter { .. }, Frequency::Month) => Ok(3),
            _ => self.children_of(child).map(|c| c.len()),
        }
    }

    fn days(&self) -> ConversionResult<Vec<Period>> {
        let out_of_range = || {
            ConversionError::MalformedIndex(format!("{} is outside the supported calendar", self))
        };
        let first = self.first_day().ok_or_else(out_of_range)?;
        let last = self.last_day().ok_or_else(out_of_range)?;
        Ok(first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(Period::Day)
            .collect())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Period::Month { year, month } => write!(f, "{}M{}", year, month),
            Period::Quarter { year, quarter } => write!(f, "{}Q{}", year, quarter),
            Period::Year(year) => write!(f, "{}", year),
        }
    }
}

impl FromStr for Period {
    type Err = ConversionError;

    /// Accepts `2020`, `2020Q1`, `2020-Q1`, `2020M1`, `2020M01`, `2020-01`
    /// and `2020-01-15`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        let not_a_period =
            || ConversionError::MalformedIndex(format!("'{}' is not a period label", label));
        let field = |c: &regex::Captures, i: usize| -> ConversionResult<i64> {
            capture_number(c, i).ok_or_else(not_a_period)
        };

        if let Some(c) = YEAR_RE.captures(label) {
            return Ok(Period::Year(field(&c, 1)? as i32));
        }
        if let Some(c) = QUARTER_RE.captures(label) {
            return Period::quarter(field(&c, 1)? as i32, field(&c, 2)? as u32);
        }
        if let Some(c) = MONTH_RE.captures(label) {
            return Period::month(field(&c, 1)? as i32, field(&c, 2)? as u32);
        }
        if let Some(c) = DAY_RE.captures(label) {
            return Period::day(field(&c, 1)? as i32, field(&c, 2)? as u32, field(&c, 3)? as u32);
        }
        Err(not_a_period())
    }
}

fn capture_number(captures: &regex::Captures, index: usize) -> Option<i64> {
    captures.get(index)?.as_str().parse().ok()
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(label: &str) -> Period {
        label.parse().unwrap()
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(p("2020"), Period::Year(2020));
        assert_eq!(p("2020Q3"), Period::Quarter { year: 2020, quarter: 3 });
        assert_eq!(p("2020-q3"), Period::Quarter { year: 2020, quarter: 3 });
        assert_eq!(p("2020M1"), Period::Month { year: 2020, month: 1 });
        assert_eq!(p("2020M01"), Period::Month { year: 2020, month: 1 });
        assert_eq!(p("2020-11"), Period::Month { year: 2020, month: 11 });
        assert_eq!(p("2020-02-29"), Period::day(2020, 2, 29).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "20", "2020Q5", "2020M13", "2021-02-29", "Q1 2020", "abc"] {
            assert!(
                matches!(bad.parse::<Period>(), Err(ConversionError::MalformedIndex(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        for label in ["2020", "2020Q1", "2020M12", "2020-01-05"] {
            assert_eq!(p(label).to_string(), label);
        }
    }

    #[test]
    fn test_year_children() {
        let quarters = p("2020").children_of(Frequency::Quarter).unwrap();
        let labels: Vec<String> = quarters.iter().map(|q| q.to_string()).collect();
        assert_eq!(labels, ["2020Q1", "2020Q2", "2020Q3", "2020Q4"]);

        let months = p("2020").children_of(Frequency::Month).unwrap();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], p("2020M1"));
        assert_eq!(months[11], p("2020M12"));

        assert_eq!(p("2020").children_of(Frequency::Day).unwrap().len(), 366);
        assert_eq!(p("2021").children_of(Frequency::Day).unwrap().len(), 365);
    }

    #[test]
    fn test_quarter_children() {
        let months = p("2020Q2").children_of(Frequency::Month).unwrap();
        assert_eq!(months, vec![p("2020M4"), p("2020M5"), p("2020M6")]);

        let days = p("2021Q1").children_of(Frequency::Day).unwrap();
        assert_eq!(days.len(), 90);
        assert_eq!(days.first(), Some(&p("2021-01-01")));
        assert_eq!(days.last(), Some(&p("2021-03-31")));
    }

    #[test]
    fn test_children_require_finer_frequency() {
        for target in [Frequency::Quarter, Frequency::Year] {
            let err = p("2020Q1").children_of(target).unwrap_err();
            assert!(matches!(err, ConversionError::UnsupportedFrequencyPair { .. }));
        }
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(p("2020M5").parent_of(Frequency::Quarter).unwrap(), p("2020Q2"));
        assert_eq!(p("2020M12").parent_of(Frequency::Year).unwrap(), p("2020"));
        assert_eq!(p("2020Q4").parent_of(Frequency::Year).unwrap(), p("2020"));
        assert_eq!(p("2020-09-30").parent_of(Frequency::Quarter).unwrap(), p("2020Q3"));
        assert_eq!(p("2020-10-01").parent_of(Frequency::Month).unwrap(), p("2020M10"));
    }

    #[test]
    fn test_parent_requires_coarser_frequency() {
        let err = p("2020Q1").parent_of(Frequency::Quarter).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFrequencyPair { .. }));
        let err = p("2020").parent_of(Frequency::Month).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFrequencyPair { .. }));
    }

    #[test]
    fn test_parent_child_consistency() {
        for quarter in p("2019").children_of(Frequency::Quarter).unwrap() {
            assert_eq!(quarter.parent_of(Frequency::Year).unwrap(), p("2019"));
            for month in quarter.children_of(Frequency::Month).unwrap() {
                assert_eq!(month.parent_of(Frequency::Quarter).unwrap(), quarter);
            }
        }
    }

    #[test]
    fn test_expected_children() {
        assert_eq!(p("2020").expected_children(Frequency::Quarter).unwrap(), 4);
        assert_eq!(p("2020Q1").expected_children(Frequency::Month).unwrap(), 3);
        assert_eq!(p("2020M2").expected_children(Frequency::Day).unwrap(), 29);
        assert_eq!(p("2021M2").expected_children(Frequency::Day).unwrap(), 28);
    }

    #[test]
    fn test_succ_wraps_year() {
        assert_eq!(p("2020Q4").succ(), Some(p("2021Q1")));
        assert_eq!(p("2020M12").succ(), Some(p("2021M1")));
        assert_eq!(p("2020-12-31").succ(), Some(p("2021-01-01")));
        assert_eq!(p("2020M2").last_day(), NaiveDate::from_ymd_opt(2020, 2, 29));
    }

    #[test]
    fn test_out_of_range_literals_are_rejected() {
        let bad_quarter = Period::Quarter { year: 2020, quarter: 0 };
        let bad_month = Period::Month { year: 2020, month: 13 };

        assert!(matches!(bad_quarter.validate(), Err(ConversionError::MalformedIndex(_))));
        assert!(matches!(
            bad_quarter.children_of(Frequency::Month),
            Err(ConversionError::MalformedIndex(_))
        ));
        assert!(matches!(
            bad_quarter.children_of(Frequency::Day),
            Err(ConversionError::MalformedIndex(_))
        ));
        assert!(matches!(
            bad_month.parent_of(Frequency::Quarter),
            Err(ConversionError::MalformedIndex(_))
        ));
        assert!(bad_month.first_day().is_none());
        assert!(p("2020Q4").validate().is_ok());
    }

    #[test]
    fn test_serde_as_label() {
        let json = serde_json::to_string(&p("2020Q1")).unwrap();
        assert_eq!(json, "\"2020Q1\"");
        let back: Period = serde_json::from_str("\"2020M3\"").unwrap();
        assert_eq!(back, p("2020M3"));
    }
}
