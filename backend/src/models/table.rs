//! Period-indexed table of numeric series.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;

use super::frequency::Frequency;
use super::period::Period;
use crate::error::{ConversionError, ConversionResult};

/// A single cell: `None` is a missing observation.
pub type Cell = Option<f64>;

/// Table whose rows are keyed by [`Period`] and whose columns are named
/// numeric series ("sectors").
///
/// Invariants (checked on every insertion):
/// - every row period has the table's frequency;
/// - every row holds exactly one cell per column;
/// - periods are unique and rows iterate in calendar order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct PeriodTable {
    frequency: Frequency,
    columns: Vec<String>,
    rows: BTreeMap<Period, Vec<Cell>>,
}

impl PeriodTable {
    /// Create an empty table.
    pub fn new(frequency: Frequency, columns: Vec<String>) -> ConversionResult<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if column.trim().is_empty() {
                return Err(ConversionError::MalformedIndex(
                    "column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(ConversionError::MalformedIndex(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
        }
        Ok(Self {
            frequency,
            columns,
            rows: BTreeMap::new(),
        })
    }

    /// Build a table from rows; the frequency is taken from the first row.
    pub fn from_rows<I>(columns: Vec<String>, rows: I) -> ConversionResult<Self>
    where
        I: IntoIterator<Item = (Period, Vec<Cell>)>,
    {
        let mut rows = rows.into_iter().peekable();
        let frequency = rows
            .peek()
            .map(|(period, _)| period.frequency())
            .ok_or_else(|| {
                ConversionError::MalformedIndex(
                    "cannot infer the frequency of a table without rows".to_string(),
                )
            })?;

        let mut table = Self::new(frequency, columns)?;
        for (period, values) in rows {
            table.insert(period, values)?;
        }
        Ok(table)
    }

    /// Insert a row, enforcing the table invariants.
    pub fn insert(&mut self, period: Period, values: Vec<Cell>) -> ConversionResult<()> {
        period.validate()?;
        if period.frequency() != self.frequency {
            return Err(ConversionError::MalformedIndex(format!(
                "period {} has frequency {}, table has {}",
                period,
                period.frequency(),
                self.frequency
            )));
        }
        if values.len() != self.columns.len() {
            return Err(ConversionError::ColumnMismatch {
                period,
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        if self.rows.contains_key(&period) {
            return Err(ConversionError::MalformedIndex(format!(
                "duplicate period {}",
                period
            )));
        }

        let values = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        self.rows.insert(period, values);
        Ok(())
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in calendar order.
    pub fn rows(&self) -> impl Iterator<Item = (&Period, &[Cell])> {
        self.rows.iter().map(|(p, v)| (p, v.as_slice()))
    }

    /// Periods in calendar order.
    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.rows.keys()
    }

    pub fn get(&self, period: &Period) -> Option<&[Cell]> {
        self.rows.get(period).map(|v| v.as_slice())
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// One column as `(period, cell)` pairs in calendar order.
    pub fn column(&self, name: &str) -> Option<Vec<(Period, Cell)>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|(p, v)| (*p, v[idx])).collect())
    }

    /// Single cell lookup.
    pub fn value(&self, period: &Period, column: &str) -> Option<Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(period).map(|v| v[idx])
    }

    /// Total count of missing cells.
    pub fn missing_count(&self) -> usize {
        self.rows
            .values()
            .flat_map(|v| v.iter())
            .filter(|c| c.is_none())
            .count()
    }

    /// First and last period, if any.
    pub fn span(&self) -> Option<(Period, Period)> {
        let first = self.rows.keys().next()?;
        let last = self.rows.keys().next_back()?;
        Some((*first, *last))
    }
}

// =============================================================================
// Serde representation
// =============================================================================

/// Wire form: `{ "frequency": "Q", "columns": [...], "rows": [{ "period", "values" }] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTable {
    frequency: Frequency,
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRow {
    period: Period,
    values: Vec<Cell>,
}

impl TryFrom<RawTable> for PeriodTable {
    type Error = ConversionError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let mut table = PeriodTable::new(raw.frequency, raw.columns)?;
        for row in raw.rows {
            table.insert(row.period, row.values)?;
        }
        Ok(table)
    }
}

impl From<PeriodTable> for RawTable {
    fn from(table: PeriodTable) -> Self {
        RawTable {
            frequency: table.frequency,
            columns: table.columns,
            rows: table
                .rows
                .into_iter()
                .map(|(period, values)| RawRow { period, values })
                .collect(),
        }
    }
}
