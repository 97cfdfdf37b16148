//! Group-and-reduce aggregation from fine periods to their parent period.
//!
//! # Architecture
//!
//! ```text
//! Input (monthly)              Groups (quarterly)         Output
//! ┌────────┬─────┐            ┌────────┬───────────┐     ┌────────┬─────┐
//! │ 2020M1 │ 1.0 │            │ 2020Q1 │ 1.0, 2.0, │     │ 2020Q1 │ 6.0 │
//! │ 2020M2 │ 2.0 │     →      │        │ 3.0       │  →  │ 2020Q2 │  ?  │
//! │ 2020M3 │ 3.0 │            ├────────┼───────────┤     └────────┴─────┘
//! │ 2020M4 │ 4.0 │            │ 2020Q2 │ 4.0       │
//! └────────┴─────┘            └────────┴───────────┘
//! ```
//!
//! # Completeness
//!
//! Completeness is decided per (group, column) cell: a cell is complete
//! when the group holds every child period the calendar expects and the
//! column has no missing value among them. A group is complete when all
//! of its cells are.
//!
//! - `ignore_incomplete = true`: incomplete cells come out missing, and a
//!   group with no complete cell emits no row.
//! - `ignore_incomplete = false`: every group is reduced over its present
//!   values and each incomplete group is reported in
//!   [`Aggregation::incomplete`].

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{ConversionError, ConversionResult};
use crate::models::{AggregationMethod, Cell, Frequency, Period, PeriodTable};

/// Result of an aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    /// Aggregated table at the target frequency.
    pub table: PeriodTable,
    /// Groups reduced despite being incomplete, in calendar order.
    /// Always empty when incomplete groups are ignored.
    pub incomplete: Vec<IncompleteGroup>,
}

impl Aggregation {
    /// True if any incomplete group was reduced.
    pub fn has_warnings(&self) -> bool {
        !self.incomplete.is_empty()
    }

    /// Parent periods of the incomplete groups.
    pub fn incomplete_periods(&self) -> Vec<Period> {
        self.incomplete.iter().map(|g| g.period).collect()
    }
}

/// Diagnostic for a group reduced with gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncompleteGroup {
    /// Parent period of the group.
    pub period: Period,
    /// Child rows present in the input.
    pub rows_present: usize,
    /// Child rows the calendar expects.
    pub rows_expected: usize,
    /// Missing cells among the present rows, across all columns.
    pub missing_values: usize,
}

/// Rows sharing a parent period.
struct AggregationGroup<'a> {
    rows: Vec<&'a [Cell]>,
    expected: usize,
}

impl<'a> AggregationGroup<'a> {
    fn is_full(&self) -> bool {
        self.rows.len() == self.expected
    }

    fn column_is_complete(&self, column: usize) -> bool {
        self.is_full() && self.rows.iter().all(|row| row[column].is_some())
    }

    fn missing_values(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.is_none())
            .count()
    }

    fn reduce_column(&self, column: usize, method: AggregationMethod) -> Cell {
        method.reduce(self.rows.iter().filter_map(|row| row[column]))
    }
}

/// Aggregate `table` to the strictly coarser `target` frequency.
///
/// Rows are grouped by their parent period and each column is reduced with
/// `method`. With `ignore_incomplete = true`, completeness is judged per
/// column: a column missing a child row or a value in a group comes out as
/// `None` for that group, the other columns keep their reduced values, and
/// the group emits no row only when every column is incomplete. With
/// `ignore_incomplete = false`, every group is reduced over its present
/// values and each incomplete one is listed in [`Aggregation::incomplete`].
pub fn aggregate(
    table: &PeriodTable,
    target: Frequency,
    method: AggregationMethod,
    ignore_incomplete: bool,
) -> ConversionResult<Aggregation> {
    let source = table.frequency();
    if !target.is_coarser_than(source) {
        return Err(ConversionError::UnsupportedFrequencyPair {
            from: source,
            to: target,
            reason: "target frequency must be strictly coarser than the table's",
        });
    }

    let groups = group_by_parent(table, target)?;
    let width = table.columns().len();

    let mut result = PeriodTable::new(target, table.columns().to_vec())?;
    let mut incomplete = Vec::new();

    for (parent, group) in &groups {
        let complete: Vec<bool> = (0..width).map(|c| group.column_is_complete(c)).collect();
        let all_complete = complete.iter().all(|c| *c);

        let values: Vec<Cell> = if ignore_incomplete {
            if !all_complete && !complete.iter().any(|c| *c) {
                continue;
            }
            (0..width)
                .map(|c| {
                    if complete[c] {
                        group.reduce_column(c, method)
                    } else {
                        None
                    }
                })
                .collect()
        } else {
            if !all_complete {
                incomplete.push(IncompleteGroup {
                    period: *parent,
                    rows_present: group.rows.len(),
                    rows_expected: group.expected,
                    missing_values: group.missing_values(),
                });
            }
            (0..width).map(|c| group.reduce_column(c, method)).collect()
        };

        result.insert(*parent, values)?;
    }

    Ok(Aggregation {
        table: result,
        incomplete,
    })
}

fn group_by_parent(
    table: &PeriodTable,
    target: Frequency,
) -> ConversionResult<BTreeMap<Period, AggregationGroup<'_>>> {
    let source = table.frequency();
    let mut groups: BTreeMap<Period, AggregationGroup<'_>> = BTreeMap::new();

    for (period, values) in table.rows() {
        let parent = period.parent_of(target)?;
        if let Some(group) = groups.get_mut(&parent) {
            group.rows.push(values);
        } else {
            groups.insert(
                parent,
                AggregationGroup {
                    rows: vec![values],
                    expected: parent.expected_children(source)?,
                },
            );
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::disaggregate::disaggregate;

    fn p(label: &str) -> Period {
        label.parse().unwrap()
    }

    fn table(columns: &[&str], rows: &[(&str, Vec<Cell>)]) -> PeriodTable {
        PeriodTable::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter().map(|(l, v)| (p(l), v.clone())),
        )
        .unwrap()
    }

    fn monthly_with_gap() -> PeriodTable {
        table(
            &["value"],
            &[
                ("2020M1", vec![Some(1.0)]),
                ("2020M2", vec![None]),
                ("2020M3", vec![Some(3.0)]),
                ("2020M4", vec![Some(4.0)]),
                ("2020M5", vec![Some(5.0)]),
                ("2020M6", vec![Some(6.0)]),
            ],
        )
    }

    #[test]
    fn test_sum_months_to_quarters() {
        let input = table(
            &["value"],
            &[
                ("2020M1", vec![Some(1.0)]),
                ("2020M2", vec![Some(2.0)]),
                ("2020M3", vec![Some(3.0)]),
                ("2020M4", vec![Some(4.0)]),
                ("2020M5", vec![Some(5.0)]),
                ("2020M6", vec![Some(6.0)]),
            ],
        );
        let out = aggregate(&input, Frequency::Quarter, AggregationMethod::Sum, true).unwrap();

        assert_eq!(out.table.len(), 2);
        assert_eq!(out.table.value(&p("2020Q1"), "value"), Some(Some(6.0)));
        assert_eq!(out.table.value(&p("2020Q2"), "value"), Some(Some(15.0)));
        assert!(!out.has_warnings());
    }

    #[test]
    fn test_mean_quarters_to_year() {
        let input = table(
            &["value"],
            &[
                ("2021Q1", vec![Some(1.0)]),
                ("2021Q2", vec![Some(2.0)]),
                ("2021Q3", vec![Some(3.0)]),
                ("2021Q4", vec![Some(6.0)]),
            ],
        );
        let out = aggregate(&input, Frequency::Year, AggregationMethod::Mean, true).unwrap();
        assert_eq!(out.table.value(&p("2021"), "value"), Some(Some(3.0)));
    }

    #[test]
    fn test_ignore_incomplete_drops_group_with_missing_value() {
        let out =
            aggregate(&monthly_with_gap(), Frequency::Quarter, AggregationMethod::Sum, true)
                .unwrap();

        let periods: Vec<String> = out.table.periods().map(|p| p.to_string()).collect();
        assert_eq!(periods, ["2020Q2"]);
        assert!(out.incomplete.is_empty());
    }

    #[test]
    fn test_keep_incomplete_reduces_present_values_and_warns() {
        let out =
            aggregate(&monthly_with_gap(), Frequency::Quarter, AggregationMethod::Sum, false)
                .unwrap();

        assert_eq!(out.table.value(&p("2020Q1"), "value"), Some(Some(4.0)));
        assert_eq!(out.table.value(&p("2020Q2"), "value"), Some(Some(15.0)));
        assert_eq!(out.incomplete_periods(), vec![p("2020Q1")]);
        assert_eq!(
            out.incomplete[0],
            IncompleteGroup {
                period: p("2020Q1"),
                rows_present: 3,
                rows_expected: 3,
                missing_values: 1,
            }
        );
    }

    #[test]
    fn test_mean_denominator_counts_present_values() {
        let out =
            aggregate(&monthly_with_gap(), Frequency::Quarter, AggregationMethod::Mean, false)
                .unwrap();
        assert_eq!(out.table.value(&p("2020Q1"), "value"), Some(Some(2.0)));
    }

    #[test]
    fn test_short_group_is_incomplete() {
        let input = table(
            &["value"],
            &[
                ("2020M2", vec![Some(2.0)]),
                ("2020M3", vec![Some(3.0)]),
                ("2020M4", vec![Some(4.0)]),
                ("2020M5", vec![Some(5.0)]),
                ("2020M6", vec![Some(6.0)]),
            ],
        );

        let dropped = aggregate(&input, Frequency::Quarter, AggregationMethod::Sum, true).unwrap();
        assert_eq!(dropped.table.periods().copied().collect::<Vec<_>>(), vec![p("2020Q2")]);

        let kept = aggregate(&input, Frequency::Quarter, AggregationMethod::Sum, false).unwrap();
        assert_eq!(kept.table.value(&p("2020Q1"), "value"), Some(Some(5.0)));
        assert_eq!(kept.incomplete[0].rows_present, 2);
        assert_eq!(kept.incomplete[0].rows_expected, 3);
        assert_eq!(kept.incomplete[0].missing_values, 0);
    }

    #[test]
    fn test_all_missing_group_reduces_to_missing() {
        let input = table(
            &["value"],
            &[
                ("2020M1", vec![None]),
                ("2020M2", vec![None]),
                ("2020M3", vec![None]),
            ],
        );
        let out = aggregate(&input, Frequency::Quarter, AggregationMethod::Sum, false).unwrap();
        assert_eq!(out.table.value(&p("2020Q1"), "value"), Some(None));
        assert!(out.has_warnings());
    }

    #[test]
    fn test_columns_do_not_interfere() {
        let input = table(
            &["a", "b"],
            &[
                ("2020Q1", vec![Some(1.0), Some(10.0)]),
                ("2020Q2", vec![None, Some(10.0)]),
                ("2020Q3", vec![Some(1.0), Some(10.0)]),
                ("2020Q4", vec![Some(1.0), Some(10.0)]),
            ],
        );
        let out = aggregate(&input, Frequency::Year, AggregationMethod::Sum, true).unwrap();

        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.value(&p("2020"), "a"), Some(None));
        assert_eq!(out.table.value(&p("2020"), "b"), Some(Some(40.0)));
    }

    #[test]
    fn test_days_to_month_uses_calendar_length() {
        let mut input = PeriodTable::new(Frequency::Day, vec!["v".into()]).unwrap();
        for day in p("2021M2").children_of(Frequency::Day).unwrap() {
            input.insert(day, vec![Some(1.0)]).unwrap();
        }
        input.insert(p("2021-03-01"), vec![Some(1.0)]).unwrap();

        let out = aggregate(&input, Frequency::Month, AggregationMethod::Sum, true).unwrap();
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.value(&p("2021M2"), "v"), Some(Some(28.0)));
    }

    #[test]
    fn test_months_straight_to_year() {
        let mut input = PeriodTable::new(Frequency::Month, vec!["v".into()]).unwrap();
        for month in p("2020").children_of(Frequency::Month).unwrap() {
            input.insert(month, vec![Some(2.0)]).unwrap();
        }
        let out = aggregate(&input, Frequency::Year, AggregationMethod::Sum, true).unwrap();
        assert_eq!(out.table.value(&p("2020"), "v"), Some(Some(24.0)));
    }

    #[test]
    fn test_rejects_equal_or_finer_target() {
        let input = monthly_with_gap();
        for target in [Frequency::Month, Frequency::Day] {
            let err = aggregate(&input, target, AggregationMethod::Sum, true).unwrap_err();
            assert!(matches!(err, ConversionError::UnsupportedFrequencyPair { .. }));
        }
    }

    #[test]
    fn test_round_trip_through_disaggregation() {
        let original = table(
            &["a", "b"],
            &[
                ("2019", vec![Some(3.0), Some(-1.5)]),
                ("2020", vec![Some(7.0), Some(0.25)]),
            ],
        );
        let quarterly = disaggregate(&original, Frequency::Year, Frequency::Quarter).unwrap();

        let summed = aggregate(&quarterly, Frequency::Year, AggregationMethod::Sum, false).unwrap();
        for (period, values) in original.rows() {
            let expected: Vec<Cell> = values.iter().map(|v| v.map(|x| x * 4.0)).collect();
            assert_eq!(summed.table.get(period), Some(expected.as_slice()));
        }

        let averaged =
            aggregate(&quarterly, Frequency::Year, AggregationMethod::Mean, false).unwrap();
        assert_eq!(averaged.table, original);
        assert!(!averaged.has_warnings());
    }

    #[test]
    fn test_output_order_is_calendar_order() {
        let input = table(
            &["v"],
            &[
                ("2021M1", vec![Some(1.0)]),
                ("2020M12", vec![Some(1.0)]),
                ("2020M1", vec![Some(1.0)]),
            ],
        );
        let out = aggregate(&input, Frequency::Year, AggregationMethod::Sum, false).unwrap();
        let periods: Vec<String> = out.table.periods().map(|p| p.to_string()).collect();
        assert_eq!(periods, ["2020", "2021"]);
        assert_eq!(out.incomplete_periods(), vec![p("2020"), p("2021")]);
    }
}
