//! Copy-down disaggregation from coarse periods to their children.
//!
//! ```text
//! Input                       Output
//! ┌────────┬──────┐          ┌────────┬──────┐
//! │ 2020Q1 │ 1900 │    →     │ 2020M1 │ 1900 │
//! └────────┴──────┘          │ 2020M2 │ 1900 │
//!                            │ 2020M3 │ 1900 │
//!                            └────────┴──────┘
//! ```
//!
//! Every child receives the parent's full row; no interpolation or
//! smoothing is applied.

use crate::error::{ConversionError, ConversionResult};
use crate::models::{Frequency, PeriodTable};

/// Input frequencies that can be disaggregated.
const DISAGGREGATE_FROM: [Frequency; 2] = [Frequency::Year, Frequency::Quarter];

/// Output frequencies disaggregation can produce.
const DISAGGREGATE_TO: [Frequency; 2] = [Frequency::Quarter, Frequency::Month];

/// Disaggregate `table` from `input` to the finer `output` frequency.
///
/// Supported pairs are Year→Quarter, Quarter→Month and Year→Month.
pub fn disaggregate(
    table: &PeriodTable,
    input: Frequency,
    output: Frequency,
) -> ConversionResult<PeriodTable> {
    validate_pair(input, output)?;

    if table.frequency() != input {
        return Err(ConversionError::MalformedIndex(format!(
            "table is indexed by {} periods, expected {}",
            table.frequency().name(),
            input.name()
        )));
    }

    let mut result = PeriodTable::new(output, table.columns().to_vec())?;
    for (period, values) in table.rows() {
        for child in period.children_of(output)? {
            result.insert(child, values.to_vec())?;
        }
    }
    Ok(result)
}

fn validate_pair(input: Frequency, output: Frequency) -> ConversionResult<()> {
    let reason = if !output.is_finer_than(input) {
        "output frequency must be strictly finer than input"
    } else if !DISAGGREGATE_FROM.contains(&input) {
        "only yearly or quarterly data can be disaggregated"
    } else if !DISAGGREGATE_TO.contains(&output) {
        "disaggregation produces quarterly or monthly data only"
    } else {
        return Ok(());
    };

    Err(ConversionError::UnsupportedFrequencyPair {
        from: input,
        to: output,
        reason,
    })
}
