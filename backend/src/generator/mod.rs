//! Synthetic test tables.
//!
//! Row `i`, column `j` holds `i + j⁴ − 2j` plus Gaussian noise, so every
//! sector has its own level and a shared upward trend. Output is fully
//! determined by the seed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{ConversionError, ConversionResult};
use crate::models::{Cell, Period, PeriodTable};

/// Column name prefix; sectors are `industry_0`, `industry_1`, ...
pub const SECTOR_PREFIX: &str = "industry_";

/// Default standard deviation of the noise.
pub const DEFAULT_NOISE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of value columns.
    pub sectors: usize,
    /// First period (inclusive).
    pub start: Period,
    /// Last period (inclusive), same frequency as `start`.
    pub end: Period,
    /// Share of cells per column set to missing, in `[0, 1]`.
    pub null_ratio: f64,
    /// Standard deviation of the zero-mean normal noise.
    pub noise: f64,
    pub seed: u64,
}

impl GeneratorConfig {
    pub fn new(sectors: usize, start: Period, end: Period) -> Self {
        Self {
            sectors,
            start,
            end,
            null_ratio: 0.0,
            noise: DEFAULT_NOISE,
            seed: 0,
        }
    }

    fn validate(&self) -> ConversionResult<()> {
        self.start.validate()?;
        self.end.validate()?;
        if self.start.frequency() != self.end.frequency() {
            return Err(ConversionError::MalformedIndex(format!(
                "start {} and end {} have different frequencies",
                self.start, self.end
            )));
        }
        if self.start > self.end {
            return Err(ConversionError::InvalidParameter(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if self.sectors == 0 {
            return Err(ConversionError::InvalidParameter(
                "at least one sector is required".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.null_ratio) {
            return Err(ConversionError::InvalidParameter(format!(
                "null ratio {} is outside [0, 1]",
                self.null_ratio
            )));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(ConversionError::InvalidParameter(format!(
                "noise standard deviation {} must be a non-negative number",
                self.noise
            )));
        }
        Ok(())
    }
}

/// Build a synthetic table covering `start..=end`.
pub fn generate_table(config: &GeneratorConfig) -> ConversionResult<PeriodTable> {
    config.validate()?;

    let mut periods = vec![config.start];
    let mut current = config.start;
    while current < config.end {
        current = current.succ().ok_or_else(|| {
            ConversionError::InvalidParameter(format!("{} has no successor", current))
        })?;
        periods.push(current);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise)
        .map_err(|e| ConversionError::InvalidParameter(format!("noise: {}", e)))?;
    let mut rows: Vec<Vec<Cell>> = periods
        .iter()
        .enumerate()
        .map(|(i, _)| {
            (0..config.sectors)
                .map(|j| {
                    let trend = i as f64 + (j as f64).powi(4) - 2.0 * j as f64;
                    Some(trend + noise.sample(&mut rng))
                })
                .collect()
        })
        .collect();

    let nulls = (config.null_ratio * periods.len() as f64).round() as usize;
    if nulls > 0 {
        for j in 0..config.sectors {
            for i in rand::seq::index::sample(&mut rng, periods.len(), nulls).iter() {
                rows[i][j] = None;
            }
        }
    }

    let columns = (0..config.sectors)
        .map(|j| format!("{}{}", SECTOR_PREFIX, j))
        .collect();
    let mut table = PeriodTable::new(config.start.frequency(), columns)?;
    for (period, values) in periods.into_iter().zip(rows) {
        table.insert(period, values)?;
    }
    Ok(table)
}
