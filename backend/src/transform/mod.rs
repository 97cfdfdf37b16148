//! Transformation module.
//!
//! This module handles period-frequency conversion:
//! - Disaggregate: copy values down to finer periods
//! - Aggregate: group finer periods and reduce them
//! - Plan: serialisable description of one conversion
//! - Pipeline: CSV in, converted table out

pub mod aggregate;
pub mod disaggregate;
pub mod pipeline;
pub mod plan;

pub use aggregate::{aggregate, Aggregation, IncompleteGroup};
pub use disaggregate::disaggregate;
pub use pipeline::*;
pub use plan::{ConversionPlan, PlanOutput};
