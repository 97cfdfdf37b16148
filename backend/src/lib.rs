//! # Periodshift - period-frequency conversion for time series tables
//!
//! Periodshift converts tables indexed by calendar periods (years,
//! quarters, months, days) between frequencies: copy values down to finer
//! periods, or group finer periods and reduce them by sum or mean.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│  CSV / JSON │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (agg/disagg)│     │   export    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use periodshift::{aggregate, AggregationMethod, Frequency, PeriodTable};
//!
//! let monthly: PeriodTable = load();
//! let quarterly = aggregate(&monthly, Frequency::Quarter, AggregationMethod::Sum, true)?;
//! println!("{} quarters", quarterly.table.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Defaults and environment settings
//! - [`models`] - Frequencies, periods and tables
//! - [`parser`] - CSV parsing with auto-detection
//! - [`export`] - CSV and JSON output
//! - [`transform`] - Aggregation, disaggregation, plans and pipeline
//! - [`validation`] - Plan schema validation
//! - [`registry`] - Saved conversion plans
//! - [`generator`] - Synthetic test tables
//! - [`api`] - HTTP API server and log broadcasting

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Input / output
pub mod export;
pub mod parser;

// Conversion
pub mod transform;

// Validation
pub mod validation;

// Plan storage
pub mod registry;

// Test data
pub mod generator;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConversionError, ConversionResult, PipelineError, PipelineResult, RegistryError,
    RegistryResult, ServerError, ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{AggregationMethod, Cell, Frequency, Period, PeriodTable};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use transform::{
    aggregate, convert_bytes, convert_file, convert_table, disaggregate, Aggregation,
    ConversionPlan, ConversionReport, CsvInfo, IncompleteGroup, PlanOutput,
};

// =============================================================================
// Re-exports - CSV Parsing / Export
// =============================================================================

pub use export::{render, table_to_csv, table_to_json, OutputFormat};
pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_table_bytes_auto,
    parse_table_file_auto, parse_table_str, CsvError, ParseOptions, ParsedTable,
};

// =============================================================================
// Re-exports - Validation, Registry, Generator, Config
// =============================================================================

pub use config::{Settings, DEFAULT_OUTPUT_DELIMITER};
pub use generator::{generate_table, GeneratorConfig, DEFAULT_NOISE};
pub use registry::{PlanRegistry, StoredPlan};
pub use validation::{is_valid_conversion_plan, validate_conversion_plan};

// =============================================================================
// Re-exports - HTTP API
// =============================================================================

pub use api::logs::{log_error, log_info, log_success, log_warning, LOG_BROADCASTER};
pub use api::server::start_server;
