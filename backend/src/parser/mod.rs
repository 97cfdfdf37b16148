//! CSV to [`PeriodTable`] parser with encoding and delimiter auto-detection.
//!
//! Layout expected in the CSV:
//!
//! ```text
//! period;industry_0;industry_1
//! 2020Q1;1900;12,5
//! 2020Q2;1950;
//! ```
//!
//! The first column (or the column named by [`ParseOptions::index_column`])
//! holds period labels; every other column is a numeric series. Empty
//! cells and the usual missing-value markers become missing values.

use std::path::Path;

use crate::models::{Cell, Period, PeriodTable};

/// Tokens read as a missing value (compared case-insensitively).
const MISSING_TOKENS: [&str; 7] = ["", "na", "nan", "null", "none", ".", "n/a"];

/// CSV parsing error with context
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Line {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Parser options.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Column holding period labels (default: first column).
    pub index_column: Option<String>,
    /// Force a delimiter instead of detecting it.
    pub delimiter: Option<char>,
}

/// Parsed table with metadata
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Period-indexed data
    pub table: PeriodTable,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, index column included
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // UTF-8, ASCII and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Delimiters tried by [`detect_delimiter`], in order of preference.
const CANDIDATE_DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Data lines compared against the header when detecting the delimiter.
const DELIMITER_SAMPLE_LINES: usize = 5;

/// Detect the delimiter from the header and the first data lines.
///
/// A candidate whose count on every sampled data line matches the header
/// wins over one that only appears often in the header, so `;` files with
/// decimal commas are not mistaken for `,` files.
pub fn detect_delimiter(content: &str) -> char {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().unwrap_or("");
    let sample: Vec<&str> = lines.take(DELIMITER_SAMPLE_LINES).collect();

    CANDIDATE_DELIMITERS
        .iter()
        .enumerate()
        .filter_map(|(rank, &sep)| {
            let fields = header.matches(sep).count();
            if fields == 0 {
                return None;
            }
            let consistent = sample.iter().all(|l| l.matches(sep).count() == fields);
            Some(((consistent, fields, std::cmp::Reverse(rank)), sep))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, sep)| sep)
        .unwrap_or(';')
}

/// Parse a numeric cell. `;`-separated files may use a decimal comma.
pub fn parse_cell(raw: &str, delimiter: char) -> Option<Cell> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if MISSING_TOKENS
        .iter()
        .any(|t| trimmed.eq_ignore_ascii_case(t))
    {
        return Some(None);
    }

    let normalised = if delimiter == ';' {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    normalised
        .parse::<f64>()
        .ok()
        .map(|v| if v.is_nan() { None } else { Some(v) })
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use periodshift::parser::{parse_table_str, ParseOptions};
///
/// let csv = "period;value\n2020Q1;1900\n2020Q2;";
/// let parsed = parse_table_str(csv, ';', "utf-8".into(), &ParseOptions::default()).unwrap();
///
/// assert_eq!(parsed.table.len(), 2);
/// assert_eq!(parsed.table.missing_count(), 1);
/// ```
pub fn parse_table_str(
    content: &str,
    delimiter: char,
    encoding: String,
    options: &ParseOptions,
) -> Result<ParsedTable, CsvError> {
    if content.trim().is_empty() {
        return Err(CsvError::new(1, "Empty CSV file"));
    }
    let delimiter_byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            CsvError::new(
                1,
                format!("Delimiter '{}' is not a single ASCII character", delimiter),
            )
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::new(1, format!("Cannot read header: {}", e)))?
        .iter()
        .map(|h| h.trim_matches('"').trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.len() < 2 {
        return Err(CsvError::new(
            1,
            "Expected a period column followed by at least one value column",
        ));
    }

    let index = match &options.index_column {
        Some(name) => headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CsvError::new(1, "Index column not found").with_column(name.clone()))?,
        None => 0,
    };
    let index_name = headers[index].clone();
    let value_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(i, h)| (i, h.clone()))
        .collect();

    let mut table: Option<PeriodTable> = None;

    for (row_idx, record) in reader.records().enumerate() {
        let line = row_idx + 2; // +1 for 0-index, +1 for header

        let record =
            record.map_err(|e| CsvError::new(line, format!("Cannot read line: {}", e)))?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let label = record.get(index).unwrap_or("");
        let period: Period = label.parse().map_err(|e: crate::error::ConversionError| {
            CsvError::new(line, e.to_string())
                .with_column(index_name.clone())
                .with_value(label)
        })?;

        let mut values: Vec<Cell> = Vec::with_capacity(value_columns.len());
        for (i, name) in &value_columns {
            let raw = record.get(*i).unwrap_or("");
            let cell = parse_cell(raw, delimiter).ok_or_else(|| {
                CsvError::new(line, "Not a number")
                    .with_column(name.clone())
                    .with_value(raw)
            })?;
            values.push(cell);
        }

        // The first data row fixes the table frequency.
        if table.is_none() {
            let columns = value_columns.iter().map(|(_, h)| h.clone()).collect();
            let created = PeriodTable::new(period.frequency(), columns)
                .map_err(|e| CsvError::new(1, e.to_string()))?;
            table = Some(created);
        }
        if let Some(table) = table.as_mut() {
            table
                .insert(period, values)
                .map_err(|e| CsvError::new(line, e.to_string()).with_value(label))?;
        }
    }

    let table = table.ok_or_else(|| CsvError::new(2, "CSV file has no data rows"))?;

    Ok(ParsedTable {
        table,
        encoding,
        delimiter,
        headers,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_table_bytes_auto(
    bytes: &[u8],
    options: &ParseOptions,
) -> Result<ParsedTable, CsvError> {
    // Detect encoding
    let encoding = detect_encoding(bytes);

    // Decode content
    let content = decode_content(bytes, &encoding);

    // Detect delimiter
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(&content));

    parse_table_str(&content, delimiter, encoding, options)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let parsed = parse_table_file_auto("gdp.csv", &ParseOptions::default())?;
/// println!("Encoding: {}, Delimiter: '{}'", parsed.encoding, parsed.delimiter);
/// println!("Rows: {}", parsed.table.len());
/// ```
pub fn parse_table_file_auto<P: AsRef<Path>>(
    path: P,
    options: &ParseOptions,
) -> Result<ParsedTable, CsvError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| CsvError::new(0, format!("Cannot read file: {}", e)))?;

    parse_table_bytes_auto(&bytes, options)
}
