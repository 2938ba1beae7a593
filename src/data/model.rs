use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const DATE: &str = "date";
pub const CLOSE: &str = "close";
pub const DAILY_RETURN: &str = "daily_return";
pub const VOLATILITY_7: &str = "volatility_7";
pub const MA_30: &str = "ma_30";
pub const MA_90: &str = "ma_90";
pub const BB_UPPER: &str = "bb_upper";
pub const BB_LOWER: &str = "bb_lower";

/// Columns every loaded file must provide besides `date`; all of them numeric.
pub const REQUIRED_NUMERIC_COLUMNS: [&str; 7] = [
    CLOSE,
    DAILY_RETURN,
    VOLATILITY_7,
    MA_30,
    MA_90,
    BB_UPPER,
    BB_LOWER,
];

// ---------------------------------------------------------------------------
// CellValue – a single cell of a non-date column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a dataframe would infer.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Null,
}

impl CellValue {
    /// The numeric value, or `None` for text, null and NaN cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// Null and NaN both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(v) => v.is_nan(),
            CellValue::Text(_) => false,
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Null, CellValue::Number)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) if v.is_nan() => Ok(()),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
        }
    }
}

/// One trading day: the parsed date plus one cell per dataset column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    /// Aligned with [`Dataset::columns`].
    pub values: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table. Immutable once built; share it behind an `Arc`.
///
/// `date` is held on every [`Record`] and is not part of `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from its schema and rows.
    ///
    /// Rows shorter than the schema are padded with nulls, longer rows are
    /// truncated, so every record is aligned with `columns`.
    pub fn new(columns: Vec<Column>, mut records: Vec<Record>) -> Self {
        for record in &mut records {
            record.values.resize(columns.len(), CellValue::Null);
        }
        Self { columns, records }
    }

    /// Convenience constructor for all-numeric tables.
    pub fn from_numeric_rows(names: &[&str], rows: Vec<(NaiveDate, Vec<Option<f64>>)>) -> Self {
        let columns = names.iter().map(|n| Column::numeric(*n)).collect();
        let records = rows
            .into_iter()
            .map(|(date, values)| Record {
                date,
                values: values.into_iter().map(CellValue::from).collect(),
            })
            .collect();
        Self::new(columns, records)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Index of `name` if it exists and is numeric.
    pub fn numeric_column_index(&self, name: &str) -> Option<usize> {
        self.column_index(name)
            .filter(|&i| self.columns[i].kind == ColumnKind::Numeric)
    }

    /// Numeric columns in schema order, with their indices.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Numeric)
    }

    /// Earliest and latest date, or `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().map(|r| r.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn missing_cells() {
        assert!(CellValue::Null.is_missing());
        assert!(CellValue::Number(f64::NAN).is_missing());
        assert!(!CellValue::Number(1.5).is_missing());
        assert!(!CellValue::Text("x".into()).is_missing());
        assert_eq!(CellValue::Number(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Text("3".into()).as_f64(), None);
    }

    #[test]
    fn rows_are_aligned_to_schema() {
        let ds = Dataset::new(
            vec![Column::numeric("a"), Column::numeric("b")],
            vec![Record {
                date: day(1),
                values: vec![CellValue::Number(1.0)],
            }],
        );
        assert_eq!(ds.records()[0].values, vec![CellValue::Number(1.0), CellValue::Null]);
    }

    #[test]
    fn date_bounds_ignore_row_order() {
        let ds = Dataset::from_numeric_rows(
            &["close"],
            vec![(day(3), vec![Some(1.0)]), (day(1), vec![Some(2.0)]), (day(5), vec![None])],
        );
        assert_eq!(ds.date_bounds(), Some((day(1), day(5))));
        assert_eq!(Dataset::from_numeric_rows(&["close"], vec![]).date_bounds(), None);
    }

    #[test]
    fn numeric_lookup_skips_text_columns() {
        let ds = Dataset::new(vec![Column::text("note"), Column::numeric("close")], vec![]);
        assert_eq!(ds.numeric_column_index("note"), None);
        assert_eq!(ds.numeric_column_index("close"), Some(1));
        assert_eq!(ds.numeric_columns().count(), 1);
    }
}
