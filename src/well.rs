//! Plate geometry: well identifiers, plate formats and row-major enumeration.
//!
//! Rows are lettered `A`, `B`, `C`, … and columns are numbered from 1, so the
//! cell at `(row: 0, column: 0)` renders as `A1` and the last cell of a
//! 384-well plate renders as `P24`. Only single-letter rows are supported,
//! which covers both formats in use (8×12 and 16×24).
//!
//! # Examples
//! ```
//! use primerplate::well::{enumerate_wells, CellId, PlateFormat};
//! let wells = enumerate_wells(PlateFormat::Wells96.rows(), PlateFormat::Wells96.columns()).unwrap();
//! assert_eq!(wells.len(), 96);
//! assert_eq!(wells[13].to_string(), "B2");
//! assert_eq!("B2".parse::<CellId>().unwrap(), CellId::new(1, 1));
//! ```
use core::fmt;
use core::str::FromStr;

use crate::error::{PlateError, Result};

/// Highest row count expressible with single-letter row labels.
pub const MAX_ROWS: usize = 26;

/// A destination cell on a plate, addressed by 0-based row and column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CellId {
    pub row: usize,
    pub column: usize,
}

impl CellId {
    pub const fn new(row: usize, column: usize) -> Self { CellId { row, column } }

    /// The row letter (`A` for row 0).
    pub fn row_letter(&self) -> char { (b'A' + self.row as u8) as char }

    /// The 1-based column number used in labels.
    pub fn column_number(&self) -> usize { self.column + 1 }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column_number())
    }
}

impl FromStr for CellId {
    type Err = PlateError;

    /// Parse a label like `A1` or `p24`. The row letter is case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .filter(|c| c.is_ascii_alphabetic())
            .ok_or_else(|| PlateError::config(format!("invalid well label {s:?}: missing row letter")))?;
        let digits = chars.as_str();
        let number: usize = digits
            .parse()
            .map_err(|_| PlateError::config(format!("invalid well label {s:?}: bad column number")))?;
        if number == 0 {
            return Err(PlateError::config(format!("invalid well label {s:?}: columns start at 1")));
        }
        let row = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
        Ok(CellId::new(row, number - 1))
    }
}

/// Supported plate formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PlateFormat {
    /// 96-well plate, 8 rows (A–H) × 12 columns.
    Wells96,
    /// 384-well plate, 16 rows (A–P) × 24 columns.
    Wells384,
}

impl PlateFormat {
    pub fn rows(self) -> usize {
        match self { PlateFormat::Wells96 => 8, PlateFormat::Wells384 => 16 }
    }

    pub fn columns(self) -> usize {
        match self { PlateFormat::Wells96 => 12, PlateFormat::Wells384 => 24 }
    }

    /// Total number of wells.
    pub fn len(self) -> usize { self.rows() * self.columns() }

    /// Whether `cell` lies on this plate.
    pub fn contains(self, cell: CellId) -> bool {
        cell.row < self.rows() && cell.column < self.columns()
    }

    /// All wells of this format in row-major order.
    pub fn wells(self) -> Vec<CellId> {
        row_major(self.rows(), self.columns())
    }
}

impl fmt::Display for PlateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.len()) }
}

impl FromStr for PlateFormat {
    type Err = PlateError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "96" => Ok(PlateFormat::Wells96),
            "384" => Ok(PlateFormat::Wells384),
            other => Err(PlateError::config(format!("unsupported plate format {other:?} (expected 96 or 384)"))),
        }
    }
}

fn row_major(rows: usize, columns: usize) -> Vec<CellId> {
    (0..rows)
        .flat_map(|r| (0..columns).map(move |c| CellId::new(r, c)))
        .collect()
}

/// Enumerate the `rows × columns` cells of a grid in row-major order
/// (row 0 first, column varying fastest).
///
/// Fails with a configuration error when `rows` exceeds [`MAX_ROWS`].
pub fn enumerate_wells(rows: usize, columns: usize) -> Result<Vec<CellId>> {
    if rows > MAX_ROWS {
        return Err(PlateError::config(format!(
            "{rows} rows requested but only {MAX_ROWS} single-letter row labels exist"
        )));
    }
    Ok(row_major(rows, columns))
}

/// The full label grid of a plate format, one `Vec` per row.
///
/// This is the input shape the pool partitioner expects for the source plate.
pub fn well_grid(format: PlateFormat) -> Vec<Vec<String>> {
    (0..format.rows())
        .map(|r| (0..format.columns()).map(|c| CellId::new(r, c).to_string()).collect())
        .collect()
}
