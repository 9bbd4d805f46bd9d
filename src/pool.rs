//! Forward/reverse primer pools carved out of a source plate grid.
//!
//! The source plate interleaves the two primer families: wells on an even
//! row **and** an even column hold forward primers, wells on an odd row
//! **and** an odd column hold reverse primers. The remaining wells are
//! unused. After splitting, the first `offset` entries of each family are
//! reserved for controls and dropped; what is left is the *active* pool the
//! pair assigner draws from, by position.
//!
//! # Examples
//! ```
//! use primerplate::pool::{partition, DEFAULT_OFFSET};
//! use primerplate::well::{well_grid, PlateFormat};
//! let pools = partition(&well_grid(PlateFormat::Wells384), DEFAULT_OFFSET).unwrap();
//! assert_eq!(pools.forward.len(), 8 * 12 - 12);
//! assert_eq!(pools.forward.get(0), Some("C1"));
//! assert_eq!(pools.reverse.get(0), Some("D2"));
//! ```
use crate::error::{PlateError, Result};

/// Leading entries of each pool reserved for controls.
pub const DEFAULT_OFFSET: usize = 12;

/// An ordered, positionally addressed list of identifiers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdentifierPool(Vec<String>);

impl IdentifierPool {
    pub fn new(labels: Vec<String>) -> Self { IdentifierPool(labels) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, index: usize) -> Option<&str> { self.0.get(index).map(String::as_str) }

    pub fn labels(&self) -> &[String] { &self.0 }

    /// Drop the first `offset` entries, keeping relative order.
    pub fn trimmed(&self, offset: usize) -> IdentifierPool {
        IdentifierPool(self.0.iter().skip(offset).cloned().collect())
    }
}

impl From<Vec<String>> for IdentifierPool {
    fn from(v: Vec<String>) -> Self { IdentifierPool(v) }
}

impl<'a> From<&'a [&'a str]> for IdentifierPool {
    fn from(v: &'a [&'a str]) -> Self { IdentifierPool(v.iter().map(|s| s.to_string()).collect()) }
}

/// The active forward and reverse pools for one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrimerPools {
    pub forward: IdentifierPool,
    pub reverse: IdentifierPool,
}

/// Split a rectangular grid into the full (untrimmed) forward and reverse pools.
///
/// Both dimensions must be even and every row must have the same width.
pub fn split_grid<S: AsRef<str>>(grid: &[Vec<S>]) -> Result<(IdentifierPool, IdentifierPool)> {
    let rows = grid.len();
    let columns = grid.first().map_or(0, Vec::len);
    if rows == 0 || columns == 0 {
        return Err(PlateError::config("source grid is empty"));
    }
    if let Some((i, r)) = grid.iter().enumerate().find(|(_, r)| r.len() != columns) {
        return Err(PlateError::config(format!(
            "source grid is ragged: row {i} has {} columns, expected {columns}",
            r.len()
        )));
    }
    if rows % 2 != 0 || columns % 2 != 0 {
        return Err(PlateError::config(format!(
            "source grid must have even dimensions, got {rows}x{columns}"
        )));
    }

    let pick = |parity: usize| -> IdentifierPool {
        grid.iter()
            .skip(parity)
            .step_by(2)
            .flat_map(|row| row.iter().skip(parity).step_by(2).map(|s| s.as_ref().to_string()))
            .collect::<Vec<_>>()
            .into()
    };
    Ok((pick(0), pick(1)))
}

/// Split `grid` and trim `offset` leading entries from each pool.
///
/// Fails with a configuration error if either active pool ends up empty.
pub fn partition<S: AsRef<str>>(grid: &[Vec<S>], offset: usize) -> Result<PrimerPools> {
    let (forward_full, reverse_full) = split_grid(grid)?;
    let forward = forward_full.trimmed(offset);
    let reverse = reverse_full.trimmed(offset);
    if forward.is_empty() || reverse.is_empty() {
        return Err(PlateError::config(format!(
            "offset {offset} leaves no active primers (forward pool {}, reverse pool {})",
            forward_full.len(),
            reverse_full.len()
        )));
    }
    log::debug!(
        "partitioned {}x{} grid: {} forward, {} reverse active primers (offset {offset})",
        grid.len(),
        grid[0].len(),
        forward.len(),
        reverse.len()
    );
    Ok(PrimerPools { forward, reverse })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well::{well_grid, PlateFormat};

    fn numbered_grid(rows: usize, cols: usize) -> Vec<Vec<String>> {
        (0..rows).map(|r| (0..cols).map(|c| format!("{r}:{c}")).collect()).collect()
    }

    #[test]
    fn split_picks_even_even_and_odd_odd() {
        let (f, r) = split_grid(&numbered_grid(4, 4)).unwrap();
        assert_eq!(f.labels(), ["0:0", "0:2", "2:0", "2:2"]);
        assert_eq!(r.labels(), ["1:1", "1:3", "3:1", "3:3"]);
    }

    #[test]
    fn pool_sizes_follow_grid_quarter_minus_offset() {
        for (rows, cols) in [(2, 2), (4, 6), (8, 12), (16, 24)] {
            let quarter = (rows / 2) * (cols / 2);
            for offset in 0..quarter {
                let p = partition(&numbered_grid(rows, cols), offset).unwrap();
                assert_eq!(p.forward.len(), quarter - offset);
                assert_eq!(p.reverse.len(), quarter - offset);
            }
        }
    }

    #[test]
    fn trimming_keeps_relative_order() {
        let p = partition(&well_grid(PlateFormat::Wells384), DEFAULT_OFFSET).unwrap();
        assert_eq!(p.forward.len(), 84);
        // 12 forward primers per even row, so trimming 12 skips row A entirely.
        assert_eq!(p.forward.get(0), Some("C1"));
        assert_eq!(p.forward.get(1), Some("C3"));
        assert_eq!(p.reverse.get(0), Some("D2"));
        assert_eq!(p.reverse.get(83), Some("P24"));
    }

    #[test]
    fn empty_active_pool_is_a_configuration_error() {
        let err = partition(&numbered_grid(2, 2), 1).unwrap_err();
        assert!(matches!(err, PlateError::Configuration(_)));
    }

    #[test]
    fn odd_or_ragged_grids_are_rejected() {
        assert!(split_grid(&numbered_grid(3, 4)).is_err());
        assert!(split_grid(&numbered_grid(4, 5)).is_err());
        let mut ragged = numbered_grid(4, 4);
        ragged[2].pop();
        assert!(split_grid(&ragged).is_err());
        let empty: Vec<Vec<String>> = Vec::new();
        assert!(split_grid(&empty).is_err());
    }
}
