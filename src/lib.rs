#![forbid(unsafe_code)]
//! # primerplate
//!
//! Plans **combinatorial primer plates** for an Echo acoustic liquid handler:
//! every well of a destination plate receives a distinct forward/reverse
//! primer pair drawn from a source plate, and the resulting transfer list can
//! be joined against the oligo order sheet to produce a per-sample index
//! table for demultiplexing.
//!
//! ## Pipeline
//! 1. [`well`] enumerates plate wells (`A1` … `P24`) in row-major order.
//! 2. [`pool`] splits the source plate into forward (even row, even column)
//!    and reverse (odd row, odd column) primers and trims the control wells.
//! 3. [`assign`] draws one unique `(forward, reverse)` pair per destination
//!    well with seeded rejection sampling and emits two transfers per well.
//! 4. [`transfer`] writes the Echo CSV; [`barcodes`] joins it against the
//!    sequence table and pivots to one row per sample.
//!
//! [`reference`] and [`heatmap`] turn plate layouts into minimap2/FASTA
//! references and plotting grids.
//!
//! ## Highlights
//! - 🎲 **Reproducible**: a plan is a pure function of its seed and configuration.
//! - 🛑 **Fails fast**: undersized pools are rejected before any random draw.
//! - 🧵 **Independent runs**: each plan owns its generator, so plates can be planned in parallel.
//!
//! ## Examples
//! ```rust
//! let config = primerplate::PlanConfig { seed: 7, ..Default::default() };
//! let records = primerplate::plan_plate(&config).unwrap();
//! assert_eq!(records.len(), 2 * 384);
//! assert_eq!(records.first().unwrap().destination, "A1");
//! assert_eq!(records.last().unwrap().destination, "P24");
//! ```

pub mod error;
pub mod well;
pub mod pool;
pub mod assign;
pub mod transfer;
pub mod columns;
pub mod barcodes;
pub mod reference;
pub mod heatmap;
pub mod plan;

pub use error::{PlateError, Result};
pub use plan::{plan_many, plan_plate, PlanConfig};

use barcodes::{IndexRow, BarcodeTable};
use transfer::TransferRecord;

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Join a transfer list against a sequence table and pivot to one row per
/// destination well.
///
/// This is [`barcodes::join`] followed by [`barcodes::pivot`].
pub fn sample_sheet(records: &[TransferRecord], table: &BarcodeTable) -> Result<Vec<IndexRow>> {
    let joined = barcodes::join(records, table)?;
    barcodes::pivot(&joined)
}

/// Convenience: `(label, row_letter, column_number)` rows for every well of
/// a plate format, for listing in the CLI.
pub fn well_rows(format: well::PlateFormat) -> Vec<(String, char, usize)> {
    format
        .wells()
        .iter()
        .map(|c| (c.to_string(), c.row_letter(), c.column_number()))
        .collect()
}
