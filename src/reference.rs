//! Barcode reference files for demultiplexing.
//!
//! Reads a plate layout (`Well, Barcode_Name, Sequence`) and writes the
//! barcodes either as a headerless two-column TSV (`name<TAB>sequence`) that
//! minimap2-based demultiplexers accept, or as FASTA.
use std::io::{Read, Write};

use crate::columns::{ColumnMap, ColumnRole};
use crate::error::Result;

/// A barcode placed in a plate well.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlacedBarcode {
    pub well: String,
    pub name: String,
    /// Upper-cased sequence.
    pub sequence: String,
}

impl PlacedBarcode {
    /// Reference name, optionally suffixed with the well (`BC01_A1`).
    pub fn reference_name(&self, include_well: bool) -> String {
        if include_well { format!("{}_{}", self.name, self.well) } else { self.name.clone() }
    }
}

/// Parse a plate layout. Rows with an empty well, name or sequence are skipped.
pub fn read_positions<R: Read>(reader: R, columns: &ColumnMap) -> Result<Vec<PlacedBarcode>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
    let idx = columns.resolve(rdr.headers()?, &[ColumnRole::Well, ColumnRole::Name, ColumnRole::Sequence])?;
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        let field = |role: ColumnRole| rec.get(idx[&role]).unwrap_or("");
        let (well, name, sequence) = (field(ColumnRole::Well), field(ColumnRole::Name), field(ColumnRole::Sequence));
        if well.is_empty() || name.is_empty() || sequence.is_empty() {
            skipped += 1;
            continue;
        }
        out.push(PlacedBarcode { well: well.to_string(), name: name.to_string(), sequence: sequence.to_ascii_uppercase() });
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} incomplete layout rows");
    }
    Ok(out)
}

/// Write `name<TAB>sequence` lines, no header.
pub fn write_minimap_tsv<W: Write>(writer: W, barcodes: &[PlacedBarcode], include_well: bool) -> Result<()> {
    let mut w = csv::WriterBuilder::new().delimiter(b'\t').has_headers(false).from_writer(writer);
    for b in barcodes {
        w.write_record([b.reference_name(include_well).as_str(), b.sequence.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

/// Write one FASTA record per barcode.
pub fn write_fasta<W: Write>(mut writer: W, barcodes: &[PlacedBarcode], include_well: bool) -> Result<()> {
    for b in barcodes {
        writeln!(writer, ">{}", b.reference_name(include_well))?;
        writeln!(writer, "{}", b.sequence)?;
    }
    writer.flush()?;
    Ok(())
}
