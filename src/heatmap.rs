//! Plate coordinates for plotting demultiplexing results.
//!
//! Two outputs: a long mapping (one line per barcode with its row/column
//! labels and 0-based indices) and a plate-shaped matrix of barcode names
//! that plotting tools can read directly as a heatmap grid.
use std::io::{Read, Write};

use crate::columns::{ColumnMap, ColumnRole};
use crate::error::Result;
use crate::well::{CellId, PlateFormat};

/// A barcode name at a parsed well position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamedWell {
    pub cell: CellId,
    pub name: String,
}

/// Read `(well, name)` pairs using the `Well` and `Name` roles.
/// Rows with an empty well or name are skipped; malformed wells are errors.
pub fn read_named_wells<R: Read>(reader: R, columns: &ColumnMap) -> Result<Vec<NamedWell>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
    let idx = columns.resolve(rdr.headers()?, &[ColumnRole::Well, ColumnRole::Name])?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let well = rec.get(idx[&ColumnRole::Well]).unwrap_or("");
        let name = rec.get(idx[&ColumnRole::Name]).unwrap_or("");
        if well.is_empty() || name.is_empty() {
            continue;
        }
        out.push(NamedWell { cell: well.parse()?, name: name.to_string() });
    }
    Ok(out)
}

/// Write the long-form mapping.
pub fn write_mapping<W: Write>(writer: W, entries: &[NamedWell]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["Barcode_Name", "Well", "Row", "Column", "Row_Index", "Column_Index"])?;
    for e in entries {
        w.write_record([
            e.name.clone(),
            e.cell.to_string(),
            e.cell.row_letter().to_string(),
            e.cell.column_number().to_string(),
            e.cell.row.to_string(),
            e.cell.column.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Lay names out on a plate grid. Wells off the plate are ignored; later
/// entries overwrite earlier ones at the same well.
pub fn plate_matrix(entries: &[NamedWell], format: PlateFormat) -> Vec<Vec<String>> {
    let mut m = vec![vec![String::new(); format.columns()]; format.rows()];
    for e in entries.iter().filter(|e| format.contains(e.cell)) {
        m[e.cell.row][e.cell.column] = e.name.clone();
    }
    m
}

/// Write a matrix with a `Row,1,2,…` header and one lettered line per row.
pub fn write_matrix<W: Write>(writer: W, matrix: &[Vec<String>]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    let cols = matrix.first().map_or(0, Vec::len);
    let header: Vec<String> = std::iter::once("Row".to_string()).chain((1..=cols).map(|c| c.to_string())).collect();
    w.write_record(&header)?;
    for (i, row) in matrix.iter().enumerate() {
        let letter = CellId::new(i, 0).row_letter().to_string();
        w.write_record(std::iter::once(&letter).chain(row.iter()))?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<NamedWell> {
        let csv = "Well,Barcode_Name,Sequence\nA1,BC01,AC\nB2,BC02,GT\nP24,BC99,TT\n,BC00,AA\n";
        read_named_wells(csv.as_bytes(), &ColumnMap::default()).unwrap()
    }

    #[test]
    fn mapping_lines_carry_labels_and_indices() {
        let mut buf = Vec::new();
        write_mapping(&mut buf, &entries()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Barcode_Name,Well,Row,Column,Row_Index,Column_Index");
        assert_eq!(lines[2], "BC02,B2,B,2,1,1");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn matrix_ignores_wells_off_the_plate() {
        let m = plate_matrix(&entries(), PlateFormat::Wells96);
        assert_eq!(m.len(), 8);
        assert_eq!(m[0][0], "BC01");
        assert_eq!(m[1][1], "BC02");
        assert!(m.iter().flatten().all(|n| n != "BC99"));

        let mut buf = Vec::new();
        write_matrix(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Row,1,2,3,4,5,6,7,8,9,10,11,12\nA,BC01,,"));
        assert_eq!(text.lines().count(), 9);
    }

    #[test]
    fn malformed_well_is_an_error() {
        let csv = "Well,Name\nZZ,BC01\n";
        assert!(read_named_wells(csv.as_bytes(), &ColumnMap::default()).is_err());
    }
}
