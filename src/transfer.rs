//! Echo transfer lists: records, CSV emission and parsing.
//!
//! An Echo picklist is a CSV with one line per droplet transfer:
//!
//! ```text
//! Source Well,Destination Well,Transfer Volume
//! C1,A1,500
//! D2,A1,500
//! ```
//!
//! Volumes are in nanolitres.
use std::io::{Read, Write};

use crate::error::{PlateError, Result};
use crate::well::{CellId, PlateFormat};

/// Header written by [`write_transfers`].
pub const HEADER: [&str; 3] = ["Source Well", "Destination Well", "Transfer Volume"];

/// One liquid transfer from a source well to a destination well.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferRecord {
    pub source: String,
    pub destination: String,
    /// Volume in nL.
    pub volume: f64,
}

/// Write `records` as an Echo CSV with [`HEADER`].
pub fn write_transfers<W: Write>(writer: W, records: &[TransferRecord]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(HEADER)?;
    for r in records {
        w.write_record([r.source.as_str(), r.destination.as_str(), r.volume.to_string().as_str()])?;
    }
    w.flush()?;
    Ok(())
}

/// Parse an Echo CSV. The third column may be titled `Transfer Volume` or `Volume`.
pub fn read_transfers<R: Read>(reader: R) -> Result<Vec<TransferRecord>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let find = |names: &[&str]| -> Result<usize> {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
            .ok_or_else(|| PlateError::config(format!("transfer CSV has no {:?} column (found {:?})", names[0], headers)))
    };
    let (src, dst, vol) = (find(&["Source Well"])?, find(&["Destination Well"])?, find(&["Transfer Volume", "Volume"])?);

    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let field = |i: usize| rec.get(i).unwrap_or("");
        let volume = field(vol)
            .parse::<f64>()
            .map_err(|_| PlateError::config(format!("row {}: invalid volume {:?}", line + 2, field(vol))))?;
        out.push(TransferRecord { source: field(src).to_string(), destination: field(dst).to_string(), volume });
    }
    Ok(out)
}

/// Pair up source and destination wells 1:1.
pub fn pair_transfers<S: AsRef<str>, D: AsRef<str>>(sources: &[S], destinations: &[D], volume: f64) -> Result<Vec<TransferRecord>> {
    if sources.len() != destinations.len() {
        return Err(PlateError::config(format!(
            "source and destination well lists must be the same length ({} vs {})",
            sources.len(),
            destinations.len()
        )));
    }
    Ok(sources
        .iter()
        .zip(destinations)
        .map(|(s, d)| TransferRecord { source: s.as_ref().to_string(), destination: d.as_ref().to_string(), volume })
        .collect())
}

/// Move the first `count` wells of the source plate, in row-major order,
/// onto the first `count` wells of the destination plate.
pub fn sequential_transfers(count: usize, source: PlateFormat, destination: PlateFormat, volume: f64) -> Result<Vec<TransferRecord>> {
    if count > source.len() {
        return Err(PlateError::config(format!(
            "cannot transfer {count} primers from a {source}-well source plate (max {})",
            source.len()
        )));
    }
    if count > destination.len() {
        return Err(PlateError::config(format!(
            "cannot transfer {count} primers to a {destination}-well destination plate (max {})",
            destination.len()
        )));
    }
    let labels = |f: PlateFormat| -> Vec<String> { f.wells().iter().take(count).map(CellId::to_string).collect() };
    pair_transfers(&labels(source), &labels(destination), volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_echo_header_and_integral_volumes() {
        let recs = vec![
            TransferRecord { source: "C1".into(), destination: "A1".into(), volume: 500.0 },
            TransferRecord { source: "D2".into(), destination: "A1".into(), volume: 2.5 },
        ];
        let mut buf = Vec::new();
        write_transfers(&mut buf, &recs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Source Well,Destination Well,Transfer Volume\nC1,A1,500\nD2,A1,2.5\n");
        assert_eq!(read_transfers(text.as_bytes()).unwrap(), recs);
    }

    #[test]
    fn reads_volume_header_alias_and_column_order() {
        let text = "Destination Well,Source Well,Volume\nB3, E5 ,100\n";
        let recs = read_transfers(text.as_bytes()).unwrap();
        assert_eq!(recs, vec![TransferRecord { source: "E5".into(), destination: "B3".into(), volume: 100.0 }]);
    }

    #[test]
    fn missing_column_or_bad_volume_fails() {
        assert!(read_transfers("Source Well,Volume\nA1,1\n".as_bytes()).is_err());
        assert!(read_transfers("Source Well,Destination Well,Volume\nA1,B1,lots\n".as_bytes()).is_err());
    }

    #[test]
    fn pairing_requires_equal_lengths() {
        let err = pair_transfers(&["A1", "A2"], &["B1"], 1.0).unwrap_err();
        assert!(matches!(err, PlateError::Configuration(_)));
    }

    #[test]
    fn sequential_96_to_384() {
        let recs = sequential_transfers(14, PlateFormat::Wells96, PlateFormat::Wells384, 100.0).unwrap();
        assert_eq!(recs.len(), 14);
        assert_eq!((recs[12].source.as_str(), recs[12].destination.as_str()), ("B1", "A13"));
        assert!(sequential_transfers(97, PlateFormat::Wells96, PlateFormat::Wells384, 100.0).is_err());
        assert!(sequential_transfers(100, PlateFormat::Wells384, PlateFormat::Wells96, 100.0).is_err());
        assert_eq!(sequential_transfers(384, PlateFormat::Wells384, PlateFormat::Wells384, 1.0).unwrap().len(), 384);
    }
}
