//! Joining transfer lists against a barcode sequence table.
//!
//! The sequence table is an oligo order sheet that records, for every source
//! well (*storage*), the primer name and its sequence. Primer names end in a
//! role letter followed by a number (`primerF03`, `idx_R12`); the letter is
//! the role tag. Joining a transfer list against the table and pivoting by
//! destination yields one row per sample with one index sequence per role,
//! which is what demultiplexers expect as a sample sheet.
//!
//! # Examples
//! ```
//! use primerplate::barcodes::{join, pivot, BarcodeEntry, BarcodeTable};
//! use primerplate::transfer::TransferRecord;
//! let table = BarcodeTable::from_entries(vec![
//!     BarcodeEntry { storage: "W05".into(), sequence_name: "primerF03".into(), sequence: "AC GT".into() },
//!     BarcodeEntry { storage: "W06".into(), sequence_name: "primerR07".into(), sequence: "TT AA".into() },
//! ]).unwrap();
//! let transfers = vec![
//!     TransferRecord { source: "W05".into(), destination: "A1".into(), volume: 500.0 },
//!     TransferRecord { source: "W06".into(), destination: "A1".into(), volume: 500.0 },
//! ];
//! let rows = pivot(&join(&transfers, &table).unwrap()).unwrap();
//! assert_eq!(rows[0].indexes[&'F'], "ACGT");
//! assert_eq!(rows[0].indexes[&'R'], "TTAA");
//! ```
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;

use polars::prelude::{DataFrame, NamedFrom, PolarsResult, Series};

use crate::columns::{ColumnMap, ColumnRole};
use crate::error::{PlateError, Result};
use crate::transfer::TransferRecord;

/// One line of the sequence table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BarcodeEntry {
    /// Source-plate well holding this oligo.
    pub storage: String,
    pub sequence_name: String,
    /// Sequence as written in the table; may contain spaces.
    pub sequence: String,
}

/// Sequence table keyed by storage label.
#[derive(Clone, Debug, Default)]
pub struct BarcodeTable {
    by_storage: HashMap<String, BarcodeEntry>,
}

impl BarcodeTable {
    /// Build a table, rejecting duplicate storage labels.
    pub fn from_entries(entries: Vec<BarcodeEntry>) -> Result<Self> {
        let mut by_storage = HashMap::with_capacity(entries.len());
        for e in entries {
            if let Some(prev) = by_storage.insert(e.storage.clone(), e) {
                return Err(PlateError::lookup(format!("storage label {:?} appears more than once", prev.storage)));
            }
        }
        Ok(BarcodeTable { by_storage })
    }

    /// Read a CSV sequence table using the `Storage`, `Name` and `Sequence` roles of `columns`.
    pub fn from_csv<R: Read>(reader: R, columns: &ColumnMap) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
        let idx = columns.resolve(rdr.headers()?, &[ColumnRole::Storage, ColumnRole::Name, ColumnRole::Sequence])?;
        let mut entries = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            let field = |role: ColumnRole| rec.get(idx[&role]).unwrap_or("").to_string();
            let entry = BarcodeEntry {
                storage: field(ColumnRole::Storage),
                sequence_name: field(ColumnRole::Name),
                sequence: field(ColumnRole::Sequence),
            };
            if entry.storage.is_empty() {
                continue;
            }
            entries.push(entry);
        }
        log::info!("loaded {} barcode entries", entries.len());
        Self::from_entries(entries)
    }

    pub fn get(&self, storage: &str) -> Option<&BarcodeEntry> { self.by_storage.get(storage) }

    pub fn len(&self) -> usize { self.by_storage.len() }

    pub fn is_empty(&self) -> bool { self.by_storage.is_empty() }
}

/// Role letter of a primer name: the character just before any trailing
/// digits, if it is not itself a digit.
///
/// `primerF03` → `F`, `R7` → `R`, `idx_R` → `R`, `123` → `None`.
pub fn role_tag(name: &str) -> Option<char> {
    name.trim_end_matches(|c: char| c.is_ascii_digit()).chars().last()
}

/// A transfer resolved to its role and cleaned sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinedRecord {
    pub destination: String,
    pub role: char,
    /// Sequence with all whitespace removed.
    pub sequence: String,
}

/// Resolve every transfer's source against `table`.
pub fn join(records: &[TransferRecord], table: &BarcodeTable) -> Result<Vec<JoinedRecord>> {
    records
        .iter()
        .map(|r| {
            let entry = table
                .get(&r.source)
                .ok_or_else(|| PlateError::lookup(format!("source well {:?} (destination {}) is not in the barcode table", r.source, r.destination)))?;
            let role = role_tag(&entry.sequence_name)
                .ok_or_else(|| PlateError::lookup(format!("cannot derive a role from sequence name {:?}", entry.sequence_name)))?;
            let sequence: String = entry.sequence.chars().filter(|c| !c.is_whitespace()).collect();
            Ok(JoinedRecord { destination: r.destination.clone(), role, sequence })
        })
        .collect()
}

/// One sample sheet row: a destination and its sequence per role.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexRow {
    pub sample_id: String,
    pub indexes: BTreeMap<char, String>,
}

/// Reshape joined records into one row per destination, in first-seen order.
///
/// Every destination must carry exactly one record for each role seen in
/// `joined`.
pub fn pivot(joined: &[JoinedRecord]) -> Result<Vec<IndexRow>> {
    let roles: BTreeSet<char> = joined.iter().map(|j| j.role).collect();
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<&str, BTreeMap<char, String>> = HashMap::new();

    for j in joined {
        let slot = rows.entry(j.destination.as_str()).or_insert_with(|| {
            order.push(j.destination.clone());
            BTreeMap::new()
        });
        if slot.insert(j.role, j.sequence.clone()).is_some() {
            return Err(PlateError::lookup(format!("destination {} has more than one {} record", j.destination, j.role)));
        }
    }

    order
        .into_iter()
        .map(|sample_id| {
            let indexes = rows.remove(sample_id.as_str()).unwrap_or_default();
            if let Some(missing) = roles.iter().find(|r| !indexes.contains_key(*r)) {
                return Err(PlateError::lookup(format!("destination {sample_id} has no {missing} record")));
            }
            Ok(IndexRow { sample_id, indexes })
        })
        .collect()
}

/// Column title for a role in the wide table.
pub fn role_column(role: char) -> String {
    match role {
        'F' => "FwIndex".to_string(),
        'R' => "RvIndex".to_string(),
        other => format!("{other}Index"),
    }
}

/// Render pivoted rows as a `DataFrame` with `SampleID` followed by one
/// column per role.
pub fn pivot_frame(rows: &[IndexRow]) -> PolarsResult<DataFrame> {
    let roles: BTreeSet<char> = rows.iter().flat_map(|r| r.indexes.keys().copied()).collect();
    let mut columns = Vec::with_capacity(roles.len() + 1);
    columns.push(Series::new("SampleID", rows.iter().map(|r| r.sample_id.clone()).collect::<Vec<_>>()));
    for role in roles {
        let values: Vec<String> = rows.iter().map(|r| r.indexes.get(&role).cloned().unwrap_or_default()).collect();
        columns.push(Series::new(role_column(role).as_str(), values));
    }
    DataFrame::new(columns)
}
