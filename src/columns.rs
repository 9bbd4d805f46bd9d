//! Header resolution for user-supplied tables.
//!
//! Every table this crate reads is described in terms of column *roles*
//! (well, name, sequence, storage). A [`ColumnMap`] lists, for each role,
//! the header spellings that are accepted. Matching is an exact,
//! case-insensitive comparison after trimming; a header either is one of the
//! listed synonyms or it is not.
//!
//! The built-in map covers the vendor order sheets and plate layouts in
//! common use. Other spellings can be supplied as JSON:
//!
//! ```json
//! { "sequence": ["Oligo Seq", "Sequence"], "storage": ["Source Plate Well"] }
//! ```
//!
//! Roles not mentioned in the file keep their built-in synonyms.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PlateError, Result};

/// What a column means, independent of its header text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    /// Plate well position (e.g. `A1`).
    Well,
    /// Barcode or primer name.
    Name,
    /// Nucleotide sequence.
    Sequence,
    /// Source-plate storage well used to join against transfer lists.
    Storage,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [ColumnRole::Well, ColumnRole::Name, ColumnRole::Sequence, ColumnRole::Storage];
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnRole::Well => "well",
            ColumnRole::Name => "name",
            ColumnRole::Sequence => "sequence",
            ColumnRole::Storage => "storage",
        };
        f.write_str(s)
    }
}

fn builtin_synonyms(role: ColumnRole) -> &'static [&'static str] {
    match role {
        ColumnRole::Well => &["Well", "Well Position", "Destination Well", "Position"],
        ColumnRole::Name => &["Barcode_Name", "Barcode Name", "Barcode", "Sequence Name", "Name", "ID"],
        ColumnRole::Sequence => &["Sequence", "Seq", "Barcode Sequence"],
        ColumnRole::Storage => &["Storage", "Source Well", "Storage Well"],
    }
}

/// Accepted header synonyms per column role.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<ColumnRole, Vec<String>>")]
pub struct ColumnMap {
    synonyms: BTreeMap<ColumnRole, Vec<String>>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        let synonyms = ColumnRole::ALL
            .iter()
            .map(|&r| (r, builtin_synonyms(r).iter().map(|s| s.to_string()).collect()))
            .collect();
        ColumnMap { synonyms }
    }
}

impl From<BTreeMap<ColumnRole, Vec<String>>> for ColumnMap {
    fn from(overrides: BTreeMap<ColumnRole, Vec<String>>) -> Self {
        let mut map = ColumnMap::default();
        for (role, names) in overrides {
            map.synonyms.insert(role, names);
        }
        map
    }
}

impl ColumnMap {
    /// Load overrides from a JSON object keyed by role name.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Replace the synonyms for one role.
    pub fn with(mut self, role: ColumnRole, names: &[&str]) -> Self {
        self.synonyms.insert(role, names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn synonyms(&self, role: ColumnRole) -> &[String] {
        self.synonyms.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Index of the first header accepted for `role`.
    pub fn find<'h, I>(&self, role: ColumnRole, headers: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let names = self.synonyms(role);
        headers
            .into_iter()
            .position(|h| names.iter().any(|n| n.trim().eq_ignore_ascii_case(h.trim())))
    }

    /// Resolve every role in `roles` against `headers`, failing with a
    /// configuration error that names all missing roles at once.
    pub fn resolve(&self, headers: &csv::StringRecord, roles: &[ColumnRole]) -> Result<BTreeMap<ColumnRole, usize>> {
        let mut found = BTreeMap::new();
        let mut missing = Vec::new();
        for &role in roles {
            match self.find(role, headers.iter()) {
                Some(i) => { found.insert(role, i); }
                None => missing.push(format!("{role} (one of {:?})", self.synonyms(role))),
            }
        }
        if !missing.is_empty() {
            let seen: Vec<&str> = headers.iter().collect();
            return Err(PlateError::config(format!(
                "could not find required columns: {}. Found headers: {seen:?}",
                missing.join(", ")
            )));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_case_insensitive_match_only() {
        let map = ColumnMap::default();
        let headers = ["well id", "barcode_name", " SEQUENCE "];
        // "well id" contains "well" but is not a synonym.
        assert_eq!(map.find(ColumnRole::Well, headers), None);
        assert_eq!(map.find(ColumnRole::Name, headers), Some(1));
        assert_eq!(map.find(ColumnRole::Sequence, headers), Some(2));
    }

    #[test]
    fn resolve_reports_every_missing_role() {
        let headers = csv::StringRecord::from(vec!["Well", "Notes"]);
        let err = ColumnMap::default()
            .resolve(&headers, &[ColumnRole::Well, ColumnRole::Name, ColumnRole::Sequence])
            .unwrap_err()
            .to_string();
        assert!(err.contains("name"));
        assert!(err.contains("sequence"));
        assert!(!err.contains("well (one of"));
    }

    #[test]
    fn json_overrides_merge_with_builtins() {
        let map: ColumnMap = serde_json::from_str(r#"{ "sequence": ["Oligo Seq"] }"#).unwrap();
        assert_eq!(map.synonyms(ColumnRole::Sequence), ["Oligo Seq"]);
        assert_eq!(map.synonyms(ColumnRole::Well), ColumnMap::default().synonyms(ColumnRole::Well));
        assert!(serde_json::from_str::<ColumnMap>(r#"{ "colour": ["x"] }"#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("columns.json");
        std::fs::write(&path, r#"{ "storage": ["Src"] }"#).unwrap();
        let map = ColumnMap::from_json_path(&path).unwrap();
        assert_eq!(map.find(ColumnRole::Storage, ["x", "src"]), Some(1));
    }
}
