//! First-seen index assignment for codes and patients.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fs::File;
use std::hash::Hash;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ShardError};

/// Assigns dense `u32` indices in the order keys are first observed.
///
/// Indices are never reordered: the side table written at the end of a run
/// must agree with the indices already baked into shard lines.
#[derive(Debug, Clone)]
pub struct FirstSeenIndex<K> {
    lookup: HashMap<K, u32>,
    keys: Vec<K>,
}

impl<K> Default for FirstSeenIndex<K> {
    fn default() -> Self {
        Self {
            lookup: HashMap::new(),
            keys: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> FirstSeenIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `key`, assigning the next free index when it is new.
    ///
    /// Returns the index and whether it was assigned by this call.
    pub fn get_or_insert(&mut self, key: &K) -> (u32, bool) {
        if let Some(&index) = self.lookup.get(key) {
            return (index, false);
        }
        let index = self.keys.len() as u32;
        self.lookup.insert(key.clone(), index);
        self.keys.push(key.clone());
        (index, true)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<u32>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.lookup.get(key).copied()
    }

    pub fn key(&self, index: u32) -> Option<&K> {
        self.keys.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `(key, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u32)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key, index as u32))
    }
}

impl<K: Eq + Hash + Clone + AsRef<str>> FirstSeenIndex<K> {
    /// Write the table as `<key_column>,index` CSV in index order.
    pub fn write_csv<W: Write>(&self, writer: W, key_column: &str, path: &Path) -> Result<()> {
        let csv_error = |source| ShardError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut out = csv::Writer::from_writer(writer);
        out.write_record([key_column, "index"]).map_err(csv_error)?;
        for (key, index) in self.iter() {
            out.write_record([key.as_ref(), index.to_string().as_str()])
                .map_err(csv_error)?;
        }
        out.flush().map_err(|source| ShardError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Write the table to `path`.
    pub fn write_csv_file(&self, path: &Path, key_column: &str) -> Result<()> {
        let file = File::create(path).map_err(|source| ShardError::Io {
            operation: "create",
            path: path.to_path_buf(),
            source,
        })?;
        self.write_csv(file, key_column, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_in_first_seen_order() {
        let mut index = FirstSeenIndex::new();
        assert_eq!(index.get_or_insert(&"E11".to_string()), (0, true));
        assert_eq!(index.get_or_insert(&"@HBA1C".to_string()), (1, true));
        assert_eq!(index.get_or_insert(&"E11".to_string()), (0, false));
        assert_eq!(index.get_or_insert(&"A10".to_string()), (2, true));
        assert_eq!(index.len(), 3);
        assert_eq!(index.key(1).map(String::as_str), Some("@HBA1C"));
        let order: Vec<_> = index.iter().map(|(k, i)| (k.as_str(), i)).collect();
        assert_eq!(order, vec![("E11", 0), ("@HBA1C", 1), ("A10", 2)]);
    }

    #[test]
    fn writes_csv_in_index_order() {
        let mut index = FirstSeenIndex::new();
        for code in ["Z99", "A01", "Z99", "M10"] {
            index.get_or_insert(&code.to_string());
        }
        let mut buffer = Vec::new();
        index
            .write_csv(&mut buffer, "code", Path::new("code_index.csv"))
            .expect("write");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "code,index\nZ99,0\nA01,1\nM10,2\n"
        );
    }
}
