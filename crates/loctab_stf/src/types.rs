//! The decoded string table
//!

use derive_more::derive::{Constructor, Deref, DerefMut};
use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Entries keyed by string id, in first-seen order
pub type Entries = IndexMap<String, String>;

/// A fully materialized string table
///
/// The header is carried through load and save untouched. Dereferences to its entries, so
/// map methods such as `get`, `iter` and `insert` are available directly.
///
/// ```
/// use loctab_stf::StringTable;
///
/// let mut table = StringTable::empty(0xDEADBEEF);
/// table.insert("greeting".into(), "Hello".into());
/// table.insert("greeting".into(), "Hi".into());
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.by_key("greeting"), Some("Hi"));
/// ```
#[derive(Constructor, Clone, Debug, Default, PartialEq, Eq, Deref, DerefMut)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StringTable {
    header: u32,

    #[deref]
    #[deref_mut]
    entries: Entries,
}

impl StringTable {
    /// A table with no entries
    pub fn empty(header: u32) -> Self {
        Self::new(header, Entries::new())
    }

    /// Build a table from records; a repeated key keeps the last text.
    pub fn from_records<I, K, V>(header: u32, records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::empty(header);
        table.extend(
            records
                .into_iter()
                .map(|(key, text)| (key.into(), text.into())),
        );
        table
    }

    /// The opaque 4 byte header
    pub fn header(&self) -> u32 {
        self.header
    }

    pub fn set_header(&mut self, header: u32) {
        self.header = header;
    }

    /// Get a reference to the entries in this table
    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn into_entries(self) -> Entries {
        self.entries
    }

    /// Try to get a text by its key
    pub fn by_key(&self, key: impl AsRef<str>) -> Option<&str> {
        self.entries.get(key.as_ref()).map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use crate::types::StringTable;

    #[test]
    fn last_write_wins() {
        let table = StringTable::from_records(7, [("a", "1"), ("b", "2"), ("a", "3")]);

        assert_eq!(table.header(), 7);
        assert_eq!(table.len(), 2);
        assert_eq!(table.by_key("a"), Some("3"));
        // a repeated key keeps its first position
        assert_eq!(
            table.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn equality_ignores_order() {
        let left = StringTable::from_records(1, [("a", "1"), ("b", "2")]);
        let right = StringTable::from_records(1, [("b", "2"), ("a", "1")]);
        assert_eq!(left, right);

        let other_header = StringTable::from_records(2, [("a", "1"), ("b", "2")]);
        assert_ne!(left, other_header);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_shape() -> serde_json::Result<()> {
        let table = StringTable::from_records(0xDEADBEEF, [("b", "2"), ("a", "1")]);

        let json = serde_json::to_string(&table)?;
        assert_eq!(json, r#"{"header":3735928559,"entries":{"b":"2","a":"1"}}"#);
        assert_eq!(serde_json::from_str::<StringTable>(&json)?, table);

        Ok(())
    }
}
