use std::collections::btree_map;
use std::collections::BTreeMap;

use csvmap_core::Cells;
use tracing::{debug, trace};

use crate::shape::FieldDescriptor;
use crate::DELIMITER;

/// A positional map from CSV column index to record field.
///
/// A column map is built from a header line and the fields of a record
/// shape. Each header token is matched against field names after removing
/// spaces, so a `First Name` column fills a field named `FirstName`. Matching
/// is otherwise exact and case sensitive.
///
/// There is one fallback: when a header token contains `date` (in any case)
/// and no field has exactly that name, the column is mapped to the first
/// field whose name contains `date`. This lets a `Billing Date` column fill
/// an `InvoiceDate` field.
///
/// Columns that match nothing are absent from the map, and their cells are
/// ignored when decoding. Building a column map never fails.
///
/// # Example
///
/// ```
/// use csvmap::{ColumnMap, FieldDescriptor, PrimitiveKind};
///
/// let fields = vec![
///     FieldDescriptor::new("FirstName", PrimitiveKind::Text),
///     FieldDescriptor::new("InvoiceDate", PrimitiveKind::DateTime),
/// ];
/// let map = ColumnMap::from_header("First Name,Notes,Billing Date", &fields);
///
/// assert_eq!(map.get(0), Some("FirstName"));
/// assert_eq!(map.get(1), None);
/// assert_eq!(map.get(2), Some("InvoiceDate"));
/// assert_eq!(map.header_len(), 3);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ColumnMap {
    columns: BTreeMap<usize, Column>,
    header_len: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Column {
    /// Index of the field in the descriptors the map was built from.
    field: usize,
    name: String,
}

impl ColumnMap {
    /// Build a column map from a header line.
    ///
    /// When several fields share a name, the first one declared wins. The
    /// same holds when several field names contain `date`.
    pub fn from_header(header: &str, fields: &[FieldDescriptor]) -> ColumnMap {
        let date_field = fields
            .iter()
            .position(|f| f.name().to_lowercase().contains("date"));

        let mut map = ColumnMap::default();
        for (i, token) in Cells::new(header, DELIMITER).enumerate() {
            map.header_len += 1;

            let normalized: String =
                token.chars().filter(|&c| c != ' ').collect();
            let exact = fields.iter().position(|f| f.name() == normalized);
            let found = match exact {
                Some(field) => Some(field),
                None if normalized.to_lowercase().contains("date") => {
                    date_field
                }
                None => None,
            };
            match found {
                Some(field) => {
                    let name = fields[field].name().to_string();
                    map.columns.insert(i, Column { field, name });
                }
                None => trace!(column = i, header = token, "unmapped column"),
            }
        }
        debug!(
            mapped = map.columns.len(),
            columns = map.header_len,
            "built column map"
        );
        map
    }

    /// Return the name of the field that column `i` maps to.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.columns.get(&i).map(|c| c.name.as_str())
    }

    /// Return the declaration index of the field that column `i` maps to.
    pub fn field_index(&self, i: usize) -> Option<usize> {
        self.columns.get(&i).map(|c| c.field)
    }

    /// Returns true if and only if column `i` maps to a field.
    pub fn contains(&self, i: usize) -> bool {
        self.columns.contains_key(&i)
    }

    /// Returns the number of mapped columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if and only if no column is mapped.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the number of columns in the header this map was built from.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Returns an iterator over mapped columns and their field names, in
    /// column order.
    pub fn iter(&self) -> ColumnMapIter {
        ColumnMapIter(self.columns.iter())
    }
}

impl<'a> IntoIterator for &'a ColumnMap {
    type IntoIter = ColumnMapIter<'a>;
    type Item = (usize, &'a str);

    fn into_iter(self) -> ColumnMapIter<'a> {
        self.iter()
    }
}

/// An iterator over the mapped columns of a `ColumnMap`.
#[derive(Clone, Debug)]
pub struct ColumnMapIter<'a>(btree_map::Iter<'a, usize, Column>);

impl<'a> Iterator for ColumnMapIter<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<(usize, &'a str)> {
        self.0.next().map(|(&i, c)| (i, c.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use crate::shape::FieldDescriptor;
    use crate::value::PrimitiveKind::{self, *};

    use super::ColumnMap;

    fn fields(spec: &[(&str, PrimitiveKind)]) -> Vec<FieldDescriptor> {
        spec.iter().map(|&(n, k)| FieldDescriptor::new(n, k)).collect()
    }

    fn mapped(map: &ColumnMap) -> Vec<(usize, &str)> {
        map.iter().collect()
    }

    #[test]
    fn exact() {
        let f = fields(&[("A", Integer), ("B", Integer)]);
        let map = ColumnMap::from_header("A,B", &f);
        assert_eq!(mapped(&map), vec![(0, "A"), (1, "B")]);
        assert_eq!(map.field_index(1), Some(1));
    }

    #[test]
    fn spaces_removed() {
        let f = fields(&[("FirstName", Text), ("LastName", Text)]);
        let map = ColumnMap::from_header("First Name, Last Name ", &f);
        assert_eq!(mapped(&map), vec![(0, "FirstName"), (1, "LastName")]);
    }

    #[test]
    fn case_sensitive() {
        let f = fields(&[("Name", Text)]);
        let map = ColumnMap::from_header("name,NAME", &f);
        assert!(map.is_empty());
    }

    #[test]
    fn only_spaces_removed() {
        let f = fields(&[("Name", Text)]);
        let map = ColumnMap::from_header("\tName", &f);
        assert!(map.is_empty());
    }

    #[test]
    fn out_of_order() {
        let f = fields(&[("A", Integer), ("B", Integer)]);
        let map = ColumnMap::from_header("B,A", &f);
        assert_eq!(mapped(&map), vec![(0, "B"), (1, "A")]);
        assert_eq!(map.field_index(0), Some(1));
    }

    #[test]
    fn unmapped_ignored() {
        let f = fields(&[("A", Integer), ("B", Integer)]);
        let map = ColumnMap::from_header("A,B,Unknown", &f);
        assert_eq!(mapped(&map), vec![(0, "A"), (1, "B")]);
        assert!(!map.contains(2));
        assert_eq!(map.header_len(), 3);
    }

    #[test]
    fn fewer_columns_than_fields() {
        let f = fields(&[("A", Integer), ("B", Integer), ("C", Text)]);
        let map = ColumnMap::from_header("C", &f);
        assert_eq!(mapped(&map), vec![(0, "C")]);
    }

    #[test]
    fn date_fallback() {
        let f = fields(&[("Id", Integer), ("InvoiceDate", DateTime)]);
        let map = ColumnMap::from_header("Id,Billing Date", &f);
        assert_eq!(mapped(&map), vec![(0, "Id"), (1, "InvoiceDate")]);
    }

    #[test]
    fn date_fallback_case_insensitive() {
        let f = fields(&[("shipdate", Text)]);
        let map = ColumnMap::from_header("DATE", &f);
        assert_eq!(mapped(&map), vec![(0, "shipdate")]);
    }

    #[test]
    fn date_fallback_needs_date_field() {
        let f = fields(&[("Id", Integer), ("When", DateTime)]);
        let map = ColumnMap::from_header("Id,Billing Date", &f);
        assert_eq!(mapped(&map), vec![(0, "Id")]);
    }

    #[test]
    fn date_exact_match_wins() {
        let f = fields(&[("InvoiceDate", DateTime), ("DueDate", DateTime)]);
        let map = ColumnMap::from_header("Due Date,Invoice Date", &f);
        assert_eq!(mapped(&map), vec![(0, "DueDate"), (1, "InvoiceDate")]);
    }

    #[test]
    fn date_fallback_first_declared() {
        let f = fields(&[
            ("Name", Text),
            ("ShipDate", DateTime),
            ("OrderDate", DateTime),
        ]);
        let map = ColumnMap::from_header("Updated Date,Created Date", &f);
        assert_eq!(mapped(&map), vec![(0, "ShipDate"), (1, "ShipDate")]);
    }

    #[test]
    fn duplicate_field_names_first_declared() {
        let f = fields(&[("A", Integer), ("A", Text)]);
        let map = ColumnMap::from_header("A", &f);
        assert_eq!(map.field_index(0), Some(0));
    }

    #[test]
    fn iter_debug() {
        let f = fields(&[("A", Integer)]);
        let map = ColumnMap::from_header("A", &f);
        let it = map.iter();
        assert!(format!("{:?}", it).contains("\"A\""));
        assert_eq!(it.clone().count(), 1);
    }

    #[test]
    fn empty_header() {
        let f = fields(&[("A", Integer)]);
        let map = ColumnMap::from_header("", &f);
        assert!(map.is_empty());
        assert_eq!(map.header_len(), 1);
    }

    #[test]
    fn empty_fields() {
        let map = ColumnMap::from_header("A,B", &[]);
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }
}
