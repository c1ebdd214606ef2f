use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::value::{PrimitiveKind, Value};

/// The name and kind of a single record field.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    name: String,
    kind: PrimitiveKind,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new<S: Into<String>>(
        name: S,
        kind: PrimitiveKind,
    ) -> FieldDescriptor {
        FieldDescriptor { name: name.into(), kind }
    }

    /// The name of this field, as matched against CSV headers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind of this field.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }
}

/// Assigns a value to one field of a record.
///
/// A setter hands back the value it was given if it cannot store a value of
/// that kind.
type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), Value> + Send + Sync>;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

macro_rules! typed_field {
    ($(#[$doc:meta])* $method:ident, $ty:ty, $kind:ident) => {
        $(#[$doc])*
        pub fn $method<S, F>(self, name: S, set: F) -> Shape<T>
        where
            S: Into<String>,
            F: Fn(&mut T, $ty) + Send + Sync + 'static,
        {
            self.field(name, PrimitiveKind::$kind, move |record, value| {
                match value {
                    Value::$kind(v) => {
                        set(record, v);
                        Ok(())
                    }
                    other => Err(other),
                }
            })
        }
    };
}

/// The shape of a record: its fields, how to set them and how to create a
/// fresh record.
///
/// A shape stands in for runtime reflection. It is built once and then
/// shared by every parse that produces records of type `T`. Fields are
/// enumerated in declaration order, which is also the order used to break
/// ties when matching headers.
///
/// # Example
///
/// ```
/// use csvmap::Shape;
///
/// #[derive(Debug, Default)]
/// struct Order {
///     id: i32,
///     name: String,
/// }
///
/// let shape = Shape::<Order>::new()
///     .integer("Id", |o, v| o.id = v)
///     .text("Name", |o, v| o.name = v);
///
/// assert_eq!(shape.len(), 2);
/// assert_eq!(shape.descriptors()[1].name(), "Name");
/// ```
pub struct Shape<T> {
    descriptors: Vec<FieldDescriptor>,
    setters: Vec<Setter<T>>,
    factory: Factory<T>,
}

impl<T: Default + 'static> Shape<T> {
    /// Create a shape without fields whose records start as `T::default()`.
    pub fn new() -> Shape<T> {
        Shape::with_factory(T::default)
    }
}

impl<T: Default + 'static> Default for Shape<T> {
    fn default() -> Shape<T> {
        Shape::new()
    }
}

impl<T> Shape<T> {
    /// Create a shape without fields whose records are created by `factory`.
    pub fn with_factory<F>(factory: F) -> Shape<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Shape {
            descriptors: vec![],
            setters: vec![],
            factory: Box::new(factory),
        }
    }

    /// Add a field with a setter that receives raw values.
    ///
    /// The setter must return the value back as an error if it cannot store
    /// it. The typed methods (`text`, `integer`, `decimal` and `datetime`)
    /// are usually more convenient.
    pub fn field<S, F>(
        mut self,
        name: S,
        kind: PrimitiveKind,
        set: F,
    ) -> Shape<T>
    where
        S: Into<String>,
        F: Fn(&mut T, Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        self.descriptors.push(FieldDescriptor::new(name, kind));
        self.setters.push(Box::new(set));
        self
    }

    typed_field!(
        /// Add a text field.
        text, String, Text
    );

    typed_field!(
        /// Add an integer field.
        integer, i32, Integer
    );

    typed_field!(
        /// Add a decimal field.
        decimal, Decimal, Decimal
    );

    typed_field!(
        /// Add a date and time field.
        datetime, NaiveDateTime, DateTime
    );

    /// The fields of this shape in declaration order.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Returns the number of fields in this shape.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if and only if this shape has no fields.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the index of the first field with the given name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.name() == name)
    }

    /// Create a fresh record.
    pub(crate) fn create(&self) -> T {
        (self.factory)()
    }

    /// Assign `value` to the field at `index`.
    ///
    /// `index` must be in bounds.
    pub(crate) fn assign(
        &self,
        index: usize,
        record: &mut T,
        value: Value,
    ) -> Result<(), Value> {
        (self.setters[index])(record, value)
    }
}

impl Shape<Row> {
    /// Create a shape producing dynamic rows with the given fields.
    ///
    /// This is useful when the set of fields is only known at runtime, for
    /// example when it is read from a configuration file. Unlike typed
    /// setters, a row accepts a value of any kind for any field.
    pub fn dynamic<I>(descriptors: I) -> Shape<Row>
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        descriptors.into_iter().fold(Shape::new(), |shape, d| {
            let name = d.name().to_string();
            shape.field(d.name(), d.kind(), move |row: &mut Row, value| {
                row.insert(name.clone(), value);
                Ok(())
            })
        })
    }
}

impl<T> fmt::Debug for Shape<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Shape").field("fields", &self.descriptors).finish()
    }
}

/// A record whose fields are only known at runtime.
///
/// Rows are produced by shapes created with `Shape::dynamic`. Fields that
/// were never assigned are absent.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    /// Create a new empty row.
    pub fn new() -> Row {
        Row::default()
    }

    /// Return the value of the named field, if it was assigned.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set the named field, returning its previous value.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        value: Value,
    ) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Returns the number of assigned fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if and only if no field was assigned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over assigned fields, ordered by name.
    pub fn iter(&self) -> btree_map::Iter<String, Value> {
        self.0.iter()
    }

    /// Unwrap this row into its underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = btree_map::Iter<'a, String, Value>;
    type Item = (&'a String, &'a Value);

    fn into_iter(self) -> btree_map::Iter<'a, String, Value> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::value::{PrimitiveKind, Value};

    use super::{FieldDescriptor, Row, Shape};

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: i32,
        name: String,
        price: Decimal,
    }

    fn item_shape() -> Shape<Item> {
        Shape::new()
            .integer("Id", |r: &mut Item, v| r.id = v)
            .text("Name", |r: &mut Item, v| r.name = v)
            .decimal("Price", |r: &mut Item, v| r.price = v)
    }

    #[test]
    fn descriptors_in_order() {
        let shape = item_shape();
        let got: Vec<(&str, PrimitiveKind)> =
            shape.descriptors().iter().map(|d| (d.name(), d.kind())).collect();
        assert_eq!(
            got,
            vec![
                ("Id", PrimitiveKind::Integer),
                ("Name", PrimitiveKind::Text),
                ("Price", PrimitiveKind::Decimal),
            ]
        );
        assert_eq!(shape.position("Name"), Some(1));
        assert_eq!(shape.position("name"), None);
    }

    #[test]
    fn typed_setters() {
        let shape = item_shape();
        let mut item = shape.create();
        shape.assign(0, &mut item, Value::Integer(5)).unwrap();
        shape.assign(1, &mut item, Value::from("bolt")).unwrap();
        let price = Value::Decimal(Decimal::new(15, 1));
        shape.assign(2, &mut item, price).unwrap();
        assert_eq!(
            item,
            Item { id: 5, name: "bolt".into(), price: Decimal::new(15, 1) }
        );
    }

    #[test]
    fn typed_setter_rejects_other_kinds() {
        let shape = item_shape();
        let mut item = shape.create();
        let got = shape.assign(1, &mut item, Value::Integer(5));
        assert_eq!(got, Err(Value::Integer(5)));
        assert_eq!(item, Item::default());
    }

    #[test]
    fn custom_factory() {
        let shape = Shape::with_factory(|| Item {
            name: "unnamed".into(),
            ..Item::default()
        });
        assert_eq!(shape.create().name, "unnamed");
        assert!(shape.is_empty());
    }

    #[test]
    fn dynamic_rows_accept_any_kind() {
        let shape = Shape::dynamic(vec![
            FieldDescriptor::new("A", PrimitiveKind::Integer),
            FieldDescriptor::new("B", PrimitiveKind::Text),
        ]);
        let mut row = shape.create();
        assert!(row.is_empty());
        shape.assign(0, &mut row, Value::Integer(1)).unwrap();
        shape.assign(1, &mut row, Value::Integer(2)).unwrap();

        let mut want = Row::new();
        want.insert("A", Value::Integer(1));
        want.insert("B", Value::Integer(2));
        assert_eq!(row, want);
        assert_eq!(row.get("A"), Some(&Value::Integer(1)));
        assert_eq!(row.get("C"), None);
    }
}
