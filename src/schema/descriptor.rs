use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::{FieldDescriptor, FieldSpec, FieldType, FieldValue};
use crate::error::{MarshalError, MarshalResult};

/// A host type that can be marshaled to and from flat files.
///
/// `declare` is called once per [`SchemaRegistry`](super::SchemaRegistry)
/// to build the type's schema; mapping starts every record from `Default`.
pub trait Record: Default + Send + Sync + 'static {
    fn declare(schema: &mut SchemaBuilder<Self>);
}

type Reader<T> = Box<dyn Fn(&T) -> FieldValue + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, FieldValue) -> bool + Send + Sync>;

/// A field descriptor bound to the accessors of a concrete record type.
pub struct BoundField<T> {
    descriptor: FieldDescriptor,
    read: Reader<T>,
    write: Writer<T>,
}

impl<T> BoundField<T> {
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Current value of the member on `record`.
    pub fn read(&self, record: &T) -> FieldValue {
        (self.read)(record)
    }

    /// Store `value` on `record`; `false` if the value does not fit the member type.
    pub fn write(&self, record: &mut T, value: FieldValue) -> bool {
        (self.write)(record, value)
    }
}

impl<T> fmt::Debug for BoundField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Collects field declarations for a record type.
pub struct SchemaBuilder<T> {
    fields: Vec<BoundField<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    pub(crate) fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare a member. Its kind and nullability come from `F`.
    pub fn field<F: FieldType>(
        &mut self,
        spec: FieldSpec,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let descriptor = FieldDescriptor::new(spec, F::KIND, F::NULLABLE);
        self.fields.push(BoundField {
            descriptor,
            read: Box::new(move |record| get(record).to_value()),
            write: Box::new(move |record, value| match F::from_value(value) {
                Some(v) => {
                    *get_mut(record) = v;
                    true
                }
                None => false,
            }),
        });
        self
    }

    /// Sort by id, index, and reject duplicate ids.
    pub(crate) fn build(self) -> MarshalResult<SchemaDescriptor<T>> {
        let record = type_name::<T>();
        let mut fields = self.fields;
        fields.sort_by_key(|f| f.descriptor.id());

        let mut by_id = BTreeMap::new();
        let mut by_name = HashMap::new();
        for (idx, field) in fields.iter().enumerate() {
            let id = field.descriptor.id();
            if by_id.insert(id, idx).is_some() {
                return Err(MarshalError::schema(
                    record,
                    format!("duplicate field id {id}"),
                ));
            }
            if let Some(name) = field.descriptor.name() {
                by_name.insert(name.to_string(), idx);
            }
        }

        Ok(SchemaDescriptor {
            record,
            fields,
            by_id,
            by_name,
        })
    }
}

/// The immutable, indexed field set of one record type.
///
/// Fields are ordered by id. A type that declares no fields has an empty
/// schema; mapping against it yields default records.
pub struct SchemaDescriptor<T> {
    record: &'static str,
    fields: Vec<BoundField<T>>,
    by_id: BTreeMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl<T: Record> SchemaDescriptor<T> {
    /// Build a schema directly, bypassing any registry cache.
    pub fn build() -> MarshalResult<Self> {
        let mut builder = SchemaBuilder::new();
        T::declare(&mut builder);
        builder.build()
    }
}

impl<T> SchemaDescriptor<T> {
    /// Type name of the record this schema describes.
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    /// All fields in id order.
    pub fn fields(&self) -> &[BoundField<T>] {
        &self.fields
    }

    pub fn field(&self, id: u32) -> Option<&BoundField<T>> {
        self.by_id.get(&id).map(|&idx| &self.fields[idx])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&BoundField<T>> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> fmt::Debug for SchemaDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("record", &self.record)
            .field("fields", &self.fields)
            .finish()
    }
}
