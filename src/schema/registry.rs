use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{Record, SchemaDescriptor};
use crate::error::{MarshalError, MarshalResult};

/// Stable runtime identifier of a record type, used as the cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

type ErasedSchema = Arc<dyn Any + Send + Sync>;

/// Build-once cache of [`SchemaDescriptor`]s keyed by record type.
///
/// Schemas are built outside the lock and published with a single
/// insert-if-absent, so a caller never sees a half-built schema. When two
/// threads race on the first build, the loser's copy is dropped and both get
/// the published `Arc`. Entries are never evicted.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeTag, ErasedSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached schema for `T`, building it on first use.
    ///
    /// # Errors
    /// Returns [`MarshalError::Schema`] if `T` declares a field id twice.
    /// Nothing is cached in that case.
    pub fn schema<T: Record>(&self) -> MarshalResult<Arc<SchemaDescriptor<T>>> {
        let tag = TypeTag::of::<T>();
        let cached = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag)
            .cloned();
        if let Some(erased) = cached {
            return downcast::<T>(erased, tag);
        }

        let built: ErasedSchema = Arc::new(SchemaDescriptor::<T>::build()?);
        let published = {
            let mut lock = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
            lock.entry(tag).or_insert(built).clone()
        };
        debug!(record = tag.name, "published record schema");
        downcast::<T>(published, tag)
    }

    /// Schema for positional (field id) mapping. Same instance as [`schema_by_name`](Self::schema_by_name).
    pub fn schema_by_position<T: Record>(&self) -> MarshalResult<Arc<SchemaDescriptor<T>>> {
        self.schema::<T>()
    }

    /// Schema for header-name mapping. Same instance as [`schema_by_position`](Self::schema_by_position).
    pub fn schema_by_name<T: Record>(&self) -> MarshalResult<Arc<SchemaDescriptor<T>>> {
        self.schema::<T>()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeTag::of::<T>())
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Record>(erased: ErasedSchema, tag: TypeTag) -> MarshalResult<Arc<SchemaDescriptor<T>>> {
    erased
        .downcast::<SchemaDescriptor<T>>()
        .map_err(|_| MarshalError::schema(tag.name, "cached schema has a different record type"))
}
