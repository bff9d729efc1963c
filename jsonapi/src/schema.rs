//! Type registry: which types exist, which relationships they declare, and
//! how polymorphic types relate to their base type.

use crate::resource::Resource;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Type is already registered: {0}")]
    DuplicateType(String),

    #[error("Type {typename} extends unregistered base type {base}")]
    UnknownBaseType { typename: String, base: String },
}

/// A relationship declared on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    pub name: String,
    pub to_many: bool,
}

impl RelationshipDescriptor {
    pub fn to_one(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            to_many: false,
        }
    }

    pub fn to_many(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            to_many: true,
        }
    }
}

/// The schema of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    typename: String,
    base: Option<String>,
    pub relationships: IndexMap<String, RelationshipDescriptor>,
}

impl Schema {
    pub fn new(typename: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            base: None,
            relationships: IndexMap::new(),
        }
    }

    /// Marks this type as a subtype of `base`. Registration merges the
    /// relationships of the base type into this schema.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn relationship(mut self, descriptor: RelationshipDescriptor) -> Self {
        self.relationships
            .insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }
}

#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema. Base types must be registered before their subtypes.
    pub fn register(&mut self, mut schema: Schema) -> Result<Arc<Schema>, SchemaError> {
        if self.schemas.contains_key(&schema.typename) {
            return Err(SchemaError::DuplicateType(schema.typename));
        }

        if let Some(base) = &schema.base {
            let Some(base_schema) = self.schemas.get(base) else {
                return Err(SchemaError::UnknownBaseType {
                    typename: schema.typename,
                    base: base.clone(),
                });
            };

            // Inherited relationships come first, own declarations override them
            let mut relationships = base_schema.relationships.clone();
            relationships.extend(schema.relationships);
            schema.relationships = relationships;
        }

        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.typename.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    pub fn has_type(&self, typename: &str) -> bool {
        self.schemas.contains_key(typename)
    }

    pub fn schema(&self, typename: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(typename)
    }

    /// The actual type of a resource.
    pub fn typename_of<'r>(&self, resource: &'r Resource) -> &'r str {
        resource.typename()
    }

    /// Returns true if `typename` is `ancestor` or (transitively) extends it.
    pub fn is_a(&self, typename: &str, ancestor: &str) -> bool {
        let mut current = Some(typename);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.schemas.get(name).and_then(|schema| schema.base());
        }
        false
    }

    /// All registered types that are `typename` or one of its subtypes, in
    /// registration order.
    pub fn family<'a>(&'a self, typename: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.schemas
            .keys()
            .map(String::as_str)
            .filter(move |name| self.is_a(name, typename))
    }
}
