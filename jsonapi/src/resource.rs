//! The resource model shared by the registry, the persistence gateway and
//! the (un)serializers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A JSON:API resource identifier object (`{"type": ..., "id": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub typename: String,
    pub id: String,
}

impl Identifier {
    pub fn new(typename: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.typename, self.id)
    }
}

/// The linkage currently stored for one relationship of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    ToOne(Option<Identifier>),
    ToMany(Vec<Identifier>),
}

impl Linkage {
    /// The empty linkage for a relationship of the given cardinality.
    pub fn empty(to_many: bool) -> Self {
        if to_many {
            Linkage::ToMany(Vec::new())
        } else {
            Linkage::ToOne(None)
        }
    }

    /// Renders the linkage as the `data` member of a relationship object.
    pub fn to_data(&self) -> Value {
        match self {
            Linkage::ToOne(None) => Value::Null,
            Linkage::ToOne(Some(identifier)) => identifier_to_value(identifier),
            Linkage::ToMany(identifiers) => {
                Value::Array(identifiers.iter().map(identifier_to_value).collect())
            }
        }
    }
}

fn identifier_to_value(identifier: &Identifier) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("type".into(), Value::String(identifier.typename.clone()));
    object.insert("id".into(), Value::String(identifier.id.clone()));
    Value::Object(object)
}

/// The relationship linkage of a stored record, tagged with its concrete
/// type.
///
/// The type tag is the resource's *actual* type, which may be a subtype of
/// the type a client addressed it by.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    typename: String,
    id: String,
    relationships: IndexMap<String, Linkage>,
}

impl Resource {
    pub fn new(typename: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            typename: typename.into(),
            id: id.into(),
            relationships: IndexMap::new(),
        }
    }

    /// Builder style helper to set a relationship linkage.
    pub fn with_linkage(mut self, relname: impl Into<String>, linkage: Linkage) -> Self {
        self.relationships.insert(relname.into(), linkage);
        self
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The stored linkage, `None` if the relationship was never set.
    pub fn linkage(&self, relname: &str) -> Option<&Linkage> {
        self.relationships.get(relname)
    }

    pub fn set_linkage(&mut self, relname: impl Into<String>, linkage: Linkage) {
        self.relationships.insert(relname.into(), linkage);
    }
}
