use crate::config::{ApiConfig, TypeConfig};
use crate::document::Document;
use crate::errors::Result;
use crate::resource::Resource;
use crate::schema::{RelationshipDescriptor, Schema, SchemaError, TypeRegistry};
use crate::serializer::{LinkageSerializer, Serializer};
use crate::unserializer::{LinkageUnserializer, Unserializer};
use hyper::body::Bytes;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Endpoints that can be reversed into URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/{type}/{id}/relationships/{relname}`
    Relationship,
    /// `/{type}/{id}/{relname}`
    Related,
}

struct TypeEntry {
    serializer: Arc<dyn Serializer>,
    unserializer: Arc<dyn Unserializer>,
}

/// The registered types with their (un)serializers, plus the API-wide
/// settings the handlers need: base URL and the `jsonapi` object.
pub struct Api {
    registry: TypeRegistry,
    types: HashMap<String, TypeEntry>,
    base_url: Url,
    jsonapi_object: Value,
}

impl Api {
    pub fn new(base_url: Url, jsonapi_object: Value) -> Self {
        Self {
            registry: TypeRegistry::new(),
            types: HashMap::new(),
            base_url,
            jsonapi_object,
        }
    }

    /// Builds the API from configuration. Types are registered in the order
    /// they are listed.
    pub fn from_config(api: &ApiConfig, types: &[TypeConfig]) -> Result<Self, SchemaError> {
        let mut jsonapi_object = Map::new();
        jsonapi_object.insert(
            "version".to_owned(),
            Value::String(api.jsonapi_version.clone()),
        );
        if let Some(meta) = &api.jsonapi_meta {
            jsonapi_object.insert("meta".to_owned(), meta.clone());
        }

        let mut this = Self::new(api.base_url.clone(), Value::Object(jsonapi_object));
        for type_config in types {
            let mut schema = Schema::new(&type_config.name);
            if let Some(base) = &type_config.base {
                schema = schema.extends(base);
            }
            for relationship in &type_config.relationships {
                schema = schema.relationship(RelationshipDescriptor {
                    name: relationship.name.clone(),
                    to_many: relationship.to_many,
                });
            }
            this.add_type(schema)?;
        }
        Ok(this)
    }

    /// Registers a type using the linkage (un)serializers.
    pub fn add_type(&mut self, schema: Schema) -> Result<(), SchemaError> {
        let schema = self.registry.register(schema)?;
        self.types.insert(
            schema.typename().to_owned(),
            TypeEntry {
                serializer: Arc::new(LinkageSerializer::new(Arc::clone(&schema))),
                unserializer: Arc::new(LinkageUnserializer::new(Arc::clone(&schema))),
            },
        );
        Ok(())
    }

    /// Registers a type with custom (un)serializers.
    pub fn add_type_with(
        &mut self,
        schema: Schema,
        serializer: Arc<dyn Serializer>,
        unserializer: Arc<dyn Unserializer>,
    ) -> Result<(), SchemaError> {
        let schema = self.registry.register(schema)?;
        self.types.insert(
            schema.typename().to_owned(),
            TypeEntry {
                serializer,
                unserializer,
            },
        );
        Ok(())
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn has_type(&self, typename: &str) -> bool {
        self.registry.has_type(typename)
    }

    pub fn typename_of<'r>(&self, resource: &'r Resource) -> &'r str {
        self.registry.typename_of(resource)
    }

    pub fn schema(&self, typename: &str) -> Option<&Arc<Schema>> {
        self.registry.schema(typename)
    }

    pub fn serializer(&self, typename: &str) -> Option<&dyn Serializer> {
        self.types.get(typename).map(|entry| entry.serializer.as_ref())
    }

    pub fn unserializer(&self, typename: &str) -> Option<&dyn Unserializer> {
        self.types
            .get(typename)
            .map(|entry| entry.unserializer.as_ref())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API-wide `jsonapi` object, e.g. `{"version": "1.0"}`.
    pub fn jsonapi_object(&self) -> &Value {
        &self.jsonapi_object
    }

    /// Builds the absolute URL of an endpoint below the base URL. Path
    /// segments are percent-encoded.
    pub fn reverse_url(&self, typename: &str, endpoint: Endpoint, id: &str, relname: &str) -> String {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(typename).push(id);
            if endpoint == Endpoint::Relationship {
                segments.push("relationships");
            }
            segments.push(relname);
        }
        url.into()
    }

    pub fn dump_json(&self, document: &Document) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(document)?))
    }
}
