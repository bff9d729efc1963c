use crate::resource::{Identifier, Linkage, Resource};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Base URL must be an http(s) URL: {0}")]
    InvalidBaseUrl(Url),

    #[error("Empty type name")]
    EmptyTypeName,

    #[error("Duplicate type name: {0}")]
    DuplicateType(String),

    #[error("Type {typename} extends {base}, which is not declared before it")]
    UnknownBaseType { typename: String, base: String },

    #[error("Type {typename} declares relationship {relname} more than once")]
    DuplicateRelationship { typename: String, relname: String },

    #[error("Resource {0} has an unknown type")]
    UnknownResourceType(String),

    #[error("Resource of type {0} has an empty id")]
    EmptyResourceId(String),

    #[error("Duplicate resource, the id is already used in its type family: {0}")]
    DuplicateResource(String),

    #[error("Resource {resource} sets undeclared relationship {relname}")]
    UnknownRelationship { resource: String, relname: String },

    #[error("Resource {resource} sets relationship {relname} with the wrong cardinality")]
    LinkageCardinality { resource: String, relname: String },
}

/// Service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for incoming requests
    pub listener: Listener,
    /// API-wide settings
    pub api: ApiConfig,
    /// Resource types, base types must be listed before their subtypes
    #[serde(default)]
    pub types: Vec<TypeConfig>,
    /// Resources loaded into the in-memory store on startup
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.api.validate()?;

        // Relationships by type, including inherited ones
        let mut declared: HashMap<&str, HashMap<&str, bool>> = HashMap::new();
        // Topmost base type of every type; ids are unique per family
        let mut roots: HashMap<&str, &str> = HashMap::new();
        for type_config in &self.types {
            if type_config.name.is_empty() {
                return Err(ValidationError::EmptyTypeName);
            }
            if declared.contains_key(type_config.name.as_str()) {
                return Err(ValidationError::DuplicateType(type_config.name.clone()));
            }

            let mut relationships = match &type_config.base {
                Some(base) => declared.get(base.as_str()).cloned().ok_or_else(|| {
                    ValidationError::UnknownBaseType {
                        typename: type_config.name.clone(),
                        base: base.clone(),
                    }
                })?,
                None => HashMap::new(),
            };

            let mut own = HashSet::new();
            for relationship in &type_config.relationships {
                if !own.insert(relationship.name.as_str()) {
                    return Err(ValidationError::DuplicateRelationship {
                        typename: type_config.name.clone(),
                        relname: relationship.name.clone(),
                    });
                }
                relationships.insert(relationship.name.as_str(), relationship.to_many);
            }

            let root = match &type_config.base {
                Some(base) => roots.get(base.as_str()).copied().unwrap_or(base.as_str()),
                None => type_config.name.as_str(),
            };
            roots.insert(type_config.name.as_str(), root);
            declared.insert(type_config.name.as_str(), relationships);
        }

        let mut seen = HashSet::new();
        for resource in &self.resources {
            let key = format!("{}/{}", resource.typename, resource.id);
            let Some(relationships) = declared.get(resource.typename.as_str()) else {
                return Err(ValidationError::UnknownResourceType(key));
            };
            if resource.id.is_empty() {
                return Err(ValidationError::EmptyResourceId(resource.typename.clone()));
            }

            for (relname, linkage) in &resource.relationships {
                let Some(&to_many) = relationships.get(relname.as_str()) else {
                    return Err(ValidationError::UnknownRelationship {
                        resource: key,
                        relname: relname.clone(),
                    });
                };
                if to_many != matches!(linkage, LinkageConfig::ToMany(_)) {
                    return Err(ValidationError::LinkageCardinality {
                        resource: key,
                        relname: relname.clone(),
                    });
                }
            }

            let root = roots
                .get(resource.typename.as_str())
                .copied()
                .unwrap_or(resource.typename.as_str());
            if !seen.insert((root, resource.id.as_str())) {
                return Err(ValidationError::DuplicateResource(key));
            }
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

fn default_jsonapi_version() -> String {
    "1.0".to_string()
}

/// API-wide settings
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Public URL the API is served under. Links in responses are built
    /// from it and its path is the mount point of all endpoints.
    pub base_url: Url,
    /// `jsonapi.version` of every response document
    #[serde(default = "default_jsonapi_version")]
    pub jsonapi_version: String,
    /// Optional `jsonapi.meta` of every response document
    #[serde(default)]
    pub jsonapi_meta: Option<JsonValue>,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base() {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }
}

/// A resource type
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TypeConfig {
    pub name: String,
    /// Base type for polymorphic collections; the type inherits its relationships
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RelationshipConfig {
    pub name: String,
    #[serde(default)]
    pub to_many: bool,
}

/// A resource to seed the store with
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub typename: String,
    pub id: String,
    #[serde(default)]
    pub relationships: IndexMap<String, LinkageConfig>,
}

/// Relationship linkage of a seeded resource: a list for to-many
/// relationships, an identifier or null for to-one relationships.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LinkageConfig {
    ToMany(Vec<Identifier>),
    ToOne(Option<Identifier>),
}

impl From<&ResourceConfig> for Resource {
    fn from(config: &ResourceConfig) -> Self {
        let mut resource = Resource::new(&config.typename, &config.id);
        for (relname, linkage) in &config.relationships {
            let linkage = match linkage {
                LinkageConfig::ToMany(identifiers) => Linkage::ToMany(identifiers.clone()),
                LinkageConfig::ToOne(identifier) => Linkage::ToOne(identifier.clone()),
            };
            resource.set_linkage(relname, linkage);
        }
        resource
    }
}
