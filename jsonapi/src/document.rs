use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Top-level members of a JSON:API document, kept in insertion order.
///
/// Serializers produce a `Document`; the handlers then complete it with
/// `set_if_absent` so that members provided by a serializer always win.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    members: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a member, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.members.insert(key.into(), value);
        self
    }

    /// Appends a member unless it already exists. Returns the stored value.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: Value) -> &mut Value {
        self.members.entry(key.into()).or_insert(value)
    }

    /// Adds `links.<name>` unless already present. A `links` object is
    /// created if the document has none yet.
    pub fn set_link_if_absent(&mut self, name: &str, href: impl Into<String>) {
        let links = self.set_if_absent("links", Value::Object(Map::new()));
        if let Value::Object(links) = links {
            links
                .entry(name)
                .or_insert_with(|| Value::String(href.into()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}
