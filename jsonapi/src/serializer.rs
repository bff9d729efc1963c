use crate::document::Document;
use crate::resource::{Linkage, Resource};
use crate::schema::Schema;
use std::sync::Arc;

/// Renders the relationships of one type.
pub trait Serializer: Send + Sync {
    /// Renders the relationship `relname` of `resource` as a document
    /// fragment. The fragment contains at least a `data` member.
    fn serialize_relationship(&self, resource: &Resource, relname: &str) -> Document;
}

/// Serializer rendering the linkage stored on a [`Resource`].
///
/// Relationships that were never set render as empty linkage of the
/// declared cardinality.
pub struct LinkageSerializer {
    schema: Arc<Schema>,
}

impl LinkageSerializer {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl Serializer for LinkageSerializer {
    fn serialize_relationship(&self, resource: &Resource, relname: &str) -> Document {
        let data = match resource.linkage(relname) {
            Some(linkage) => linkage.to_data(),
            None => {
                let to_many = self
                    .schema
                    .relationships
                    .get(relname)
                    .is_some_and(|relationship| relationship.to_many);
                Linkage::empty(to_many).to_data()
            }
        };

        let mut document = Document::new();
        document.insert("data", data);
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Identifier;
    use crate::schema::RelationshipDescriptor;
    use serde_json::json;

    fn serializer() -> LinkageSerializer {
        LinkageSerializer::new(Arc::new(
            Schema::new("articles")
                .relationship(RelationshipDescriptor::to_one("author"))
                .relationship(RelationshipDescriptor::to_many("comments")),
        ))
    }

    #[test]
    fn test_serialize_stored_linkage() {
        let article = Resource::new("articles", "1")
            .with_linkage(
                "author",
                Linkage::ToOne(Some(Identifier::new("people", "9"))),
            )
            .with_linkage(
                "comments",
                Linkage::ToMany(vec![Identifier::new("comments", "5")]),
            );

        let document = serializer().serialize_relationship(&article, "author");
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!({"data": {"type": "people", "id": "9"}})
        );

        let document = serializer().serialize_relationship(&article, "comments");
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!({"data": [{"type": "comments", "id": "5"}]})
        );
    }

    #[test]
    fn test_serialize_unset_linkage() {
        let article = Resource::new("articles", "1");

        let document = serializer().serialize_relationship(&article, "author");
        assert_eq!(document.get("data"), Some(&json!(null)));

        let document = serializer().serialize_relationship(&article, "comments");
        assert_eq!(document.get("data"), Some(&json!([])));
    }
}
