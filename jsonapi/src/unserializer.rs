use crate::db::Session;
use crate::errors::{JsonApiError, Result};
use crate::resource::{Identifier, Linkage, Resource};
use crate::schema::{RelationshipDescriptor, Schema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Applies relationship objects submitted by clients to resources.
///
/// Payloads have already passed
/// [`assert_relationship_object`](crate::validators::assert_relationship_object).
#[async_trait]
pub trait Unserializer: Send + Sync {
    /// Adds the submitted identifiers to a to-many relationship, keeping the
    /// current members.
    async fn extend_relationship(
        &self,
        session: &dyn Session,
        resource: &mut Resource,
        relname: &str,
        relationship_object: &Value,
    ) -> Result<()>;

    /// Replaces the linkage of a relationship with the submitted one.
    async fn update_relationship(
        &self,
        session: &dyn Session,
        resource: &mut Resource,
        relname: &str,
        relationship_object: &Value,
    ) -> Result<()>;

    /// Removes all linkage of a relationship.
    fn clear_relationship(&self, resource: &mut Resource, relname: &str);
}

/// Unserializer writing linkage onto a [`Resource`].
///
/// Every submitted identifier must refer to an existing resource, otherwise
/// the request fails with `NotFound` and the resource is left untouched.
pub struct LinkageUnserializer {
    schema: Arc<Schema>,
}

impl LinkageUnserializer {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    fn relationship(&self, relname: &str) -> Result<&RelationshipDescriptor> {
        self.schema.relationships.get(relname).ok_or_else(|| {
            JsonApiError::NotFound(format!(
                "type {} has no relationship {relname}",
                self.schema.typename()
            ))
        })
    }
}

#[async_trait]
impl Unserializer for LinkageUnserializer {
    async fn extend_relationship(
        &self,
        session: &dyn Session,
        resource: &mut Resource,
        relname: &str,
        relationship_object: &Value,
    ) -> Result<()> {
        let relationship = self.relationship(relname)?;
        if !relationship.to_many {
            return Err(JsonApiError::InvalidDocument(format!(
                "{relname} is a to-one relationship and cannot be extended"
            )));
        }

        let Value::Array(items) = &relationship_object["data"] else {
            return Err(JsonApiError::InvalidDocument(format!(
                "'data' must be an array when adding to the to-many relationship {relname}"
            )));
        };
        let submitted = parse_identifiers(items)?;
        assert_targets_exist(session, &submitted).await?;

        let mut current = match resource.linkage(relname) {
            Some(Linkage::ToMany(identifiers)) => identifiers.clone(),
            _ => Vec::new(),
        };
        for identifier in submitted {
            if !current.contains(&identifier) {
                current.push(identifier);
            }
        }

        resource.set_linkage(relname, Linkage::ToMany(current));
        Ok(())
    }

    async fn update_relationship(
        &self,
        session: &dyn Session,
        resource: &mut Resource,
        relname: &str,
        relationship_object: &Value,
    ) -> Result<()> {
        let relationship = self.relationship(relname)?;
        let data = &relationship_object["data"];

        let linkage = match (relationship.to_many, data) {
            (true, Value::Array(items)) => {
                let mut identifiers: Vec<Identifier> = Vec::with_capacity(items.len());
                for identifier in parse_identifiers(items)? {
                    if !identifiers.contains(&identifier) {
                        identifiers.push(identifier);
                    }
                }
                Linkage::ToMany(identifiers)
            }
            (false, Value::Null) => Linkage::ToOne(None),
            (false, Value::Object(_)) => Linkage::ToOne(Some(parse_identifier(data)?)),
            (true, _) => {
                return Err(JsonApiError::InvalidDocument(format!(
                    "'data' must be an array for the to-many relationship {relname}"
                )));
            }
            (false, _) => {
                return Err(JsonApiError::InvalidDocument(format!(
                    "'data' must be null or a resource identifier for the to-one relationship {relname}"
                )));
            }
        };

        match &linkage {
            Linkage::ToOne(Some(identifier)) => {
                assert_targets_exist(session, std::slice::from_ref(identifier)).await?
            }
            Linkage::ToMany(identifiers) => assert_targets_exist(session, identifiers).await?,
            Linkage::ToOne(None) => {}
        }

        resource.set_linkage(relname, linkage);
        Ok(())
    }

    fn clear_relationship(&self, resource: &mut Resource, relname: &str) {
        let to_many = self
            .schema
            .relationships
            .get(relname)
            .is_some_and(|relationship| relationship.to_many);
        resource.set_linkage(relname, Linkage::empty(to_many));
    }
}

fn parse_identifier(value: &Value) -> Result<Identifier> {
    // Unknown members such as `meta` are ignored
    Identifier::deserialize(value)
        .map_err(|e| JsonApiError::InvalidDocument(format!("invalid resource identifier: {e}")))
}

fn parse_identifiers(items: &[Value]) -> Result<Vec<Identifier>> {
    items.iter().map(parse_identifier).collect()
}

async fn assert_targets_exist(session: &dyn Session, identifiers: &[Identifier]) -> Result<()> {
    for identifier in identifiers {
        if session
            .get(&identifier.typename, &identifier.id)
            .await?
            .is_none()
        {
            return Err(JsonApiError::NotFound(format!(
                "related resource {identifier} does not exist"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::testutils::blog;
    use serde_json::json;

    #[tokio::test]
    async fn test_extend_appends_without_duplicates() {
        let blog = blog().await;
        let session = blog.database.session();
        let unserializer = blog.api.unserializer("articles").unwrap();
        let mut article = session.get("articles", "1").await.unwrap().unwrap();

        unserializer
            .extend_relationship(
                session.as_ref(),
                &mut article,
                "comments",
                &json!({"data": [
                    {"type": "comments", "id": "5"},
                    {"type": "comments", "id": "13"},
                ]}),
            )
            .await
            .unwrap();

        assert_eq!(
            article.linkage("comments"),
            Some(&Linkage::ToMany(vec![
                Identifier::new("comments", "5"),
                Identifier::new("comments", "12"),
                Identifier::new("comments", "13"),
            ]))
        );
    }

    #[tokio::test]
    async fn test_extend_rejects_missing_targets() {
        let blog = blog().await;
        let session = blog.database.session();
        let unserializer = blog.api.unserializer("articles").unwrap();
        let mut article = session.get("articles", "1").await.unwrap().unwrap();
        let before = article.clone();

        let result = unserializer
            .extend_relationship(
                session.as_ref(),
                &mut article,
                "comments",
                &json!({"data": [
                    {"type": "comments", "id": "13"},
                    {"type": "comments", "id": "404"},
                ]}),
            )
            .await;

        assert!(matches!(result, Err(JsonApiError::NotFound(_))));
        assert_eq!(article, before);
    }

    #[tokio::test]
    async fn test_update_checks_cardinality() {
        let blog = blog().await;
        let session = blog.database.session();
        let unserializer = blog.api.unserializer("articles").unwrap();
        let mut article = session.get("articles", "1").await.unwrap().unwrap();

        let result = unserializer
            .update_relationship(
                session.as_ref(),
                &mut article,
                "author",
                &json!({"data": [{"type": "people", "id": "10"}]}),
            )
            .await;
        assert!(matches!(result, Err(JsonApiError::InvalidDocument(_))));

        let result = unserializer
            .update_relationship(
                session.as_ref(),
                &mut article,
                "comments",
                &json!({"data": {"type": "comments", "id": "13"}}),
            )
            .await;
        assert!(matches!(result, Err(JsonApiError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_and_clears() {
        let blog = blog().await;
        let session = blog.database.session();
        let unserializer = blog.api.unserializer("articles").unwrap();
        let mut article = session.get("articles", "1").await.unwrap().unwrap();

        unserializer
            .update_relationship(
                session.as_ref(),
                &mut article,
                "comments",
                &json!({"data": [{"type": "comments", "id": "13"}]}),
            )
            .await
            .unwrap();
        assert_eq!(
            article.linkage("comments"),
            Some(&Linkage::ToMany(vec![Identifier::new("comments", "13")]))
        );

        unserializer
            .update_relationship(
                session.as_ref(),
                &mut article,
                "author",
                &json!({"data": null}),
            )
            .await
            .unwrap();
        assert_eq!(article.linkage("author"), Some(&Linkage::ToOne(None)));
    }

    #[tokio::test]
    async fn test_clear_relationship() {
        let blog = blog().await;
        let session = blog.database.session();
        let unserializer = blog.api.unserializer("articles").unwrap();
        let mut article = session.get("articles", "1").await.unwrap().unwrap();

        unserializer.clear_relationship(&mut article, "comments");
        unserializer.clear_relationship(&mut article, "author");

        assert_eq!(article.linkage("comments"), Some(&Linkage::ToMany(vec![])));
        assert_eq!(article.linkage("author"), Some(&Linkage::ToOne(None)));
    }
}
