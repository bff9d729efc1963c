use crate::db::{Database, Session};
use crate::errors::Result;
use crate::resource::Resource;
use crate::schema::TypeRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Store = HashMap<(String, String), Resource>;

/// An in-memory resource store.
///
/// Resources are keyed by their actual type and id. Lookups by a base type
/// search every registered subtype of it.
#[derive(Clone)]
pub struct MemoryDatabase {
    registry: Arc<TypeRegistry>,
    store: Arc<RwLock<Store>>,
}

impl MemoryDatabase {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Inserts or replaces resources directly, bypassing sessions.
    pub async fn seed(&self, resources: impl IntoIterator<Item = Resource>) {
        let mut store = self.store.write().await;
        for resource in resources {
            store.insert(store_key(&resource), resource);
        }
    }

    /// Reads a resource by its actual type, bypassing sessions.
    pub async fn load(&self, typename: &str, id: &str) -> Option<Resource> {
        let store = self.store.read().await;
        store.get(&(typename.to_owned(), id.to_owned())).cloned()
    }

    pub async fn resource_count(&self) -> usize {
        self.store.read().await.len()
    }
}

impl Database for MemoryDatabase {
    fn session(&self) -> Box<dyn Session> {
        Box::new(MemorySession {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            staged: Vec::new(),
        })
    }
}

fn store_key(resource: &Resource) -> (String, String) {
    (resource.typename().to_owned(), resource.id().to_owned())
}

pub struct MemorySession {
    registry: Arc<TypeRegistry>,
    store: Arc<RwLock<Store>>,
    staged: Vec<Resource>,
}

#[async_trait]
impl Session for MemorySession {
    async fn get(&self, typename: &str, id: &str) -> Result<Option<Resource>> {
        let store = self.store.read().await;
        let found = self
            .registry
            .family(typename)
            .find_map(|candidate| store.get(&(candidate.to_owned(), id.to_owned())))
            .cloned();
        Ok(found)
    }

    fn save(&mut self, resources: &[Resource]) {
        self.staged.extend_from_slice(resources);
    }

    async fn commit(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let mut store = self.store.write().await;
        let count = self.staged.len();
        for resource in self.staged.drain(..) {
            store.insert(store_key(&resource), resource);
        }
        tracing::debug!(count, "Committed resources");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Identifier, Linkage};
    use crate::schema::{RelationshipDescriptor, Schema};

    fn database() -> MemoryDatabase {
        let mut registry = TypeRegistry::new();
        registry
            .register(Schema::new("articles").relationship(RelationshipDescriptor::to_one("author")))
            .unwrap();
        registry
            .register(Schema::new("featured-articles").extends("articles"))
            .unwrap();
        registry.register(Schema::new("people")).unwrap();
        MemoryDatabase::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_polymorphic_lookup() {
        let database = database();
        database
            .seed([
                Resource::new("articles", "1"),
                Resource::new("featured-articles", "2"),
            ])
            .await;

        let session = database.session();
        let found = session.get("articles", "2").await.unwrap().unwrap();
        assert_eq!(found.typename(), "featured-articles");

        // Lookups never go up the hierarchy
        assert!(session.get("featured-articles", "1").await.unwrap().is_none());
        assert!(session.get("people", "1").await.unwrap().is_none());
        assert!(session.get("unknown", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_staged_changes_are_invisible_until_commit() {
        let database = database();
        database.seed([Resource::new("articles", "1")]).await;

        let mut session = database.session();
        let mut article = session.get("articles", "1").await.unwrap().unwrap();
        article.set_linkage(
            "author",
            Linkage::ToOne(Some(Identifier::new("people", "9"))),
        );
        session.save(std::slice::from_ref(&article));

        let other = database.session();
        let before = other.get("articles", "1").await.unwrap().unwrap();
        assert!(before.linkage("author").is_none());

        session.commit().await.unwrap();
        let after = other.get("articles", "1").await.unwrap().unwrap();
        assert_eq!(after, article);
        assert_eq!(database.resource_count().await, 1);
    }

    #[tokio::test]
    async fn test_dropped_session_persists_nothing() {
        let database = database();
        database.seed([Resource::new("articles", "1")]).await;

        {
            let mut session = database.session();
            session.save(&[Resource::new("articles", "1").with_linkage(
                "author",
                Linkage::ToOne(Some(Identifier::new("people", "9"))),
            )]);
        }

        let stored = database.load("articles", "1").await.unwrap();
        assert!(stored.linkage("author").is_none());
    }
}
