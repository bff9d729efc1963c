use crate::JSONAPI_MEDIA_TYPE;
use crate::api::Api;
use crate::db::Session;
use crate::errors::Result;
use crate::memory::MemoryDatabase;
use crate::resource::{Identifier, Linkage, Resource};
use crate::schema::{RelationshipDescriptor, Schema};
use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use serde_json::{Value, json};
use std::sync::Arc;
use url::Url;

pub struct Blog {
    pub api: Arc<Api>,
    pub database: MemoryDatabase,
}

/// A small blog:
///
/// - `articles/1` written by `people/9` with `comments/5` and `comments/12`
/// - `featured-articles/2` (a subtype of `articles`) sponsored by `people/10`
/// - `comments/13` which is not attached to anything
pub async fn blog() -> Blog {
    let mut api = Api::new(
        Url::parse("http://example.com/").unwrap(),
        json!({"version": "1.0"}),
    );
    api.add_type(Schema::new("people")).unwrap();
    api.add_type(Schema::new("comments").relationship(RelationshipDescriptor::to_one("author")))
        .unwrap();
    api.add_type(
        Schema::new("articles")
            .relationship(RelationshipDescriptor::to_one("author"))
            .relationship(RelationshipDescriptor::to_many("comments")),
    )
    .unwrap();
    api.add_type(
        Schema::new("featured-articles")
            .extends("articles")
            .relationship(RelationshipDescriptor::to_one("sponsor")),
    )
    .unwrap();

    let database = MemoryDatabase::new(Arc::new(api.registry().clone()));
    database
        .seed([
            Resource::new("people", "9"),
            Resource::new("people", "10"),
            Resource::new("comments", "5").with_linkage("author", to_one("people", "9")),
            Resource::new("comments", "12").with_linkage("author", to_one("people", "10")),
            Resource::new("comments", "13"),
            Resource::new("articles", "1")
                .with_linkage("author", to_one("people", "9"))
                .with_linkage(
                    "comments",
                    Linkage::ToMany(vec![
                        Identifier::new("comments", "5"),
                        Identifier::new("comments", "12"),
                    ]),
                ),
            Resource::new("featured-articles", "2")
                .with_linkage("author", to_one("people", "9"))
                .with_linkage("sponsor", to_one("people", "10")),
        ])
        .await;

    Blog {
        api: Arc::new(api),
        database,
    }
}

fn to_one(typename: &str, id: &str) -> Linkage {
    Linkage::ToOne(Some(Identifier::new(typename, id)))
}

/// Builds a request with the JSON:API content type.
pub fn request(method: Method, path: &str, body: Option<Value>) -> Request<Bytes> {
    let body = body
        .map(|value| Bytes::from(serde_json::to_vec(&value).unwrap()))
        .unwrap_or_default();

    Request::builder()
        .method(method)
        .uri(path)
        .header(CONTENT_TYPE, JSONAPI_MEDIA_TYPE)
        .body(body)
        .unwrap()
}

/// Session counting the calls made to the persistence layer.
pub struct RecordingSession {
    inner: Box<dyn Session>,
    pub saves: usize,
    pub commits: usize,
}

impl RecordingSession {
    pub fn new(inner: Box<dyn Session>) -> Self {
        Self {
            inner,
            saves: 0,
            commits: 0,
        }
    }
}

#[async_trait]
impl Session for RecordingSession {
    async fn get(&self, typename: &str, id: &str) -> Result<Option<Resource>> {
        self.inner.get(typename, id).await
    }

    fn save(&mut self, resources: &[Resource]) {
        self.saves += 1;
        self.inner.save(resources);
    }

    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        self.inner.commit().await
    }
}
