//! Persistence gateway used by the handlers.

use crate::errors::Result;
use crate::resource::Resource;
use async_trait::async_trait;

/// A unit of work against the resource store.
///
/// Handlers read through `get`, stage changed resources with `save` and
/// make them durable with `commit`. Nothing staged is visible to other
/// sessions before `commit` returns.
#[async_trait]
pub trait Session: Send + Sync {
    /// Loads the resource `(typename, id)`.
    ///
    /// Resources whose actual type is a subtype of `typename` are found as
    /// well; the returned resource carries its actual type.
    async fn get(&self, typename: &str, id: &str) -> Result<Option<Resource>>;

    /// Stages resources to be written on the next commit.
    fn save(&mut self, resources: &[Resource]);

    /// Writes all staged resources.
    async fn commit(&mut self) -> Result<()>;
}

/// Hands out one session per request.
pub trait Database: Send + Sync {
    fn session(&self) -> Box<dyn Session>;
}
