//! Relationship endpoints of a JSON:API server.
//!
//! The crate serves `/{type}/{id}/relationships/{relname}` for GET, POST,
//! PATCH and DELETE as described in <http://jsonapi.org/format/>. Types are
//! registered on an [`api::Api`], resources are loaded and stored through a
//! [`db::Session`], and [`service::JsonApiService`] exposes everything over
//! HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod document;
pub mod errors;
pub mod handler;
pub mod memory;
pub mod metrics_defs;
pub mod resource;
pub mod schema;
pub mod serializer;
pub mod service;
pub mod unserializer;
pub mod validators;

#[cfg(test)]
mod testutils;

use crate::api::Api;
use crate::errors::JsonApiError;
use crate::memory::MemoryDatabase;
use crate::resource::Resource;
use crate::service::JsonApiService;
use shared::http::run_http_service;
use std::sync::Arc;

/// The JSON:API media type. Requests must declare it, responses always use it.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Serves the configured API from an in-memory store seeded with the
/// configured resources.
pub async fn run(config: config::Config) -> Result<(), JsonApiError> {
    config.validate()?;
    shared::metrics_defs::describe_all(metrics_defs::ALL_METRICS);

    let api = Arc::new(Api::from_config(&config.api, &config.types)?);
    let database = MemoryDatabase::new(Arc::new(api.registry().clone()));
    database
        .seed(config.resources.iter().map(Resource::from))
        .await;

    tracing::info!(
        types = config.types.len(),
        resources = config.resources.len(),
        base_url = %api.base_url(),
        "Starting JSON:API service"
    );

    let service = JsonApiService::new(api, Arc::new(database));
    run_http_service(&config.listener.host, config.listener.port, service).await
}
