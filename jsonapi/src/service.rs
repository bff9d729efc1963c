use crate::api::Api;
use crate::db::Database;
use crate::errors::{JsonApiError, Result};
use crate::handler::RelationshipHandler;
use crate::metrics_defs::{RELATIONSHIP_UPDATES, REQUEST_DURATION, REQUESTS_INFLIGHT};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response};
use percent_encoding::percent_decode_str;
use shared::http::full_body;
use shared::routing::{PathPattern, RouteTable};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteAction {
    Relationship,
}

/// Serves the relationship endpoints of an [`Api`] mounted below the path
/// of its base URL.
#[derive(Clone)]
pub struct JsonApiService {
    api: Arc<Api>,
    database: Arc<dyn Database>,
    routes: Arc<RouteTable<RouteAction>>,
}

impl JsonApiService {
    pub fn new(api: Arc<Api>, database: Arc<dyn Database>) -> Self {
        let mut routes = RouteTable::new();
        routes.add(
            PathPattern::with_prefix(
                api.base_url().path(),
                "/{type}/{id}/relationships/{relname}",
            ),
            RouteAction::Relationship,
        );

        Self {
            api,
            database,
            routes: Arc::new(routes),
        }
    }

    /// Handles a request whose body has been fully read. Errors are
    /// rendered as JSON:API error documents.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let _inflight = InflightGuard::new();

        let response = match self.dispatch(request).await {
            Ok(response) => {
                if method != Method::GET {
                    shared::counter!(RELATIONSHIP_UPDATES, "method" => method.to_string())
                        .increment(1);
                }
                response
            }
            Err(error) => {
                if error.status().is_server_error() {
                    tracing::error!(%method, %path, error = %error, "Request failed");
                } else {
                    tracing::debug!(%method, %path, error = %error, "Request rejected");
                }
                error.to_response(self.api.jsonapi_object())
            }
        };

        shared::histogram!(
            REQUEST_DURATION,
            "method" => method.to_string(),
            "status" => response.status().as_u16().to_string(),
        )
        .record(start.elapsed().as_secs_f64());

        response
    }

    async fn dispatch(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let path = request.uri().path().to_owned();
        let Some(route_match) = self.routes.resolve(&path) else {
            return Err(JsonApiError::NotFound(format!("no endpoint at {path}")));
        };

        match route_match.action {
            RouteAction::Relationship => {
                let param = |name: &str| {
                    decode_param(route_match.params.get(name).copied().unwrap_or_default())
                };
                let handler = RelationshipHandler::new(
                    &self.api,
                    param("type")?,
                    param("id")?,
                    param("relname")?,
                );

                let mut session = self.database.session();
                handler.handle(session.as_mut(), request).await
            }
        }
    }
}

/// Path params arrive percent-encoded, the same way `Api::reverse_url`
/// writes them.
fn decode_param(raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| JsonApiError::NotFound(format!("path segment {raw} is not valid UTF-8")))
}

/// Counts a request as in flight until dropped, including when the client
/// goes away and the request future is cancelled.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        shared::gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        shared::gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

impl Service<Request<Incoming>> for JsonApiService {
    type Response = Response<BoxBody<Bytes, JsonApiError>>;
    type Error = JsonApiError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let response = match body.collect().await {
                Ok(collected) => {
                    service
                        .handle(Request::from_parts(parts, collected.to_bytes()))
                        .await
                }
                Err(e) => JsonApiError::RequestBodyError(e.to_string())
                    .to_response(service.api.jsonapi_object()),
            };

            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, full_body(body)))
        })
    }
}
