//! Relationship endpoint: `/{type}/{id}/relationships/{relname}`
//!
//! See <http://jsonapi.org/format/#fetching-relationships> and
//! <http://jsonapi.org/format/#crud-updating-relationships>.
//!
//! # Lifecycle
//!
//! ```text
//! RelationshipHandler --prepare()--> PreparedRelationship --get/post/patch/delete--> Response
//!          |                                  |
//!          +------------ error ---------------+
//! ```
//!
//! Preparation checks the content type, loads the resource and resolves the
//! relationship on the resource's actual type. Method handlers only exist on
//! [`PreparedRelationship`] and consume it, so each request runs at most one
//! of them.

use super::{assert_jsonapi_content_type, jsonapi_response, parse_json_body};
use crate::api::{Api, Endpoint};
use crate::db::Session;
use crate::errors::{JsonApiError, RELATIONSHIP_METHODS, Result};
use crate::resource::Resource;
use crate::schema::RelationshipDescriptor;
use crate::serializer::Serializer;
use crate::unserializer::Unserializer;
use crate::validators::assert_relationship_object;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response, StatusCode};

/// Methods that can be used on to-one relationships.
const TO_ONE_METHODS: &str = "GET, PATCH, DELETE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl TryFrom<&Method> for RelationshipMethod {
    type Error = JsonApiError;

    fn try_from(method: &Method) -> Result<Self> {
        match *method {
            Method::GET => Ok(RelationshipMethod::Get),
            Method::POST => Ok(RelationshipMethod::Post),
            Method::PATCH => Ok(RelationshipMethod::Patch),
            Method::DELETE => Ok(RelationshipMethod::Delete),
            _ => Err(JsonApiError::MethodNotAllowed {
                detail: format!("{method} is not supported on relationship endpoints"),
                allow: RELATIONSHIP_METHODS,
            }),
        }
    }
}

/// Handler bound to one `(typename, resource_id, relname)` triple.
pub struct RelationshipHandler<'a> {
    api: &'a Api,
    typename: String,
    resource_id: String,
    relname: String,
}

impl<'a> RelationshipHandler<'a> {
    pub fn new(
        api: &'a Api,
        typename: impl Into<String>,
        resource_id: impl Into<String>,
        relname: impl Into<String>,
    ) -> Self {
        Self {
            api,
            typename: typename.into(),
            resource_id: resource_id.into(),
            relname: relname.into(),
        }
    }

    /// Runs the whole request: preparation, then the handler for the
    /// request method.
    pub async fn handle(
        self,
        session: &mut dyn Session,
        request: Request<Bytes>,
    ) -> Result<Response<Bytes>> {
        let method = RelationshipMethod::try_from(request.method())?;
        let prepared = self.prepare(&*session, request.headers()).await?;

        match method {
            RelationshipMethod::Get => prepared.get(),
            RelationshipMethod::Post => prepared.post(session, request.body()).await,
            RelationshipMethod::Patch => prepared.patch(session, request.body()).await,
            RelationshipMethod::Delete => prepared.delete(session).await,
        }
    }

    /// Validates the request and loads the resource.
    ///
    /// Fails with `UnsupportedMediaType` if the request does not use the
    /// JSON:API media type, and with `NotFound` if the type, the resource or
    /// the relationship on the resource's actual type does not exist.
    pub async fn prepare(
        self,
        session: &dyn Session,
        headers: &HeaderMap,
    ) -> Result<PreparedRelationship<'a>> {
        assert_jsonapi_content_type(headers)?;

        if !self.api.has_type(&self.typename) {
            return Err(JsonApiError::NotFound(format!(
                "unknown type {}",
                self.typename
            )));
        }

        let Some(resource) = session.get(&self.typename, &self.resource_id).await? else {
            return Err(JsonApiError::NotFound(format!(
                "resource {}/{} does not exist",
                self.typename, self.resource_id
            )));
        };

        let real_typename = self.api.typename_of(&resource).to_owned();

        let relationship = self
            .api
            .schema(&real_typename)
            .and_then(|schema| schema.relationships.get(&self.relname))
            .cloned()
            .ok_or_else(|| {
                JsonApiError::NotFound(format!(
                    "type {real_typename} has no relationship {}",
                    self.relname
                ))
            })?;

        tracing::debug!(
            typename = %self.typename,
            real_typename = %real_typename,
            id = %self.resource_id,
            relname = %self.relname,
            to_many = relationship.to_many,
            "Prepared relationship request"
        );

        Ok(PreparedRelationship {
            api: self.api,
            typename: self.typename,
            resource_id: self.resource_id,
            relname: self.relname,
            real_typename,
            resource,
            relationship,
        })
    }
}

/// A relationship request that passed preparation.
pub struct PreparedRelationship<'a> {
    api: &'a Api,
    typename: String,
    resource_id: String,
    relname: String,
    real_typename: String,
    resource: Resource,
    relationship: RelationshipDescriptor,
}

impl<'a> PreparedRelationship<'a> {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn real_typename(&self) -> &str {
        &self.real_typename
    }

    pub fn relationship(&self) -> &RelationshipDescriptor {
        &self.relationship
    }

    /// Handles a GET request.
    pub fn get(self) -> Result<Response<Bytes>> {
        self.respond()
    }

    /// Handles a POST request: adds the submitted members to a to-many
    /// relationship.
    pub async fn post(mut self, session: &mut dyn Session, body: &Bytes) -> Result<Response<Bytes>> {
        // This method is only allowed for to-many relationships
        if !self.relationship.to_many {
            return Err(JsonApiError::MethodNotAllowed {
                detail: format!(
                    "POST is only allowed on to-many relationships, {} is to-one",
                    self.relname
                ),
                allow: TO_ONE_METHODS,
            });
        }

        let relationship_object = parse_json_body(body)?;
        assert_relationship_object(&relationship_object)?;

        self.unserializer()?
            .extend_relationship(
                &*session,
                &mut self.resource,
                &self.relname,
                &relationship_object,
            )
            .await?;

        self.persist(session).await?;
        self.respond()
    }

    /// Handles a PATCH request: replaces the relationship's linkage.
    pub async fn patch(mut self, session: &mut dyn Session, body: &Bytes) -> Result<Response<Bytes>> {
        let relationship_object = parse_json_body(body)?;
        assert_relationship_object(&relationship_object)?;

        self.unserializer()?
            .update_relationship(
                &*session,
                &mut self.resource,
                &self.relname,
                &relationship_object,
            )
            .await?;

        self.persist(session).await?;
        self.respond()
    }

    /// Handles a DELETE request: clears the relationship. The request body
    /// is not read.
    pub async fn delete(mut self, session: &mut dyn Session) -> Result<Response<Bytes>> {
        self.unserializer()?
            .clear_relationship(&mut self.resource, &self.relname);

        self.persist(session).await?;
        self.respond()
    }

    fn serializer(&self) -> Result<&'a dyn Serializer> {
        let api: &'a Api = self.api;
        api.serializer(&self.real_typename).ok_or_else(|| {
            JsonApiError::InternalError(format!("no serializer for {}", self.real_typename))
        })
    }

    fn unserializer(&self) -> Result<&'a dyn Unserializer> {
        let api: &'a Api = self.api;
        api.unserializer(&self.real_typename).ok_or_else(|| {
            JsonApiError::InternalError(format!("no unserializer for {}", self.real_typename))
        })
    }

    async fn persist(&self, session: &mut dyn Session) -> Result<()> {
        session.save(std::slice::from_ref(&self.resource));
        session.commit().await?;

        tracing::debug!(
            typename = %self.real_typename,
            id = %self.resource_id,
            relname = %self.relname,
            "Saved relationship"
        );
        Ok(())
    }

    /// Serializes the relationship and completes it into the response
    /// document. Links are reversed with the requested type so they stay
    /// stable for polymorphic resources.
    fn build_body(&self) -> Result<Bytes> {
        let mut document = self
            .serializer()?
            .serialize_relationship(&self.resource, &self.relname);

        document.set_link_if_absent(
            "self",
            self.api.reverse_url(
                &self.typename,
                Endpoint::Relationship,
                &self.resource_id,
                &self.relname,
            ),
        );
        document.set_link_if_absent(
            "related",
            self.api.reverse_url(
                &self.typename,
                Endpoint::Related,
                &self.resource_id,
                &self.relname,
            ),
        );
        document.set_if_absent("jsonapi", self.api.jsonapi_object().clone());

        self.api.dump_json(&document)
    }

    fn respond(&self) -> Result<Response<Bytes>> {
        jsonapi_response(StatusCode::OK, self.build_body()?)
    }
}
