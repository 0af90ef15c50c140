//! Context broker gateway
//!
//! Maps entity CRUD intents onto the NGSI-LD HTTP binding and
//! delegates every call through the [`AuthSession`]. Responses come
//! back as raw [`reqwest::Response`] values: this layer never
//! interprets broker error bodies, that is the caller's job.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::document::NgsiDocument;
use crate::entity::Entity;
use crate::error::{NgsildError, NgsildResult};

const URL_ENTITIES: &str = "ngsi-ld/v1/entities/";

/// Characters escaped when an entity id is embedded in a URL path
/// segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// A connection to an NGSI-LD context broker.
///
/// # Example
/// ```no_run
/// use ngsild_client::{ClientConfig, ContextBroker, Entity, NgsiDocument};
///
/// # async fn run() -> ngsild_client::NgsildResult<()> {
/// let config = ClientConfig::new(
///     "https://broker.example.com",
///     "https://identity.example.com/token",
///     "client-id",
///     "client-secret",
/// );
/// let mut broker = ContextBroker::new(config);
/// let entity = Entity::new("urn:ngsi-ld:Vehicle:A123", "Vehicle");
/// let response = broker.create_entity(&NgsiDocument::from(entity)).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ContextBroker {
    host: String,
    session: AuthSession,
}

impl ContextBroker {
    pub fn new(config: ClientConfig) -> Self {
        let session = AuthSession::from_config(&config);
        ContextBroker {
            host: config.broker_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Build a broker from `NGSILD_*` environment variables.
    pub fn from_env() -> NgsildResult<Self> {
        Ok(ContextBroker::new(ClientConfig::from_env()?))
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Query the entity collection, filtered by request parameters
    /// (e.g. `type`, `idPattern`, `q`).
    pub async fn query_entities(
        &mut self,
        params: &[(&str, &str)],
    ) -> NgsildResult<reqwest::Response> {
        let url = self.entities_url();
        tracing::debug!(%url, "querying entities");
        let http = self.session.http().clone();
        self.session
            .execute(|headers| http.get(&url).headers(headers).query(params).send())
            .await
    }

    /// Retrieve one entity by id.
    pub async fn retrieve_entity(&mut self, id: &str) -> NgsildResult<reqwest::Response> {
        let url = self.entity_url(id);
        let http = self.session.http().clone();
        self.session
            .execute(|headers| http.get(&url).headers(headers).send())
            .await
    }

    /// Create an entity. Fails with [`NgsildError::TypeMismatch`]
    /// before any network call if `document` is not an Entity.
    pub async fn create_entity(
        &mut self,
        document: &NgsiDocument,
    ) -> NgsildResult<reqwest::Response> {
        let entity = match document {
            NgsiDocument::Entity(entity) => entity,
            other => {
                return Err(NgsildError::TypeMismatch {
                    expected: "Entity",
                    actual: other.kind(),
                })
            }
        };
        let body = entity.to_ngsild();
        let url = self.entities_url();
        tracing::debug!(%url, id = entity.id(), "creating entity");
        let http = self.session.http().clone();
        self.session
            .execute(|headers| http.post(&url).headers(headers).json(&body).send())
            .await
    }

    /// Update attributes of an existing entity with a Property or
    /// Relationship fragment (PATCH semantics: the named attributes
    /// are replaced).
    pub async fn update_attributes(
        &mut self,
        entity: &Entity,
        fragment: &NgsiDocument,
    ) -> NgsildResult<reqwest::Response> {
        let body = fragment_body(entity, fragment)?;
        let url = self.attrs_url(entity.id());
        let http = self.session.http().clone();
        self.session
            .execute(|headers| http.patch(&url).headers(headers).json(&body).send())
            .await
    }

    /// Append attributes to an existing entity with a Property or
    /// Relationship fragment (POST semantics: the named attributes are
    /// added).
    pub async fn append_attributes(
        &mut self,
        entity: &Entity,
        fragment: &NgsiDocument,
    ) -> NgsildResult<reqwest::Response> {
        let body = fragment_body(entity, fragment)?;
        let url = self.attrs_url(entity.id());
        let http = self.session.http().clone();
        self.session
            .execute(|headers| http.post(&url).headers(headers).json(&body).send())
            .await
    }

    /// Delete one entity by id.
    pub async fn delete_entity(&mut self, id: &str) -> NgsildResult<reqwest::Response> {
        let url = self.entity_url(id);
        tracing::debug!(%url, "deleting entity");
        let http = self.session.http().clone();
        self.session
            .execute(|headers| http.delete(&url).headers(headers).send())
            .await
    }

    fn entities_url(&self) -> String {
        format!("{}/{}", self.host, URL_ENTITIES)
    }

    fn entity_url(&self, id: &str) -> String {
        format!(
            "{}{}",
            self.entities_url(),
            utf8_percent_encode(id, PATH_SEGMENT)
        )
    }

    fn attrs_url(&self, id: &str) -> String {
        format!("{}/attrs/", self.entity_url(id))
    }
}

/// Render an update/append fragment and stamp the owning entity's
/// `@context` onto it. Only Property and Relationship fragments are
/// accepted.
fn fragment_body(entity: &Entity, fragment: &NgsiDocument) -> NgsildResult<Value> {
    let mut body = match fragment {
        NgsiDocument::Property(property) => property.to_ngsild(),
        NgsiDocument::Relationship(relationship) => relationship.to_ngsild(),
        other => {
            return Err(NgsildError::TypeMismatch {
                expected: "Property or Relationship",
                actual: other.kind(),
            })
        }
    };
    if let Value::Object(map) = &mut body {
        map.insert(
            "@context".to_string(),
            entity
                .at_context()
                .map(|context| context.to_value())
                .unwrap_or(Value::Null),
        );
    }
    Ok(body)
}
