//! NGSI-LD client library
//!
//! Builds typed NGSI-LD graph fragments in memory, renders them into
//! the canonical JSON representation, and exchanges them with a
//! context broker over HTTP behind an OAuth2 client-credentials
//! session with transparent token renewal.
//!
//! The information model is a recursive attribute tree: an [`Entity`]
//! owns top-level [`Property`] and [`Relationship`] attributes, each
//! of which may own nested attributes of its own. [`GeoProperty`] is a
//! terminal leaf carrying a geometry value. Rendering walks the tree
//! depth-first and merges every child into its parent's body as a
//! sibling key.
//!
//! # Quick start
//!
//! ```rust
//! use ngsild_client::{Entity, Property};
//!
//! let mut temperature = Property::new("temperature", 37);
//! temperature.set_unit_code("CEL");
//!
//! let mut plant_health = Property::new("plant_health", 5);
//! plant_health.add_property(temperature);
//!
//! let mut entity = Entity::new("uri:entity:1", "ENTITY");
//! entity.add_property(plant_health);
//!
//! let rendered = entity.to_ngsild();
//! assert_eq!(rendered["id"], "uri:entity:1");
//! assert_eq!(rendered["plant_health"]["temperature"]["value"], 37);
//! ```
//!
//! Talking to a broker goes through [`ContextBroker`], configured
//! explicitly or from `NGSILD_*` environment variables; see
//! [`ClientConfig`].

pub mod attribute;
pub mod auth;
pub mod broker;
pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod temporal;

pub use attribute::{GeoProperty, Geometry, Property, PropertyNode, Relationship};
pub use auth::AuthSession;
pub use broker::ContextBroker;
pub use config::ClientConfig;
pub use document::NgsiDocument;
pub use entity::{Context, Entity};
pub use error::{NgsildError, NgsildResult};
pub use temporal::Timestamp;
