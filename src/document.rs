//! The closed set of NGSI-LD document kinds
//!
//! Broker operations that accept "some NGSI-LD document" take an
//! [`NgsiDocument`] and match exhaustively on it, so kind checks are
//! ordinary pattern matches instead of runtime type inspection.

use serde_json::Value;

use crate::attribute::{GeoProperty, Property, Relationship};
use crate::entity::Entity;

/// Any document this library can render and submit to a broker.
#[derive(Debug, Clone, PartialEq)]
pub enum NgsiDocument {
    Entity(Entity),
    Property(Property),
    GeoProperty(GeoProperty),
    Relationship(Relationship),
}

impl NgsiDocument {
    /// Name of the document kind, as used in error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            NgsiDocument::Entity(_) => "Entity",
            NgsiDocument::Property(_) => "Property",
            NgsiDocument::GeoProperty(_) => "GeoProperty",
            NgsiDocument::Relationship(_) => "Relationship",
        }
    }

    pub fn to_ngsild(&self) -> Value {
        match self {
            NgsiDocument::Entity(entity) => entity.to_ngsild(),
            NgsiDocument::Property(property) => property.to_ngsild(),
            NgsiDocument::GeoProperty(geo_property) => geo_property.to_ngsild(),
            NgsiDocument::Relationship(relationship) => relationship.to_ngsild(),
        }
    }
}

impl From<Entity> for NgsiDocument {
    fn from(entity: Entity) -> Self {
        NgsiDocument::Entity(entity)
    }
}

impl From<Property> for NgsiDocument {
    fn from(property: Property) -> Self {
        NgsiDocument::Property(property)
    }
}

impl From<GeoProperty> for NgsiDocument {
    fn from(geo_property: GeoProperty) -> Self {
        NgsiDocument::GeoProperty(geo_property)
    }
}

impl From<Relationship> for NgsiDocument {
    fn from(relationship: Relationship) -> Self {
        NgsiDocument::Relationship(relationship)
    }
}
