//! Property, GeoProperty and Relationship attribute nodes
//!
//! Attributes form a recursive tree: a [`Property`] or [`Relationship`]
//! may own nested properties and relationships, which may themselves
//! own more. A [`GeoProperty`] is terminal and owns no children, which
//! the type enforces by simply not having child collections.
//!
//! `to_ngsild()` renders a node and its whole subtree into the
//! canonical NGSI-LD representation: a single-key object
//! `{name: body}`, where each child's own rendering is merged into
//! `body` as a sibling key. Siblings sharing a name overwrite each
//! other in insertion order, so callers should keep sibling names
//! distinct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::temporal::Timestamp;

/// GeoJSON-shaped geometry value carried by a [`GeoProperty`]:
/// a geometry kind plus coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Geometry kind, e.g. "Point" or "LineString".
    #[serde(rename = "type")]
    pub kind: String,
    /// Coordinates in GeoJSON layout.
    pub coordinates: Value,
}

impl Geometry {
    pub fn new(kind: impl Into<String>, coordinates: Value) -> Self {
        Geometry {
            kind: kind.into(),
            coordinates,
        }
    }

    /// A GeoJSON Point at the given position.
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Geometry::new("Point", Value::from(vec![longitude, latitude]))
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.kind.clone()));
        map.insert("coordinates".to_string(), self.coordinates.clone());
        Value::Object(map)
    }
}

/// A node allowed in a `properties` collection: a full [`Property`] or
/// a terminal [`GeoProperty`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyNode {
    Property(Property),
    GeoProperty(GeoProperty),
}

impl PropertyNode {
    pub fn name(&self) -> &str {
        match self {
            PropertyNode::Property(p) => p.name(),
            PropertyNode::GeoProperty(g) => g.name(),
        }
    }

    pub fn to_ngsild(&self) -> Value {
        match self {
            PropertyNode::Property(p) => p.to_ngsild(),
            PropertyNode::GeoProperty(g) => g.to_ngsild(),
        }
    }
}

impl From<Property> for PropertyNode {
    fn from(property: Property) -> Self {
        PropertyNode::Property(property)
    }
}

impl From<GeoProperty> for PropertyNode {
    fn from(geo_property: GeoProperty) -> Self {
        PropertyNode::GeoProperty(geo_property)
    }
}

/// An NGSI-LD Property: a named literal value with optional
/// observation time, unit code and dataset id, and optionally nested
/// sub-properties and sub-relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    value: Value,
    observed_at: Option<String>,
    unit_code: Option<String>,
    dataset_id: Option<String>,
    properties: Vec<PropertyNode>,
    relationships: Vec<Relationship>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Property {
            name: name.into(),
            value: value.into(),
            observed_at: None,
            unit_code: None,
            dataset_id: None,
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Canonical observedAt text, if set.
    pub fn observed_at(&self) -> Option<&str> {
        self.observed_at.as_deref()
    }

    pub fn unit_code(&self) -> Option<&str> {
        self.unit_code.as_deref()
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn properties(&self) -> &[PropertyNode] {
        &self.properties
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Set the observation time. The input is normalized to ISO 8601
    /// text immediately, so the stored form is always canonical.
    pub fn set_observed_at(&mut self, observed_at: impl Into<Timestamp>) {
        self.observed_at = Some(observed_at.into().to_iso8601());
    }

    pub fn set_unit_code(&mut self, unit_code: impl Into<String>) {
        self.unit_code = Some(unit_code.into());
    }

    pub fn set_dataset_id(&mut self, dataset_id: impl Into<String>) {
        self.dataset_id = Some(dataset_id.into());
    }

    /// Replace all nested properties.
    pub fn set_properties(&mut self, properties: Vec<PropertyNode>) {
        self.properties = properties;
    }

    /// Append one nested property.
    pub fn add_property(&mut self, property: impl Into<PropertyNode>) {
        self.properties.push(property.into());
    }

    /// Append nested properties in order. An empty iterator is a no-op.
    pub fn add_properties(&mut self, properties: impl IntoIterator<Item = PropertyNode>) {
        self.properties.extend(properties);
    }

    /// Replace all nested relationships.
    pub fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships = relationships;
    }

    /// Append one nested relationship.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    /// Append nested relationships in order. An empty iterator is a no-op.
    pub fn add_relationships(&mut self, relationships: impl IntoIterator<Item = Relationship>) {
        self.relationships.extend(relationships);
    }

    /// Render this property and its subtree as `{name: body}`.
    pub fn to_ngsild(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".to_string(), Value::String("Property".to_string()));
        body.insert("value".to_string(), self.value.clone());
        if let Some(observed_at) = &self.observed_at {
            body.insert(
                "observedAt".to_string(),
                Value::String(observed_at.clone()),
            );
        }
        if let Some(unit_code) = &self.unit_code {
            body.insert("unitCode".to_string(), Value::String(unit_code.clone()));
        }
        if let Some(dataset_id) = &self.dataset_id {
            body.insert("datasetId".to_string(), Value::String(dataset_id.clone()));
        }
        merge_children(&mut body, &self.properties, &self.relationships);
        single_key(&self.name, body)
    }
}

/// An NGSI-LD GeoProperty: a named geospatial value. Terminal, it owns
/// no nested attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoProperty {
    name: String,
    value: Geometry,
    observed_at: Option<String>,
    dataset_id: Option<String>,
}

impl GeoProperty {
    pub fn new(name: impl Into<String>, value: Geometry) -> Self {
        GeoProperty {
            name: name.into(),
            value,
            observed_at: None,
            dataset_id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Geometry {
        &self.value
    }

    pub fn observed_at(&self) -> Option<&str> {
        self.observed_at.as_deref()
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn set_value(&mut self, value: Geometry) {
        self.value = value;
    }

    pub fn set_observed_at(&mut self, observed_at: impl Into<Timestamp>) {
        self.observed_at = Some(observed_at.into().to_iso8601());
    }

    pub fn set_dataset_id(&mut self, dataset_id: impl Into<String>) {
        self.dataset_id = Some(dataset_id.into());
    }

    pub fn to_ngsild(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".to_string(), Value::String("GeoProperty".to_string()));
        body.insert("value".to_string(), self.value.to_value());
        if let Some(observed_at) = &self.observed_at {
            body.insert(
                "observedAt".to_string(),
                Value::String(observed_at.clone()),
            );
        }
        if let Some(dataset_id) = &self.dataset_id {
            body.insert("datasetId".to_string(), Value::String(dataset_id.clone()));
        }
        single_key(&self.name, body)
    }
}

/// An NGSI-LD Relationship: a named reference to another entity,
/// optionally with nested sub-properties and sub-relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    name: String,
    object: String,
    observed_at: Option<String>,
    dataset_id: Option<String>,
    properties: Vec<PropertyNode>,
    relationships: Vec<Relationship>,
}

impl Relationship {
    pub fn new(name: impl Into<String>, object: impl Into<String>) -> Self {
        Relationship {
            name: name.into(),
            object: object.into(),
            observed_at: None,
            dataset_id: None,
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the referenced entity.
    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn observed_at(&self) -> Option<&str> {
        self.observed_at.as_deref()
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn properties(&self) -> &[PropertyNode] {
        &self.properties
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn set_object(&mut self, object: impl Into<String>) {
        self.object = object.into();
    }

    pub fn set_observed_at(&mut self, observed_at: impl Into<Timestamp>) {
        self.observed_at = Some(observed_at.into().to_iso8601());
    }

    pub fn set_dataset_id(&mut self, dataset_id: impl Into<String>) {
        self.dataset_id = Some(dataset_id.into());
    }

    pub fn set_properties(&mut self, properties: Vec<PropertyNode>) {
        self.properties = properties;
    }

    pub fn add_property(&mut self, property: impl Into<PropertyNode>) {
        self.properties.push(property.into());
    }

    pub fn add_properties(&mut self, properties: impl IntoIterator<Item = PropertyNode>) {
        self.properties.extend(properties);
    }

    pub fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships = relationships;
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn add_relationships(&mut self, relationships: impl IntoIterator<Item = Relationship>) {
        self.relationships.extend(relationships);
    }

    pub fn to_ngsild(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "type".to_string(),
            Value::String("Relationship".to_string()),
        );
        body.insert("object".to_string(), Value::String(self.object.clone()));
        if let Some(observed_at) = &self.observed_at {
            body.insert(
                "observedAt".to_string(),
                Value::String(observed_at.clone()),
            );
        }
        if let Some(dataset_id) = &self.dataset_id {
            body.insert("datasetId".to_string(), Value::String(dataset_id.clone()));
        }
        merge_children(&mut body, &self.properties, &self.relationships);
        single_key(&self.name, body)
    }
}

/// Merge each child's single-key rendering into `body` as sibling
/// keys: properties first, then relationships, each in insertion
/// order. A repeated name overwrites the earlier entry.
pub(crate) fn merge_children(
    body: &mut Map<String, Value>,
    properties: &[PropertyNode],
    relationships: &[Relationship],
) {
    for child in properties {
        merge_rendered(body, child.to_ngsild());
    }
    for child in relationships {
        merge_rendered(body, child.to_ngsild());
    }
}

fn merge_rendered(body: &mut Map<String, Value>, rendered: Value) {
    if let Value::Object(map) = rendered {
        for (name, node_body) in map {
            body.insert(name, node_body);
        }
    }
}

fn single_key(name: &str, body: Map<String, Value>) -> Value {
    let mut root = Map::new();
    root.insert(name.to_string(), Value::Object(body));
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OBSERVED_AT: &str = "2021-07-22T10:11:12.000013+00:00";

    fn plant_health() -> Property {
        let mut p = Property::new("plant_health", 5);
        p.set_observed_at(OBSERVED_AT);
        p
    }

    fn temperature() -> Property {
        let mut p = Property::new("temperature", 37);
        p.set_observed_at(OBSERVED_AT);
        p.set_unit_code("CEL");
        p
    }

    fn to_object_1() -> Relationship {
        let mut r = Relationship::new("to_object_1", "uri:object_1");
        r.set_observed_at(OBSERVED_AT);
        r
    }

    #[test]
    fn property_renders_single_key_with_type_and_value() {
        let rendered = plant_health().to_ngsild();
        let root = rendered.as_object().unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(
            rendered,
            json!({
                "plant_health": {
                    "type": "Property",
                    "value": 5,
                    "observedAt": OBSERVED_AT,
                }
            })
        );
    }

    #[test]
    fn optional_fields_appear_only_when_set() {
        let mut p = Property::new("a_property", 17);
        assert_eq!(
            p.to_ngsild(),
            json!({"a_property": {"type": "Property", "value": 17}})
        );

        p.set_unit_code("SEC");
        p.set_dataset_id("urn:p_datasetid:1");
        assert_eq!(
            p.to_ngsild(),
            json!({
                "a_property": {
                    "type": "Property",
                    "value": 17,
                    "unitCode": "SEC",
                    "datasetId": "urn:p_datasetid:1",
                }
            })
        );
    }

    #[test]
    fn sub_property_is_a_sibling_key_inside_the_body() {
        let mut p = plant_health();
        p.add_property(temperature());
        let rendered = p.to_ngsild();

        // The nested property lands inside plant_health's body, next to
        // "value", never under it.
        assert_eq!(
            rendered,
            json!({
                "plant_health": {
                    "type": "Property",
                    "value": 5,
                    "observedAt": OBSERVED_AT,
                    "temperature": {
                        "type": "Property",
                        "value": 37,
                        "observedAt": OBSERVED_AT,
                        "unitCode": "CEL",
                    }
                }
            })
        );
        assert!(rendered["plant_health"]["value"].is_number());
    }

    #[test]
    fn structured_values_render_as_given() {
        let p = Property::new(
            "dimensions",
            json!({"width": 40, "depth": 25, "height": 12}),
        );
        assert_eq!(
            p.to_ngsild()["dimensions"]["value"],
            json!({"width": 40, "depth": 25, "height": 12})
        );
    }

    #[test]
    fn observed_at_accepts_aware_datetimes() {
        use chrono::NaiveDate;
        let dt = NaiveDate::from_ymd_opt(2021, 7, 22)
            .unwrap()
            .and_hms_micro_opt(10, 11, 12, 13)
            .unwrap()
            .and_utc();
        let mut p = Property::new("a_property", 17);
        p.set_observed_at(dt);
        assert_eq!(p.observed_at(), Some(OBSERVED_AT));
    }

    #[test]
    fn add_properties_with_empty_iterator_is_a_noop() {
        let mut p = plant_health();
        p.add_properties([]);
        assert!(p.properties().is_empty());
    }

    #[test]
    fn adding_the_same_node_twice_keeps_both() {
        let mut p = plant_health();
        p.add_property(temperature());
        p.add_property(temperature());
        assert_eq!(p.properties().len(), 2);
    }

    #[test]
    fn set_properties_replaces_previous_children() {
        let mut p = plant_health();
        p.add_property(temperature());
        p.set_properties(vec![Property::new("pH", 7.3).into()]);
        assert_eq!(p.properties().len(), 1);
        assert_eq!(p.properties()[0].name(), "pH");
    }

    #[test]
    fn duplicate_sibling_names_overwrite_at_render_time() {
        let mut p = plant_health();
        p.add_property(Property::new("temperature", 20));
        p.add_property(Property::new("temperature", 37));
        let rendered = p.to_ngsild();
        let body = rendered["plant_health"].as_object().unwrap();

        assert_eq!(body["temperature"]["value"], json!(37));
        // type, value, observedAt plus a single temperature key
        assert_eq!(body.len(), 4);
    }

    #[test]
    fn geo_property_renders_geometry_value() {
        let geo = GeoProperty::new("location", Geometry::point(39.2753478, 16.4077153));
        assert_eq!(
            geo.to_ngsild(),
            json!({
                "location": {
                    "type": "GeoProperty",
                    "value": {
                        "type": "Point",
                        "coordinates": [39.2753478, 16.4077153],
                    }
                }
            })
        );
    }

    #[test]
    fn geo_property_joins_a_properties_collection() {
        let mut p = plant_health();
        p.add_property(GeoProperty::new(
            "location",
            Geometry::point(39.2753478, 16.4077153),
        ));
        let rendered = p.to_ngsild();
        assert_eq!(
            rendered["plant_health"]["location"]["type"],
            json!("GeoProperty")
        );
    }

    #[test]
    fn relationship_renders_object_reference() {
        assert_eq!(
            to_object_1().to_ngsild(),
            json!({
                "to_object_1": {
                    "type": "Relationship",
                    "object": "uri:object_1",
                    "observedAt": OBSERVED_AT,
                }
            })
        );
    }

    #[test]
    fn relationship_nests_relationships_and_properties() {
        let mut r = to_object_1();
        let mut sub = Relationship::new("to_object_2", "uri:object_2");
        sub.set_observed_at(OBSERVED_AT);
        sub.set_dataset_id("r:dataset:2");
        r.add_relationship(sub);
        r.add_property(plant_health());

        assert_eq!(
            r.to_ngsild(),
            json!({
                "to_object_1": {
                    "type": "Relationship",
                    "object": "uri:object_1",
                    "observedAt": OBSERVED_AT,
                    "plant_health": {
                        "type": "Property",
                        "value": 5,
                        "observedAt": OBSERVED_AT,
                    },
                    "to_object_2": {
                        "type": "Relationship",
                        "object": "uri:object_2",
                        "observedAt": OBSERVED_AT,
                        "datasetId": "r:dataset:2",
                    }
                }
            })
        );
    }

    #[test]
    fn deep_nesting_renders_depth_first() {
        let mut inner = Property::new("humidity", 0.6);
        inner.add_property(Property::new("accuracy", 0.02));
        let mut outer = plant_health();
        outer.add_property(inner);

        let rendered = outer.to_ngsild();
        assert_eq!(
            rendered["plant_health"]["humidity"]["accuracy"]["value"],
            json!(0.02)
        );
    }
}
