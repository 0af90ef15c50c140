//! The Entity root of an NGSI-LD graph fragment

use serde_json::{Map, Value};

use crate::attribute::{merge_children, PropertyNode, Relationship};

/// A link-context reference: a single context IRI or an ordered list.
///
/// The context is attached to the rendered document as-is; this
/// library does not resolve or validate it.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    Iri(String),
    List(Vec<String>),
}

impl Context {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Context::Iri(iri) => Value::String(iri.clone()),
            Context::List(iris) => {
                Value::Array(iris.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for Context {
    fn from(iri: &str) -> Self {
        Context::Iri(iri.to_string())
    }
}

impl From<String> for Context {
    fn from(iri: String) -> Self {
        Context::Iri(iri)
    }
}

impl From<Vec<String>> for Context {
    fn from(iris: Vec<String>) -> Self {
        Context::List(iris)
    }
}

impl From<Vec<&str>> for Context {
    fn from(iris: Vec<&str>) -> Self {
        Context::List(iris.into_iter().map(str::to_string).collect())
    }
}

/// An NGSI-LD Entity: the identified, typed root that owns top-level
/// properties and relationships and an optional link-context.
///
/// `id` and `entity_type` identify the graph root and are fixed at
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: String,
    entity_type: String,
    at_context: Option<Context>,
    properties: Vec<PropertyNode>,
    relationships: Vec<Relationship>,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            entity_type: entity_type.into(),
            at_context: None,
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn at_context(&self) -> Option<&Context> {
        self.at_context.as_ref()
    }

    pub fn set_context(&mut self, context: impl Into<Context>) {
        self.at_context = Some(context.into());
    }

    pub fn properties(&self) -> &[PropertyNode] {
        &self.properties
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Replace all top-level properties.
    pub fn set_properties(&mut self, properties: Vec<PropertyNode>) {
        self.properties = properties;
    }

    /// Append one top-level property.
    pub fn add_property(&mut self, property: impl Into<PropertyNode>) {
        self.properties.push(property.into());
    }

    /// Append top-level properties in order. An empty iterator is a no-op.
    pub fn add_properties(&mut self, properties: impl IntoIterator<Item = PropertyNode>) {
        self.properties.extend(properties);
    }

    /// Replace all top-level relationships.
    pub fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships = relationships;
    }

    /// Append one top-level relationship.
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    /// Append top-level relationships in order. An empty iterator is a no-op.
    pub fn add_relationships(&mut self, relationships: impl IntoIterator<Item = Relationship>) {
        self.relationships.extend(relationships);
    }

    /// Render the whole graph into its canonical NGSI-LD
    /// representation. The `@context` key is always present, `null`
    /// when no context is attached; every top-level attribute's
    /// rendering is merged in after `id` and `type`, in insertion
    /// order.
    pub fn to_ngsild(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "@context".to_string(),
            self.at_context
                .as_ref()
                .map(Context::to_value)
                .unwrap_or(Value::Null),
        );
        body.insert("id".to_string(), Value::String(self.id.clone()));
        body.insert("type".to_string(), Value::String(self.entity_type.clone()));
        merge_children(&mut body, &self.properties, &self.relationships);
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Property;
    use serde_json::json;

    const AT_CONTEXT: &str = "https://raw.githubusercontent.com/dummy/ngsild-api-data-models/main/jsonld-contexts/mydummy-contexts.jsonld";
    const OBSERVED_AT: &str = "2021-07-22T10:11:12.000013+00:00";

    fn ent_1() -> Entity {
        Entity::new("uri:entity:1", "ENTITY")
    }

    fn prop_1() -> Property {
        let mut p = Property::new("plant_health", 5);
        p.set_observed_at(OBSERVED_AT);
        p
    }

    fn prop_2() -> Property {
        let mut p = Property::new("temperature", 37);
        p.set_observed_at(OBSERVED_AT);
        p.set_unit_code("CEL");
        p
    }

    #[test]
    fn keeps_id_and_type() {
        let e = ent_1();
        assert_eq!(e.id(), "uri:entity:1");
        assert_eq!(e.entity_type(), "ENTITY");
    }

    #[test]
    fn bare_entity_renders_null_context_id_and_type_only() {
        assert_eq!(
            ent_1().to_ngsild(),
            json!({
                "@context": null,
                "id": "uri:entity:1",
                "type": "ENTITY",
            })
        );
    }

    #[test]
    fn context_list_is_rendered_as_given() {
        let mut e = ent_1();
        e.set_context(vec![AT_CONTEXT]);
        assert_eq!(
            e.to_ngsild(),
            json!({
                "@context": [AT_CONTEXT],
                "id": "uri:entity:1",
                "type": "ENTITY",
            })
        );
    }

    #[test]
    fn single_context_iri_stays_scalar() {
        let mut e = ent_1();
        e.set_context(AT_CONTEXT);
        assert_eq!(e.to_ngsild()["@context"], json!(AT_CONTEXT));
    }

    #[test]
    fn add_property_appends_in_order() {
        let mut e = ent_1();
        e.add_property(prop_1());
        e.add_property(prop_2());
        assert_eq!(e.properties().len(), 2);
        assert_eq!(e.properties()[0].name(), "plant_health");
        assert_eq!(e.properties()[1].name(), "temperature");
    }

    #[test]
    fn add_properties_bulk_appends() {
        let mut e = ent_1();
        e.add_properties([prop_1().into(), prop_2().into()]);
        assert_eq!(e.properties().len(), 2);
    }

    #[test]
    fn set_properties_replaces() {
        let mut e = ent_1();
        e.add_property(prop_1());
        e.set_properties(vec![prop_2().into()]);
        assert_eq!(e.properties().len(), 1);
        assert_eq!(e.properties()[0].name(), "temperature");
    }

    #[test]
    fn renders_two_top_level_properties() {
        let mut e = ent_1();
        e.set_context(vec![AT_CONTEXT]);
        e.add_properties([prop_1().into(), prop_2().into()]);
        assert_eq!(
            e.to_ngsild(),
            json!({
                "@context": [AT_CONTEXT],
                "id": "uri:entity:1",
                "type": "ENTITY",
                "plant_health": {
                    "type": "Property",
                    "value": 5,
                    "observedAt": OBSERVED_AT,
                },
                "temperature": {
                    "type": "Property",
                    "value": 37,
                    "observedAt": OBSERVED_AT,
                    "unitCode": "CEL",
                }
            })
        );
    }

    #[test]
    fn renders_sub_property_inside_parent_body() {
        let mut e = ent_1();
        e.set_context(vec![AT_CONTEXT]);
        let mut p = prop_1();
        p.add_property(prop_2());
        e.add_property(p);
        assert_eq!(
            e.to_ngsild(),
            json!({
                "@context": [AT_CONTEXT],
                "id": "uri:entity:1",
                "type": "ENTITY",
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
    }

    #[test]
    fn renders_top_level_relationship() {
        use crate::attribute::Relationship;
        let mut e = ent_1();
        e.add_relationship(Relationship::new("to_object_1", "uri:object_1"));
        assert_eq!(
            e.to_ngsild()["to_object_1"],
            json!({"type": "Relationship", "object": "uri:object_1"})
        );
    }

    #[test]
    fn properties_render_before_relationships() {
        use crate::attribute::Relationship;
        let mut e = ent_1();
        e.add_relationship(Relationship::new("to_object_1", "uri:object_1"));
        e.add_property(prop_1());
        let rendered = e.to_ngsild();
        let keys: Vec<&str> = rendered
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            ["@context", "id", "type", "plant_health", "to_object_1"]
        );
    }

    #[test]
    fn key_order_is_deterministic() {
        let mut e = ent_1();
        e.add_property(prop_1());
        e.add_property(prop_2());
        let rendered = e.to_ngsild();
        let keys: Vec<&str> = rendered
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            ["@context", "id", "type", "plant_health", "temperature"]
        );
    }
}
