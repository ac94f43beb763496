use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// AttributeRef
// ---------------------------------------------------------------------------

/// Identifies one attribute on one entity. Used as the subscription key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRef {
    pub entity_id: String,
    pub attribute_name: String,
}

impl AttributeRef {
    pub fn new(entity_id: impl Into<String>, attribute_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            attribute_name: attribute_name.into(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_id, self.attribute_name)
    }
}

impl FromStr for AttributeRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((entity_id, attribute_name))
                if !entity_id.is_empty() && !attribute_name.is_empty() =>
            {
                Ok(Self::new(entity_id, attribute_name))
            }
            _ => Err(ModelError::MalformedRef(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Meta items
// ---------------------------------------------------------------------------

/// Well-known meta item keys consulted by the attribute input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaItemType {
    Label,
    ReadOnly,
    RangeMin,
    RangeMax,
    Step,
    UnitType,
    AllowedValues,
    Multiline,
    Format,
}

impl MetaItemType {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::ReadOnly => "readOnly",
            Self::RangeMin => "rangeMin",
            Self::RangeMax => "rangeMax",
            Self::Step => "step",
            Self::UnitType => "unitType",
            Self::AllowedValues => "allowedValues",
            Self::Multiline => "multiline",
            Self::Format => "format",
        }
    }
}

/// Keyed bag of auxiliary facts attached to an attribute or descriptor.
///
/// Keys are kept as strings so unknown meta from the wire survives a
/// round trip; typed access goes through [`MetaItemType`].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct MetaItems(BTreeMap<String, Value>);

impl MetaItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: MetaItemType, value: impl Into<Value>) -> Self {
        self.insert(kind, value);
        self
    }

    pub fn insert(&mut self, kind: MetaItemType, value: impl Into<Value>) {
        self.0.insert(kind.key().to_string(), value.into());
    }

    pub fn remove(&mut self, kind: MetaItemType) -> Option<Value> {
        self.0.remove(kind.key())
    }

    pub fn get(&self, kind: MetaItemType) -> Option<&Value> {
        self.0.get(kind.key())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Primitive category of a value descriptor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// Static schema info for the type of an attribute value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueDescriptor {
    pub name: String,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "MetaItems::is_empty")]
    pub meta: MetaItems,
}

impl ValueDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            meta: MetaItems::default(),
        }
    }

    pub fn with_meta(mut self, meta: MetaItems) -> Self {
        self.meta = meta;
        self
    }
}

/// Static schema info for an attribute name, independent of the entity type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    pub name: String,
    /// Name of the value descriptor used when the attribute carries no type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "MetaItems::is_empty")]
    pub meta: MetaItems,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_descriptor: None,
            meta: MetaItems::default(),
        }
    }

    pub fn with_value_descriptor(mut self, name: impl Into<String>) -> Self {
        self.value_descriptor = Some(name.into());
        self
    }

    pub fn with_meta(mut self, meta: MetaItems) -> Self {
        self.meta = meta;
        self
    }
}

// ---------------------------------------------------------------------------
// AssetAttribute
// ---------------------------------------------------------------------------

/// An attribute object as bound by a parent view.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Value descriptor name.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "MetaItems::is_empty")]
    pub meta: MetaItems,
}

impl AssetAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.value_timestamp = Some(timestamp);
        self
    }

    pub fn with_meta(mut self, meta: MetaItems) -> Self {
        self.meta = meta;
        self
    }

    /// The ref this attribute lives at, if it is attached to an asset.
    pub fn attribute_ref(&self) -> Option<AttributeRef> {
        self.asset_id
            .as_ref()
            .map(|asset_id| AttributeRef::new(asset_id.clone(), self.name.clone()))
    }

    /// True when both attributes are the same apart from value and timestamp.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name
            && self.asset_id == other.asset_id
            && self.value_type == other.value_type
            && self.meta == other.meta
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeState {
    pub attribute_ref: AttributeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A value of one attribute at a point in time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeEvent {
    pub attribute_state: AttributeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl AttributeEvent {
    pub fn new(attribute_ref: AttributeRef, value: Option<Value>) -> Self {
        Self {
            attribute_state: AttributeState {
                attribute_ref,
                value,
            },
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn attribute_ref(&self) -> &AttributeRef {
        &self.attribute_state.attribute_ref
    }

    pub fn value(&self) -> Option<&Value> {
        self.attribute_state.value.as_ref()
    }
}

/// Envelope for everything travelling over the event bus.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "eventType", rename_all = "kebab-case")]
pub enum SharedEvent {
    Attribute(AttributeEvent),
    /// Any event type the attribute input does not care about.
    #[serde(other)]
    Other,
}

impl SharedEvent {
    pub fn as_attribute(&self) -> Option<&AttributeEvent> {
        match self {
            Self::Attribute(event) => Some(event),
            Self::Other => None,
        }
    }
}

impl From<AttributeEvent> for SharedEvent {
    fn from(event: AttributeEvent) -> Self {
        Self::Attribute(event)
    }
}
