//! Well-known value descriptors and attribute types of the asset model.

use crate::types::{AttributeDescriptor, MetaItemType, MetaItems, ValueDescriptor, ValueType};

pub const STRING: &str = "STRING";
pub const NUMBER: &str = "NUMBER";
pub const BOOLEAN: &str = "BOOLEAN";
pub const OBJECT: &str = "OBJECT";
pub const ARRAY: &str = "ARRAY";
pub const EMAIL: &str = "EMAIL";
pub const PERCENTAGE: &str = "PERCENTAGE";
pub const TIMESTAMP: &str = "TIMESTAMP";
pub const SWITCH_TOGGLE: &str = "SWITCH_TOGGLE";
pub const SWITCH_MOMENTARY: &str = "SWITCH_MOMENTARY";
pub const GEO_JSON_POINT: &str = "GEO_JSON_POINT";

/// Value descriptors every catalog knows about.
pub fn well_known_value_descriptors() -> Vec<ValueDescriptor> {
    vec![
        ValueDescriptor::new(STRING, ValueType::String),
        ValueDescriptor::new(NUMBER, ValueType::Number),
        ValueDescriptor::new(BOOLEAN, ValueType::Boolean),
        ValueDescriptor::new(OBJECT, ValueType::Object),
        ValueDescriptor::new(ARRAY, ValueType::Array),
        ValueDescriptor::new(EMAIL, ValueType::String),
        ValueDescriptor::new(PERCENTAGE, ValueType::Number).with_meta(
            MetaItems::new()
                .with(MetaItemType::RangeMin, 0)
                .with(MetaItemType::RangeMax, 100)
                .with(MetaItemType::UnitType, "%"),
        ),
        ValueDescriptor::new(TIMESTAMP, ValueType::Number),
        ValueDescriptor::new(SWITCH_TOGGLE, ValueType::Boolean),
        ValueDescriptor::new(SWITCH_MOMENTARY, ValueType::Boolean),
        ValueDescriptor::new(GEO_JSON_POINT, ValueType::Object),
    ]
}

fn labelled(name: &str, value_descriptor: &str, label: &str) -> AttributeDescriptor {
    AttributeDescriptor::new(name)
        .with_value_descriptor(value_descriptor)
        .with_meta(MetaItems::new().with(MetaItemType::Label, label))
}

/// Attribute types shared by every asset type.
pub fn well_known_attribute_descriptors() -> Vec<AttributeDescriptor> {
    vec![
        AttributeDescriptor::new("string").with_value_descriptor(STRING),
        AttributeDescriptor::new("number").with_value_descriptor(NUMBER),
        AttributeDescriptor::new("consoleName").with_value_descriptor(STRING),
        AttributeDescriptor::new("consoleVersion").with_value_descriptor(STRING),
        AttributeDescriptor::new("consolePlatform").with_value_descriptor(STRING),
        AttributeDescriptor::new("consoleProviders").with_value_descriptor(OBJECT),
        labelled("email", EMAIL, "Email"),
        labelled("city", STRING, "City"),
        labelled("country", STRING, "Country"),
        labelled("postalCode", NUMBER, "Postal Code"),
        labelled("street", STRING, "Street"),
        labelled("location", GEO_JSON_POINT, "Location"),
        labelled("surfaceArea", NUMBER, "Surface Area"),
    ]
}
