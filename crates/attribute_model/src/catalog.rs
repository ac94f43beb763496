use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::CatalogError;
use crate::types::{AssetAttribute, AttributeDescriptor, MetaItemType, ValueDescriptor};
use crate::value_types;

/// What a schema lookup is keyed on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolutionSubject<'a> {
    Descriptor(&'a AttributeDescriptor),
    Attribute(&'a AssetAttribute),
    Name(&'a str),
}

/// Read-only schema collaborator consulted by the attribute input.
pub trait SchemaCatalog: Send + Sync + 'static {
    fn lookup(
        &self,
        asset_type: Option<&str>,
        subject: ResolutionSubject<'_>,
    ) -> (Option<AttributeDescriptor>, Option<ValueDescriptor>);

    /// First meta value found on the attribute, then the attribute
    /// descriptor, then the value descriptor.
    fn meta_value(
        &self,
        kind: MetaItemType,
        attribute: Option<&AssetAttribute>,
        descriptor: Option<&AttributeDescriptor>,
        value_descriptor: Option<&ValueDescriptor>,
    ) -> Option<Value> {
        attribute
            .and_then(|a| a.meta.get(kind))
            .or_else(|| descriptor.and_then(|d| d.meta.get(kind)))
            .or_else(|| value_descriptor.and_then(|v| v.meta.get(kind)))
            .cloned()
    }
}

/// Attribute descriptors specific to one asset type.
#[derive(Clone, Debug, Default)]
pub struct AssetTypeInfo {
    pub name: String,
    pub attribute_descriptors: Vec<AttributeDescriptor>,
}

impl AssetTypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_descriptors: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, descriptor: AttributeDescriptor) -> Self {
        self.attribute_descriptors.push(descriptor);
        self
    }

    fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attribute_descriptors.iter().find(|d| d.name == name)
    }
}

/// In-memory schema catalog.
#[derive(Clone, Debug, Default)]
pub struct AssetModel {
    value_descriptors: BTreeMap<String, ValueDescriptor>,
    attribute_descriptors: BTreeMap<String, AttributeDescriptor>,
    asset_types: BTreeMap<String, AssetTypeInfo>,
}

impl AssetModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with the well-known value descriptors and attribute types.
    pub fn with_well_known_types() -> Self {
        let mut model = Self::default();
        for descriptor in value_types::well_known_value_descriptors() {
            model
                .value_descriptors
                .insert(descriptor.name.clone(), descriptor);
        }
        for descriptor in value_types::well_known_attribute_descriptors() {
            model.register_attribute_descriptor(descriptor);
        }
        model
    }

    pub fn register_value_descriptor(
        &mut self,
        descriptor: ValueDescriptor,
    ) -> Result<(), CatalogError> {
        if self.value_descriptors.contains_key(&descriptor.name) {
            return Err(CatalogError::DuplicateValueDescriptor(descriptor.name));
        }
        self.value_descriptors
            .insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Register or replace an attribute descriptor shared by all asset types.
    pub fn register_attribute_descriptor(&mut self, descriptor: AttributeDescriptor) {
        self.attribute_descriptors
            .insert(descriptor.name.clone(), descriptor);
    }

    pub fn register_asset_type(&mut self, info: AssetTypeInfo) -> Result<(), CatalogError> {
        if self.asset_types.contains_key(&info.name) {
            return Err(CatalogError::DuplicateAssetType(info.name));
        }
        self.asset_types.insert(info.name.clone(), info);
        Ok(())
    }

    pub fn value_descriptor(&self, name: &str) -> Option<&ValueDescriptor> {
        self.value_descriptors.get(name)
    }

    fn asset_type(&self, asset_type: Option<&str>) -> Option<&AssetTypeInfo> {
        asset_type.and_then(|name| self.asset_types.get(name))
    }

    fn value_descriptor_for(&self, descriptor: Option<&AttributeDescriptor>) -> Option<ValueDescriptor> {
        descriptor
            .and_then(|d| d.value_descriptor.as_deref())
            .and_then(|name| self.value_descriptors.get(name))
            .cloned()
    }
}

impl SchemaCatalog for AssetModel {
    fn lookup(
        &self,
        asset_type: Option<&str>,
        subject: ResolutionSubject<'_>,
    ) -> (Option<AttributeDescriptor>, Option<ValueDescriptor>) {
        let asset_type = self.asset_type(asset_type);

        match subject {
            ResolutionSubject::Descriptor(descriptor) => {
                // An asset type may refine a shared descriptor under the same name
                let descriptor = asset_type
                    .and_then(|t| t.attribute(&descriptor.name))
                    .unwrap_or(descriptor)
                    .clone();
                let value_descriptor = self.value_descriptor_for(Some(&descriptor));
                (Some(descriptor), value_descriptor)
            }
            ResolutionSubject::Attribute(attribute) => {
                let descriptor = asset_type
                    .and_then(|t| t.attribute(&attribute.name))
                    .or_else(|| self.attribute_descriptors.get(&attribute.name))
                    .cloned();
                let value_descriptor = attribute
                    .value_type
                    .as_deref()
                    .and_then(|name| self.value_descriptors.get(name))
                    .cloned()
                    .or_else(|| self.value_descriptor_for(descriptor.as_ref()));
                (descriptor, value_descriptor)
            }
            ResolutionSubject::Name(name) => {
                // A bare name only means something within a known asset type
                let descriptor = asset_type.and_then(|t| t.attribute(name)).cloned();
                let value_descriptor = self.value_descriptor_for(descriptor.as_ref());
                (descriptor, value_descriptor)
            }
        }
    }
}
