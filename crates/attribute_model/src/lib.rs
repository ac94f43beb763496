pub mod catalog;
pub mod error;
pub mod geo;
pub mod types;
pub mod value_types;

// Re-export core types for consumer convenience
pub use catalog::{AssetModel, AssetTypeInfo, ResolutionSubject, SchemaCatalog};
pub use error::{CatalogError, ModelError};
pub use geo::GeoPoint;
pub use types::{
    AssetAttribute, AttributeDescriptor, AttributeEvent, AttributeRef, AttributeState,
    MetaItemType, MetaItems, SharedEvent, ValueDescriptor, ValueType,
};

/// Dynamic attribute value as carried on the wire.
pub use serde_json::Value;
