#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ModelError {
    #[error("not a GeoJSON point: {0}")]
    InvalidGeoJson(String),
    #[error("malformed attribute ref '{0}', expected 'entityId:attributeName'")]
    MalformedRef(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("asset type '{0}' is already registered")]
    DuplicateAssetType(String),
    #[error("value descriptor '{0}' is already registered")]
    DuplicateValueDescriptor(String),
}
