use std::sync::Arc;
use std::time::Duration;

use attribute_model::{AssetModel, SchemaCatalog};
use bevy::prelude::*;

/// How long a submitted write waits for its confirming event.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(5000);

/// App-wide defaults for attribute inputs. Per-input options on
/// [`AttributeInput`](crate::input::AttributeInput) take precedence.
#[derive(Resource, Clone, Debug)]
pub struct AttributeInputSettings {
    pub write_timeout: Duration,
    pub helper_text: bool,
}

impl Default for AttributeInputSettings {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            helper_text: false,
        }
    }
}

/// Schema catalog consulted when resolving descriptors.
/// Insert before adding the plugin to replace the built-in asset model.
#[derive(Resource, Clone)]
pub struct AttributeSchemas(pub Arc<dyn SchemaCatalog>);

impl AttributeSchemas {
    pub fn new(catalog: impl SchemaCatalog) -> Self {
        Self(Arc::new(catalog))
    }

    pub fn catalog(&self) -> &dyn SchemaCatalog {
        self.0.as_ref()
    }
}

impl Default for AttributeSchemas {
    fn default() -> Self {
        Self::new(AssetModel::with_well_known_types())
    }
}
