use attribute_model::{
    AssetAttribute, AttributeDescriptor, AttributeRef, ResolutionSubject, SchemaCatalog,
    ValueDescriptor,
};

/// Everything the resolver may be handed. Any field can be absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct DescriptorInputs<'a> {
    pub asset_type: Option<&'a str>,
    pub descriptor: Option<&'a AttributeDescriptor>,
    pub value_descriptor: Option<&'a ValueDescriptor>,
    pub attribute: Option<&'a AssetAttribute>,
    pub attribute_ref: Option<&'a AttributeRef>,
}

/// Canonical descriptor pair. Both `None` means "unsupported attribute".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedDescriptors {
    pub attribute: Option<AttributeDescriptor>,
    pub value: Option<ValueDescriptor>,
}

impl ResolvedDescriptors {
    pub fn is_unresolved(&self) -> bool {
        self.attribute.is_none() && self.value.is_none()
    }
}

/// Pick the single lookup subject: descriptor, then attribute, then ref name.
pub fn resolution_subject<'a>(inputs: &DescriptorInputs<'a>) -> Option<ResolutionSubject<'a>> {
    if let Some(descriptor) = inputs.descriptor {
        return Some(ResolutionSubject::Descriptor(descriptor));
    }
    if let Some(attribute) = inputs.attribute {
        return Some(ResolutionSubject::Attribute(attribute));
    }
    inputs
        .attribute_ref
        .map(|r| ResolutionSubject::Name(r.attribute_name.as_str()))
}

pub fn resolve(catalog: &dyn SchemaCatalog, inputs: &DescriptorInputs<'_>) -> ResolvedDescriptors {
    // Both explicitly supplied: the caller's word is final
    if let (Some(descriptor), Some(value)) = (inputs.descriptor, inputs.value_descriptor) {
        return ResolvedDescriptors {
            attribute: Some(descriptor.clone()),
            value: Some(value.clone()),
        };
    }

    let Some(subject) = resolution_subject(inputs) else {
        return ResolvedDescriptors::default();
    };

    let (attribute, looked_up) = catalog.lookup(inputs.asset_type, subject);
    ResolvedDescriptors {
        attribute,
        value: inputs.value_descriptor.cloned().or(looked_up),
    }
}
