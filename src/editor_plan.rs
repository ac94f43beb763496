use attribute_model::{
    AssetAttribute, MetaItemType, SchemaCatalog, Value, ValueDescriptor, ValueType, value_types,
};
use serde::{Deserialize, Serialize};

use crate::descriptors::ResolvedDescriptors;

/// Closed set of editors an attribute can be shown with.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EditorKind {
    Text,
    TextArea,
    Password,
    Email,
    Url,
    Telephone,
    Number,
    Range,
    Date,
    DateTime,
    Time,
    Month,
    Week,
    Select,
    Switch,
    Checkbox,
    Color,
    Json,
    ButtonMomentary,
    GeoJsonPoint,
}

impl EditorKind {
    /// Kinds that hold a draft and commit it through a send button.
    pub const fn supports_write_button(self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::Telephone
                | Self::Text
                | Self::Password
                | Self::Date
                | Self::DateTime
                | Self::Email
                | Self::Json
                | Self::Month
                | Self::TextArea
                | Self::Time
                | Self::Url
                | Self::Week
        )
    }

    pub const fn supports_helper_text(self) -> bool {
        self.supports_write_button() || matches!(self, Self::Select)
    }

    /// Enter inserts a newline in these editors instead of submitting.
    pub const fn commits_on_enter(self) -> bool {
        !matches!(self, Self::Json | Self::TextArea)
    }

    /// Kinds rendered by a dedicated renderer rather than the generic editor.
    pub const fn is_specialized(self) -> bool {
        matches!(self, Self::GeoJsonPoint | Self::ButtonMomentary)
    }

    fn for_value_type(value_type: ValueType) -> Self {
        match value_type {
            ValueType::String => Self::Text,
            ValueType::Number => Self::Number,
            ValueType::Boolean => Self::Switch,
            ValueType::Object | ValueType::Array => Self::Json,
        }
    }

    fn for_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(_) => Some(Self::Number),
            Value::String(_) => Some(Self::Text),
            Value::Bool(_) => Some(Self::Switch),
            Value::Array(_) | Value::Object(_) => Some(Self::Json),
        }
    }
}

/// Everything the renderer needs to draw one attribute editor.
///
/// Always rebuilt as a whole by [`infer`]; never patched field by field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorPlan {
    pub kind: Option<EditorKind>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub unit: Option<String>,
    pub allowed_values: Option<Vec<Value>>,
    pub readonly: bool,
    pub disabled: bool,
    pub show_write_button: bool,
    pub value_format: Option<String>,
    pub label: Option<String>,
}

impl EditorPlan {
    /// Plan carrying only the flags that apply whatever renders the attribute.
    pub fn base(readonly: bool, disabled: bool, label: Option<String>) -> Self {
        Self {
            readonly,
            disabled,
            label,
            ..Default::default()
        }
    }

    pub fn supports_helper_text(&self) -> bool {
        self.kind.is_some_and(EditorKind::supports_helper_text)
    }
}

/// Inputs to [`infer`] beyond the resolved descriptors.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanInputs<'a> {
    pub attribute: Option<&'a AssetAttribute>,
    pub current_value: Option<&'a Value>,
    pub explicit_kind: Option<EditorKind>,
    pub readonly: Option<bool>,
    pub disabled: bool,
    pub label: Option<&'a str>,
    pub disable_button: bool,
    pub has_attribute_ref: bool,
}

pub fn infer(
    catalog: &dyn SchemaCatalog,
    descriptors: &ResolvedDescriptors,
    inputs: &PlanInputs<'_>,
) -> EditorPlan {
    let mut plan = base_plan(catalog, descriptors, inputs);

    let kind = match (inputs.explicit_kind, descriptors.value.as_ref()) {
        (Some(kind), _) => Some(kind),
        (None, Some(value_descriptor)) => {
            let kind = kind_for_descriptor(value_descriptor);
            if kind.is_specialized() {
                // Specialised renderers derive nothing from meta
                plan.kind = Some(kind);
                return plan;
            }
            Some(kind)
        }
        (None, None) => inputs.current_value.and_then(EditorKind::for_value),
    };
    let Some(mut kind) = kind else {
        return plan;
    };

    let meta = |item: MetaItemType| {
        catalog.meta_value(
            item,
            inputs.attribute,
            descriptors.attribute.as_ref(),
            descriptors.value.as_ref(),
        )
    };
    let number = |item: MetaItemType| meta(item).as_ref().and_then(Value::as_f64);

    plan.min = number(MetaItemType::RangeMin);
    plan.max = number(MetaItemType::RangeMax);
    plan.step = number(MetaItemType::Step);
    plan.unit = meta(MetaItemType::UnitType).and_then(into_string);
    plan.allowed_values = catalog
        .meta_value(
            MetaItemType::AllowedValues,
            inputs.attribute,
            descriptors.attribute.as_ref(),
            None,
        )
        .and_then(|v| match v {
            Value::Array(values) => Some(values),
            _ => None,
        });

    if inputs.explicit_kind.is_none() {
        if kind == EditorKind::Text && plan.allowed_values.as_ref().is_some_and(|v| !v.is_empty()) {
            kind = EditorKind::Select;
        }
        if kind == EditorKind::Text && meta(MetaItemType::Multiline).is_some_and(|v| is_truthy(&v)) {
            kind = EditorKind::TextArea;
        }
        // Any min counts, even one that is not a number
        let has_min = meta(MetaItemType::RangeMin).is_some();
        if kind == EditorKind::Number && has_min && plan.max.is_some_and(|max| max != 0.0) {
            kind = EditorKind::Range;
        }
    }

    plan.kind = Some(kind);
    plan.value_format = meta(MetaItemType::Format).and_then(into_string);
    plan.show_write_button = !plan.readonly
        && !plan.disabled
        && !inputs.disable_button
        && kind.supports_write_button()
        && inputs.has_attribute_ref;
    plan
}

/// Flags and label shared by every render path, custom providers included.
pub fn base_plan(
    catalog: &dyn SchemaCatalog,
    descriptors: &ResolvedDescriptors,
    inputs: &PlanInputs<'_>,
) -> EditorPlan {
    let readonly = inputs.readonly.unwrap_or_else(|| {
        catalog
            .meta_value(
                MetaItemType::ReadOnly,
                inputs.attribute,
                descriptors.attribute.as_ref(),
                None,
            )
            .is_some_and(|v| is_truthy(&v))
    });
    let label = derive_label(catalog, descriptors, inputs.attribute, inputs.label);
    EditorPlan::base(readonly, inputs.disabled, label)
}

fn kind_for_descriptor(value_descriptor: &ValueDescriptor) -> EditorKind {
    match value_descriptor.name.as_str() {
        value_types::GEO_JSON_POINT => EditorKind::GeoJsonPoint,
        value_types::SWITCH_MOMENTARY => EditorKind::ButtonMomentary,
        _ => EditorKind::for_value_type(value_descriptor.value_type),
    }
}

/// An explicit non-empty label wins; an explicit empty label hides it.
/// Otherwise use the label meta item, then the humanised attribute name.
pub fn derive_label(
    catalog: &dyn SchemaCatalog,
    descriptors: &ResolvedDescriptors,
    attribute: Option<&AssetAttribute>,
    label: Option<&str>,
) -> Option<String> {
    match label {
        Some("") => return None,
        Some(label) => return Some(label.to_string()),
        None => {}
    }

    catalog
        .meta_value(
            MetaItemType::Label,
            attribute,
            descriptors.attribute.as_ref(),
            None,
        )
        .and_then(into_string)
        .or_else(|| {
            attribute
                .map(|a| a.name.as_str())
                .or_else(|| descriptors.attribute.as_ref().map(|d| d.name.as_str()))
                .map(name_to_label)
        })
}

/// `surfaceArea` -> `Surface area`, `postal_code` -> `Postal code`.
pub fn name_to_label(name: &str) -> String {
    let mut label = String::new();
    for (i, ch) in name.chars().enumerate() {
        if ch == '_' {
            label.push(' ');
        } else if ch.is_uppercase() && i > 0 {
            label.push(' ');
            label.extend(ch.to_lowercase());
        } else if i == 0 {
            label.extend(ch.to_uppercase());
        } else {
            label.push(ch);
        }
    }
    label
}

fn into_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attribute_model::{AssetModel, AttributeDescriptor, MetaItems};
    use serde_json::json;

    fn number_descriptor(meta: MetaItems) -> ResolvedDescriptors {
        ResolvedDescriptors {
            attribute: Some(AttributeDescriptor::new("temp").with_meta(meta)),
            value: Some(ValueDescriptor::new(value_types::NUMBER, ValueType::Number)),
        }
    }

    fn with_ref() -> PlanInputs<'static> {
        PlanInputs {
            has_attribute_ref: true,
            ..Default::default()
        }
    }

    #[test]
    fn value_types_map_to_editors() {
        let model = AssetModel::new();
        for (value_type, expected) in [
            (ValueType::String, EditorKind::Text),
            (ValueType::Number, EditorKind::Number),
            (ValueType::Boolean, EditorKind::Switch),
            (ValueType::Object, EditorKind::Json),
            (ValueType::Array, EditorKind::Json),
        ] {
            let descriptors = ResolvedDescriptors {
                attribute: None,
                value: Some(ValueDescriptor::new("ANY", value_type)),
            };
            assert_eq!(infer(&model, &descriptors, &with_ref()).kind, Some(expected));
        }
    }

    #[test]
    fn runtime_type_is_used_without_descriptor() {
        let model = AssetModel::new();
        let descriptors = ResolvedDescriptors::default();
        let kind_of = |value: Value| {
            infer(
                &model,
                &descriptors,
                &PlanInputs {
                    current_value: Some(&value),
                    ..Default::default()
                },
            )
            .kind
        };
        assert_eq!(kind_of(json!(21.5)), Some(EditorKind::Number));
        assert_eq!(kind_of(json!("on")), Some(EditorKind::Text));
        assert_eq!(kind_of(json!(false)), Some(EditorKind::Switch));
        assert_eq!(kind_of(json!({ "a": 1 })), Some(EditorKind::Json));
        assert_eq!(kind_of(Value::Null), None);
        assert_eq!(infer(&model, &descriptors, &PlanInputs::default()).kind, None);
    }

    #[test]
    fn range_needs_min_and_truthy_max() {
        let model = AssetModel::new();
        let kind = |meta: MetaItems| infer(&model, &number_descriptor(meta), &with_ref()).kind;

        let both = MetaItems::new()
            .with(MetaItemType::RangeMin, 0)
            .with(MetaItemType::RangeMax, 10);
        assert_eq!(kind(both.clone()), Some(EditorKind::Range));

        let mut no_min = both.clone();
        no_min.remove(MetaItemType::RangeMin);
        assert_eq!(kind(no_min), Some(EditorKind::Number));

        let mut no_max = both.clone();
        no_max.remove(MetaItemType::RangeMax);
        assert_eq!(kind(no_max), Some(EditorKind::Number));

        let textual_min = both.clone().with(MetaItemType::RangeMin, "low");
        assert_eq!(kind(textual_min), Some(EditorKind::Range));

        let zero_max = both.with(MetaItemType::RangeMax, 0);
        assert_eq!(kind(zero_max), Some(EditorKind::Number));
    }

    #[test]
    fn bounds_are_kept_alongside_allowed_values() {
        let model = AssetModel::new();
        let meta = MetaItems::new()
            .with(MetaItemType::RangeMin, 0)
            .with(MetaItemType::RangeMax, 10)
            .with(MetaItemType::AllowedValues, json!([1, 2, 3]));
        let plan = infer(&model, &number_descriptor(meta), &with_ref());
        assert_eq!(plan.min, Some(0.0));
        assert_eq!(plan.max, Some(10.0));
        assert_eq!(plan.allowed_values, Some(vec![json!(1), json!(2), json!(3)]));
    }

    #[test]
    fn text_refinements() {
        let model = AssetModel::new();
        let text = |meta: MetaItems| ResolvedDescriptors {
            attribute: Some(AttributeDescriptor::new("mode").with_meta(meta)),
            value: Some(ValueDescriptor::new(value_types::STRING, ValueType::String)),
        };

        let select = text(MetaItems::new().with(MetaItemType::AllowedValues, json!(["a", "b"])));
        assert_eq!(infer(&model, &select, &with_ref()).kind, Some(EditorKind::Select));

        let empty = text(MetaItems::new().with(MetaItemType::AllowedValues, json!([])));
        assert_eq!(infer(&model, &empty, &with_ref()).kind, Some(EditorKind::Text));

        let multiline = text(MetaItems::new().with(MetaItemType::Multiline, true));
        assert_eq!(infer(&model, &multiline, &with_ref()).kind, Some(EditorKind::TextArea));
    }

    #[test]
    fn explicit_kind_skips_refinement() {
        let model = AssetModel::new();
        let meta = MetaItems::new()
            .with(MetaItemType::RangeMin, 0)
            .with(MetaItemType::RangeMax, 10);
        let plan = infer(
            &model,
            &number_descriptor(meta),
            &PlanInputs {
                explicit_kind: Some(EditorKind::Number),
                has_attribute_ref: true,
                ..Default::default()
            },
        );
        assert_eq!(plan.kind, Some(EditorKind::Number));
        assert_eq!(plan.max, Some(10.0));
    }

    #[test]
    fn geometry_skips_meta_derivation() {
        let model = AssetModel::new();
        let descriptors = ResolvedDescriptors {
            attribute: Some(AttributeDescriptor::new("location").with_meta(
                MetaItems::new()
                    .with(MetaItemType::RangeMin, 0)
                    .with(MetaItemType::RangeMax, 10)
                    .with(MetaItemType::Step, 1)
                    .with(MetaItemType::UnitType, "m"),
            )),
            value: Some(ValueDescriptor::new(value_types::GEO_JSON_POINT, ValueType::Object)),
        };
        let point = json!({ "type": "Point", "coordinates": [5.0, 51.0] });
        let plan = infer(
            &model,
            &descriptors,
            &PlanInputs {
                current_value: Some(&point),
                has_attribute_ref: true,
                ..Default::default()
            },
        );
        assert_eq!(plan.kind, Some(EditorKind::GeoJsonPoint));
        assert_eq!((plan.min, plan.max, plan.step), (None, None, None));
        assert_eq!(plan.unit, None);
        assert!(!plan.show_write_button);
    }

    #[test]
    fn momentary_switch_is_specialised() {
        let model = AssetModel::new();
        let descriptors = ResolvedDescriptors {
            attribute: None,
            value: Some(ValueDescriptor::new(value_types::SWITCH_MOMENTARY, ValueType::Boolean)),
        };
        let plan = infer(&model, &descriptors, &with_ref());
        assert_eq!(plan.kind, Some(EditorKind::ButtonMomentary));
        assert!(!plan.show_write_button);
    }

    #[test]
    fn write_button_conditions() {
        let model = AssetModel::new();
        let descriptors = number_descriptor(MetaItems::new());
        assert!(infer(&model, &descriptors, &with_ref()).show_write_button);

        let no_ref = PlanInputs::default();
        assert!(!infer(&model, &descriptors, &no_ref).show_write_button);

        let suppressed = PlanInputs {
            disable_button: true,
            ..with_ref()
        };
        assert!(!infer(&model, &descriptors, &suppressed).show_write_button);

        let readonly = PlanInputs {
            readonly: Some(true),
            ..with_ref()
        };
        assert!(!infer(&model, &descriptors, &readonly).show_write_button);

        let disabled = PlanInputs {
            disabled: true,
            ..with_ref()
        };
        assert!(!infer(&model, &descriptors, &disabled).show_write_button);

        let switch = ResolvedDescriptors {
            attribute: None,
            value: Some(ValueDescriptor::new(value_types::BOOLEAN, ValueType::Boolean)),
        };
        assert!(!infer(&model, &switch, &with_ref()).show_write_button);
    }

    #[test]
    fn readonly_meta_applies_unless_overridden() {
        let model = AssetModel::new();
        let descriptors = number_descriptor(MetaItems::new().with(MetaItemType::ReadOnly, true));
        assert!(infer(&model, &descriptors, &with_ref()).readonly);

        let overridden = PlanInputs {
            readonly: Some(false),
            ..with_ref()
        };
        assert!(!infer(&model, &descriptors, &overridden).readonly);
    }

    #[test]
    fn labels() {
        let model = AssetModel::new();
        let attribute = AssetAttribute::new("surfaceArea");
        let descriptors = ResolvedDescriptors::default();

        assert_eq!(
            derive_label(&model, &descriptors, Some(&attribute), None),
            Some("Surface area".to_string())
        );
        assert_eq!(derive_label(&model, &descriptors, Some(&attribute), Some("")), None);
        assert_eq!(
            derive_label(&model, &descriptors, Some(&attribute), Some("Area")),
            Some("Area".to_string())
        );

        let labelled = attribute.with_meta(MetaItems::new().with(MetaItemType::Label, "Floor area"));
        assert_eq!(
            derive_label(&model, &descriptors, Some(&labelled), None),
            Some("Floor area".to_string())
        );
    }

    #[test]
    fn format_and_unit_come_from_meta() {
        let model = AssetModel::new();
        let descriptors = ResolvedDescriptors {
            attribute: Some(AttributeDescriptor::new("temp")),
            value: Some(
                ValueDescriptor::new(value_types::NUMBER, ValueType::Number).with_meta(
                    MetaItems::new()
                        .with(MetaItemType::UnitType, "°C")
                        .with(MetaItemType::Format, "%.1f")
                        .with(MetaItemType::Step, 0.5),
                ),
            ),
        };
        let plan = infer(&model, &descriptors, &with_ref());
        assert_eq!(plan.unit.as_deref(), Some("°C"));
        assert_eq!(plan.value_format.as_deref(), Some("%.1f"));
        assert_eq!(plan.step, Some(0.5));
    }
}
