use attribute_model::{AssetAttribute, GeoPoint, Value};
use bevy::prelude::*;

use crate::descriptors::ResolvedDescriptors;
use crate::editor_plan::{EditorKind, EditorPlan};
use crate::input::SubmitAttributeValue;

// ---------------------------------------------------------------------------
// Helper text
// ---------------------------------------------------------------------------

/// Status line under an editor. Translating it into a string is up to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelperText {
    Sending,
    SendFailed,
    UpdatedAt(i64),
}

impl HelperText {
    pub fn resolve(sending: bool, error: bool, timestamp: Option<i64>) -> Option<Self> {
        if sending {
            return Some(Self::Sending);
        }
        if error {
            return Some(Self::SendFailed);
        }
        timestamp.filter(|t| *t != 0).map(Self::UpdatedAt)
    }
}

// ---------------------------------------------------------------------------
// Custom providers
// ---------------------------------------------------------------------------

/// Per-frame inputs to a render capability.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderState<'a> {
    pub value: Option<&'a Value>,
    pub timestamp: Option<i64>,
    pub loading: bool,
    pub sending: bool,
    pub error: bool,
}

/// Hands a new value from a custom editor back to its attribute input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueChangeNotifier {
    entity: Entity,
}

impl ValueChangeNotifier {
    pub fn new(entity: Entity) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn notify(&self, commands: &mut Commands, value: Option<Value>) {
        commands.trigger(SubmitAttributeValue {
            entity: self.entity,
            value,
        });
    }
}

/// What a custom provider is told when asked for a template.
#[derive(Clone, Copy, Debug)]
pub struct ProviderContext<'a> {
    pub asset_type: Option<&'a str>,
    pub attribute: Option<&'a AssetAttribute>,
    pub descriptors: &'a ResolvedDescriptors,
    pub notifier: ValueChangeNotifier,
    pub readonly: bool,
    pub disabled: bool,
    pub label: Option<&'a str>,
}

/// Factory stage: decides once per descriptor change whether it takes over.
pub trait InputTemplateProvider: Send + Sync + 'static {
    fn create(&self, ctx: &ProviderContext<'_>) -> Option<Box<dyn InputTemplate>>;
}

/// Render stage: called on every state change. `None` means nothing to show.
pub trait InputTemplate: Send + Sync + 'static {
    fn render(&self, state: &RenderState<'_>) -> Option<CustomView>;
}

/// Opaque output of a custom template, passed through to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomView {
    pub kind: String,
    pub payload: Value,
}

// ---------------------------------------------------------------------------
// Geo point
// ---------------------------------------------------------------------------

/// Built-in template for GeoJSON point attributes.
#[derive(Clone, Debug)]
pub struct GeoPointTemplate {
    notifier: ValueChangeNotifier,
    readonly: bool,
    disabled: bool,
    label: Option<String>,
}

impl GeoPointTemplate {
    pub fn new(ctx: &ProviderContext<'_>) -> Self {
        Self {
            notifier: ctx.notifier,
            readonly: ctx.readonly,
            disabled: ctx.disabled,
            label: ctx.label.map(str::to_string),
        }
    }

    pub fn notifier(&self) -> ValueChangeNotifier {
        self.notifier
    }

    pub fn render(&self, state: &RenderState<'_>) -> GeoPointView {
        let point = state
            .value
            .and_then(|value| GeoPoint::from_geo_json(value).ok());
        GeoPointView {
            label: self.label.clone(),
            point,
            center: point.map(GeoPoint::to_array),
            helper_text: HelperText::resolve(state.sending, false, state.timestamp),
            loading: state.loading,
            disabled: self.disabled,
            interactive: !self.readonly && !self.disabled,
        }
    }

    /// Value to submit for a click on the map, if the click places the marker.
    pub fn on_map_click(&self, point: GeoPoint, double_click: bool) -> Option<Value> {
        (double_click && !self.readonly && !self.disabled).then(|| point.to_geo_json())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoPointView {
    pub label: Option<String>,
    /// Marker position. `None` when the value is not a valid point.
    pub point: Option<GeoPoint>,
    pub center: Option<[f64; 2]>,
    pub helper_text: Option<HelperText>,
    pub loading: bool,
    pub disabled: bool,
    pub interactive: bool,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Template chosen for an input when descriptors were last resolved.
pub enum ActiveTemplate {
    Custom(Box<dyn InputTemplate>),
    GeoPoint(GeoPointTemplate),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendIcon {
    Send,
    SendClock,
}

impl SendIcon {
    pub fn name(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::SendClock => "send-clock",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendButton {
    /// Suppressed by the caller: no space is reserved.
    Hidden,
    /// Not applicable to this editor; the slot stays empty.
    Placeholder,
    Shown { icon: SendIcon, disabled: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenericEditorView {
    pub plan: EditorPlan,
    /// Last authoritative value.
    pub value: Option<Value>,
    /// What the widget should currently contain.
    pub input_value: Option<Value>,
    /// Label handed to the widget itself; the outer label stays in `plan`.
    pub input_label: Option<String>,
    pub input_disabled: bool,
    pub loading: bool,
    pub helper_text: Option<HelperText>,
    /// Shown by the widget rather than by the surrounding wrapper.
    pub helper_text_inline: bool,
    pub send_button: SendButton,
    pub submit_on_enter: bool,
    pub submit_on_change: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MomentaryView {
    pub label: Option<String>,
    pub value: Option<Value>,
    pub readonly: bool,
    pub disabled: bool,
}

/// Rendered state of one attribute input, rebuilt whenever anything it
/// depends on changes.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub enum AttributeInputView {
    #[default]
    Unsupported,
    Custom(CustomView),
    GeoPoint(GeoPointView),
    Momentary(MomentaryView),
    Generic(GenericEditorView),
}

/// Presentation switches coming from the input's configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewOptions {
    pub helper_text: bool,
    pub disable_button: bool,
}

/// Pick exactly one rendering path: custom output, then a specialised
/// renderer, then the generic editor, then the unsupported placeholder.
pub fn dispatch(
    plan: &EditorPlan,
    template: Option<&ActiveTemplate>,
    state: &RenderState<'_>,
    input_value: Option<&Value>,
    options: ViewOptions,
) -> AttributeInputView {
    match template {
        Some(ActiveTemplate::Custom(custom)) => {
            if let Some(view) = custom.render(state) {
                return AttributeInputView::Custom(view);
            }
        }
        Some(ActiveTemplate::GeoPoint(geo)) => {
            return AttributeInputView::GeoPoint(geo.render(state));
        }
        None => {}
    }

    match plan.kind {
        None | Some(EditorKind::GeoJsonPoint) => AttributeInputView::Unsupported,
        Some(EditorKind::ButtonMomentary) => AttributeInputView::Momentary(MomentaryView {
            label: plan.label.clone(),
            value: state.value.cloned(),
            readonly: plan.readonly,
            disabled: plan.disabled || state.loading,
        }),
        Some(kind) => AttributeInputView::Generic(generic_view(
            plan,
            kind,
            state,
            input_value,
            options,
        )),
    }
}

fn generic_view(
    plan: &EditorPlan,
    kind: EditorKind,
    state: &RenderState<'_>,
    input_value: Option<&Value>,
    options: ViewOptions,
) -> GenericEditorView {
    let helper_text = options
        .helper_text
        .then(|| HelperText::resolve(state.sending, state.error, state.timestamp))
        .flatten();
    let helper_text_inline = kind.supports_helper_text();

    // A wrapper-level helper line replaces the widget's own label
    let input_label = if helper_text.is_some() && !helper_text_inline {
        None
    } else {
        plan.label.clone()
    };

    let send_button = if plan.show_write_button {
        SendButton::Shown {
            icon: if state.sending {
                SendIcon::SendClock
            } else {
                SendIcon::Send
            },
            disabled: plan.disabled || state.loading,
        }
    } else if options.disable_button {
        SendButton::Hidden
    } else {
        SendButton::Placeholder
    };

    GenericEditorView {
        plan: plan.clone(),
        value: state.value.cloned(),
        input_value: input_value.or(state.value).cloned(),
        input_label,
        input_disabled: plan.disabled || state.loading,
        loading: state.loading,
        helper_text,
        helper_text_inline,
        send_button,
        submit_on_enter: kind.commits_on_enter(),
        submit_on_change: !plan.show_write_button,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Badge;

    impl InputTemplate for Badge {
        fn render(&self, state: &RenderState<'_>) -> Option<CustomView> {
            state.value.map(|value| CustomView {
                kind: "badge".to_string(),
                payload: value.clone(),
            })
        }
    }

    fn notifier() -> ValueChangeNotifier {
        ValueChangeNotifier::new(Entity::PLACEHOLDER)
    }

    fn number_plan() -> EditorPlan {
        EditorPlan {
            kind: Some(EditorKind::Number),
            show_write_button: true,
            label: Some("Temp".to_string()),
            ..Default::default()
        }
    }

    fn geo_template(readonly: bool, disabled: bool) -> GeoPointTemplate {
        let descriptors = ResolvedDescriptors::default();
        GeoPointTemplate::new(&ProviderContext {
            asset_type: None,
            attribute: None,
            descriptors: &descriptors,
            notifier: notifier(),
            readonly,
            disabled,
            label: Some("Location"),
        })
    }

    #[test]
    fn helper_text_priority() {
        assert_eq!(HelperText::resolve(true, true, Some(5)), Some(HelperText::Sending));
        assert_eq!(HelperText::resolve(false, true, Some(5)), Some(HelperText::SendFailed));
        assert_eq!(HelperText::resolve(false, false, Some(5)), Some(HelperText::UpdatedAt(5)));
        assert_eq!(HelperText::resolve(false, false, None), None);
    }

    #[test]
    fn custom_output_wins_when_present() {
        let template = ActiveTemplate::Custom(Box::new(Badge));
        let value = json!(3);
        let state = RenderState {
            value: Some(&value),
            ..Default::default()
        };
        let view = dispatch(&number_plan(), Some(&template), &state, None, ViewOptions::default());
        assert!(matches!(view, AttributeInputView::Custom(v) if v.kind == "badge"));

        // Empty custom output falls through to the plan
        let empty = RenderState::default();
        let view = dispatch(&number_plan(), Some(&template), &empty, None, ViewOptions::default());
        assert!(matches!(view, AttributeInputView::Generic(_)));
    }

    #[test]
    fn no_kind_is_unsupported() {
        let view = dispatch(
            &EditorPlan::default(),
            None,
            &RenderState::default(),
            None,
            ViewOptions::default(),
        );
        assert_eq!(view, AttributeInputView::Unsupported);
    }

    #[test]
    fn momentary_gets_its_own_renderer() {
        let plan = EditorPlan {
            kind: Some(EditorKind::ButtonMomentary),
            ..Default::default()
        };
        let state = RenderState {
            loading: true,
            ..Default::default()
        };
        let view = dispatch(&plan, None, &state, None, ViewOptions::default());
        assert!(matches!(view, AttributeInputView::Momentary(m) if m.disabled));
    }

    #[test]
    fn send_button_follows_pending_state() {
        let plan = number_plan();
        let sending = RenderState {
            sending: true,
            loading: true,
            ..Default::default()
        };
        let AttributeInputView::Generic(view) =
            dispatch(&plan, None, &sending, None, ViewOptions::default())
        else {
            panic!("expected generic editor");
        };
        assert_eq!(
            view.send_button,
            SendButton::Shown {
                icon: SendIcon::SendClock,
                disabled: true,
            }
        );
        assert!(view.input_disabled);
        assert!(!view.submit_on_change);

        let switch = EditorPlan {
            kind: Some(EditorKind::Switch),
            ..Default::default()
        };
        let suppressed = ViewOptions {
            disable_button: true,
            ..Default::default()
        };
        let AttributeInputView::Generic(view) =
            dispatch(&switch, None, &RenderState::default(), None, suppressed)
        else {
            panic!("expected generic editor");
        };
        assert_eq!(view.send_button, SendButton::Hidden);
        assert!(view.submit_on_change);

        let AttributeInputView::Generic(view) =
            dispatch(&switch, None, &RenderState::default(), None, ViewOptions::default())
        else {
            panic!("expected generic editor");
        };
        assert_eq!(view.send_button, SendButton::Placeholder);
    }

    #[test]
    fn wrapper_helper_text_drops_widget_label() {
        let switch = EditorPlan {
            kind: Some(EditorKind::Switch),
            label: Some("Power".to_string()),
            ..Default::default()
        };
        let options = ViewOptions {
            helper_text: true,
            ..Default::default()
        };
        let failed = RenderState {
            error: true,
            ..Default::default()
        };
        let AttributeInputView::Generic(view) = dispatch(&switch, None, &failed, None, options)
        else {
            panic!("expected generic editor");
        };
        assert_eq!(view.helper_text, Some(HelperText::SendFailed));
        assert!(!view.helper_text_inline);
        assert_eq!(view.input_label, None);
        assert_eq!(view.plan.label.as_deref(), Some("Power"));
    }

    #[test]
    fn geo_point_view_parses_value() {
        let template = ActiveTemplate::GeoPoint(geo_template(false, false));
        let point = json!({ "type": "Point", "coordinates": [5.46, 51.44] });
        let state = RenderState {
            value: Some(&point),
            timestamp: Some(10),
            ..Default::default()
        };
        let AttributeInputView::GeoPoint(view) =
            dispatch(&EditorPlan::default(), Some(&template), &state, None, ViewOptions::default())
        else {
            panic!("expected geo point view");
        };
        assert_eq!(view.center, Some([5.46, 51.44]));
        assert_eq!(view.helper_text, Some(HelperText::UpdatedAt(10)));
        assert!(view.interactive);

        let garbage = json!("nowhere");
        let view = geo_template(false, false).render(&RenderState {
            value: Some(&garbage),
            ..Default::default()
        });
        assert_eq!(view.point, None);
    }

    #[test]
    fn only_editable_double_clicks_place_the_marker() {
        let point = GeoPoint { lng: 1.0, lat: 2.0 };
        assert_eq!(
            geo_template(false, false).on_map_click(point, true),
            Some(json!({ "type": "Point", "coordinates": [1.0, 2.0] }))
        );
        assert_eq!(geo_template(false, false).on_map_click(point, false), None);
        assert_eq!(geo_template(true, false).on_map_click(point, true), None);
        assert_eq!(geo_template(false, true).on_map_click(point, true), None);
    }
}
