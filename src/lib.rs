pub mod descriptors;
pub mod editor_plan;
pub mod input;
pub mod reconcile;
pub mod settings;
pub mod subscription;
pub mod template;

use bevy::prelude::*;

pub use attribute_model;
pub use editor_plan::{EditorKind, EditorPlan};
pub use input::{
    AttributeInput, AttributeInputChanged, AttributeInputCommitted, AttributeInputEdited,
    AttributeInputFocusRequested, CommitGesture, MapClicked, ResolvedInput, SubmitAttributeValue,
};
pub use reconcile::{WriteReconciler, WriteState};
pub use settings::{AttributeInputSettings, AttributeSchemas, DEFAULT_WRITE_TIMEOUT};
pub use subscription::{
    AttributeEventDelivered, AttributeSubscriptionChanged, AttributeSubscriptions,
    AttributeWriteRequested, InboundAttributeEvent,
};
pub use template::{
    AttributeInputView, CustomView, HelperText, InputTemplate, InputTemplateProvider,
    ProviderContext, RenderState, ValueChangeNotifier,
};

/// Systems that pick up configuration changes and resolve descriptors.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeInputDetect;

/// Systems that advance pending write deadlines.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeInputTick;

/// Systems that rebuild [`AttributeInputView`]s.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeInputRender;

/// Drives every [`AttributeInput`] entity. Requires `Time`, which the host's
/// `TimePlugin` provides.
pub struct AttributeInputPlugin;

impl Plugin for AttributeInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AttributeInputSettings>()
            .init_resource::<AttributeSchemas>()
            .init_resource::<AttributeSubscriptions>()
            .configure_sets(
                Update,
                (
                    AttributeInputDetect,
                    AttributeInputTick,
                    AttributeInputRender,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    input::sync_attribute_inputs.in_set(AttributeInputDetect),
                    input::tick_pending_writes.in_set(AttributeInputTick),
                    input::refresh_views.in_set(AttributeInputRender),
                ),
            )
            .add_observer(subscription::route_inbound_events)
            .add_observer(input::on_attribute_event_delivered)
            .add_observer(input::on_submit_attribute_value)
            .add_observer(input::on_attribute_input_edited)
            .add_observer(input::on_attribute_input_committed)
            .add_observer(input::on_map_clicked)
            .add_observer(input::on_attribute_input_removed);
    }
}
