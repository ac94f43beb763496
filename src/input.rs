use std::sync::Arc;
use std::time::Duration;

use attribute_model::{
    AssetAttribute, AttributeDescriptor, AttributeRef, GeoPoint, SchemaCatalog, Value,
    ValueDescriptor,
};
use bevy::prelude::*;

use crate::descriptors::{DescriptorInputs, ResolvedDescriptors, resolve};
use crate::editor_plan::{EditorKind, EditorPlan, PlanInputs, base_plan, infer};
use crate::reconcile::{SubmitContext, SubmitOutcome, ValueChange, WriteReconciler};
use crate::settings::{AttributeInputSettings, AttributeSchemas};
use crate::subscription::{
    AttributeEventDelivered, AttributeSubscriptionChanged, AttributeSubscriptions,
    AttributeWriteRequested,
};
use crate::template::{
    ActiveTemplate, AttributeInputView, GeoPointTemplate, InputTemplateProvider, ProviderContext,
    RenderState, ValueChangeNotifier, ViewOptions, dispatch,
};

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// One editable attribute. Every field is optional configuration; mutate the
/// component to reconfigure the input.
#[derive(Component, Clone, Default)]
#[require(ResolvedInput, WriteReconciler, AttributeInputView)]
pub struct AttributeInput {
    pub asset_type: Option<String>,
    pub attribute_ref: Option<AttributeRef>,
    /// Bound attribute. Replacing it with one that only differs in value or
    /// timestamp overrides the displayed value.
    pub attribute: Option<AssetAttribute>,
    pub attribute_descriptor: Option<AttributeDescriptor>,
    pub value_descriptor: Option<ValueDescriptor>,
    /// Raw value used when no attribute is bound.
    pub value: Option<Value>,
    pub input_type: Option<EditorKind>,
    /// `None` derives read-only from meta.
    pub readonly: Option<bool>,
    pub disabled: bool,
    /// `Some("")` hides the label.
    pub label: Option<String>,
    /// `None` uses [`AttributeInputSettings::helper_text`].
    pub helper_text: Option<bool>,
    pub disable_button: bool,
    pub disable_subscribe: bool,
    /// Apply submissions locally instead of writing them.
    pub disable_write: bool,
    /// `None` uses [`AttributeInputSettings::write_timeout`].
    pub write_timeout: Option<Duration>,
    pub custom_provider: Option<Arc<dyn InputTemplateProvider>>,
}

impl AttributeInput {
    pub fn for_ref(attribute_ref: AttributeRef) -> Self {
        Self {
            attribute_ref: Some(attribute_ref),
            ..Default::default()
        }
    }

    pub fn for_attribute(attribute: AssetAttribute) -> Self {
        Self {
            attribute: Some(attribute),
            ..Default::default()
        }
    }

    pub fn for_value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn with_ref(mut self, attribute_ref: AttributeRef) -> Self {
        self.attribute_ref = Some(attribute_ref);
        self
    }

    pub fn with_descriptor(mut self, descriptor: AttributeDescriptor) -> Self {
        self.attribute_descriptor = Some(descriptor);
        self
    }

    pub fn with_value_descriptor(mut self, descriptor: ValueDescriptor) -> Self {
        self.value_descriptor = Some(descriptor);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_input_type(mut self, kind: EditorKind) -> Self {
        self.input_type = Some(kind);
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_helper_text(mut self, enabled: bool) -> Self {
        self.helper_text = Some(enabled);
        self
    }

    pub fn without_button(mut self) -> Self {
        self.disable_button = true;
        self
    }

    pub fn without_subscribe(mut self) -> Self {
        self.disable_subscribe = true;
        self
    }

    pub fn without_write(mut self) -> Self {
        self.disable_write = true;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn with_custom_provider(mut self, provider: impl InputTemplateProvider) -> Self {
        self.custom_provider = Some(Arc::new(provider));
        self
    }

    /// Ref to write to: the explicit one, else the bound attribute's.
    pub fn resolved_ref(&self) -> Option<AttributeRef> {
        self.attribute_ref
            .clone()
            .or_else(|| self.attribute.as_ref().and_then(AssetAttribute::attribute_ref))
    }

    /// Value and timestamp supplied by the caller, before any event arrives.
    pub fn supplied_value(&self) -> (Option<Value>, Option<i64>) {
        match &self.attribute {
            Some(attribute) => (attribute.value.clone(), attribute.value_timestamp),
            None => (self.value.clone(), None),
        }
    }

    fn descriptor_inputs(&self) -> DescriptorInputs<'_> {
        DescriptorInputs {
            asset_type: self.asset_type.as_deref(),
            descriptor: self.attribute_descriptor.as_ref(),
            value_descriptor: self.value_descriptor.as_ref(),
            attribute: self.attribute.as_ref(),
            attribute_ref: self.attribute_ref.as_ref(),
        }
    }

    fn plan_inputs<'a>(&'a self, current_value: Option<&'a Value>) -> PlanInputs<'a> {
        PlanInputs {
            attribute: self.attribute.as_ref(),
            current_value,
            explicit_kind: self.input_type,
            readonly: self.readonly,
            disabled: self.disabled,
            label: self.label.as_deref(),
            disable_button: self.disable_button,
            has_attribute_ref: self.resolved_ref().is_some(),
        }
    }
}

/// Derived state of an [`AttributeInput`], refreshed when its configuration
/// changes.
#[derive(Component, Default)]
pub struct ResolvedInput {
    descriptors: ResolvedDescriptors,
    plan: EditorPlan,
    template: Option<ActiveTemplate>,
    attribute_ref: Option<AttributeRef>,
    subscribed: bool,
    previous: Option<AttributeInput>,
}

impl ResolvedInput {
    pub fn descriptors(&self) -> &ResolvedDescriptors {
        &self.descriptors
    }

    pub fn plan(&self) -> &EditorPlan {
        &self.plan
    }

    pub fn attribute_ref(&self) -> Option<&AttributeRef> {
        self.attribute_ref.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn has_custom_template(&self) -> bool {
        matches!(self.template, Some(ActiveTemplate::Custom(_)))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The editor widget's content changed.
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeInputEdited {
    pub entity: Entity,
    pub value: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitGesture {
    Enter,
    SendButton,
}

/// The user asked to send what the editor currently holds.
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeInputCommitted {
    pub entity: Entity,
    pub gesture: CommitGesture,
}

/// Submit a value for writing. Custom templates reach this through their
/// [`ValueChangeNotifier`].
#[derive(EntityEvent, Debug, Clone)]
pub struct SubmitAttributeValue {
    pub entity: Entity,
    pub value: Option<Value>,
}

/// A click on the map of a geo point input.
#[derive(EntityEvent, Debug, Clone)]
pub struct MapClicked {
    pub entity: Entity,
    pub point: GeoPoint,
    pub double_click: bool,
}

/// The authoritative value changed: confirmed write, local update or override.
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeInputChanged {
    pub entity: Entity,
    pub value: Option<Value>,
    pub previous_value: Option<Value>,
}

impl AttributeInputChanged {
    fn new(entity: Entity, change: ValueChange) -> Self {
        Self {
            entity,
            value: change.value,
            previous_value: change.previous_value,
        }
    }
}

/// A pending write resolved; the host may return focus to the editor widget.
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeInputFocusRequested {
    pub entity: Entity,
}

// ---------------------------------------------------------------------------
// Change detection
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct InputChanges {
    refs: bool,
    descriptors: bool,
    template: bool,
    value_override: bool,
}

impl InputChanges {
    const FIRST: Self = Self {
        refs: true,
        descriptors: true,
        template: true,
        value_override: false,
    };
}

fn classify(previous: &AttributeInput, current: &AttributeInput) -> InputChanges {
    let mut changes = InputChanges {
        refs: previous.disable_subscribe != current.disable_subscribe,
        descriptors: previous.attribute_descriptor != current.attribute_descriptor
            || previous.value_descriptor != current.value_descriptor
            || previous.asset_type != current.asset_type,
        ..Default::default()
    };

    match (&previous.attribute, &current.attribute) {
        (Some(old), Some(new)) if old.same_identity(new) => {
            changes.value_override =
                old.value != new.value || old.value_timestamp != new.value_timestamp;
        }
        (None, None) => changes.value_override = previous.value != current.value,
        _ => {
            changes.refs = true;
            changes.descriptors = true;
        }
    }

    if previous.attribute_ref != current.attribute_ref {
        changes.refs = true;
        changes.descriptors = true;
    }

    changes.template = changes.descriptors
        || previous.readonly != current.readonly
        || previous.disabled != current.disabled
        || previous.label != current.label
        || previous.input_type != current.input_type
        || previous.disable_button != current.disable_button
        || !same_provider(&previous.custom_provider, &current.custom_provider);
    changes
}

fn same_provider(
    a: &Option<Arc<dyn InputTemplateProvider>>,
    b: &Option<Arc<dyn InputTemplateProvider>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Plan and template for the current descriptors. A custom provider that
/// takes over skips kind inference.
fn build_template(
    entity: Entity,
    input: &AttributeInput,
    descriptors: &ResolvedDescriptors,
    catalog: &dyn SchemaCatalog,
    current_value: Option<&Value>,
) -> (EditorPlan, Option<ActiveTemplate>) {
    let inputs = input.plan_inputs(current_value);
    let base = base_plan(catalog, descriptors, &inputs);
    let ctx = ProviderContext {
        asset_type: input.asset_type.as_deref(),
        attribute: input.attribute.as_ref(),
        descriptors,
        notifier: ValueChangeNotifier::new(entity),
        readonly: base.readonly,
        disabled: base.disabled,
        label: base.label.as_deref(),
    };

    if let Some(custom) = input
        .custom_provider
        .as_ref()
        .and_then(|provider| provider.create(&ctx))
    {
        return (base, Some(ActiveTemplate::Custom(custom)));
    }

    let plan = infer(catalog, descriptors, &inputs);
    let template = (plan.kind == Some(EditorKind::GeoJsonPoint))
        .then(|| ActiveTemplate::GeoPoint(GeoPointTemplate::new(&ctx)));
    (plan, template)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub(crate) fn sync_attribute_inputs(
    mut inputs: Query<
        (
            Entity,
            &AttributeInput,
            &mut ResolvedInput,
            &mut WriteReconciler,
        ),
        Changed<AttributeInput>,
    >,
    schemas: Res<AttributeSchemas>,
    mut subscriptions: ResMut<AttributeSubscriptions>,
    mut commands: Commands,
) {
    for (entity, input, mut resolved, mut reconciler) in &mut inputs {
        let changes = match &resolved.previous {
            Some(previous) => classify(previous, input),
            None => {
                let (value, timestamp) = input.supplied_value();
                *reconciler = WriteReconciler::new(value, timestamp);
                InputChanges::FIRST
            }
        };

        if changes.value_override {
            let (value, timestamp) = input.supplied_value();
            let was_pending = reconciler.is_pending();
            let change = reconciler.override_value(value, timestamp);
            debug!("Attribute input {entity}: value overridden (pending write dropped: {was_pending})");
            if was_pending {
                commands.trigger(AttributeInputFocusRequested { entity });
            }
            commands.trigger(AttributeInputChanged::new(entity, change));
        }

        if changes.descriptors {
            resolved.descriptors = resolve(schemas.catalog(), &input.descriptor_inputs());
            if resolved.descriptors.is_unresolved() {
                debug!("Attribute input {entity}: no descriptors resolved");
            }
        }

        if changes.refs {
            let attribute_ref = input.resolved_ref();
            let subscription = attribute_ref.clone().filter(|_| !input.disable_subscribe);
            resolved.subscribed = subscription.is_some();
            resolved.attribute_ref = attribute_ref;

            let (value, timestamp) = input.supplied_value();
            let was_pending = reconciler.is_pending();
            if let Some(change) = reconciler.rebind(value, timestamp) {
                debug!("Attribute input {entity}: rebound to a new attribute");
                commands.trigger(AttributeInputChanged::new(entity, change));
            }
            if was_pending {
                commands.trigger(AttributeInputFocusRequested { entity });
            }

            if subscriptions.register(entity, subscription.clone()) {
                commands.trigger(AttributeSubscriptionChanged {
                    entity,
                    attribute_ref: subscription,
                });
            }
        }

        if changes.template {
            let (plan, template) = build_template(
                entity,
                input,
                &resolved.descriptors,
                schemas.catalog(),
                reconciler.displayed(),
            );
            resolved.plan = plan;
            resolved.template = template;
        }

        resolved.previous = Some(input.clone());
    }
}

pub(crate) fn tick_pending_writes(
    mut inputs: Query<(Entity, &ResolvedInput, &mut WriteReconciler)>,
    time: Res<Time>,
    mut commands: Commands,
) {
    for (entity, resolved, mut reconciler) in &mut inputs {
        if !reconciler.is_pending() {
            continue;
        }

        // Editors without a send button drop whatever was typed on failure
        let rollback = !resolved
            .plan
            .kind
            .is_some_and(EditorKind::supports_write_button);
        let timed_out = reconciler
            .bypass_change_detection()
            .tick(time.delta(), rollback);

        if let Some(timed_out) = timed_out {
            reconciler.set_changed();
            warn!(
                "Attribute input {entity}: write timed out (input rolled back: {})",
                timed_out.rolled_back
            );
            commands.trigger(AttributeInputFocusRequested { entity });
        }
    }
}

pub(crate) fn refresh_views(
    mut inputs: Query<
        (
            &AttributeInput,
            &ResolvedInput,
            &WriteReconciler,
            &mut AttributeInputView,
        ),
        Or<(Changed<ResolvedInput>, Changed<WriteReconciler>)>,
    >,
    settings: Res<AttributeInputSettings>,
) {
    for (input, resolved, reconciler, mut view) in &mut inputs {
        let state = RenderState {
            value: reconciler.displayed(),
            timestamp: reconciler.timestamp(),
            loading: reconciler.is_loading(resolved.subscribed),
            sending: reconciler.is_pending(),
            error: reconciler.has_error(),
        };
        let options = ViewOptions {
            helper_text: input.helper_text.unwrap_or(settings.helper_text),
            disable_button: input.disable_button,
        };
        view.set_if_neq(dispatch(
            &resolved.plan,
            resolved.template.as_ref(),
            &state,
            reconciler.input_value(),
            options,
        ));
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

pub(crate) fn on_attribute_event_delivered(
    delivered: On<AttributeEventDelivered>,
    mut inputs: Query<(&ResolvedInput, &mut WriteReconciler)>,
    mut commands: Commands,
) -> Result<(), BevyError> {
    let entity = delivered.entity;
    let (resolved, mut reconciler) = inputs.get_mut(entity)?;

    let Some(inbound) = reconciler.receive(&delivered.event, resolved.attribute_ref.as_ref())
    else {
        return Ok(());
    };

    if inbound.confirmed {
        debug!("Attribute input {entity}: write confirmed");
        commands.trigger(AttributeInputFocusRequested { entity });
    }
    commands.trigger(AttributeInputChanged::new(entity, inbound.change));
    Ok(())
}

pub(crate) fn on_submit_attribute_value(
    submit: On<SubmitAttributeValue>,
    mut inputs: Query<(&AttributeInput, &ResolvedInput, &mut WriteReconciler)>,
    settings: Res<AttributeInputSettings>,
    mut commands: Commands,
) -> Result<(), BevyError> {
    let entity = submit.entity;
    let (input, resolved, mut reconciler) = inputs.get_mut(entity)?;

    let ctx = SubmitContext {
        readonly: resolved.plan.readonly,
        target: resolved
            .attribute_ref
            .as_ref()
            .filter(|_| !input.disable_write),
        timeout: input.write_timeout.unwrap_or(settings.write_timeout),
    };

    match reconciler.submit(submit.value.clone(), ctx) {
        SubmitOutcome::Rejected(reason) => {
            debug!("Attribute input {entity}: submission ignored ({reason:?})");
        }
        SubmitOutcome::Sent(event) => {
            debug!("Attribute input {entity}: write sent");
            commands.trigger(AttributeWriteRequested { entity, event });
        }
        SubmitOutcome::Local(change) => {
            commands.trigger(AttributeInputChanged::new(entity, change));
        }
    }
    Ok(())
}

pub(crate) fn on_attribute_input_edited(
    edited: On<AttributeInputEdited>,
    mut inputs: Query<(&ResolvedInput, &mut WriteReconciler)>,
    mut commands: Commands,
) -> Result<(), BevyError> {
    let entity = edited.entity;
    let (resolved, mut reconciler) = inputs.get_mut(entity)?;

    if !reconciler.edit(edited.value.clone()) {
        return Ok(());
    }
    // Without a send button every change is a submission
    if !resolved.plan.show_write_button {
        commands.trigger(SubmitAttributeValue {
            entity,
            value: edited.value.clone(),
        });
    }
    Ok(())
}

pub(crate) fn on_attribute_input_committed(
    committed: On<AttributeInputCommitted>,
    inputs: Query<(&ResolvedInput, &WriteReconciler)>,
    mut commands: Commands,
) -> Result<(), BevyError> {
    let entity = committed.entity;
    let (resolved, reconciler) = inputs.get(entity)?;

    let accepted = match committed.gesture {
        CommitGesture::Enter => resolved.plan.kind.is_some_and(EditorKind::commits_on_enter),
        CommitGesture::SendButton => resolved.plan.show_write_button,
    };
    if accepted {
        commands.trigger(SubmitAttributeValue {
            entity,
            value: reconciler.input_value().cloned(),
        });
    }
    Ok(())
}

pub(crate) fn on_map_clicked(
    click: On<MapClicked>,
    inputs: Query<&ResolvedInput>,
    mut commands: Commands,
) -> Result<(), BevyError> {
    let resolved = inputs.get(click.entity)?;
    let Some(ActiveTemplate::GeoPoint(geo)) = &resolved.template else {
        return Ok(());
    };

    if let Some(value) = geo.on_map_click(click.point, click.double_click) {
        geo.notifier().notify(&mut commands, Some(value));
    }
    Ok(())
}

/// Releases the subscription and any pending write of a removed input.
pub(crate) fn on_attribute_input_removed(
    trigger: On<Remove, AttributeInput>,
    mut inputs: Query<(&mut ResolvedInput, &mut WriteReconciler)>,
    mut subscriptions: ResMut<AttributeSubscriptions>,
    mut commands: Commands,
) {
    let entity = trigger.event_target();

    if let Ok((mut resolved, mut reconciler)) = inputs.get_mut(entity) {
        if reconciler.cancel() {
            debug!("Attribute input {entity}: pending write cancelled");
        }
        *resolved = ResolvedInput::default();
        *reconciler = WriteReconciler::default();
    }

    if subscriptions.register(entity, None) {
        commands.trigger(AttributeSubscriptionChanged {
            entity,
            attribute_ref: None,
        });
    }
}
