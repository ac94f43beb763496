use std::time::Duration;

use attribute_model::{AttributeEvent, AttributeRef, SharedEvent, Value};
use bevy::prelude::*;

/// Authoritative value change, reported to observers as `(value, previous)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueChange {
    pub value: Option<Value>,
    pub previous_value: Option<Value>,
}

/// The single in-flight write of one input. Dropping it cancels the deadline.
#[derive(Debug)]
pub struct PendingWrite {
    submitted: Option<Value>,
    deadline: Timer,
}

impl PendingWrite {
    fn new(submitted: Option<Value>, timeout: Duration) -> Self {
        Self {
            submitted,
            deadline: Timer::new(timeout, TimerMode::Once),
        }
    }

    pub fn submitted(&self) -> Option<&Value> {
        self.submitted.as_ref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteState {
    Idle,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    ReadOnly,
    WritePending,
}

/// Where a submission is allowed to go.
#[derive(Clone, Copy, Debug)]
pub struct SubmitContext<'a> {
    pub readonly: bool,
    /// `None` when there is no ref or writes are suppressed: the value is
    /// then applied locally without a round trip.
    pub target: Option<&'a AttributeRef>,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    /// Outbound write to hand to the write sink; the input is now pending.
    Sent(SharedEvent),
    Local(ValueChange),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Inbound {
    pub change: ValueChange,
    /// The event resolved a pending write.
    pub confirmed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedOut {
    /// The live editor value was reset to the displayed value.
    pub rolled_back: bool,
}

/// Write/reconcile state of one attribute input.
///
/// Owns the displayed value, the live editor value and at most one
/// [`PendingWrite`]. Never fails: invalid requests degrade to a no-op.
#[derive(Component, Debug, Default)]
pub struct WriteReconciler {
    displayed: Option<Value>,
    timestamp: Option<i64>,
    input: Option<Value>,
    pending: Option<PendingWrite>,
    error: bool,
    received_event: bool,
}

impl WriteReconciler {
    pub fn new(value: Option<Value>, timestamp: Option<i64>) -> Self {
        Self {
            input: value.clone(),
            displayed: value,
            timestamp,
            ..Default::default()
        }
    }

    pub fn displayed(&self) -> Option<&Value> {
        self.displayed.as_ref()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// What the editor widget currently holds, including unsent typing.
    pub fn input_value(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    pub fn state(&self) -> WriteState {
        if self.pending.is_some() {
            WriteState::Pending
        } else {
            WriteState::Idle
        }
    }

    pub fn pending(&self) -> Option<&PendingWrite> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Subscribed but nothing heard yet, or waiting on a write.
    pub fn is_loading(&self, subscribed: bool) -> bool {
        (subscribed && !self.received_event) || self.is_pending()
    }

    /// Record typing in the editor. Ignored while a write is pending.
    pub fn edit(&mut self, value: Option<Value>) -> bool {
        if self.is_pending() {
            return false;
        }
        self.input = value;
        true
    }

    pub fn submit(&mut self, value: Option<Value>, ctx: SubmitContext<'_>) -> SubmitOutcome {
        if ctx.readonly {
            return SubmitOutcome::Rejected(RejectReason::ReadOnly);
        }
        if self.is_pending() {
            return SubmitOutcome::Rejected(RejectReason::WritePending);
        }

        let Some(target) = ctx.target else {
            let previous_value = std::mem::replace(&mut self.displayed, value.clone());
            self.input = value.clone();
            return SubmitOutcome::Local(ValueChange {
                value,
                previous_value,
            });
        };

        let request = AttributeEvent::new(target.clone(), value.clone());
        self.input = value.clone();
        self.pending = Some(PendingWrite::new(value, ctx.timeout));
        SubmitOutcome::Sent(request.into())
    }

    /// Apply an inbound event. Only attribute events for `current_ref` count.
    pub fn receive(
        &mut self,
        event: &SharedEvent,
        current_ref: Option<&AttributeRef>,
    ) -> Option<Inbound> {
        let event = event.as_attribute()?;
        if Some(event.attribute_ref()) != current_ref {
            return None;
        }

        self.received_event = true;
        let confirmed = self.pending.take().is_some();
        let change = self.apply(event.value().cloned(), event.timestamp);
        Some(Inbound { change, confirmed })
    }

    /// A parent replaced the value directly. Supersedes any pending write.
    pub fn override_value(&mut self, value: Option<Value>, timestamp: Option<i64>) -> ValueChange {
        self.pending = None;
        self.apply(value, timestamp)
    }

    fn apply(&mut self, value: Option<Value>, timestamp: Option<i64>) -> ValueChange {
        self.error = false;
        self.timestamp = timestamp;
        self.input = value.clone();
        let previous_value = std::mem::replace(&mut self.displayed, value.clone());
        ValueChange {
            value,
            previous_value,
        }
    }

    /// Advance the deadline. `rollback_input` resets the live editor value to
    /// the displayed one on expiry.
    pub fn tick(&mut self, delta: Duration, rollback_input: bool) -> Option<TimedOut> {
        let pending = self.pending.as_mut()?;
        pending.deadline.tick(delta);
        if !pending.deadline.is_finished() {
            return None;
        }

        self.pending = None;
        self.error = true;
        if rollback_input {
            self.input = self.displayed.clone();
        }
        Some(TimedOut {
            rolled_back: rollback_input,
        })
    }

    /// The input now points at another attribute. Whatever the old one's
    /// events or pending write said no longer applies; start over from the
    /// supplied value. Returns the change when the displayed value moved.
    pub fn rebind(&mut self, value: Option<Value>, timestamp: Option<i64>) -> Option<ValueChange> {
        self.received_event = false;
        let change = self.override_value(value, timestamp);
        (change.value != change.previous_value).then_some(change)
    }

    /// Drop the pending write without touching the value.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
