use std::collections::HashMap;

use attribute_model::{AttributeRef, SharedEvent};
use bevy::prelude::*;

/// Which attribute each input entity listens to. An input holds at most one ref.
#[derive(Resource, Debug, Default)]
pub struct AttributeSubscriptions {
    by_entity: HashMap<Entity, AttributeRef>,
}

impl AttributeSubscriptions {
    /// Replace the registration of `entity`. `None` unsubscribes.
    /// Returns whether anything changed.
    pub fn register(&mut self, entity: Entity, attribute_ref: Option<AttributeRef>) -> bool {
        match attribute_ref {
            Some(attribute_ref) => {
                self.by_entity.insert(entity, attribute_ref.clone()) != Some(attribute_ref)
            }
            None => self.by_entity.remove(&entity).is_some(),
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&AttributeRef> {
        self.by_entity.get(&entity)
    }

    pub fn is_subscribed(&self, entity: Entity) -> bool {
        self.by_entity.contains_key(&entity)
    }

    pub fn subscribers<'a>(
        &'a self,
        attribute_ref: &'a AttributeRef,
    ) -> impl Iterator<Item = Entity> + 'a {
        self.by_entity
            .iter()
            .filter(move |(_, r)| *r == attribute_ref)
            .map(|(entity, _)| *entity)
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// An event delivered by the subscription transport. Trigger this globally;
/// it is routed to every input subscribed to the event's ref.
#[derive(Event, Debug, Clone)]
pub struct InboundAttributeEvent(pub SharedEvent);

/// An inbound event routed to one subscribed input.
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeEventDelivered {
    pub entity: Entity,
    pub event: SharedEvent,
}

/// Outbound write produced by an input. The host forwards `event` to the
/// write sink; confirmation comes back as an [`InboundAttributeEvent`].
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeWriteRequested {
    pub entity: Entity,
    pub event: SharedEvent,
}

/// The ref an input listens to changed. `None` means it unsubscribed.
#[derive(EntityEvent, Debug, Clone)]
pub struct AttributeSubscriptionChanged {
    pub entity: Entity,
    pub attribute_ref: Option<AttributeRef>,
}

pub(crate) fn route_inbound_events(
    inbound: On<InboundAttributeEvent>,
    subscriptions: Res<AttributeSubscriptions>,
    mut commands: Commands,
) {
    let Some(attribute_event) = inbound.0.as_attribute() else {
        return;
    };
    for entity in subscriptions.subscribers(attribute_event.attribute_ref()) {
        commands.trigger(AttributeEventDelivered {
            entity,
            event: inbound.0.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_reports_changes() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let temp = AttributeRef::new("a1", "temp");

        let mut subscriptions = AttributeSubscriptions::default();
        assert!(subscriptions.register(a, Some(temp.clone())));
        assert!(!subscriptions.register(a, Some(temp.clone())));
        assert!(subscriptions.register(b, Some(temp.clone())));

        let mut subscribers: Vec<_> = subscriptions.subscribers(&temp).collect();
        subscribers.sort();
        assert_eq!(subscribers, vec![a, b]);

        assert!(subscriptions.register(a, None));
        assert!(!subscriptions.register(a, None));
        assert!(!subscriptions.is_subscribed(a));
        assert_eq!(subscriptions.get(b), Some(&temp));
        assert!(!subscriptions.is_empty());
    }
}
