//! Event bus connecting units, entities and UI collaborators.
//!
//! The bus is owned by the engine. Listeners subscribe to one [`Channel`] and
//! receive every event emitted on it afterwards, synchronously and in
//! registration order. There is no replay.

use codingland_logic::Vector;
use hecs::Entity;
use std::collections::HashMap;
use std::fmt;

use crate::actions::PopupOptions;
use crate::components::{NodeKind, ObjectId};

/// Closed set of bus channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    SpawnEnemy,
    ProduceResource,
    ShowActions,
    NodeDisposed,
    Message,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::SpawnEnemy,
        Channel::ProduceResource,
        Channel::ShowActions,
        Channel::NodeDisposed,
        Channel::Message,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::SpawnEnemy => "codingland.spawn.enemy",
            Channel::ProduceResource => "codingland.produce.resource",
            Channel::ShowActions => "codingland.popups.show.actions",
            Channel::NodeDisposed => "codingland.stage.disposed",
            Channel::Message => "codingland.message",
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// User-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }
}

/// Typed payloads, one variant per channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// Request to spawn an enemy at a map position.
    SpawnEnemy { position: Vector },
    /// A unit produced `count` of `item`.
    ProduceResource {
        source: Entity,
        item: String,
        count: u32,
    },
    ShowActions(PopupOptions),
    NodeDisposed {
        entity: Entity,
        id: ObjectId,
        kind: NodeKind,
    },
    Message(Message),
}

impl StageEvent {
    pub fn channel(&self) -> Channel {
        match self {
            StageEvent::SpawnEnemy { .. } => Channel::SpawnEnemy,
            StageEvent::ProduceResource { .. } => Channel::ProduceResource,
            StageEvent::ShowActions(_) => Channel::ShowActions,
            StageEvent::NodeDisposed { .. } => Channel::NodeDisposed,
            StageEvent::Message(_) => Channel::Message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&StageEvent)>;

/// Publish/subscribe bus.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<Channel, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        channel: Channel,
        listener: impl FnMut(&StageEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(channel)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe. Returns false if the id was unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        for list in self.listeners.values_mut() {
            if let Some(index) = list.iter().position(|(l, _)| *l == id) {
                drop(list.remove(index));
                return true;
            }
        }
        false
    }

    /// Deliver `event` to the listeners of its channel. Returns how many
    /// listeners received it.
    pub fn emit(&mut self, event: &StageEvent) -> usize {
        let channel = event.channel();
        match self.listeners.get_mut(&channel) {
            Some(list) => {
                for (_, listener) in list.iter_mut() {
                    listener(event);
                }
                list.len()
            }
            None => 0,
        }
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners.get(&channel).map_or(0, Vec::len)
    }
}
