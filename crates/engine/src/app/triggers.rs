use std::sync::Arc;

use super::dialogue::Dialogue;
use super::entity::{NpcHandle, NpcRoster};
use super::geometry::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTrigger {
    pub area: Rect,
    pub map: String,
    pub spawn: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogueTrigger {
    pub area: Rect,
    pub dialogue: Arc<Dialogue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventTrigger {
    pub area: Rect,
    /// Index into the loaded map's event list.
    pub event_index: usize,
}

/// Trigger regions of the loaded map, in authored order. Every query returns
/// the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionIndex {
    transitions: Vec<TransitionTrigger>,
    dialogues: Vec<DialogueTrigger>,
    events: Vec<EventTrigger>,
}

impl InteractionIndex {
    pub fn new(
        transitions: Vec<TransitionTrigger>,
        dialogues: Vec<DialogueTrigger>,
        events: Vec<EventTrigger>,
    ) -> Self {
        Self {
            transitions,
            dialogues,
            events,
        }
    }

    pub fn transitions(&self) -> &[TransitionTrigger] {
        &self.transitions
    }

    pub fn dialogues(&self) -> &[DialogueTrigger] {
        &self.dialogues
    }

    pub fn events(&self) -> &[EventTrigger] {
        &self.events
    }

    pub fn dialogue_at(&self, body: &Rect) -> Option<&DialogueTrigger> {
        self.dialogues
            .iter()
            .find(|trigger| trigger.area.intersects(body))
    }

    pub fn transition_at(&self, body: &Rect) -> Option<&TransitionTrigger> {
        self.transitions
            .iter()
            .find(|trigger| trigger.area.intersects(body))
    }

    /// First event zone touching `body` whose event has not run yet.
    pub fn event_at(
        &self,
        body: &Rect,
        is_triggered: impl Fn(usize) -> bool,
    ) -> Option<&EventTrigger> {
        self.events
            .iter()
            .find(|trigger| trigger.area.intersects(body) && !is_triggered(trigger.event_index))
    }

    /// First NPC with a dialogue whose body overlaps `zone`.
    pub fn npc_in_zone(zone: &Rect, roster: &NpcRoster) -> Option<NpcHandle> {
        roster
            .handles()
            .find(|(_, npc)| npc.dialogue().is_some() && npc.body().intersects(zone))
            .map(|(handle, _)| handle)
    }
}
