use std::sync::Arc;

use super::entity::NpcHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

/// Named, ordered conversation. Owned by the loaded map and shared with the
/// NPCs and triggers that open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialogue {
    pub name: String,
    pub lines: Vec<DialogueLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueProgress {
    /// The current line was completed early.
    Revealed,
    Advanced,
    Closed,
}

/// What a UI needs to draw the dialogue box this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialoguePanel {
    pub dialogue: String,
    pub speaker: String,
    pub visible_text: String,
    pub line_index: usize,
    pub line_count: usize,
    pub line_finished: bool,
}

/// Typewriter reveal over one dialogue, one character per reveal interval.
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    dialogue: Arc<Dialogue>,
    npc: Option<NpcHandle>,
    line_index: usize,
    visible_chars: usize,
    elapsed: f32,
    line_finished: bool,
    reveal_interval: f32,
}

impl DialogueEngine {
    pub fn open(dialogue: Arc<Dialogue>, npc: Option<NpcHandle>, reveal_interval: f32) -> Self {
        let mut engine = Self {
            dialogue,
            npc,
            line_index: 0,
            visible_chars: 0,
            elapsed: 0.0,
            line_finished: false,
            reveal_interval,
        };
        engine.start_line(0);
        engine
    }

    pub fn dialogue(&self) -> &Arc<Dialogue> {
        &self.dialogue
    }

    /// NPC that opened this dialogue, if any.
    pub fn npc(&self) -> Option<NpcHandle> {
        self.npc
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn visible_chars(&self) -> usize {
        self.visible_chars
    }

    pub fn line_finished(&self) -> bool {
        self.line_finished
    }

    pub fn tick(&mut self, dt: f32) {
        if self.line_finished {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.reveal_interval {
            self.elapsed = 0.0;
            self.visible_chars += 1;
            if self.visible_chars >= self.current_line_len() {
                self.visible_chars = self.current_line_len();
                self.line_finished = true;
            }
        }
    }

    pub fn confirm(&mut self) -> DialogueProgress {
        if !self.line_finished {
            self.reveal_line();
            return DialogueProgress::Revealed;
        }
        let next = self.line_index + 1;
        if next < self.dialogue.lines.len() {
            self.start_line(next);
            DialogueProgress::Advanced
        } else {
            DialogueProgress::Closed
        }
    }

    /// Finish revealing the current line. Never advances.
    pub fn skip(&mut self) {
        self.reveal_line();
    }

    pub fn panel(&self) -> DialoguePanel {
        let line = self.dialogue.lines.get(self.line_index);
        DialoguePanel {
            dialogue: self.dialogue.name.clone(),
            speaker: line.map(|line| line.speaker.clone()).unwrap_or_default(),
            visible_text: line
                .map(|line| line.text.chars().take(self.visible_chars).collect())
                .unwrap_or_default(),
            line_index: self.line_index,
            line_count: self.dialogue.lines.len(),
            line_finished: self.line_finished,
        }
    }

    fn start_line(&mut self, index: usize) {
        self.line_index = index;
        self.visible_chars = 0;
        self.elapsed = 0.0;
        self.line_finished = self.current_line_len() == 0;
    }

    fn reveal_line(&mut self) {
        self.visible_chars = self.current_line_len();
        self.elapsed = 0.0;
        self.line_finished = true;
    }

    fn current_line_len(&self) -> usize {
        self.dialogue
            .lines
            .get(self.line_index)
            .map_or(0, |line| line.text.chars().count())
    }
}
