use std::path::Path;

use serde::Deserialize;
use wayfarer_engine::{read_json_file, ContentError, InputAction, InputSnapshot};

/// Scripted input: each step holds some actions for a number of frames and
/// presses others on its first frame only. An action that becomes held counts
/// as pressed on the frame it goes down, like a key press.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputScript {
    pub(crate) steps: Vec<InputStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputStep {
    pub(crate) frames: u32,
    #[serde(default)]
    pub(crate) hold: Vec<InputAction>,
    #[serde(default)]
    pub(crate) press: Vec<InputAction>,
}

impl InputScript {
    pub(crate) fn load(path: &Path) -> Result<Self, ContentError> {
        read_json_file(path)
    }

    /// One idle frame per tick for `ticks` ticks.
    pub(crate) fn idle(ticks: u32) -> Self {
        Self {
            steps: vec![InputStep {
                frames: ticks,
                hold: Vec::new(),
                press: Vec::new(),
            }],
        }
    }

    pub(crate) fn frames(&self) -> Vec<InputSnapshot> {
        let total: usize = self.steps.iter().map(|step| step.frames as usize).sum();
        let mut frames = Vec::with_capacity(total);
        let mut previous = InputSnapshot::empty();
        for step in &self.steps {
            for frame_index in 0..step.frames {
                let mut snapshot = InputSnapshot::empty();
                for action in &step.hold {
                    snapshot = snapshot.with_action_down(*action, true);
                    if !previous.is_down(*action) {
                        snapshot = snapshot.with_action_pressed(*action);
                    }
                }
                if frame_index == 0 {
                    for action in &step.press {
                        snapshot = snapshot.with_action_pressed(*action);
                    }
                }
                frames.push(snapshot);
                previous = snapshot;
            }
        }
        frames
    }
}
