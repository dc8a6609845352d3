use serde::{Deserialize, Serialize};

use super::geometry::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Run,
    Interact,
    Skip,
    ToggleDebug,
}

const ACTION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Run => 4,
            InputAction::Interact => 5,
            InputAction::Skip => 6,
            InputAction::ToggleDebug => 7,
        }
    }

    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Up => InputAction::MoveUp,
            Direction::Down => InputAction::MoveDown,
            Direction::Left => InputAction::MoveLeft,
            Direction::Right => InputAction::MoveRight,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            InputAction::MoveUp => Some(Direction::Up),
            InputAction::MoveDown => Some(Direction::Down),
            InputAction::MoveLeft => Some(Direction::Left),
            InputAction::MoveRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// One frame of input as seen by the simulation: which actions are held, which
/// were pressed this frame, and the most recent newly pressed direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
    last_direction_pressed: Option<Direction>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn last_direction_pressed(&self) -> Option<Direction> {
        self.last_direction_pressed
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    /// Marks `action` as pressed this frame. Pressing a movement action also
    /// holds it and records it as the latest direction key.
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.pressed.set(action, true);
        if let Some(direction) = action.direction() {
            self.held.set(action, true);
            self.last_direction_pressed = Some(direction);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressing_a_direction_holds_it_and_records_it() {
        let snapshot = InputSnapshot::empty().with_action_pressed(InputAction::MoveLeft);
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(snapshot.was_pressed(InputAction::MoveLeft));
        assert_eq!(snapshot.last_direction_pressed(), Some(Direction::Left));
    }

    #[test]
    fn discrete_presses_are_not_held() {
        let snapshot = InputSnapshot::empty().with_action_pressed(InputAction::Interact);
        assert!(snapshot.was_pressed(InputAction::Interact));
        assert!(!snapshot.is_down(InputAction::Interact));
        assert_eq!(snapshot.last_direction_pressed(), None);
    }

    #[test]
    fn direction_actions_round_trip() {
        for direction in Direction::ALL {
            assert_eq!(
                InputAction::for_direction(direction).direction(),
                Some(direction)
            );
        }
        assert_eq!(InputAction::Run.direction(), None);
    }
}
