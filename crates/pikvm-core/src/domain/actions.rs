//! Declarative device action lists.
//!
//! An action list describes a scripted remote session — move the pointer,
//! click, type a search query, press Enter, scroll, and so on — as data
//! instead of code.  Lists are stored as TOML:
//!
//! ```toml
//! [[steps]]
//! action = "mouse_move"
//! x = -27000
//! y = -29000
//!
//! [[steps]]
//! action = "click"
//! button = "left"
//!
//! [[steps]]
//! action = "type"
//! text = "python fastapi docs"
//!
//! [[steps]]
//! action = "key"
//! key = "Enter"
//!
//! [[steps]]
//! action = "parallel"
//! steps = [
//!     { action = "type", text = "hello" },
//!     { action = "click", button = "left" },
//! ]
//! ```
//!
//! The `action` field selects the variant (`#[serde(tag = "action")]`).
//! Executing a list is the client's job; this module only defines and
//! validates the data.

use serde::{Deserialize, Serialize};

use crate::keymap::KeyCode;

/// A mouse button known to kvmd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Back side button.
    Up,
    /// Forward side button.
    Down,
}

impl MouseButton {
    /// Returns the kvmd wire name of this button.
    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::Up => "up",
            MouseButton::Down => "down",
        }
    }
}

impl std::str::FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            "up" => Ok(MouseButton::Up),
            "down" => Ok(MouseButton::Down),
            other => Err(format!("unknown mouse button: {other:?}")),
        }
    }
}

/// A single step of an action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeviceAction {
    /// Moves the pointer to an absolute position.
    ///
    /// kvmd coordinates span `-32768..=32767` on each axis with `(0, 0)` at
    /// the centre of the target screen.
    MouseMove { x: i16, y: i16 },

    /// Presses and/or releases a mouse button.  Without `state` the device
    /// performs a full click.
    Click {
        button: MouseButton,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<bool>,
    },

    /// Scrolls the wheel `repeat` times, waiting `interval_ms` between turns.
    Scroll {
        delta_x: i16,
        delta_y: i16,
        #[serde(default = "default_repeat")]
        repeat: u32,
        #[serde(default)]
        interval_ms: u64,
    },

    /// Presses and/or releases a key.  Without `state` the device performs a
    /// full click.
    Key {
        key: KeyCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<bool>,
        #[serde(default)]
        finish: bool,
    },

    /// Types text with human-like cadence and typos.
    Type { text: String },

    /// Sends text in one request, letting the device type it at full speed.
    Print { text: String },

    /// Does nothing for `millis` milliseconds.
    Wait { millis: u64 },

    /// Runs the nested steps concurrently; completes when all of them do.
    Parallel { steps: Vec<DeviceAction> },
}

fn default_repeat() -> u32 {
    1
}

/// A complete action list as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionList {
    #[serde(default)]
    pub steps: Vec<DeviceAction>,
}

impl ActionList {
    /// Total number of steps, counting the children of parallel groups
    /// (the group itself is not counted).
    pub fn leaf_count(&self) -> usize {
        fn count(steps: &[DeviceAction]) -> usize {
            steps
                .iter()
                .map(|s| match s {
                    DeviceAction::Parallel { steps } => count(steps),
                    _ => 1,
                })
                .sum()
        }
        count(&self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"
        [[steps]]
        action = "mouse_move"
        x = -19500
        y = 31200

        [[steps]]
        action = "click"
        button = "left"

        [[steps]]
        action = "wait"
        millis = 5000

        [[steps]]
        action = "scroll"
        delta_x = 0
        delta_y = -5
        repeat = 3
        interval_ms = 500

        [[steps]]
        action = "key"
        key = "Enter"

        [[steps]]
        action = "parallel"
        steps = [
            { action = "type", text = "Hello World" },
            { action = "mouse_move", x = 0, y = 0 },
            { action = "click", button = "left" },
        ]
    "#;

    #[test]
    fn test_session_toml_parses_into_expected_steps() {
        // Act
        let list: ActionList = toml::from_str(SESSION).expect("valid action list");

        // Assert
        assert_eq!(list.steps.len(), 6);
        assert_eq!(list.steps[0], DeviceAction::MouseMove { x: -19500, y: 31200 });
        assert_eq!(
            list.steps[1],
            DeviceAction::Click { button: MouseButton::Left, state: None }
        );
        assert_eq!(list.steps[2], DeviceAction::Wait { millis: 5000 });
        assert_eq!(
            list.steps[3],
            DeviceAction::Scroll { delta_x: 0, delta_y: -5, repeat: 3, interval_ms: 500 }
        );
        assert_eq!(
            list.steps[4],
            DeviceAction::Key { key: KeyCode::Enter, state: None, finish: false }
        );
    }

    #[test]
    fn test_parallel_group_contains_nested_steps() {
        let list: ActionList = toml::from_str(SESSION).unwrap();
        match &list.steps[5] {
            DeviceAction::Parallel { steps } => {
                assert_eq!(steps.len(), 3);
                assert_eq!(steps[0], DeviceAction::Type { text: "Hello World".into() });
            }
            other => panic!("expected parallel group, got {other:?}"),
        }
        assert_eq!(list.leaf_count(), 8);
    }

    #[test]
    fn test_scroll_defaults_to_single_turn_without_interval() {
        let list: ActionList = toml::from_str(
            "[[steps]]\naction = \"scroll\"\ndelta_x = 0\ndelta_y = 5\n",
        )
        .unwrap();
        assert_eq!(
            list.steps[0],
            DeviceAction::Scroll { delta_x: 0, delta_y: 5, repeat: 1, interval_ms: 0 }
        );
    }

    #[test]
    fn test_unknown_key_name_is_rejected() {
        let result: Result<ActionList, _> =
            toml::from_str("[[steps]]\naction = \"key\"\nkey = \"Entr\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_coordinate_is_rejected() {
        let result: Result<ActionList, _> =
            toml::from_str("[[steps]]\naction = \"mouse_move\"\nx = 40000\ny = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_document_is_an_empty_list() {
        let list: ActionList = toml::from_str("").unwrap();
        assert!(list.steps.is_empty());
    }

    #[test]
    fn test_mouse_button_names_round_trip() {
        for b in [
            MouseButton::Left,
            MouseButton::Right,
            MouseButton::Middle,
            MouseButton::Up,
            MouseButton::Down,
        ] {
            assert_eq!(b.name().parse::<MouseButton>().unwrap(), b);
        }
        assert!("side".parse::<MouseButton>().is_err());
    }
}
