//! Keyboard input sent to the foreground application.
//!
//! Engines translate these into their native key syntax, so the rest of the crate never
//! builds key strings by hand.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Tab,
    ShiftTab,
    Enter,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    /// Ctrl+Left, the focus-shift shortcut that moves a tabbed dialog one pane left.
    CtrlLeft,
    /// Ctrl+Right, moves one pane right.
    CtrlRight,
    /// Ctrl+V
    Paste,
    /// Alt+<letter>, menu and field accelerators.
    Alt(char),
    /// Ctrl+<letter>
    Ctrl(char),
    /// A single unmodified character.
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn shift_key(self) -> Key {
        match self {
            Direction::Left => Key::CtrlLeft,
            Direction::Right => Key::CtrlRight,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

impl Key {
    /// Key syntax understood by `uiautomation::inputs::Keyboard::send_keys`.
    pub fn to_uia_sequence(self) -> String {
        match self {
            Key::Tab => "{tab}".to_string(),
            Key::ShiftTab => "{shift}({tab})".to_string(),
            Key::Enter => "{enter}".to_string(),
            Key::Backspace => "{backspace}".to_string(),
            Key::Up => "{up}".to_string(),
            Key::Down => "{down}".to_string(),
            Key::Left => "{left}".to_string(),
            Key::Right => "{right}".to_string(),
            Key::CtrlLeft => "{ctrl}({left})".to_string(),
            Key::CtrlRight => "{ctrl}({right})".to_string(),
            Key::Paste => "{ctrl}(v)".to_string(),
            Key::Alt(c) => format!("{{alt}}({})", c.to_ascii_lowercase()),
            Key::Ctrl(c) => format!("{{ctrl}}({})", c.to_ascii_lowercase()),
            Key::Char(c) => c.to_string(),
        }
    }
}
