use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Terminal cells are roughly twice as tall as they are wide; vertical drag
/// distances are scaled so both axes share one unit.
pub const CELL_ASPECT: f32 = 2.0;

/// Represents the result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Fling the current card right
    Keep,
    /// Fling the current card left and move it to the trash
    Burn,
    /// Ask for library access again, or retry a failed load
    Retry,
    Help,
    None,
}

/// Maps keyboard events to actions
pub fn handle_key_event(key: KeyEvent) -> KeyAction {
    match (key.code, key.modifiers) {
        // Quit: q, Esc or Ctrl+C
        (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (KeyCode::Esc, KeyModifiers::NONE) => KeyAction::Quit,

        (KeyCode::Right, KeyModifiers::NONE) => KeyAction::Keep,
        (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::Keep,

        (KeyCode::Left, KeyModifiers::NONE) => KeyAction::Burn,
        (KeyCode::Char('b'), KeyModifiers::NONE) => KeyAction::Burn,

        (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Retry,

        (KeyCode::Char('?'), KeyModifiers::NONE) => KeyAction::Help,
        // Some terminals report '?' with SHIFT
        (KeyCode::Char('?'), KeyModifiers::SHIFT) => KeyAction::Help,

        _ => KeyAction::None,
    }
}

/// Gesture phase derived from mouse input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Start,
    /// Cumulative translation since the button went down, in columns
    Move { dx: f32, dy: f32 },
    End,
    None,
}

/// Turns left-button press, drag and release into a gesture
#[derive(Debug, Default, Clone)]
pub struct DragTracker {
    origin: Option<(u16, u16)>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.origin.is_some()
    }

    pub fn handle(&mut self, event: MouseEvent) -> PointerAction {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some((event.column, event.row));
                PointerAction::Start
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.origin {
                Some((column, row)) => PointerAction::Move {
                    dx: f32::from(event.column) - f32::from(column),
                    dy: (f32::from(event.row) - f32::from(row)) * CELL_ASPECT,
                },
                None => PointerAction::None,
            },
            MouseEventKind::Up(MouseButton::Left) => match self.origin.take() {
                Some(_) => PointerAction::End,
                None => PointerAction::None,
            },
            _ => PointerAction::None,
        }
    }
}
