use std::collections::HashSet;

use glam::Vec2;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

/// Non-character keys the viewer listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
}

/// Platform-neutral event fed to [`InputState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(KeyCode),
    KeyReleased(KeyCode),
    /// Cursor position in window pixels, y growing downwards.
    CursorMoved(Vec2),
    /// Vertical scroll in lines; positive scrolls away from the user.
    Scrolled(f32),
    Resized { width: u32, height: u32 },
    CloseRequested,
}

/// Everything that happened since the previous frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub held: HashSet<KeyCode>,
    pub pressed: Vec<KeyCode>,
    /// Cursor motion with y pointing up.
    pub cursor_delta: Vec2,
    pub scroll: f32,
    pub resized: Option<(u32, u32)>,
    pub close_requested: bool,
}

impl FrameInput {
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

/// Accumulates input events between frames.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    pressed: Vec<KeyCode>,
    last_cursor: Option<Vec2>,
    cursor_delta: Vec2,
    scroll: f32,
    resized: Option<(u32, u32)>,
    close_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => {
                // OS key repeat arrives as more presses of a held key.
                if self.keys.insert(key) {
                    self.pressed.push(key);
                }
            }
            InputEvent::KeyReleased(key) => {
                self.keys.remove(&key);
            }
            InputEvent::CursorMoved(position) => {
                if let Some(last) = self.last_cursor {
                    self.cursor_delta += Vec2::new(position.x - last.x, last.y - position.y);
                }
                self.last_cursor = Some(position);
            }
            InputEvent::Scrolled(lines) => self.scroll += lines,
            InputEvent::Resized { width, height } => self.resized = Some((width, height)),
            InputEvent::CloseRequested => self.close_requested = true,
        }
    }

    /// Hands out the accumulated frame and resets the per-frame parts.
    /// Held keys and the last cursor position carry over.
    pub fn take_frame(&mut self) -> FrameInput {
        FrameInput {
            held: self.keys.clone(),
            pressed: std::mem::take(&mut self.pressed),
            cursor_delta: std::mem::take(&mut self.cursor_delta),
            scroll: std::mem::take(&mut self.scroll),
            resized: self.resized.take(),
            close_requested: std::mem::take(&mut self.close_requested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: KeyCode = KeyCode::Character('W');

    #[test]
    fn held_keys_survive_frames_but_presses_do_not() {
        let mut state = InputState::new();
        state.handle(InputEvent::KeyPressed(W));
        let frame = state.take_frame();
        assert!(frame.is_held(W));
        assert!(frame.was_pressed(W));

        let frame = state.take_frame();
        assert!(frame.is_held(W));
        assert!(!frame.was_pressed(W));

        state.handle(InputEvent::KeyReleased(W));
        assert!(!state.take_frame().is_held(W));
    }

    #[test]
    fn key_repeat_is_not_a_new_press() {
        let mut state = InputState::new();
        state.handle(InputEvent::KeyPressed(W));
        state.handle(InputEvent::KeyPressed(W));
        assert_eq!(state.take_frame().pressed, vec![W]);
    }

    #[test]
    fn first_cursor_sample_produces_no_motion() {
        let mut state = InputState::new();
        state.handle(InputEvent::CursorMoved(Vec2::new(400.0, 300.0)));
        assert_eq!(state.take_frame().cursor_delta, Vec2::ZERO);

        state.handle(InputEvent::CursorMoved(Vec2::new(410.0, 290.0)));
        state.handle(InputEvent::CursorMoved(Vec2::new(415.0, 295.0)));
        // moving the mouse up (smaller y) is positive
        assert_eq!(state.take_frame().cursor_delta, Vec2::new(15.0, 5.0));
    }

    #[test]
    fn scroll_resize_and_close_reset_each_frame() {
        let mut state = InputState::new();
        state.handle(InputEvent::Scrolled(1.0));
        state.handle(InputEvent::Scrolled(0.5));
        state.handle(InputEvent::Resized {
            width: 640,
            height: 480,
        });
        state.handle(InputEvent::CloseRequested);

        let frame = state.take_frame();
        assert_eq!(frame.scroll, 1.5);
        assert_eq!(frame.resized, Some((640, 480)));
        assert!(frame.close_requested);

        assert_eq!(state.take_frame(), FrameInput::default());
    }
}
