use chip8::{KeyCode, Keypad};
use winit::event::{ElementState, VirtualKeyCode};

/// Host keyboard layout of the 16 Chip8 keys, indexed by Chip8 key value.
///
/// ```text
/// 1 2 3 4        1 2 3 C
/// Q W E R   ->   4 5 6 D
/// A S D F        7 8 9 E
/// Z X C V        A 0 B F
/// ```
pub const KEYMAP: [VirtualKeyCode; 16] = [
    VirtualKeyCode::X,    // 0
    VirtualKeyCode::Key1, // 1
    VirtualKeyCode::Key2, // 2
    VirtualKeyCode::Key3, // 3
    VirtualKeyCode::Q,    // 4
    VirtualKeyCode::W,    // 5
    VirtualKeyCode::E,    // 6
    VirtualKeyCode::A,    // 7
    VirtualKeyCode::S,    // 8
    VirtualKeyCode::D,    // 9
    VirtualKeyCode::Z,    // A
    VirtualKeyCode::C,    // B
    VirtualKeyCode::Key4, // C
    VirtualKeyCode::R,    // D
    VirtualKeyCode::F,    // E
    VirtualKeyCode::V,    // F
];

/// Application specific input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Action(Action),
    Chip8(KeyCode),
}

/// Input mapper
///
/// Maps user input events to either Chip8 keycodes (suitable to be used in the VM),
/// or application specific actions.
///
/// Key state is tracked as events arrive, and sampled once per frame
/// with [`InputMap::keypad`].
#[derive(Debug, Default)]
pub struct InputMap {
    /// Chip8 keys currently held down.
    held: Keypad,
    /// Actions triggered since the state was last cleared.
    exit: bool,
}

impl InputMap {
    pub fn new() -> Self {
        Default::default()
    }

    /// Given a user input keycode, map it to either a Chip8 key, or an action.
    pub fn map_key(key: VirtualKeyCode) -> Option<InputKind> {
        if key == VirtualKeyCode::Escape {
            return Some(InputKind::Action(Action::Exit));
        }

        KEYMAP
            .iter()
            .position(|keycode| *keycode == key)
            .and_then(|index| KeyCode::try_from(index as u8).ok())
            .map(InputKind::Chip8)
    }

    /// Push key event into the input state.
    pub fn push_key(&mut self, keycode: VirtualKeyCode, state: ElementState) {
        let pressed = state == ElementState::Pressed;

        // Convert `winit` key to our input framework
        match Self::map_key(keycode) {
            Some(InputKind::Chip8(key)) => self.held.set(key.as_u8(), pressed),
            Some(InputKind::Action(Action::Exit)) => self.exit |= pressed,
            None => {
                log::trace!("no input mapping for {keycode:?}");
            }
        }
    }

    pub fn is_action_pressed(&self, action: Action) -> bool {
        match action {
            Action::Exit => self.exit,
        }
    }

    /// Snapshot of the Chip8 keys held down right now.
    pub fn keypad(&self) -> Keypad {
        self.held
    }

    /// Release everything, for example when the window loses focus.
    pub fn clear_state(&mut self) {
        self.held.clear();
        self.exit = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(
            InputMap::map_key(VirtualKeyCode::X),
            Some(InputKind::Chip8(KeyCode::Key0))
        );
        assert_eq!(
            InputMap::map_key(VirtualKeyCode::Key4),
            Some(InputKind::Chip8(KeyCode::KeyC))
        );
        assert_eq!(
            InputMap::map_key(VirtualKeyCode::V),
            Some(InputKind::Chip8(KeyCode::KeyF))
        );
        assert_eq!(InputMap::map_key(VirtualKeyCode::P), None);
    }

    #[test]
    fn test_every_key_mapped_once() {
        for (index, keycode) in KEYMAP.iter().enumerate() {
            assert_eq!(
                InputMap::map_key(*keycode),
                Some(InputKind::Chip8(KeyCode::try_from(index as u8).unwrap()))
            );
        }
    }

    #[test]
    fn test_held_keys() {
        let mut input = InputMap::new();

        input.push_key(VirtualKeyCode::W, ElementState::Pressed);
        input.push_key(VirtualKeyCode::R, ElementState::Pressed);
        assert!(input.keypad().is_pressed(0x5));
        assert!(input.keypad().is_pressed(0xD));

        input.push_key(VirtualKeyCode::W, ElementState::Released);
        assert!(!input.keypad().is_pressed(0x5));
        assert!(input.keypad().is_pressed(0xD));

        input.clear_state();
        assert!(!input.keypad().any());
    }

    #[test]
    fn test_exit_action() {
        let mut input = InputMap::new();
        assert!(!input.is_action_pressed(Action::Exit));

        input.push_key(VirtualKeyCode::Escape, ElementState::Pressed);
        assert!(input.is_action_pressed(Action::Exit));
        assert!(!input.keypad().any());
    }
}
