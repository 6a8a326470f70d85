//! Hexadecimal keypad input.
use std::fmt;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        use KeyCode::*;
        const KEYS: [KeyCode; KEY_COUNT as usize] = [
            Key0, Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9, KeyA, KeyB, KeyC, KeyD,
            KeyE, KeyF,
        ];
        KEYS.get(key_id as usize).copied().ok_or(InvalidKeyCode)
    }
}

#[derive(Debug)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < 16")
    }
}

/// Latched keyboard state. Pressed is a 1 bit, released is a 0 bit.
///
/// The host refreshes the whole latch once per frame, so the
/// state is stale between refreshes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad(u16);

impl Keypad {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn set(&mut self, key_id: u8, pressed: bool) {
        if key_id < KEY_COUNT {
            if pressed {
                self.0 |= 1 << key_id;
            } else {
                self.0 &= !(1 << key_id);
            }
        }
    }

    /// Key identifiers outside the keypad are never pressed.
    pub fn is_pressed(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.0 & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.0 > 0
    }

    /// Retrieve the lowest numbered key that is pressed down.
    #[inline]
    pub fn first_pressed(&self) -> Option<KeyCode> {
        if self.any() {
            KeyCode::try_from(self.0.trailing_zeros() as u8).ok()
        } else {
            None
        }
    }

    /// Set all keys to up.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn iter_pressed(&self) -> impl Iterator<Item = KeyCode> + '_ {
        (0..KEY_COUNT)
            .filter(|key_id| self.is_pressed(*key_id))
            .filter_map(|key_id| KeyCode::try_from(key_id).ok())
    }
}

impl From<KeyCode> for Keypad {
    fn from(keycode: KeyCode) -> Self {
        let mut keypad = Keypad::new();
        keypad.set(keycode.as_u8(), true);
        keypad
    }
}
