//! Key and modifier lookup for script tokens.
//!
//! Named keys use the Arduino `Keyboard.h` code space: codes below `0x80` are
//! ASCII characters, `0x80..=0x87` are modifiers and everything above is a
//! named key (e.g. `ENTER` is `0xB0`). A token that is not in either table
//! but is exactly one ASCII character resolves to that character's own code.

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// An 8-bit key code as understood by the HID transports. `0` means "no key".
pub type KeyCode = u8;

pub const KEY_NONE: KeyCode = 0;
pub const KEY_ENTER: KeyCode = 0xB0;
pub const KEY_ESC: KeyCode = 0xB1;
pub const KEY_BACKSPACE: KeyCode = 0xB2;
pub const KEY_TAB: KeyCode = 0xB3;
pub const KEY_SPACE: KeyCode = b' ';
pub const KEY_CAPS_LOCK: KeyCode = 0xC1;
pub const KEY_PRINT_SCREEN: KeyCode = 0xCE;
pub const KEY_INSERT: KeyCode = 0xD1;
pub const KEY_HOME: KeyCode = 0xD2;
pub const KEY_PAGE_UP: KeyCode = 0xD3;
pub const KEY_DELETE: KeyCode = 0xD4;
pub const KEY_END: KeyCode = 0xD5;
pub const KEY_PAGE_DOWN: KeyCode = 0xD6;
pub const KEY_RIGHT: KeyCode = 0xD7;
pub const KEY_LEFT: KeyCode = 0xD8;
pub const KEY_DOWN: KeyCode = 0xD9;
pub const KEY_UP: KeyCode = 0xDA;
pub const KEY_F1: KeyCode = 0xC2;

/// Set of modifier keys held during a combo.
///
/// Bit layout matches the modifier byte of a boot-protocol keyboard report:
/// left Ctrl/Shift/Alt/GUI in bits 0-3, right-hand variants in bits 4-7.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierMask(u8);

impl ModifierMask {
    pub const NONE: Self = Self(0);
    pub const CTRL_LEFT: Self = Self(0x01);
    pub const SHIFT_LEFT: Self = Self(0x02);
    pub const ALT_LEFT: Self = Self(0x04);
    pub const GUI_LEFT: Self = Self(0x08);
    pub const CTRL_RIGHT: Self = Self(0x10);
    pub const SHIFT_RIGHT: Self = Self(0x20);
    pub const ALT_RIGHT: Self = Self(0x40);
    pub const GUI_RIGHT: Self = Self(0x80);

    /// Every single-bit modifier, left-hand first.
    pub const ALL: [Self; 8] = [
        Self::CTRL_LEFT,
        Self::SHIFT_LEFT,
        Self::ALT_LEFT,
        Self::GUI_LEFT,
        Self::CTRL_RIGHT,
        Self::SHIFT_RIGHT,
        Self::ALT_RIGHT,
        Self::GUI_RIGHT,
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if either the left or right variant of `left`'s modifier is set.
    ///
    /// `left` must be one of the `*_LEFT` constants.
    pub const fn has_either(self, left: Self) -> bool {
        self.0 & (left.0 | (left.0 << 4)) != 0
    }

    /// Iterate over the individual modifier bits that are set.
    pub fn iter(self) -> impl Iterator<Item = ModifierMask> {
        Self::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

impl BitOr for ModifierMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModifierMask(0x{:02X})", self.0)
    }
}

/// Immutable lookup table from case-sensitive script tokens to key codes and
/// modifier bits.
#[derive(Debug, Clone)]
pub struct KeyTable {
    keys: HashMap<&'static str, KeyCode>,
    modifiers: HashMap<&'static str, ModifierMask>,
}

impl KeyTable {
    pub fn new() -> Self {
        let mut keys: HashMap<&'static str, KeyCode> = HashMap::from([
            ("ENTER", KEY_ENTER),
            ("ESC", KEY_ESC),
            ("ESCAPE", KEY_ESC),
            ("BACKSPACE", KEY_BACKSPACE),
            ("TAB", KEY_TAB),
            ("SPACE", KEY_SPACE),
            ("DELETE", KEY_DELETE),
            ("UP", KEY_UP),
            ("DOWN", KEY_DOWN),
            ("LEFT", KEY_LEFT),
            ("RIGHT", KEY_RIGHT),
            ("HOME", KEY_HOME),
            ("END", KEY_END),
            ("PAGEUP", KEY_PAGE_UP),
            ("PAGEDOWN", KEY_PAGE_DOWN),
            ("INSERT", KEY_INSERT),
            ("CAPSLOCK", KEY_CAPS_LOCK),
            ("PRINTSCREEN", KEY_PRINT_SCREEN),
        ]);

        const FUNCTION_KEYS: [&str; 12] = [
            "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
        ];
        for (offset, name) in (0u8..).zip(FUNCTION_KEYS) {
            keys.insert(name, KEY_F1 + offset);
        }

        let modifiers = HashMap::from([
            ("CTRL", ModifierMask::CTRL_LEFT),
            ("SHIFT", ModifierMask::SHIFT_LEFT),
            ("ALT", ModifierMask::ALT_LEFT),
            ("GUI", ModifierMask::GUI_LEFT),
            ("WINDOWS", ModifierMask::GUI_LEFT),
            ("COMMAND", ModifierMask::GUI_LEFT),
            ("CTRL-LEFT", ModifierMask::CTRL_LEFT),
            ("CTRL-RIGHT", ModifierMask::CTRL_RIGHT),
            ("SHIFT-LEFT", ModifierMask::SHIFT_LEFT),
            ("SHIFT-RIGHT", ModifierMask::SHIFT_RIGHT),
            ("ALT-LEFT", ModifierMask::ALT_LEFT),
            ("ALT-RIGHT", ModifierMask::ALT_RIGHT),
            ("GUI-LEFT", ModifierMask::GUI_LEFT),
            ("GUI-RIGHT", ModifierMask::GUI_RIGHT),
        ]);

        Self { keys, modifiers }
    }

    /// Resolve a key token: a named key, or a single ASCII character.
    pub fn resolve(&self, token: &str) -> Option<KeyCode> {
        if let Some(code) = self.named_key(token) {
            return Some(code);
        }
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii() => Some(ch as u8),
            _ => None,
        }
    }

    /// Resolve a named key only (no single-character fallback).
    pub fn named_key(&self, token: &str) -> Option<KeyCode> {
        self.keys.get(token).copied()
    }

    pub fn resolve_modifier(&self, token: &str) -> Option<ModifierMask> {
        self.modifiers.get(token).copied()
    }

    /// True if `token` names a key or a modifier in the dictionary.
    ///
    /// Single characters are not covered, so a bare `a` line is an unknown
    /// command rather than an implicit key press.
    pub fn is_named(&self, token: &str) -> bool {
        self.keys.contains_key(token) || self.modifiers.contains_key(token)
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        let table = KeyTable::new();
        assert_eq!(table.resolve("ENTER"), Some(KEY_ENTER));
        assert_eq!(table.resolve("ESCAPE"), Some(KEY_ESC));
        assert_eq!(table.resolve("F1"), Some(0xC2));
        assert_eq!(table.resolve("F5"), Some(0xC6));
        assert_eq!(table.resolve("F12"), Some(0xCD));
        assert_eq!(table.resolve("UP"), Some(KEY_UP));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = KeyTable::new();
        assert_eq!(table.resolve("enter"), None);
        assert_eq!(table.resolve_modifier("ctrl"), None);
    }

    #[test]
    fn test_single_character_fallback() {
        let table = KeyTable::new();
        assert_eq!(table.resolve("x"), Some(b'x'));
        assert_eq!(table.resolve("R"), Some(b'R'));
        assert_eq!(table.resolve("é"), None);
        assert_eq!(table.resolve("xy"), None);
        assert_eq!(table.named_key("x"), None);
    }

    #[test]
    fn test_modifiers() {
        let table = KeyTable::new();
        assert_eq!(table.resolve_modifier("CTRL"), Some(ModifierMask::CTRL_LEFT));
        assert_eq!(table.resolve_modifier("COMMAND"), Some(ModifierMask::GUI_LEFT));
        assert_eq!(
            table.resolve_modifier("ALT-RIGHT"),
            Some(ModifierMask::ALT_RIGHT)
        );
        assert_eq!(table.resolve("CTRL"), None);
    }

    #[test]
    fn test_mask_combination() {
        let mut mask = ModifierMask::ALT_LEFT;
        mask |= ModifierMask::CTRL_LEFT;
        assert_eq!(mask, ModifierMask::CTRL_LEFT | ModifierMask::ALT_LEFT);
        assert_eq!(mask.bits(), 0x05);
        assert!(mask.contains(ModifierMask::CTRL_LEFT));
        assert!(!mask.contains(ModifierMask::SHIFT_LEFT));
        assert_eq!(mask.iter().count(), 2);
    }

    #[test]
    fn test_has_either() {
        let mask = ModifierMask::CTRL_RIGHT;
        assert!(mask.has_either(ModifierMask::CTRL_LEFT));
        assert!(!mask.has_either(ModifierMask::ALT_LEFT));
    }
}
