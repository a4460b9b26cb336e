//! Key combos: `KEY`, the GUI aliases, `ENTER`, implicit combos and `KEYS`.
//!
//! Script syntax:
//! - `KEY CTRL ALT t` presses Ctrl+Alt+t
//! - `GUI r` (also `WINDOWS r`, `COMMAND r`) presses GUI+r
//! - `CTRL c`, `F5` and other lines that start with a key or modifier name
//! - `KEYS ...` forwards the raw sequence to the transport
//!
//! Every modifier token is OR-ed into the mask. Of the key tokens (named keys
//! or single characters) the last one wins. Other tokens are ignored.

use tracing::{debug, trace};

use crate::command::{Command, Context};
use crate::keys::{KEY_ENTER, KeyCode, KeyTable, ModifierMask};

pub const KEY: &str = "KEY";
pub const KEYS: &str = "KEYS";
pub const ENTER: &str = "ENTER";
pub const GUI: &str = "GUI";
pub const WINDOWS: &str = "WINDOWS";
pub const COMMAND: &str = "COMMAND";

pub(crate) fn parse_key(args: &str, keys: &KeyTable) -> Command {
    parse_combo(args, keys)
}

pub(crate) fn parse_gui(args: &str, keys: &KeyTable) -> Command {
    let mut combo = parse_combo(args, keys);
    if let Command::SendKeyCombo { modifiers, .. } = &mut combo {
        *modifiers |= ModifierMask::GUI_LEFT;
    }
    combo
}

pub(crate) fn parse_enter(_args: &str, _keys: &KeyTable) -> Command {
    Command::SendKeyCombo {
        key: KEY_ENTER,
        modifiers: ModifierMask::NONE,
    }
}

pub(crate) fn parse_raw(args: &str, _keys: &KeyTable) -> Command {
    Command::SendRawSequence(args.to_string())
}

/// Build a combo from whitespace-separated key and modifier tokens.
pub(crate) fn parse_combo(expr: &str, keys: &KeyTable) -> Command {
    let mut key: KeyCode = 0;
    let mut modifiers = ModifierMask::NONE;

    for token in expr.split_whitespace() {
        if let Some(bit) = keys.resolve_modifier(token) {
            modifiers |= bit;
        } else if let Some(code) = keys.resolve(token) {
            key = code;
        } else {
            trace!("ignoring combo token {:?}", token);
        }
    }

    Command::SendKeyCombo { key, modifiers }
}

pub(crate) fn send_combo(key: KeyCode, modifiers: ModifierMask, ctx: &mut Context<'_>) {
    debug!("Key: 0x{:02X} mods 0x{:02X}", key, modifiers.bits());
    let result = ctx.transport().send_key_combo(key, modifiers);
    ctx.report("key combo", result);
}

pub(crate) fn send_raw(keys: &str, ctx: &mut Context<'_>) {
    debug!("Keys: {}", keys);
    let result = ctx.transport().send_raw_sequence(keys);
    ctx.report("raw sequence", result);
}
