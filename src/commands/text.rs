//! `STRING` and `STRINGLN`: type literal text.
//!
//! The text is everything after the keyword with surrounding whitespace
//! removed. There is no quoting or escaping.

use tracing::debug;

use crate::command::{Command, Context};
use crate::keys::{KEY_ENTER, KeyTable, ModifierMask};

pub const STRING: &str = "STRING";
pub const STRING_LINE: &str = "STRINGLN";

pub(crate) fn parse_string(args: &str, _keys: &KeyTable) -> Command {
    Command::SendText(args.to_string())
}

pub(crate) fn parse_string_line(args: &str, _keys: &KeyTable) -> Command {
    Command::SendTextThenEnter(args.to_string())
}

pub(crate) fn send_text(text: &str, ctx: &mut Context<'_>) {
    debug!("String: {}", text);
    let result = ctx.transport().send_text(text);
    ctx.report("text", result);
}

pub(crate) fn send_text_then_enter(text: &str, ctx: &mut Context<'_>) {
    debug!("StringLN: {}", text);
    let result = ctx.transport().send_text(text);
    ctx.report("text", result);
    let result = ctx.transport().send_key_combo(KEY_ENTER, ModifierMask::NONE);
    ctx.report("enter", result);
}
