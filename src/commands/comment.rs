//! `REM_BLOCK` block comments and unknown commands.
//!
//! ```text
//! REM_BLOCK
//! anything here is skipped
//! REM_BLOCK END
//! ```
//!
//! A `REM_BLOCK` line that already contains `END` opens nothing.

use tracing::warn;

use crate::command::{Command, Context};
use crate::keys::KeyTable;

pub const REM_BLOCK: &str = "REM_BLOCK";

/// Marker that closes a block when it appears on a `REM_BLOCK` line.
pub const BLOCK_END: &str = "END";

pub(crate) fn parse_block_open(args: &str, _keys: &KeyTable) -> Command {
    if args.contains(BLOCK_END) {
        Command::Comment
    } else {
        Command::CommentBlockToggle { closing: false }
    }
}

/// Classify a trimmed, non-empty line while a block comment is open.
pub(crate) fn parse_in_block(line: &str) -> Command {
    if line.starts_with(REM_BLOCK) && line.contains(BLOCK_END) {
        Command::CommentBlockToggle { closing: true }
    } else {
        Command::Comment
    }
}

pub(crate) fn toggle_block(closing: bool, ctx: &mut Context<'_>) {
    ctx.set_in_comment_block(!closing);
}

pub(crate) fn unknown(name: &str) {
    warn!("Unknown command: {}", name);
}
