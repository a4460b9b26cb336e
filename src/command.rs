//! The [`Command`] type and the [`Context`] commands execute against.

use std::time::Duration;

use tracing::debug;

use crate::commands::{comment, delay, key_combo, text};
use crate::error::TransportError;
use crate::keys::{KeyCode, ModifierMask};
use crate::transport::HidTransport;

/// One parsed script line.
///
/// Commands are derived from a line right before it runs and are never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pause for this many milliseconds. `0` means no pause.
    Delay(u64),
    /// Change the pause inserted after every command. `0` leaves it unchanged.
    SetDefaultDelay(u64),
    SendText(String),
    SendTextThenEnter(String),
    SendKeyCombo {
        key: KeyCode,
        modifiers: ModifierMask,
    },
    /// Multi-key sequence, passed to the transport verbatim.
    SendRawSequence(String),
    CommentBlockToggle {
        closing: bool,
    },
    Comment,
    Unknown(String),
}

impl Command {
    /// Run the command against the context's transport.
    ///
    /// Transport failures are logged and swallowed; a script keeps going
    /// through transient disconnects.
    pub fn execute(&self, ctx: &mut Context<'_>) {
        match self {
            Command::Delay(ms) => delay::delay(*ms, ctx),
            Command::SetDefaultDelay(ms) => delay::set_default_delay(*ms, ctx),
            Command::SendText(s) => text::send_text(s, ctx),
            Command::SendTextThenEnter(s) => text::send_text_then_enter(s, ctx),
            Command::SendKeyCombo { key, modifiers } => key_combo::send_combo(*key, *modifiers, ctx),
            Command::SendRawSequence(s) => key_combo::send_raw(s, ctx),
            Command::CommentBlockToggle { closing } => comment::toggle_block(*closing, ctx),
            Command::Comment => {}
            Command::Unknown(name) => comment::unknown(name),
        }
    }

    /// Whether the scheduler follows this command with the default delay.
    ///
    /// Lines that do nothing on the wire (blank, comments, block markers)
    /// are skipped without pausing.
    pub fn takes_default_delay(&self) -> bool {
        !matches!(
            self,
            Command::Comment | Command::CommentBlockToggle { .. }
        )
    }
}

/// Execution state handed to [`Command::execute`].
///
/// Wraps the bound transport together with the interpreter state that
/// commands may change: the default inter-command delay and whether a block
/// comment is open.
pub struct Context<'a> {
    transport: &'a mut dyn HidTransport,
    default_delay: Duration,
    in_comment_block: bool,
}

impl<'a> Context<'a> {
    pub fn new(
        transport: &'a mut dyn HidTransport,
        default_delay: Duration,
        in_comment_block: bool,
    ) -> Self {
        Self {
            transport,
            default_delay,
            in_comment_block,
        }
    }

    pub fn transport(&mut self) -> &mut dyn HidTransport {
        &mut *self.transport
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    pub fn set_default_delay(&mut self, delay: Duration) {
        self.default_delay = delay;
    }

    pub fn in_comment_block(&self) -> bool {
        self.in_comment_block
    }

    pub fn set_in_comment_block(&mut self, open: bool) {
        self.in_comment_block = open;
    }

    /// Log a failed transport operation and carry on.
    pub(crate) fn report(&self, what: &str, result: Result<(), TransportError>) {
        if let Err(e) = result {
            debug!("{} skipped: {}", what, e);
        }
    }
}
