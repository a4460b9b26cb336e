//! `DELAY` and `DEFAULTDELAY`.
//!
//! Script syntax:
//! - `DELAY 500` pauses for 500 ms
//! - `DEFAULTDELAY 50` sets the pause inserted after every later command
//!
//! Values that are zero, negative or not a number are ignored rather than
//! treated as errors.

use std::time::Duration;

use tracing::debug;

use crate::command::{Command, Context};
use crate::keys::KeyTable;
use crate::parser::parse_millis;

pub const DELAY: &str = "DELAY";
pub const DEFAULT_DELAY: &str = "DEFAULTDELAY";
pub const DEFAULT_DELAY_ALIAS: &str = "DEFAULT_DELAY";

pub(crate) fn parse_delay(args: &str, _keys: &KeyTable) -> Command {
    Command::Delay(parse_millis(args).unwrap_or(0))
}

pub(crate) fn parse_default_delay(args: &str, _keys: &KeyTable) -> Command {
    Command::SetDefaultDelay(parse_millis(args).unwrap_or(0))
}

pub(crate) fn delay(ms: u64, ctx: &mut Context<'_>) {
    if ms == 0 {
        return;
    }
    debug!("Delay: {}ms", ms);
    ctx.transport().pause(Duration::from_millis(ms));
}

pub(crate) fn set_default_delay(ms: u64, ctx: &mut Context<'_>) {
    if ms == 0 {
        return;
    }
    debug!("Default delay: {}ms", ms);
    ctx.set_default_delay(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Action, RecordingTransport};

    fn run(cmd: Command) -> (Vec<Action>, Duration) {
        let mut transport = RecordingTransport::connected();
        let log = transport.log();
        let mut ctx = Context::new(&mut transport, Duration::from_millis(100), false);
        cmd.execute(&mut ctx);
        let default_delay = ctx.default_delay();
        let actions = log.lock().clone();
        (actions, default_delay)
    }

    #[test]
    fn test_parse() {
        let keys = KeyTable::new();
        assert_eq!(parse_delay("250", &keys), Command::Delay(250));
        assert_eq!(parse_delay("-5", &keys), Command::Delay(0));
        assert_eq!(parse_delay("abc", &keys), Command::Delay(0));
        assert_eq!(parse_default_delay("10", &keys), Command::SetDefaultDelay(10));
    }

    #[test]
    fn test_delay_pauses_transport() {
        let (actions, _) = run(Command::Delay(250));
        assert_eq!(actions, vec![Action::Pause(Duration::from_millis(250))]);
    }

    #[test]
    fn test_zero_delay_does_not_pause() {
        let (actions, _) = run(Command::Delay(0));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_set_default_delay() {
        let (actions, default_delay) = run(Command::SetDefaultDelay(10));
        assert!(actions.is_empty());
        assert_eq!(default_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_zero_default_delay_is_ignored() {
        let (_, default_delay) = run(Command::SetDefaultDelay(0));
        assert_eq!(default_delay, Duration::from_millis(100));
    }
}
