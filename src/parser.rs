//! Line interpreter for the keystroke scripting language.
//!
//! Scripts are split into lines with [`split_lines`]; each line is turned into
//! a [`Command`] by [`Interpreter::parse_line`] at the moment it is about to
//! run. Parsing never fails: anything unrecognised becomes
//! [`Command::Unknown`].

use crate::command::Command;
use crate::commands::{comment, delay, key_combo, text};
use crate::keys::KeyTable;

/// Largest millisecond parameter accepted; longer values are clamped.
pub const MAX_MILLIS: u64 = i32::MAX as u64;

/// Keyword that turns the rest of a line into a comment.
pub const REM: &str = "REM";

type ParseFn = fn(&str, &KeyTable) -> Command;

static REGISTRY: &[(&str, ParseFn)] = &[
    (delay::DELAY, delay::parse_delay),
    (delay::DEFAULT_DELAY, delay::parse_default_delay),
    (delay::DEFAULT_DELAY_ALIAS, delay::parse_default_delay),
    (text::STRING, text::parse_string),
    (text::STRING_LINE, text::parse_string_line),
    (key_combo::KEY, key_combo::parse_key),
    (key_combo::KEYS, key_combo::parse_raw),
    (key_combo::ENTER, key_combo::parse_enter),
    (key_combo::GUI, key_combo::parse_gui),
    (key_combo::WINDOWS, key_combo::parse_gui),
    (key_combo::COMMAND, key_combo::parse_gui),
    (comment::REM_BLOCK, comment::parse_block_open),
];

/// Parses script lines against a fixed [`KeyTable`].
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    keys: KeyTable,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_keys(KeyTable::new())
    }

    pub fn with_keys(keys: KeyTable) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyTable {
        &self.keys
    }

    /// Classify one raw script line.
    ///
    /// `in_comment_block` is owned by the caller; it should be updated from
    /// the returned [`Command::CommentBlockToggle`].
    ///
    /// # Example
    ///
    /// ```
    /// use hidscript::{Command, Interpreter, ModifierMask};
    ///
    /// let interp = Interpreter::new();
    /// assert_eq!(
    ///     interp.parse_line("CTRL ALT t", false),
    ///     Command::SendKeyCombo {
    ///         key: b't',
    ///         modifiers: ModifierMask::CTRL_LEFT | ModifierMask::ALT_LEFT,
    ///     }
    /// );
    /// ```
    pub fn parse_line(&self, raw: &str, in_comment_block: bool) -> Command {
        let line = raw.trim();
        if line.is_empty() {
            return Command::Comment;
        }

        if in_comment_block {
            return comment::parse_in_block(line);
        }

        let (name, args) = line
            .split_once(char::is_whitespace)
            .map(|(name, args)| (name, args.trim()))
            .unwrap_or((line, ""));

        if name == REM {
            return Command::Comment;
        }

        if let Some((_, parse)) = REGISTRY.iter().find(|(keyword, _)| *keyword == name) {
            return parse(args, &self.keys);
        }

        // Bare key or modifier names form an implicit combo: `CTRL c`, `F5`.
        if self.keys.is_named(name) {
            return key_combo::parse_combo(line, &self.keys);
        }

        Command::Unknown(name.to_string())
    }
}

/// Split script text on line feeds.
///
/// A final line without a terminator is kept; a trailing terminator does not
/// produce an extra empty line. Carriage returns are left in place and
/// removed by trimming at parse time.
pub fn split_lines(script: &str) -> Vec<String> {
    script.split_terminator('\n').map(str::to_string).collect()
}

/// Parse a millisecond count leniently, `atoi` style: an optional
/// sign followed by leading digits, ignoring anything after them. Returns
/// `None` for values that are not strictly positive or have no digits.
/// Values are capped at [`MAX_MILLIS`].
pub(crate) fn parse_millis(s: &str) -> Option<u64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end]
        .bytes()
        .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add(u64::from(b - b'0')));
    (!negative && value > 0).then_some(value.min(MAX_MILLIS))
}
