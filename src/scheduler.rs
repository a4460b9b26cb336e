//! Incremental script execution.
//!
//! The [`Scheduler`] owns the loaded script and a cursor into it. Each
//! [`tick`](Scheduler::tick) runs exactly one line, so a host loop can keep
//! rendering, polling input and servicing the radio between commands.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::command::Context;
use crate::error::SchedulerError;
use crate::parser::{Interpreter, split_lines};
use crate::transport::SharedTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause inserted after every command until a script changes it.
    pub default_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Complete,
}

/// Runs a script one line per tick against the bound transport.
pub struct Scheduler {
    interpreter: Interpreter,
    config: SchedulerConfig,
    transport: Option<SharedTransport>,
    lines: Vec<String>,
    cursor: usize,
    in_comment_block: bool,
    default_delay: Duration,
    state: RunState,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            interpreter: Interpreter::new(),
            config,
            transport: None,
            lines: Vec::new(),
            cursor: 0,
            in_comment_block: false,
            default_delay: config.default_delay,
            state: RunState::Idle,
        }
    }

    /// Bind the transport commands are executed against.
    ///
    /// Fails while a script is running; stop it first.
    pub fn set_transport(&mut self, transport: SharedTransport) -> Result<(), SchedulerError> {
        if self.state == RunState::Running {
            return Err(SchedulerError::TransportBusy);
        }
        self.transport = Some(transport);
        Ok(())
    }

    /// Unbind the transport. Fails while a script is running.
    pub fn clear_transport(&mut self) -> Result<(), SchedulerError> {
        if self.state == RunState::Running {
            return Err(SchedulerError::TransportBusy);
        }
        self.transport = None;
        Ok(())
    }

    /// Load `script` and start running it from the first line.
    ///
    /// Any script already running is discarded.
    pub fn start(&mut self, script: &str) {
        if self.state == RunState::Running {
            info!(
                "Replacing running script at line {}/{}",
                self.cursor + 1,
                self.lines.len()
            );
        }

        self.lines = split_lines(script);
        self.cursor = 0;
        self.in_comment_block = false;
        self.default_delay = self.config.default_delay;
        self.state = if self.lines.is_empty() {
            RunState::Complete
        } else {
            RunState::Running
        };
        info!("Starting script: {} lines", self.lines.len());
    }

    /// Execute the line under the cursor and advance.
    ///
    /// Does nothing unless a script is running and a transport is bound.
    pub fn tick(&mut self) {
        if self.state != RunState::Running {
            return;
        }
        let Some(transport) = self.transport.as_ref().map(Arc::clone) else {
            return;
        };
        if self.cursor >= self.lines.len() {
            self.finish();
            return;
        }

        let command = self
            .interpreter
            .parse_line(&self.lines[self.cursor], self.in_comment_block);
        debug!("line {}: {:?}", self.cursor + 1, command);

        {
            let mut guard = transport.lock();
            let mut ctx = Context::new(&mut *guard, self.default_delay, self.in_comment_block);
            command.execute(&mut ctx);
            self.default_delay = ctx.default_delay();
            self.in_comment_block = ctx.in_comment_block();

            if command.takes_default_delay() && !self.default_delay.is_zero() {
                guard.pause(self.default_delay);
            }
        }

        self.cursor += 1;
        if self.cursor >= self.lines.len() {
            self.finish();
        }
    }

    /// Abort the running script. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state == RunState::Running {
            info!("Script stopped at line {}/{}", self.cursor + 1, self.lines.len());
        }
        self.lines.clear();
        self.cursor = 0;
        self.in_comment_block = false;
        self.state = RunState::Complete;
    }

    fn finish(&mut self) {
        self.cursor = self.lines.len();
        self.state = RunState::Complete;
        info!("Script complete");
    }

    /// Raw text of the line the next tick will run, or `""`.
    pub fn current_line_text(&self) -> &str {
        self.lines.get(self.cursor).map(String::as_str).unwrap_or("")
    }

    /// 1-based number of the next line, for progress display.
    pub fn current_line_number(&self) -> usize {
        self.cursor + 1
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// True whenever no script is running.
    pub fn is_complete(&self) -> bool {
        self.state != RunState::Running
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KEY_ENTER, ModifierMask};
    use crate::test_support::{Action, RecordingTransport};
    use crate::transport::shared;
    use parking_lot::Mutex;

    const MS100: Duration = Duration::from_millis(100);

    fn scheduler() -> (Scheduler, Arc<Mutex<Vec<Action>>>) {
        let transport = RecordingTransport::connected();
        let log = transport.log();
        let mut scheduler = Scheduler::new();
        scheduler.set_transport(shared(transport)).unwrap();
        (scheduler, log)
    }

    fn run(scheduler: &mut Scheduler) {
        while !scheduler.is_complete() {
            scheduler.tick();
        }
    }

    #[test]
    fn test_one_line_per_tick() {
        let (mut s, _) = scheduler();
        s.start("STRING a\nREM b\n\nSTRING c");
        assert_eq!(s.line_count(), 4);
        for _ in 0..3 {
            s.tick();
            assert!(!s.is_complete());
        }
        s.tick();
        assert!(s.is_complete());
        assert_eq!(s.state(), RunState::Complete);
    }

    #[test]
    fn test_default_delay_follows_commands() {
        let (mut s, log) = scheduler();
        s.start("STRING hi\nREM quiet\nENTER\n");
        run(&mut s);
        assert_eq!(
            *log.lock(),
            vec![
                Action::Text("hi".into()),
                Action::Pause(MS100),
                Action::Combo(KEY_ENTER, ModifierMask::NONE),
                Action::Pause(MS100),
            ]
        );
    }

    #[test]
    fn test_delay_command() {
        let (mut s, log) = scheduler();
        s.start("DELAY 250\nDELAY -5\nDELAY abc");
        run(&mut s);
        assert_eq!(
            *log.lock(),
            vec![
                Action::Pause(Duration::from_millis(250)),
                Action::Pause(MS100),
                Action::Pause(MS100),
                Action::Pause(MS100),
            ]
        );
    }

    #[test]
    fn test_default_delay_change_applies_right_after_its_line() {
        let (mut s, log) = scheduler();
        s.start("DEFAULTDELAY 10\nSTRING a\nSTRING b");
        run(&mut s);
        assert_eq!(
            *log.lock(),
            vec![
                Action::Pause(Duration::from_millis(10)),
                Action::Text("a".into()),
                Action::Pause(Duration::from_millis(10)),
                Action::Text("b".into()),
                Action::Pause(Duration::from_millis(10)),
            ]
        );
        assert_eq!(s.default_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_key_lines_send_one_combo_each() {
        let (mut s, log) = scheduler();
        s.start("KEY CTRL ALT x\nKEY CTRL x y");
        run(&mut s);
        let combos: Vec<_> = log
            .lock()
            .iter()
            .filter(|a| !matches!(a, Action::Pause(_)))
            .cloned()
            .collect();
        assert_eq!(
            combos,
            vec![
                Action::Combo(b'x', ModifierMask::CTRL_LEFT | ModifierMask::ALT_LEFT),
                Action::Combo(b'y', ModifierMask::CTRL_LEFT),
            ]
        );
    }

    #[test]
    fn test_comment_block_suppresses_everything() {
        let (mut s, log) = scheduler();
        s.start("REM_BLOCK\nSTRING secret\nCTRL c\nDELAY 500\nREM_BLOCK END\nSTRING shown");
        run(&mut s);
        assert_eq!(
            *log.lock(),
            vec![Action::Text("shown".into()), Action::Pause(MS100)]
        );
    }

    #[test]
    fn test_zero_default_delay_never_pauses() {
        let transport = RecordingTransport::connected();
        let log = transport.log();
        let mut s = Scheduler::with_config(SchedulerConfig {
            default_delay: Duration::ZERO,
        });
        s.set_transport(shared(transport)).unwrap();
        s.start("STRING a\nSTRING b");
        run(&mut s);
        assert_eq!(
            *log.lock(),
            vec![Action::Text("a".into()), Action::Text("b".into())]
        );
    }

    #[test]
    fn test_stop_before_tick() {
        let (mut s, log) = scheduler();
        s.start("STRING a\nSTRING b");
        s.stop();
        assert!(s.is_complete());
        assert_eq!(s.current_line_text(), "");
        s.tick();
        assert!(log.lock().is_empty());

        s.stop();
        assert!(s.is_complete());
    }

    #[test]
    fn test_stop_mid_script() {
        let (mut s, log) = scheduler();
        s.start("STRING a\nSTRING b\nSTRING c");
        s.tick();
        s.stop();
        s.tick();
        assert_eq!(
            *log.lock(),
            vec![Action::Text("a".into()), Action::Pause(MS100)]
        );
    }

    #[test]
    fn test_current_line_text() {
        let (mut s, _) = scheduler();
        assert_eq!(s.current_line_text(), "");
        s.start("STRING a\r\n  DELAY 5");
        assert_eq!(s.current_line_text(), "STRING a\r");
        assert_eq!(s.current_line_number(), 1);
        s.tick();
        assert_eq!(s.current_line_text(), "  DELAY 5");
        s.tick();
        assert_eq!(s.current_line_text(), "");
    }

    #[test]
    fn test_restart_discards_previous_script() {
        let (mut s, log) = scheduler();
        s.start("STRING old1\nSTRING old2");
        s.tick();
        s.start("STRING new");
        run(&mut s);
        let texts: Vec<_> = log
            .lock()
            .iter()
            .filter_map(|a| match a {
                Action::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["old1", "new"]);
    }

    #[test]
    fn test_restart_resets_delay_and_block_state() {
        let (mut s, log) = scheduler();
        s.start("DEFAULTDELAY 7\nREM_BLOCK\nSTRING hidden");
        s.tick();
        s.tick();
        s.start("STRING visible");
        run(&mut s);
        assert_eq!(
            log.lock()[1..],
            [Action::Text("visible".into()), Action::Pause(MS100)]
        );
    }

    #[test]
    fn test_empty_script_is_complete() {
        let (mut s, _) = scheduler();
        s.start("");
        assert!(s.is_complete());
    }

    #[test]
    fn test_tick_without_transport_is_noop() {
        let mut s = Scheduler::new();
        s.start("STRING a");
        s.tick();
        assert!(!s.is_complete());
        assert_eq!(s.current_line_text(), "STRING a");
    }

    #[test]
    fn test_rebinding_while_running_fails() {
        let (mut s, _) = scheduler();
        s.start("STRING a\nSTRING b");
        assert_eq!(
            s.set_transport(shared(RecordingTransport::connected())),
            Err(SchedulerError::TransportBusy)
        );
        assert_eq!(s.clear_transport(), Err(SchedulerError::TransportBusy));

        s.stop();
        assert!(s.set_transport(shared(RecordingTransport::connected())).is_ok());
    }

    #[test]
    fn test_disconnected_transport_still_completes() {
        let transport = RecordingTransport::disconnected();
        let log = transport.log();
        let mut s = Scheduler::new();
        s.set_transport(shared(transport)).unwrap();
        s.start("STRING a\nKEY CTRL c\nKEYS x y");
        for _ in 0..3 {
            s.tick();
        }
        assert!(s.is_complete());
        let sends = log
            .lock()
            .iter()
            .filter(|a| !matches!(a, Action::Pause(_)))
            .count();
        assert_eq!(sends, 0);
    }
}
