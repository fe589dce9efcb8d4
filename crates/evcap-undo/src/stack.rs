#![forbid(unsafe_code)]

//! Bounded undo/redo stack.
//!
//! [`CommandStack`] keeps two sequences of executed commands:
//!
//! - **done**: applied commands, oldest at the front, next undo at the back
//! - **undone**: reverted commands, next redo at the back
//!
//! # Invariants
//!
//! 1. `done.len() <= config.max_depth` after any operation
//! 2. `undone` is empty after every successful `execute`
//! 3. `undo`/`redo` move exactly one command, or nothing if the source is empty
//!
//! ```text
//! execute(c4)
//! ┌───────────────────────────────────────┐
//! │ done:   [c1, c2, c3, c4]              │
//! │ undone: []                            │
//! └───────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────┐
//! │ done:   [c1, c2]                      │
//! │ undone: [c4, c3]                      │
//! └───────────────────────────────────────┘
//!
//! execute(c5)  <-- new branch, c3/c4 are gone
//! ┌───────────────────────────────────────┐
//! │ done:   [c1, c2, c5]                  │
//! │ undone: []                            │
//! └───────────────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! | Failing call      | Stack afterwards                               |
//! |-------------------|------------------------------------------------|
//! | `execute`         | unchanged; command dropped, redo branch intact |
//! | `undo` callback   | command removed from `done`, not redoable      |
//! | `redo` callback   | command removed from `undone`, not undoable    |
//!
//! Errors are returned exactly as the callback produced them.
//!
//! Every `undo.*` span records `undo_depth`/`redo_depth` as they were when
//! the operation started.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::command::{CommandError, CommandInfo, Reversible};
use crate::config::{ConfigError, StackConfig};

const UNTYPED: &str = "untyped";

/// Undo/redo history over caller-defined commands.
///
/// Single-threaded: commands may close over `Rc<RefCell<_>>`
/// state owned by the UI.
pub struct CommandStack<E = CommandError> {
    /// Commands available for undo (newest at back).
    done: VecDeque<Box<dyn Reversible<E>>>,
    /// Commands available for redo (most recently undone at back).
    undone: Vec<Box<dyn Reversible<E>>>,
    config: StackConfig,
}

impl<E> fmt::Debug for CommandStack<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStack")
            .field("undo_depth", &self.done.len())
            .field("redo_depth", &self.undone.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<E> Default for CommandStack<E> {
    fn default() -> Self {
        Self::new(StackConfig::default())
    }
}

impl<E> CommandStack<E> {
    /// Create a stack with the given configuration.
    ///
    /// A `max_depth` of zero is raised to one; use [`try_new`](Self::try_new)
    /// to reject it instead.
    #[must_use]
    pub fn new(mut config: StackConfig) -> Self {
        if config.max_depth == 0 {
            warn!(target: "evcap.undo", "max_depth of 0 raised to 1");
            config.max_depth = 1;
        }
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            config,
        }
    }

    /// Create a stack after validating the configuration.
    pub fn try_new(config: StackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Create a stack holding at most `max_depth` undoable commands.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::new(StackConfig::new(max_depth))
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Run a command and record it.
    ///
    /// On success the redo branch is discarded and the oldest commands are
    /// dropped (without being undone) until the depth limit holds. If the
    /// command fails it is not recorded and the stack is left as it was.
    pub fn execute<C>(&mut self, command: C) -> Result<(), E>
    where
        C: Reversible<E> + 'static,
    {
        self.execute_boxed(Box::new(command))
    }

    /// Same as [`execute`](Self::execute) for an already boxed command.
    pub fn execute_boxed(&mut self, mut command: Box<dyn Reversible<E>>) -> Result<(), E> {
        let _span = tracing::debug_span!(
            "undo.execute",
            kind = command.kind().unwrap_or(UNTYPED),
            undo_depth = self.done.len(),
            redo_depth = self.undone.len(),
        )
        .entered();

        if let Err(err) = command.execute() {
            warn!(
                target: "evcap.undo",
                kind = command.kind().unwrap_or(UNTYPED),
                "command failed on execute; not recorded"
            );
            return Err(err);
        }

        self.done.push_back(command);
        let discarded = self.undone.len();
        self.undone.clear();
        self.enforce_limits();

        debug!(
            target: "evcap.undo",
            undo_depth = self.done.len(),
            discarded_redo = discarded,
            "command executed"
        );
        Ok(())
    }

    /// Undo the most recent command.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. If the command's
    /// undo callback fails, the error is returned and the command is dropped
    /// from history.
    pub fn undo(&mut self) -> Result<Option<CommandInfo>, E> {
        let _span = tracing::debug_span!(
            "undo.undo",
            kind = self.done.back().and_then(|c| c.kind()).unwrap_or(UNTYPED),
            undo_depth = self.done.len(),
            redo_depth = self.undone.len(),
        )
        .entered();

        let Some(mut command) = self.done.pop_back() else {
            trace!(target: "evcap.undo", "undo with empty history");
            return Ok(None);
        };
        let info = CommandInfo::of(command.as_ref());

        if let Err(err) = command.undo() {
            warn!(
                target: "evcap.undo",
                kind = info.kind.as_deref().unwrap_or(UNTYPED),
                "command failed on undo; dropped from history"
            );
            return Err(err);
        }

        self.undone.push(command);
        debug!(target: "evcap.undo", redo_depth = self.undone.len(), "command undone");
        Ok(Some(info))
    }

    /// Redo the most recently undone command.
    ///
    /// Returns `Ok(None)` when there is nothing to redo. No eviction runs
    /// here: every redo is paired with an earlier undo since the last
    /// execute, so the depth limit already holds.
    pub fn redo(&mut self) -> Result<Option<CommandInfo>, E> {
        let _span = tracing::debug_span!(
            "undo.redo",
            kind = self.undone.last().and_then(|c| c.kind()).unwrap_or(UNTYPED),
            undo_depth = self.done.len(),
            redo_depth = self.undone.len(),
        )
        .entered();

        let Some(mut command) = self.undone.pop() else {
            trace!(target: "evcap.undo", "redo with empty redo branch");
            return Ok(None);
        };
        let info = CommandInfo::of(command.as_ref());

        if let Err(err) = command.redo() {
            warn!(
                target: "evcap.undo",
                kind = info.kind.as_deref().unwrap_or(UNTYPED),
                "command failed on redo; dropped from history"
            );
            return Err(err);
        }

        self.done.push_back(command);
        debug_assert!(self.done.len() <= self.config.max_depth);
        debug!(target: "evcap.undo", undo_depth = self.done.len(), "command redone");
        Ok(Some(info))
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Forget all history. No command is undone or re-executed.
    pub fn clear(&mut self) {
        let _span = tracing::debug_span!(
            "undo.clear",
            undo_depth = self.done.len(),
            redo_depth = self.undone.len(),
        )
        .entered();
        self.done.clear();
        self.undone.clear();
        debug!(target: "evcap.undo", "history cleared");
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Number of commands available for undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    /// Number of commands available for redo.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// Configured depth limit.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.config.max_depth
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Labels of undoable commands, most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.done
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.metadata().label())
            .collect()
    }

    /// Labels of redoable commands, most recent first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undone
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.metadata().label())
            .collect()
    }

    /// Label of the command the next `undo` would revert.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.done.back().map(|c| c.metadata().label())
    }

    /// Label of the command the next `redo` would re-apply.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.undone.last().map(|c| c.metadata().label())
    }

    /// Drop the oldest commands until the depth limit holds.
    fn enforce_limits(&mut self) {
        while self.done.len() > self.config.max_depth {
            if let Some(evicted) = self.done.pop_front() {
                trace!(
                    target: "evcap.undo",
                    kind = evicted.kind().unwrap_or(UNTYPED),
                    "oldest command evicted"
                );
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use std::cell::RefCell;
    use std::rc::Rc;

    type List = Rc<RefCell<Vec<i32>>>;

    /// Command that pushes `value` onto `list` and pops it on undo.
    fn push_cmd(list: &List, value: i32) -> Command {
        let (fwd, back) = (list.clone(), list.clone());
        Command::new(
            move || {
                fwd.borrow_mut().push(value);
                Ok(())
            },
            move || {
                back.borrow_mut().pop();
                Ok(())
            },
        )
        .with_kind("push")
    }

    fn failing_cmd() -> Command {
        Command::new(
            || Err(CommandError::Other("backing store offline".into())),
            || Err(CommandError::Other("backing store offline".into())),
        )
    }

    #[test]
    fn test_new_stack() {
        let stack: CommandStack = CommandStack::default();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_depth(), 0);
        assert_eq!(stack.redo_depth(), 0);
        assert_eq!(stack.max_depth(), 50);
    }

    #[test]
    fn test_execute_runs_command_immediately() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::default();
        stack.execute(push_cmd(&list, 1)).unwrap();

        assert_eq!(*list.borrow(), vec![1]);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_then_redo_round_trip() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::default();
        stack.execute(push_cmd(&list, 1)).unwrap();
        stack.execute(push_cmd(&list, 2)).unwrap();

        let info = stack.undo().unwrap().unwrap();
        assert_eq!(info.kind.as_deref(), Some("push"));
        assert_eq!(*list.borrow(), vec![1]);
        assert!(stack.can_redo());

        stack.redo().unwrap().unwrap();
        assert_eq!(*list.borrow(), vec![1, 2]);
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_depth(), 2);
    }

    #[test]
    fn test_undo_and_redo_on_empty_are_noops() {
        let mut stack: CommandStack = CommandStack::default();
        assert_eq!(stack.undo(), Ok(None));
        assert_eq!(stack.redo(), Ok(None));
        assert_eq!(stack.undo_depth(), 0);
        assert_eq!(stack.redo_depth(), 0);
    }

    #[test]
    fn test_execute_clears_redo() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::default();
        stack.execute(push_cmd(&list, 1)).unwrap();
        stack.execute(push_cmd(&list, 2)).unwrap();
        stack.undo().unwrap();
        stack.undo().unwrap();
        assert_eq!(stack.redo_depth(), 2);

        stack.execute(push_cmd(&list, 3)).unwrap();
        assert!(!stack.can_redo());
        assert_eq!(stack.redo(), Ok(None));
        assert_eq!(*list.borrow(), vec![3]);
    }

    #[test]
    fn test_max_depth_evicts_oldest_without_undo() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::with_max_depth(3);
        for i in 1..=5 {
            stack.execute(push_cmd(&list, i)).unwrap();
        }

        assert_eq!(stack.undo_depth(), 3);
        // Eviction must not touch caller state.
        assert_eq!(*list.borrow(), vec![1, 2, 3, 4, 5]);

        while stack.can_undo() {
            stack.undo().unwrap();
        }
        assert_eq!(*list.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_failed_execute_is_not_recorded() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::default();
        stack.execute(push_cmd(&list, 1)).unwrap();
        stack.undo().unwrap();

        let err = stack.execute(failing_cmd()).unwrap_err();
        assert_eq!(err, CommandError::Other("backing store offline".into()));
        assert_eq!(stack.undo_depth(), 0);
        // Nothing happened, so the redo branch survives.
        assert!(stack.can_redo());
    }

    #[test]
    fn test_failed_undo_drops_command() {
        let fail_undo = Rc::new(RefCell::new(false));
        let flag = fail_undo.clone();
        let cmd = Command::new(
            || Ok(()),
            move || {
                if *flag.borrow() {
                    Err(CommandError::InvalidState("capture locked".into()))
                } else {
                    Ok(())
                }
            },
        );

        let mut stack: CommandStack = CommandStack::default();
        stack.execute(cmd).unwrap();
        *fail_undo.borrow_mut() = true;

        assert_eq!(
            stack.undo(),
            Err(CommandError::InvalidState("capture locked".into()))
        );
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_failed_redo_drops_command() {
        let fail_exec = Rc::new(RefCell::new(false));
        let flag = fail_exec.clone();
        let cmd = Command::new(
            move || {
                if *flag.borrow() {
                    Err(CommandError::Other("write failed".into()))
                } else {
                    Ok(())
                }
            },
            || Ok(()),
        );

        let mut stack: CommandStack = CommandStack::default();
        stack.execute(cmd).unwrap();
        stack.undo().unwrap();
        *fail_exec.borrow_mut() = true;

        assert!(stack.redo().is_err());
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_clear_does_not_invoke_commands() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::default();
        stack.execute(push_cmd(&list, 1)).unwrap();
        stack.execute(push_cmd(&list, 2)).unwrap();
        stack.undo().unwrap();

        stack.clear();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
        assert_eq!(*list.borrow(), vec![1]);
    }

    #[test]
    fn test_descriptions() {
        let list = List::default();
        let mut stack: CommandStack = CommandStack::default();
        stack.execute(push_cmd(&list, 1)).unwrap();
        stack
            .execute(push_cmd(&list, 2).with_description("Push two"))
            .unwrap();
        stack.execute(push_cmd(&list, 3)).unwrap();

        assert_eq!(stack.undo_descriptions(5), vec!["push", "Push two", "push"]);
        assert_eq!(stack.undo_descriptions(1).len(), 1);

        stack.undo().unwrap();
        stack.undo().unwrap();
        assert_eq!(stack.next_undo_description(), Some("push"));
        assert_eq!(stack.next_redo_description(), Some("Push two"));
        assert_eq!(stack.redo_descriptions(5), vec!["Push two", "push"]);
    }

    #[test]
    fn test_zero_depth_is_raised_or_rejected() {
        let stack: CommandStack = CommandStack::new(StackConfig::new(0));
        assert_eq!(stack.max_depth(), 1);

        let result: Result<CommandStack, _> = CommandStack::try_new(StackConfig::new(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_error_type_passes_through() {
        #[derive(Debug, PartialEq)]
        enum StoreError {
            Conflict(u32),
        }

        let mut stack: CommandStack<StoreError> = CommandStack::default();
        let cmd = Command::new(|| Err(StoreError::Conflict(409)), || Ok(()));
        assert_eq!(stack.execute(cmd), Err(StoreError::Conflict(409)));
    }

    #[test]
    fn test_debug_impl() {
        let stack: CommandStack = CommandStack::default();
        let debug_str = format!("{stack:?}");
        assert!(debug_str.contains("CommandStack"));
        assert!(debug_str.contains("undo_depth"));
    }
}
