#![forbid(unsafe_code)]

//! Reversible command contract for the capture-list undo stack.
//!
//! A command pairs a forward operation with the operation that reverses it.
//! The stack treats every command as an opaque unit: it calls [`execute`]
//! once when the command is first recorded, [`undo`] when the user steps
//! back and [`redo`] when the user steps forward again.
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` restores the prior observable state
//! - `undo()` followed by `redo()` restores the executed state
//!
//! Neither is checked by the stack. They are obligations on whoever builds
//! the command.
//!
//! [`execute`]: Reversible::execute
//! [`undo`]: Reversible::undo
//! [`redo`]: Reversible::redo

use std::fmt;

use web_time::Instant;

/// Kind tag used by [`delete_command`](crate::delete_command).
pub const DELETE_KIND: &str = "delete";

/// Kind tag used by [`update_command`](crate::update_command).
pub const UPDATE_KIND: &str = "update";

/// Result of running one side of a command.
pub type CommandResult<E = CommandError> = Result<(), E>;

/// Who or what triggered a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandSource {
    /// Direct user action (keyboard, mouse, context menu).
    #[default]
    User,
    /// Issued by application code, e.g. a bulk cleanup.
    Programmatic,
    /// Issued on behalf of another process.
    External,
}

/// Metadata attached to a command for history labels and diagnostics.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Free-form kind tag such as `"delete"` or `"update"`.
    pub kind: Option<String>,
    /// Human-readable description for UI (e.g. "Delete capture 3").
    pub description: Option<String>,
    /// Who/what triggered the command.
    pub source: CommandSource,
    /// When the command was created.
    pub created_at: Instant,
}

impl CommandMetadata {
    /// Create empty metadata stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: None,
            description: None,
            source: CommandSource::User,
            created_at: Instant::now(),
        }
    }

    /// Set the kind tag.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the command source.
    #[must_use]
    pub fn with_source(mut self, source: CommandSource) -> Self {
        self.source = source;
        self
    }

    /// Best label for a history list: description, then kind, then a
    /// generic fallback.
    #[must_use]
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("command")
    }
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Default error type for command callbacks.
///
/// The stack is generic over the error type and never converts errors, so
/// callers with their own error enum can use it directly instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The item the command targets no longer exists.
    TargetNotFound(String),
    /// The command cannot run in the current state.
    InvalidState(String),
    /// Generic error with message.
    Other(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound(id) => write!(f, "target {id} not found"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// A reversible unit of work.
///
/// Commands are owned by the stack once executed, so implementations must
/// carry everything they need (usually closures over shared caller state).
/// No `Send`/`Sync` bound: the stack lives on the UI thread.
pub trait Reversible<E = CommandError> {
    /// Apply the command's effect.
    fn execute(&mut self) -> CommandResult<E>;

    /// Revert the command's effect.
    fn undo(&mut self) -> CommandResult<E>;

    /// Re-apply the command after it was undone.
    fn redo(&mut self) -> CommandResult<E> {
        self.execute()
    }

    /// Get the command metadata.
    fn metadata(&self) -> &CommandMetadata;

    /// Kind tag, if any.
    fn kind(&self) -> Option<&str> {
        self.metadata().kind.as_deref()
    }

    /// Description, if any.
    fn description(&self) -> Option<&str> {
        self.metadata().description.as_deref()
    }

    /// Type name used by the `Debug` impl of `dyn Reversible`.
    fn debug_name(&self) -> &'static str {
        "Reversible"
    }
}

impl<E> fmt::Debug for dyn Reversible<E> + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.debug_name())
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish()
    }
}

/// Snapshot of a command's labels, returned when the stack moves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Kind tag of the moved command, if it had one.
    pub kind: Option<String>,
    /// Description of the moved command, if it had one.
    pub description: Option<String>,
}

impl CommandInfo {
    pub(crate) fn of<E>(cmd: &dyn Reversible<E>) -> Self {
        Self {
            kind: cmd.kind().map(str::to_owned),
            description: cmd.description().map(str::to_owned),
        }
    }
}

/// Callback type for one side of a closure command.
pub type StepFn<E> = Box<dyn FnMut() -> CommandResult<E>>;

/// A command built from two caller-supplied closures.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use evcap_undo::{Command, CommandError, CommandStack};
///
/// let counter = Rc::new(Cell::new(0));
/// let (up, down) = (counter.clone(), counter.clone());
/// let cmd = Command::<CommandError>::new(
///     move || { up.set(up.get() + 1); Ok(()) },
///     move || { down.set(down.get() - 1); Ok(()) },
/// )
/// .with_kind("increment");
///
/// let mut stack: CommandStack = CommandStack::default();
/// stack.execute(cmd).unwrap();
/// assert_eq!(counter.get(), 1);
/// stack.undo().unwrap();
/// assert_eq!(counter.get(), 0);
/// ```
pub struct Command<E = CommandError> {
    metadata: CommandMetadata,
    execute: StepFn<E>,
    undo: StepFn<E>,
}

impl<E> fmt::Debug for Command<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl<E> Command<E> {
    /// Create a command from its forward and backward closures.
    pub fn new<X, U>(execute: X, undo: U) -> Self
    where
        X: FnMut() -> CommandResult<E> + 'static,
        U: FnMut() -> CommandResult<E> + 'static,
    {
        Self {
            metadata: CommandMetadata::new(),
            execute: Box::new(execute),
            undo: Box::new(undo),
        }
    }

    /// Set the kind tag.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_kind(kind);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_description(description);
        self
    }

    /// Set the command source.
    #[must_use]
    pub fn with_source(mut self, source: CommandSource) -> Self {
        self.metadata = self.metadata.with_source(source);
        self
    }

    /// Replace the metadata wholesale.
    #[must_use]
    pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl<E> Reversible<E> for Command<E> {
    fn execute(&mut self) -> CommandResult<E> {
        (self.execute)()
    }

    fn undo(&mut self) -> CommandResult<E> {
        (self.undo)()
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn debug_name(&self) -> &'static str {
        "Command"
    }
}
