#![forbid(unsafe_code)]

//! Ready-made commands for the two destructive actions on the capture list.
//!
//! - [`delete_command`]: remove an item, restore it on undo
//! - [`update_command`]: set a field to a new value, set it back on undo
//!
//! Both capture the affected item and lend it to the caller's callbacks, so
//! the callbacks can locate the item in whatever store the host keeps.

use std::fmt;

use crate::command::{
    CommandError, CommandMetadata, CommandResult, DELETE_KIND, Reversible, UPDATE_KIND,
};

/// Callback type for delete/restore of an item.
pub type ItemFn<T, E> = Box<dyn FnMut(&T) -> CommandResult<E>>;
/// Callback type for assigning a field value on an item.
pub type SetFn<T, V, E> = Box<dyn FnMut(&T, &V) -> CommandResult<E>>;

/// Command that removes an item and puts it back on undo.
pub struct DeleteCmd<T, E = CommandError> {
    item: T,
    metadata: CommandMetadata,
    remove: ItemFn<T, E>,
    restore: ItemFn<T, E>,
}

impl<T: fmt::Debug, E> fmt::Debug for DeleteCmd<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteCmd")
            .field("item", &self.item)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Build a delete command.
///
/// `remove_fn` runs on execute/redo and `restore_fn` on undo. Restoring must
/// leave the caller's collection indistinguishable from never having deleted
/// the item; keeping the original position is up to the callback.
pub fn delete_command<T, E, R, S>(item: T, remove_fn: R, restore_fn: S) -> DeleteCmd<T, E>
where
    R: FnMut(&T) -> CommandResult<E> + 'static,
    S: FnMut(&T) -> CommandResult<E> + 'static,
{
    DeleteCmd {
        item,
        metadata: CommandMetadata::new()
            .with_kind(DELETE_KIND)
            .with_description("Delete item"),
        remove: Box::new(remove_fn),
        restore: Box::new(restore_fn),
    }
}

impl<T, E> DeleteCmd<T, E> {
    /// The item this command deletes.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Override the default description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_description(description);
        self
    }
}

impl<T, E> Reversible<E> for DeleteCmd<T, E> {
    fn execute(&mut self) -> CommandResult<E> {
        (self.remove)(&self.item)
    }

    fn undo(&mut self) -> CommandResult<E> {
        (self.restore)(&self.item)
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn debug_name(&self) -> &'static str {
        "DeleteCmd"
    }
}

/// Command that assigns a new value to a field and rolls it back on undo.
pub struct UpdateCmd<T, V, E = CommandError> {
    item: T,
    old_value: V,
    new_value: V,
    metadata: CommandMetadata,
    set: SetFn<T, V, E>,
}

impl<T: fmt::Debug, V: fmt::Debug, E> fmt::Debug for UpdateCmd<T, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateCmd")
            .field("item", &self.item)
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Build an update command.
///
/// `set_fn` is called with `new_value` on execute/redo and `old_value` on
/// undo. It must be a plain assignment so that alternating undo and redo
/// always lands on the same two states.
pub fn update_command<T, V, E, F>(
    item: T,
    old_value: V,
    new_value: V,
    set_fn: F,
) -> UpdateCmd<T, V, E>
where
    F: FnMut(&T, &V) -> CommandResult<E> + 'static,
{
    UpdateCmd {
        item,
        old_value,
        new_value,
        metadata: CommandMetadata::new()
            .with_kind(UPDATE_KIND)
            .with_description("Update item"),
        set: Box::new(set_fn),
    }
}

impl<T, V, E> UpdateCmd<T, V, E> {
    /// The item this command updates.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Value restored by undo.
    pub fn old_value(&self) -> &V {
        &self.old_value
    }

    /// Value applied by execute/redo.
    pub fn new_value(&self) -> &V {
        &self.new_value
    }

    /// Override the default description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_description(description);
        self
    }
}

impl<T, V, E> Reversible<E> for UpdateCmd<T, V, E> {
    fn execute(&mut self) -> CommandResult<E> {
        (self.set)(&self.item, &self.new_value)
    }

    fn undo(&mut self) -> CommandResult<E> {
        (self.set)(&self.item, &self.old_value)
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn debug_name(&self) -> &'static str {
        "UpdateCmd"
    }
}
