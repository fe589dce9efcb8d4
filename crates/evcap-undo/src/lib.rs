#![forbid(unsafe_code)]

//! evcap undo/redo engine.
//!
//! This crate provides the reversible-action history behind the capture
//! list: deleting a capture or editing one of its fields can be undone and
//! redone, with a bounded history and the usual branching rule (a new action
//! discards anything that was undone).
//!
//! # Key Components
//!
//! - [`CommandStack`] - bounded done/undone history (`execute`, `undo`, `redo`)
//! - [`Reversible`] - trait every command implements
//! - [`Command`] - command built from two closures
//! - [`delete_command`] / [`update_command`] - the two standard commands
//! - [`StackConfig`] - depth limit, loadable from TOML/JSON with `config`
//! - [`DeferredCommits`] - grace-period tracking for soft deletes
//!
//! # Quick Start
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use evcap_undo::{CommandError, CommandStack, delete_command};
//!
//! let captures = Rc::new(RefCell::new(vec!["login", "cart", "checkout"]));
//! let (list, restore) = (captures.clone(), captures.clone());
//!
//! let mut stack: CommandStack = CommandStack::default();
//! stack
//!     .execute(delete_command(
//!         (1usize, "cart"),
//!         move |item: &(usize, &'static str)| {
//!             list.borrow_mut().retain(|c| *c != item.1);
//!             Ok::<(), CommandError>(())
//!         },
//!         move |item: &(usize, &'static str)| {
//!             restore.borrow_mut().insert(item.0, item.1);
//!             Ok(())
//!         },
//!     ))
//!     .unwrap();
//! assert_eq!(*captures.borrow(), vec!["login", "checkout"]);
//!
//! stack.undo().unwrap();
//! assert_eq!(*captures.borrow(), vec!["login", "cart", "checkout"]);
//! ```
//!
//! # Threading
//!
//! Everything here is synchronous and single-threaded. Asynchronous work
//! (persisting a delete, for instance) belongs inside the caller's closures
//! or around the stack, never inside it.

pub mod command;
pub mod config;
pub mod deferred;
pub mod factory;
pub mod stack;

pub use command::{
    Command, CommandError, CommandInfo, CommandMetadata, CommandResult, CommandSource,
    DELETE_KIND, Reversible, StepFn, UPDATE_KIND,
};
pub use config::{ConfigError, DEFAULT_MAX_DEPTH, StackConfig};
pub use deferred::{DEFAULT_GRACE, DeferredCommits};
pub use factory::{DeleteCmd, ItemFn, SetFn, UpdateCmd, delete_command, update_command};
pub use stack::CommandStack;
