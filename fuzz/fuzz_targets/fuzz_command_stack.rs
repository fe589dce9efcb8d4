#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use evcap_undo::{Command, CommandError, CommandStack};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Execute(u8),
    ExecuteFailing,
    Undo,
    Redo,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_depth: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let max_depth = (input.max_depth as usize % 64).max(1);
    let list: Rc<RefCell<Vec<u8>>> = Rc::default();
    let mut stack: CommandStack = CommandStack::with_max_depth(max_depth);

    for op in input.ops {
        match op {
            Op::Execute(v) => {
                let (fwd, back) = (list.clone(), list.clone());
                stack
                    .execute(Command::<CommandError>::new(
                        move || {
                            fwd.borrow_mut().push(v);
                            Ok(())
                        },
                        move || {
                            back.borrow_mut().pop();
                            Ok(())
                        },
                    ))
                    .expect("push never fails");
                assert!(!stack.can_redo(), "execute must clear redo");
            }
            Op::ExecuteFailing => {
                let before = (stack.undo_depth(), stack.redo_depth(), list.borrow().clone());
                let failing = Command::<CommandError>::new(
                    || Err(CommandError::Other("fuzz".into())),
                    || Ok(()),
                );
                assert!(stack.execute(failing).is_err());
                let after = (stack.undo_depth(), stack.redo_depth(), list.borrow().clone());
                assert_eq!(before, after, "failed execute changed state");
            }
            Op::Undo => {
                let (done, undone) = (stack.undo_depth(), stack.redo_depth());
                let moved = stack.undo().expect("pop never fails").is_some();
                assert_eq!(moved, done > 0);
                if moved {
                    assert_eq!(stack.undo_depth(), done - 1);
                    assert_eq!(stack.redo_depth(), undone + 1);
                }
            }
            Op::Redo => {
                let (done, undone) = (stack.undo_depth(), stack.redo_depth());
                let moved = stack.redo().expect("push never fails").is_some();
                assert_eq!(moved, undone > 0);
                if moved {
                    assert_eq!(stack.undo_depth(), done + 1);
                    assert_eq!(stack.redo_depth(), undone - 1);
                }
            }
            Op::Clear => {
                stack.clear();
                assert!(!stack.can_undo() && !stack.can_redo());
            }
        }

        assert!(stack.undo_depth() <= max_depth, "depth bound violated");
        // Evicted pushes stay applied, so the list is never shorter than the history.
        assert!(list.borrow().len() >= stack.undo_depth());
    }
});
