//! Stack of named diagnostic contexts
//!
//! Both the reading and the writing cursor keep a LIFO stack of the
//! contexts (message types and complex fields) that are currently open.
//! The backing storage is selected at compile-time: a plain `Vec`, or a
//! `SmallVec` when the `smallvec_framestack` feature is enabled, as nesting
//! depth rarely exceeds a handful of levels.

use crate::error::ContextError;

pub(crate) trait Stack {
    /// Type of the values that are pushed onto the stack.
    type Item: Copy;

    /// Return the topmost value of the Stack, or `None` if it is empty
    fn peek(&self) -> Option<Self::Item>;

    /// Like `peek`, but the topmost value of the stack is removed if it exists.
    fn pop(&mut self) -> Option<Self::Item>;

    /// Push `item` onto the top of the stack.
    fn push(&mut self, item: Self::Item);

    /// Number of items currently on the stack
    fn depth(&self) -> usize;
}

impl<T: Copy> Stack for Vec<T> {
    type Item = T;

    fn peek(&self) -> Option<Self::Item> {
        self.last().copied()
    }

    fn pop(&mut self) -> Option<Self::Item> {
        Vec::pop(self)
    }

    fn push(&mut self, item: Self::Item) {
        Vec::push(self, item)
    }

    fn depth(&self) -> usize {
        self.len()
    }
}

#[cfg(feature = "smallvec_framestack")]
impl<A> Stack for smallvec::SmallVec<A>
where
    A: smallvec::Array,
    A::Item: Copy,
{
    type Item = A::Item;

    fn peek(&self) -> Option<Self::Item> {
        self.last().copied()
    }

    fn pop(&mut self) -> Option<Self::Item> {
        smallvec::SmallVec::pop(self)
    }

    fn push(&mut self, item: Self::Item) {
        smallvec::SmallVec::push(self, item)
    }

    fn depth(&self) -> usize {
        self.len()
    }
}

/// A single open context: its name and the bit position at which it was opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) name: &'static str,
    pub(crate) start: usize,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "smallvec_framestack")] {
        type FrameStore = smallvec::SmallVec<[Frame; 8]>;
    } else {
        type FrameStore = Vec<Frame>;
    }
}

/// Name-checked stack of open contexts shared by every cursor type
#[derive(Clone, Debug, Default)]
pub(crate) struct ContextStack {
    frames: FrameStore,
}

impl ContextStack {
    pub(crate) fn new() -> Self {
        Self {
            frames: FrameStore::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, start: usize) {
        tracing::trace!(context = name, bit = start, "push context");
        Stack::push(&mut self.frames, Frame { name, start });
    }

    /// Closes the innermost context, which must be `name`
    ///
    /// On failure the stack is left untouched.
    pub(crate) fn pop(&mut self, name: &'static str, pos: usize) -> Result<Frame, ContextError> {
        match Stack::peek(&self.frames) {
            None => Err(ContextError::CloseWithoutContext { requested: name }),
            Some(frame) if frame.name != name => Err(ContextError::Mismatched {
                requested: name,
                open: frame.name,
            }),
            Some(_) => {
                let frame = Stack::pop(&mut self.frames)
                    .ok_or(ContextError::CloseWithoutContext { requested: name })?;
                tracing::trace!(context = name, bits = pos.saturating_sub(frame.start), "pop context");
                Ok(frame)
            }
        }
    }

    pub(crate) fn depth(&self) -> usize {
        Stack::depth(&self.frames)
    }

    /// Fails unless every context that was opened has been closed
    pub(crate) fn ensure_closed(&self) -> Result<(), ContextError> {
        match Stack::peek(&self.frames) {
            None => Ok(()),
            Some(frame) => Err(ContextError::Unclosed {
                depth: self.depth(),
                innermost: frame.name,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_push_pop() {
        let mut stack = ContextStack::new();
        stack.push("CBusCommand", 0);
        stack.push("header", 0);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop("header", 8).map(|f| f.start), Ok(0));
        assert!(stack.ensure_closed().is_err());
        assert!(stack.pop("CBusCommand", 8).is_ok());
        assert_eq!(stack.ensure_closed(), Ok(()));
    }

    #[test]
    fn mismatched_pop_is_rejected() {
        let mut stack = ContextStack::new();
        stack.push("outer", 0);
        stack.push("inner", 3);
        assert_eq!(
            stack.pop("outer", 5),
            Err(ContextError::Mismatched {
                requested: "outer",
                open: "inner"
            })
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn pop_on_empty_stack() {
        let mut stack = ContextStack::new();
        assert_eq!(
            stack.pop("anything", 0),
            Err(ContextError::CloseWithoutContext {
                requested: "anything"
            })
        );
    }
}
