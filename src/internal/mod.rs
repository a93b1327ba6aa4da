//! Low-level logic used throughout this crate
//!
//! This module serves as a general heading for assorted definitions that are
//! designed primarily for library-internal use: the bit-granular index used by
//! buffer-backed cursors (`offset`), and the name-checked stack of diagnostic
//! contexts shared by the reading and writing cursors (`stack`).

pub(crate) mod offset;
pub(crate) mod stack;

pub(crate) use offset::BitIndex;
pub(crate) use stack::ContextStack;
