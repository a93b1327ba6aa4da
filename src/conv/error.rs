//! Error types for the write path
//!
//! Serialization is fallible only where a message value cannot be expressed
//! in its declared wire layout: an integer wider than its field, a string or
//! byte-array whose length disagrees with the length the layout computes for
//! it, or contexts left unbalanced by a hand-written `write_to`.

use crate::error::ContextError;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// The value has bits set beyond the declared width of its field
    #[error("value {value} does not fit in {width} bits of '{field}'")]
    ValueTooWide {
        field: &'static str,
        width: usize,
        value: i128,
    },
    #[error("invalid width {width} for '{field}' (supported: 1..={max})")]
    InvalidWidth {
        field: &'static str,
        width: usize,
        max: usize,
    },
    #[error(transparent)]
    Context(#[from] ContextError),
    /// A byte-array or string does not occupy the length its layout requires
    #[error("field '{field}' must occupy {expected} bits but holds {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{0}")]
    Validation(String),
    /// The discriminators stored in a family value select a different variant
    /// than the one being written
    #[error("discriminators of {type_name} do not select the variant being written")]
    Misclassified { type_name: &'static str },
    /// Error raised inside a named message type or complex field
    #[error("error serializing '{context}': {source}")]
    Within {
        context: &'static str,
        #[source]
        source: Box<SerializeError>,
    },
}

impl SerializeError {
    /// Wraps `self` in one more breadcrumb layer
    #[must_use]
    pub fn within(self, context: &'static str) -> Self {
        Self::Within {
            context,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, stripped of every breadcrumb layer
    #[must_use]
    pub fn root(&self) -> &SerializeError {
        let mut cur = self;
        while let SerializeError::Within { source, .. } = cur {
            cur = source;
        }
        cur
    }
}

pub type SerializeResult<T> = std::result::Result<T, SerializeError>;

/// Extension trait for attaching breadcrumbs to a [`SerializeResult`]
pub trait SerializeResultExt<T> {
    fn within(self, context: &'static str) -> SerializeResult<T>;
}

impl<T> SerializeResultExt<T> for SerializeResult<T> {
    #[inline]
    fn within(self, context: &'static str) -> SerializeResult<T> {
        self.map_err(|err| err.within(context))
    }
}
