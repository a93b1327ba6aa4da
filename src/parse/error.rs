//! Error types used to report failure in bit-level parsing
//!
//! This module defines the primary type [`ParseError`] and the alias
//! [`ParseResult<T>`], along with [`UnmappedVariant`], the payload reported
//! when discriminator dispatch finds no matching variant.
//!
//! # Breadcrumbs
//!
//! Errors do not carry a position-independent description of where they
//! happened. Instead, every layer of the parse (each message type and each
//! complex field) wraps errors passing through it in
//! [`ParseError::Within`], so that the outermost error reads as a path from
//! the top-level message down to the field that actually failed:
//!
//! ```text
//! error parsing 'CBusCommand': error parsing 'calData': cannot read 8 bits for 'paramNo': ...
//! ```

use std::fmt::{Display, Formatter};

use crate::error::{ChecksumError, ContextError, HexConvError};

/// Enumeration type over all errors that may be encountered when calling
/// methods on `Parser` types, or while decoding a message through one.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A read requested more bits than remain in the buffer
    #[error("cannot read {requested} bits for '{field}': only {available} bits remain")]
    Underrun {
        field: &'static str,
        requested: usize,
        available: usize,
    },
    /// A primitive read was requested at a width its type cannot hold
    #[error("invalid width {width} for '{field}' (supported: 1..={max})")]
    InvalidWidth {
        field: &'static str,
        width: usize,
        max: usize,
    },
    /// `reset` was asked to move beyond the end of the buffer
    #[error("cannot reset to bit {requested}: buffer holds {len} bits")]
    ResetOutOfBounds { requested: usize, len: usize },
    /// Diagnostic contexts were pushed and popped out of order
    #[error(transparent)]
    Context(#[from] ContextError),
    /// A Const field held something other than its literal
    #[error("const field '{field}' expected {expected:#x} but found {actual:#x}")]
    ConstMismatch {
        field: &'static str,
        expected: u64,
        actual: u64,
    },
    /// A domain rule over already-decoded fields was violated
    #[error("{0}")]
    Validation(String),
    /// The bytes at the cursor do not look like the type being parsed
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// Discriminator values matched none of the variants of a family
    #[error(transparent)]
    Unmapped(#[from] UnmappedVariant),
    /// A string field did not contain valid UTF-8
    #[error("field '{field}' is not valid UTF-8")]
    Utf8 { field: &'static str },
    /// A length-delimited array consumed more bits than its declared length
    #[error("array '{field}' overran its declared length of {declared} bits by {excess}")]
    LengthOverrun {
        field: &'static str,
        declared: usize,
        excess: usize,
    },
    #[error(transparent)]
    Hex(#[from] HexConvError),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    /// Bits left over after a top-level decode (`check_complete_parse` only)
    #[error("{0} bits left unconsumed after top-level parse")]
    Leftover(usize),
    /// Error raised inside a named message type or complex field
    #[error("error parsing '{context}': {source}")]
    Within {
        context: &'static str,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Wraps `self` in one more breadcrumb layer
    #[must_use]
    pub fn within(self, context: &'static str) -> Self {
        Self::Within {
            context,
            source: Box::new(self),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Returns the innermost error, stripped of every breadcrumb layer
    #[must_use]
    pub fn root(&self) -> &ParseError {
        let mut cur = self;
        while let ParseError::Within { source, .. } = cur {
            cur = source;
        }
        cur
    }

    /// Returns the context names the error passed through, outermost first
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<&'static str> {
        let mut trail = Vec::new();
        let mut cur = self;
        while let ParseError::Within { context, source } = cur {
            trail.push(*context);
            cur = source;
        }
        trail
    }
}

/// Type alias for Result with an error type of [`ParseError`]
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Extension trait for attaching breadcrumbs to a [`ParseResult`]
pub trait ParseResultExt<T> {
    /// Wraps the error case, if any, in a `Within` layer named `context`
    fn within(self, context: &'static str) -> ParseResult<T>;
}

impl<T> ParseResultExt<T> for ParseResult<T> {
    #[inline]
    fn within(self, context: &'static str) -> ParseResult<T> {
        self.map_err(|err| err.within(context))
    }
}

/// Discriminator values for which a family has no variant
///
/// Each discriminator is recorded by name alongside its rendered value, in
/// the order they were evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnmappedVariant {
    pub type_name: &'static str,
    pub discriminators: Vec<(&'static str, String)>,
}

impl Display for UnmappedVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unmapped type {} for parameters [", self.type_name)?;
        for (ix, (name, value)) in self.discriminators.iter().enumerate() {
            if ix > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for UnmappedVariant {}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn parse_error_threadsafe() {
        dummy::<ParseError>()
    }

    fn underrun() -> ParseError {
        ParseError::Underrun {
            field: "paramNo",
            requested: 8,
            available: 3,
        }
    }

    #[test]
    fn breadcrumb_lists_contexts_outermost_first() {
        let err = underrun().within("CalData").within("CBusCommand");
        assert_eq!(err.breadcrumb(), vec!["CBusCommand", "CalData"]);
        assert_eq!(err.root(), &underrun());
        assert_eq!(
            err.to_string(),
            "error parsing 'CBusCommand': error parsing 'CalData': \
             cannot read 8 bits for 'paramNo': only 3 bits remain"
        );
    }

    #[test]
    fn result_extension_wraps_context_errors() {
        let res: Result<(), ContextError> = Err(ContextError::CloseWithoutContext { requested: "x" });
        let err = res.map_err(ParseError::from).within("outer").unwrap_err();
        assert_eq!(err.breadcrumb(), vec!["outer"]);
        assert!(matches!(err.root(), ParseError::Context(_)));
    }

    #[test]
    fn unmapped_names_every_discriminator() {
        let err = UnmappedVariant {
            type_name: "MeteringData",
            discriminators: vec![
                ("commandType", String::from("EVENT")),
                ("argument", String::from("0x06")),
            ],
        };
        assert_eq!(
            err.to_string(),
            "unmapped type MeteringData for parameters [commandType=EVENT, argument=0x06]"
        );
    }
}
