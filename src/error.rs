//! General error types
//!
//! This module contains the error types that are shared between the read path
//! ([`ParseError`](crate::parse::error::ParseError)) and the write path
//! ([`SerializeError`](crate::conv::error::SerializeError)), as well as those
//! that belong to neither: the aggregate error reported by message builders,
//! and the failure cases of the hex/checksum framing adapter.

use std::fmt::{Display, Formatter};

/// Failure to keep the stack of diagnostic contexts balanced
///
/// Every `push_context(name)` on a cursor must be matched by a
/// `pop_context(name)` with the same name, in LIFO order. Anything else is
/// reported as one of the cases below rather than silently repaired.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// `pop_context` was called with no open context
    #[error("cannot close context `{requested}`: no context is open")]
    CloseWithoutContext { requested: &'static str },
    /// `pop_context` named a context other than the innermost open one
    #[error("cannot close context `{requested}`: innermost open context is `{open}`")]
    Mismatched {
        requested: &'static str,
        open: &'static str,
    },
    /// A cursor was finalized while contexts were still open
    #[error("{depth} context(s) left open (innermost `{innermost}`)")]
    Unclosed {
        depth: usize,
        innermost: &'static str,
    },
}

/// Error type representing all possible conditions for invalidity
/// encountered when interpreting a run of ASCII characters as
/// hex-encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexConvError {
    /// Error case for runs with an odd number of hex digits
    #[error("hex-conversion failed on odd-length run of {0} digits")]
    OddParity(usize),
    /// Error case for runs containing anything other than `[0-9A-F]`
    #[error("hex-conversion failed on non-hex character {found:#04x} at offset {offset}")]
    NonHex { offset: usize, found: u8 },
    /// No hex digits were found where a payload was expected
    #[error("no hex digits found where a payload was expected")]
    Empty,
}

/// Mismatch between the checksum carried by a frame and the one computed
/// over its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
pub struct ChecksumError {
    pub computed: u8,
    pub received: u8,
}

/// Single reason a builder refused to produce a message
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BuildProblem {
    /// A mandatory field was never given a value
    #[error("mandatory field '{0}' not set")]
    MissingField(&'static str),
    /// A family builder was asked to build without a variant being selected
    #[error("no variant of {0} selected")]
    MissingVariant(&'static str),
    /// A nested builder passed to `with_x_builder` failed
    #[error("failed to build '{field}': {source}")]
    SubBuilder {
        field: &'static str,
        #[source]
        source: Box<BuildError>,
    },
    /// The field values are individually present but jointly invalid
    #[error("{0}")]
    Invalid(String),
}

/// Aggregate of every problem found while validating a builder
///
/// A builder never stops at the first problem it finds; all of them are
/// collected here, in the order they were detected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiError {
    problems: Vec<BuildProblem>,
}

impl MultiError {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            problems: Vec::new(),
        }
    }

    pub fn push(&mut self, problem: BuildProblem) {
        self.problems.push(problem)
    }

    pub fn append(&mut self, other: &MultiError) {
        self.problems.extend(other.problems.iter().cloned())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuildProblem> {
        self.problems.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[BuildProblem] {
        &self.problems
    }
}

impl Display for MultiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (ix, problem) in self.problems.iter().enumerate() {
            if ix > 0 {
                f.write_str("; ")?;
            }
            Display::fmt(problem, f)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a BuildProblem;
    type IntoIter = std::slice::Iter<'a, BuildProblem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}

/// Error returned by [`Builder::build`](crate::builder::Builder::build)
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("error occurred during build of {type_name}: {problems}")]
pub struct BuildError {
    pub type_name: &'static str,
    pub problems: MultiError,
}

impl BuildError {
    #[must_use]
    pub fn problems(&self) -> &[BuildProblem] {
        self.problems.as_slice()
    }

    /// Names of the mandatory fields that were reported missing, in report order
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.problems
            .iter()
            .filter_map(|p| match p {
                BuildProblem::MissingField(name) => Some(*name),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_threadsafe<T: Send + Sync>() {}

    #[test]
    fn errors_are_threadsafe() {
        is_threadsafe::<ContextError>();
        is_threadsafe::<HexConvError>();
        is_threadsafe::<ChecksumError>();
        is_threadsafe::<BuildError>();
    }

    #[test]
    fn multi_error_display_joins_every_problem() {
        let mut errs = MultiError::new();
        errs.push(BuildProblem::MissingField("salData"));
        errs.push(BuildProblem::Invalid(String::from("Invalid Error condition")));
        assert_eq!(
            errs.to_string(),
            "mandatory field 'salData' not set; Invalid Error condition"
        );
    }

    #[test]
    fn missing_fields_filters_other_problems() {
        let mut problems = MultiError::new();
        problems.push(BuildProblem::MissingField("header"));
        problems.push(BuildProblem::MissingVariant("CBusCommand"));
        problems.push(BuildProblem::MissingField("calData"));
        let err = BuildError {
            type_name: "CBusPointToPointCommand",
            problems,
        };
        assert_eq!(err.missing_fields(), vec!["header", "calData"]);
        assert_eq!(err.problems().len(), 3);
    }
}
