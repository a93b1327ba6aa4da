//! Builders for constructing messages with mandatory-field checking
//!
//! Messages are immutable once built. They are created, and "modified", only
//! through builders:
//!
//! * `XBuilder::new()` followed by chained `with_field(value)` setters;
//! * `with_field_builder(|b| ...)` to configure a nested message in place,
//!   seeded from its current value if one is set;
//! * for families, `as_variant()` to narrow to the builder of one variant,
//!   which returns a [`Narrowed`] handle whose [`done`](Narrowed::done)
//!   lifts the configured child back into the family builder;
//! * [`Builder::build`], which checks every mandatory field and reports
//!   *all* problems at once in a single [`BuildError`];
//! * [`Builder::must_build`], which panics instead, for fixtures;
//! * [`ToBuilder::to_builder`] on a message, which seeds a new builder with a
//!   deep copy of every field.
//!
//! Every built value is an independent owned tree. Building twice from the
//! same builder, or building from a builder seeded by an existing message,
//! never shares any state with either.
//!
//! The [`message_builder!`](crate::message_builder) macro generates the
//! builder of a plain (non-family) message struct.

use crate::error::{BuildError, BuildProblem, MultiError};

pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Common interface of every message builder
pub trait Builder {
    type Output;

    /// Validates the configured fields and produces a new message.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] listing every missing mandatory field,
    /// every failed nested builder and every violated invariant.
    fn build(&self) -> BuildResult<Self::Output>;

    /// As [`build`](Builder::build), for inputs known to be complete
    ///
    /// # Panics
    ///
    /// Panics with the full problem list if `build` fails.
    fn must_build(&self) -> Self::Output {
        match self.build() {
            Ok(msg) => msg,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Messages that can seed a builder with a deep copy of themselves
pub trait ToBuilder {
    type Builder: Builder<Output = Self>;

    fn to_builder(&self) -> Self::Builder;

    /// Independent copy of the whole message tree
    ///
    /// Messages own every node of their tree, so this is a plain `clone`.
    fn deep_copy(&self) -> Self
    where
        Self: Clone,
    {
        self.clone()
    }
}

/// Accumulator of the problems found while building one message
#[derive(Debug)]
pub struct Checklist {
    type_name: &'static str,
    problems: MultiError,
}

impl Checklist {
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            problems: MultiError::new(),
        }
    }

    /// Copies out a mandatory field, recording it as missing if unset
    pub fn require<T: Clone>(&mut self, field: &'static str, slot: &Option<T>) -> Option<T> {
        if slot.is_none() {
            self.problems.push(BuildProblem::MissingField(field));
        }
        slot.clone()
    }

    /// Copies out the selected variant builder of a family builder
    pub fn require_variant<T: Clone>(&mut self, slot: &Option<T>) -> Option<T> {
        if slot.is_none() {
            self.problems.push(BuildProblem::MissingVariant(self.type_name));
        }
        slot.clone()
    }

    /// Records `message` unless `condition` holds
    pub fn check(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.problems.push(BuildProblem::Invalid(message.into()));
        }
    }

    /// Merges problems that were recorded before `build` was called
    pub fn absorb(&mut self, deferred: &MultiError) {
        self.problems.append(deferred)
    }

    /// Records the failure of a nested build, returning its output otherwise
    pub fn nested<T>(&mut self, field: &'static str, result: BuildResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.problems.push(BuildProblem::SubBuilder {
                    field,
                    source: Box::new(err),
                });
                None
            }
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    /// Converts the recorded problems into an error, regardless of count
    #[must_use]
    pub fn into_error(self) -> BuildError {
        BuildError {
            type_name: self.type_name,
            problems: self.problems,
        }
    }

    /// Succeeds only if no problem was recorded
    pub fn finish(self) -> BuildResult<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

/// Runs a nested builder on behalf of `with_x_builder`, deferring its failure
/// into `deferred` so that it is reported by the enclosing `build`
pub fn build_nested<B: Builder>(deferred: &mut MultiError, field: &'static str, builder: B) -> Option<B::Output> {
    match builder.build() {
        Ok(value) => Some(value),
        Err(err) => {
            deferred.push(BuildProblem::SubBuilder {
                field,
                source: Box::new(err),
            });
            None
        }
    }
}

/// Family builders that can hold a child builder of type `C`
///
/// `adopt` is the explicit conversion that lifts a configured child back
/// into the family builder, and is also where the family builder sets the
/// discriminator values that select `C`'s variant.
pub trait Compose<C>: Sized {
    /// Stores `child` as the selected variant
    fn adopt(self, child: C) -> Self;

    /// Removes and returns the currently selected child, if it is a `C`
    fn take_child(&mut self) -> Option<C>;

    /// Narrows to the builder of variant `C`, resuming any child of that
    /// type that was already selected
    fn narrow(mut self) -> Narrowed<Self, C>
    where
        C: Default,
    {
        let child = self.take_child().unwrap_or_default();
        Narrowed { parent: self, child }
    }
}

/// A family builder narrowed to one of its variant builders
#[derive(Clone, Debug)]
pub struct Narrowed<P, C> {
    parent: P,
    child: C,
}

impl<P: Compose<C>, C> Narrowed<P, C> {
    /// Applies `f` to the variant builder
    #[must_use]
    pub fn with(self, f: impl FnOnce(C) -> C) -> Self {
        Self {
            parent: self.parent,
            child: f(self.child),
        }
    }

    pub fn child(&self) -> &C {
        &self.child
    }

    /// Returns to the family builder with this variant selected
    pub fn done(self) -> P {
        self.parent.adopt(self.child)
    }
}

/// Generates a builder for a message struct
///
/// ```ignore
/// message_builder! {
///     /// Builder for [`Label`]
///     pub struct LabelBuilder => Label {
///         group: u8 = with_group,
///         options: LabelOptions = with_options / with_options_builder,
///     }
///     optional {
///         language: Language = with_language,
///     }
///     check Label::check_invariants
/// }
/// ```
///
/// Every field in the first block is mandatory. A field whose type has its
/// own builder may name a second setter after a `/`, which configures the
/// nested message in place. Fields in the `optional`
/// block are `Option<T>` in the message and default to `None`. The optional
/// `check` function receives the assembled message and the [`Checklist`],
/// and may record further problems with [`Checklist::check`].
#[macro_export]
macro_rules! message_builder {
    (
        $(#[$meta:meta])*
        $vis:vis struct $builder:ident => $msg:ident {
            $( $field:ident : $ty:ty = $setter:ident $( / $bsetter:ident )? ),+ $(,)?
        }
        $( optional { $( $ofield:ident : $oty:ty = $osetter:ident ),+ $(,)? } )?
        $( check $validator:path )?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        $vis struct $builder {
            $( $field: Option<$ty>, )+
            $($( $ofield: Option<$oty>, )+)?
            deferred: $crate::error::MultiError,
        }

        impl $builder {
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            $(
                #[must_use]
                pub fn $setter(mut self, value: $ty) -> Self {
                    self.$field = Some(value);
                    self
                }

                $(
                    /// Configures the nested message through its own builder,
                    /// seeded from the current value if there is one. A failed
                    /// nested build is reported by the enclosing `build`.
                    #[must_use]
                    pub fn $bsetter(
                        mut self,
                        f: impl FnOnce(
                            <$ty as $crate::builder::ToBuilder>::Builder,
                        ) -> <$ty as $crate::builder::ToBuilder>::Builder,
                    ) -> Self
                    where
                        <$ty as $crate::builder::ToBuilder>::Builder: Default,
                    {
                        let seed = self
                            .$field
                            .as_ref()
                            .map($crate::builder::ToBuilder::to_builder)
                            .unwrap_or_default();
                        self.$field =
                            $crate::builder::build_nested(&mut self.deferred, stringify!($field), f(seed));
                        self
                    }
                )?
            )+

            $($(
                #[must_use]
                pub fn $osetter(mut self, value: Option<$oty>) -> Self {
                    self.$ofield = value;
                    self
                }
            )+)?
        }

        impl $crate::builder::Builder for $builder {
            type Output = $msg;

            fn build(&self) -> $crate::builder::BuildResult<$msg> {
                let mut checklist = $crate::builder::Checklist::new(stringify!($msg));
                checklist.absorb(&self.deferred);
                $( let $field = checklist.require(stringify!($field), &self.$field); )+
                let ( $( Some($field), )+ ) = ( $( $field, )+ ) else {
                    return Err(checklist.into_error());
                };
                let built = $msg {
                    $( $field, )+
                    $($( $ofield: self.$ofield.clone(), )+)?
                };
                $( $validator(&built, &mut checklist); )?
                checklist.finish()?;
                Ok(built)
            }
        }

        impl $crate::builder::ToBuilder for $msg {
            type Builder = $builder;

            fn to_builder(&self) -> $builder {
                $builder {
                    $( $field: Some(self.$field.clone()), )+
                    $($( $ofield: self.$ofield.clone(), )+)?
                    deferred: $crate::error::MultiError::new(),
                }
            }
        }
    };
}
