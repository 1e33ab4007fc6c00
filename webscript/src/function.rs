// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::{fmt, iter::repeat};

pub use uuid::{uuid, Uuid};

use crate::{
    bindings::Bindings,
    computer::Computer,
    error::FunctionError,
    evaluation::Evaluation,
    term::{ApplicationTerm, Symbol},
};

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum ArgType {
    /** Reduce argument to its result before invoking the function */
    Strict,
    /** Pass argument directly into function body without evaluating */
    Lazy,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct FunctionArity<const REQUIRED: usize, const OPTIONAL: usize> {
    pub required: [ArgType; REQUIRED],
    pub optional: [ArgType; OPTIONAL],
    pub variadic: Option<ArgType>,
}

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct Arity {
    required: &'static [ArgType],
    optional: &'static [ArgType],
    variadic: Option<ArgType>,
}
impl<const R: usize, const O: usize> From<&'static FunctionArity<R, O>> for Arity {
    fn from(definition: &'static FunctionArity<R, O>) -> Self {
        Self {
            required: &definition.required,
            optional: &definition.optional,
            variadic: definition.variadic,
        }
    }
}
impl Arity {
    /// Any number of strict arguments
    pub fn variadic() -> Self {
        Self {
            required: &[],
            optional: &[],
            variadic: Some(ArgType::Strict),
        }
    }
    pub fn required(&self) -> &[ArgType] {
        self.required
    }
    pub fn optional(&self) -> &[ArgType] {
        self.optional
    }
    pub fn variadic_type(&self) -> Option<ArgType> {
        self.variadic
    }
    pub fn accepts(&self, num_args: usize) -> bool {
        num_args >= self.required.len()
            && (self.variadic.is_some() || num_args <= self.required.len() + self.optional.len())
    }
    pub fn iter(&self) -> impl Iterator<Item = ArgType> + '_ {
        self.required
            .iter()
            .chain(self.optional.iter())
            .copied()
            .chain(self.variadic.into_iter().flat_map(repeat))
    }
}
impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.optional.len(), self.variadic) {
            (_, Some(_)) => write!(f, "at least {}", self.required.len()),
            (0, None) => write!(f, "{}", self.required.len()),
            (optional, None) => write!(
                f,
                "between {} and {}",
                self.required.len(),
                self.required.len() + optional
            ),
        }
    }
}

/// Built-in function invoked when an application's symbol matches [`Function::symbol`].
///
/// Strict arguments have already been reduced when `apply` is called; lazy arguments are passed
/// through as written. Implementations that evaluate nested terms via the provided [`Computer`]
/// must include those evaluations as sub-steps of the returned [`Evaluation`].
pub trait Function: Send + Sync {
    fn uid(&self) -> Uuid;
    fn symbol(&self) -> Symbol;
    fn arity(&self) -> Arity {
        Arity::variadic()
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        computer: &Computer,
    ) -> Result<Evaluation, FunctionError>;
}
