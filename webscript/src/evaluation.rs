// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::fmt;

use im::OrdSet;
use serde::{Deserialize, Serialize};

use crate::{
    bindings::Bindings,
    error::ErrorInfo,
    hash::{combine_hashes, HashId},
    term::{ApplicationTerm, Symbol, Term},
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Constant,
    Compound,
    BindSymbol,
    ApplyFunction,
    CacheHit,
    ExpandMacro,
}
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Constant => "CONSTANT",
                Self::Compound => "COMPOUND",
                Self::BindSymbol => "BIND_SYMBOL",
                Self::ApplyFunction => "APPLY_FUNCTION",
                Self::CacheHit => "CACHE_HIT",
                Self::ExpandMacro => "EXPAND_MACRO",
            }
        )
    }
}

/// Record of a single reduction step, together with the steps it was built from.
///
/// `dependencies` is the subset of `bindings` that the result relied upon. A cache hit reports no
/// dependencies of its own, but retains the dependency set the cached result was stored against:
/// enclosing steps inherit that set via [`Evaluation::effective_dependencies`] so that their own
/// cache entries are keyed correctly.
///
/// Symbols that were looked up but found unbound are tracked separately as `unbound_symbols`: a
/// result that relied on a symbol being absent is only valid for environments that still lack it.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Evaluation {
    input: Term,
    result: Term,
    operation: Operation,
    dependencies: Bindings,
    bindings: Bindings,
    sub_steps: Vec<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cached_dependencies: Option<Bindings>,
    #[serde(default, skip_serializing_if = "OrdSet::is_empty")]
    unbound_symbols: OrdSet<Symbol>,
}
impl Evaluation {
    pub fn new(
        input: Term,
        result: Term,
        operation: Operation,
        dependencies: Bindings,
        bindings: Bindings,
        sub_steps: Vec<Evaluation>,
    ) -> Self {
        let unbound_symbols = sub_steps
            .iter()
            .fold(OrdSet::new(), |result, sub_step| {
                result.union(sub_step.unbound_symbols.clone())
            });
        Self {
            input,
            result,
            operation,
            dependencies,
            bindings,
            sub_steps,
            cached_dependencies: None,
            unbound_symbols,
        }
    }
    pub fn constant(term: Term, bindings: Bindings) -> Self {
        Self::new(
            term.clone(),
            term,
            Operation::Constant,
            Bindings::new(),
            bindings,
            Vec::new(),
        )
    }
    pub fn compound(
        input: Term,
        result: Term,
        bindings: Bindings,
        sub_steps: Vec<Evaluation>,
    ) -> Self {
        let dependencies = collect_dependencies(Bindings::new(), &sub_steps);
        Self::new(
            input,
            result,
            Operation::Compound,
            dependencies,
            bindings,
            sub_steps,
        )
    }
    /// Resolution of a bound symbol, where `sub_step` is the evaluation of a non-constant bound
    /// value.
    pub fn bind_symbol(
        symbol: Symbol,
        value: Term,
        sub_step: Option<Evaluation>,
        bindings: Bindings,
    ) -> Self {
        let result = match &sub_step {
            Some(evaluation) => evaluation.result.clone(),
            None => value.clone(),
        };
        let sub_steps = sub_step.into_iter().collect::<Vec<_>>();
        let dependencies = collect_dependencies(
            Bindings::new().with(symbol.clone(), value),
            &sub_steps,
        );
        Self::new(
            Term::Symbol(symbol),
            result,
            Operation::BindSymbol,
            dependencies,
            bindings,
            sub_steps,
        )
    }
    pub fn unknown_symbol(symbol: Symbol, bindings: Bindings) -> Self {
        let error = Term::Error(ErrorInfo::unknown_symbol(&symbol));
        Self {
            unbound_symbols: OrdSet::unit(symbol.clone()),
            ..Self::new(
                Term::Symbol(symbol),
                error,
                Operation::BindSymbol,
                Bindings::new(),
                bindings,
                Vec::new(),
            )
        }
    }
    /// Function application step. The dependencies of all sub-steps are folded into the
    /// explicitly provided `dependencies`.
    pub fn apply_function(
        input: Term,
        result: Term,
        dependencies: Bindings,
        bindings: Bindings,
        sub_steps: Vec<Evaluation>,
    ) -> Self {
        let dependencies = collect_dependencies(dependencies, &sub_steps);
        Self::new(
            input,
            result,
            Operation::ApplyFunction,
            dependencies,
            bindings,
            sub_steps,
        )
    }
    /// Application step for a function that produced its result without evaluating any further
    /// terms.
    pub fn function_result(
        application: &ApplicationTerm,
        result: Term,
        bindings: &Bindings,
    ) -> Self {
        Self::apply_function(
            Term::Application(application.clone()),
            result,
            Bindings::new(),
            bindings.clone(),
            Vec::new(),
        )
    }
    pub fn expand_macro(
        input: ApplicationTerm,
        expansion: ApplicationTerm,
        dependencies: Bindings,
        bindings: Bindings,
    ) -> Self {
        Self::new(
            Term::Application(input),
            Term::Application(expansion),
            Operation::ExpandMacro,
            dependencies,
            bindings,
            Vec::new(),
        )
    }
    pub fn cache_hit(
        input: Term,
        result: Term,
        bindings: Bindings,
        cached_dependencies: Bindings,
    ) -> Self {
        Self {
            cached_dependencies: Some(cached_dependencies),
            ..Self::new(
                input,
                result,
                Operation::CacheHit,
                Bindings::new(),
                bindings,
                Vec::new(),
            )
        }
    }
    /// Attach the unbound symbols a cached result was stored against
    pub fn with_unbound_symbols(self, unbound_symbols: OrdSet<Symbol>) -> Self {
        Self {
            unbound_symbols,
            ..self
        }
    }
    pub fn input(&self) -> &Term {
        &self.input
    }
    pub fn result(&self) -> &Term {
        &self.result
    }
    pub fn into_result(self) -> Term {
        self.result
    }
    pub fn operation(&self) -> Operation {
        self.operation
    }
    pub fn dependencies(&self) -> &Bindings {
        &self.dependencies
    }
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
    pub fn sub_steps(&self) -> &[Evaluation] {
        &self.sub_steps
    }
    /// Dependency set the result actually relied upon, including the dependencies of a cached
    /// result.
    pub fn effective_dependencies(&self) -> &Bindings {
        self.cached_dependencies
            .as_ref()
            .unwrap_or(&self.dependencies)
    }
    pub fn unbound_symbols(&self) -> &OrdSet<Symbol> {
        &self.unbound_symbols
    }
    pub fn cache_key(&self) -> HashId {
        combine_hashes(&self.input, &self.dependencies)
    }
    /// Number of steps in this tree, including the root
    pub fn len(&self) -> usize {
        1 + self.sub_steps.iter().map(Self::len).sum::<usize>()
    }
    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{} {} => {}{}",
            "",
            self.operation,
            self.input,
            self.result,
            if self.dependencies.is_empty() {
                String::new()
            } else {
                format!(" {}", self.dependencies)
            },
            indent = depth * 2,
        )?;
        for sub_step in self.sub_steps.iter() {
            sub_step.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}
impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn collect_dependencies(dependencies: Bindings, sub_steps: &[Evaluation]) -> Bindings {
    sub_steps.iter().fold(dependencies, |result, sub_step| {
        result.union(sub_step.effective_dependencies())
    })
}
