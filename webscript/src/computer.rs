// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Jordan Hall <j.hall@mwam.com> https://github.com/j-hall-mwam
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use crate::{
    bindings::Bindings,
    cache::EvaluationCache,
    error::{ErrorInfo, FunctionError, SyntaxError},
    evaluation::Evaluation,
    expand::expand_macro,
    function::{ArgType, Function},
    hash::FnvHashMap,
    term::{ApplicationTerm, Symbol, Term},
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ComputerOptions {
    pub debug_evaluations: bool,
}
impl Default for ComputerOptions {
    fn default() -> Self {
        Self {
            debug_evaluations: false,
        }
    }
}
impl ComputerOptions {
    pub fn debug() -> Self {
        Self {
            debug_evaluations: true,
            ..Default::default()
        }
    }
}

/// Reduces terms to constants, recording every step of the reduction.
pub struct Computer {
    functions: FnvHashMap<Symbol, Arc<dyn Function>>,
    cache: Arc<dyn EvaluationCache>,
    options: ComputerOptions,
}
impl Computer {
    pub fn new(
        functions: impl IntoIterator<Item = Arc<dyn Function>>,
        cache: Arc<dyn EvaluationCache>,
        options: ComputerOptions,
    ) -> Self {
        Self {
            functions: functions
                .into_iter()
                .map(|function| (function.symbol(), function))
                .collect(),
            cache,
            options,
        }
    }
    pub fn register(&mut self, function: Arc<dyn Function>) -> Option<Arc<dyn Function>> {
        self.functions.insert(function.symbol(), function)
    }
    pub fn function(&self, symbol: &Symbol) -> Option<&Arc<dyn Function>> {
        self.functions.get(symbol)
    }
    pub fn cache(&self) -> &Arc<dyn EvaluationCache> {
        &self.cache
    }
    pub fn options(&self) -> &ComputerOptions {
        &self.options
    }

    /// Reduce `term` under `bindings`.
    ///
    /// Runtime failures are returned as error values within the evaluation; only structural
    /// failures abort the evaluation.
    pub fn evaluate(&self, term: &Term, bindings: &Bindings) -> Result<Evaluation, SyntaxError> {
        let evaluation = match term {
            Term::Symbol(symbol) => self.evaluate_symbol(symbol, bindings),
            Term::Application(application) => {
                let _span = debug_span!("application", symbol = %application.symbol()).entered();
                self.cache.get_or_compute(term, bindings, &mut || {
                    self.evaluate_application(application, bindings)
                })
            }
            Term::List(_) | Term::Set(_) | Term::Map(_) if !term.is_constant() => {
                self.evaluate_compound(term, bindings)
            }
            _ => Ok(Evaluation::constant(term.clone(), bindings.clone())),
        }?;
        if self.options.debug_evaluations {
            debug!(
                operation = %evaluation.operation(),
                input = %evaluation.input(),
                result = %evaluation.result(),
                "Evaluation step"
            );
        } else {
            trace!(operation = %evaluation.operation(), "Evaluation step");
        }
        Ok(evaluation)
    }

    fn evaluate_compound(
        &self,
        term: &Term,
        bindings: &Bindings,
    ) -> Result<Evaluation, SyntaxError> {
        if let Term::Map(entries) = term {
            if let Some(key) = entries.keys().find(|key| !key.is_constant()) {
                return Err(SyntaxError::InvalidMapKey(key.clone()));
            }
        }
        let mut sub_steps = Vec::new();
        let result = term.map_children(|child| {
            let evaluation = self.evaluate(child, bindings)?;
            let result = evaluation.result().clone();
            sub_steps.push(evaluation);
            Ok(result)
        })?;
        Ok(Evaluation::compound(
            term.clone(),
            result,
            bindings.clone(),
            sub_steps,
        ))
    }

    fn evaluate_symbol(
        &self,
        symbol: &Symbol,
        bindings: &Bindings,
    ) -> Result<Evaluation, SyntaxError> {
        match bindings.get(symbol) {
            None => Ok(Evaluation::unknown_symbol(symbol.clone(), bindings.clone())),
            Some(value) if value.is_constant() => Ok(Evaluation::bind_symbol(
                symbol.clone(),
                value.clone(),
                None,
                bindings.clone(),
            )),
            Some(value) => {
                let sub_step = self.evaluate(value, bindings)?;
                Ok(Evaluation::bind_symbol(
                    symbol.clone(),
                    value.clone(),
                    Some(sub_step),
                    bindings.clone(),
                ))
            }
        }
    }

    fn evaluate_application(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
    ) -> Result<Evaluation, SyntaxError> {
        let symbol = application.symbol();
        match bindings.get(symbol) {
            Some(Term::Application(body)) => self.evaluate_macro(application, body, bindings),
            _ => match self.functions.get(symbol) {
                Some(function) => self.evaluate_function(application, function.as_ref(), bindings),
                None => {
                    let symbol_evaluation = self.evaluate_symbol(symbol, bindings)?;
                    let result = symbol_evaluation.result().clone();
                    Ok(Evaluation::apply_function(
                        Term::Application(application.clone()),
                        match result {
                            Term::Error(_) => result,
                            _ => Term::Error(ErrorInfo::unknown_symbol(symbol)),
                        },
                        Bindings::new(),
                        bindings.clone(),
                        vec![symbol_evaluation],
                    ))
                }
            },
        }
    }

    fn evaluate_macro(
        &self,
        application: &ApplicationTerm,
        body: &ApplicationTerm,
        bindings: &Bindings,
    ) -> Result<Evaluation, SyntaxError> {
        let symbol = application.symbol();
        let expansion = expand_macro(application, body)?;
        trace!(symbol = %symbol, expansion = %expansion, "Expanded macro");
        let macro_dependencies =
            Bindings::new().with(symbol.clone(), Term::Application(body.clone()));
        let expanded = self.evaluate(&Term::Application(expansion.clone()), bindings)?;
        let result = expanded.result().clone();
        let expansion_step = Evaluation::expand_macro(
            application.clone(),
            expansion,
            macro_dependencies.clone(),
            bindings.clone(),
        );
        Ok(Evaluation::apply_function(
            Term::Application(application.clone()),
            result,
            macro_dependencies,
            bindings.clone(),
            vec![expansion_step, expanded],
        ))
    }

    fn evaluate_function(
        &self,
        application: &ApplicationTerm,
        function: &dyn Function,
        bindings: &Bindings,
    ) -> Result<Evaluation, SyntaxError> {
        let input = Term::Application(application.clone());
        let arity = function.arity();
        if !arity.accepts(application.args().len()) {
            return Ok(Evaluation::apply_function(
                input,
                Term::Error(ErrorInfo::invalid_arguments(format!(
                    "Expected {} arguments, received {}",
                    arity,
                    application.args().len()
                ))),
                Bindings::new(),
                bindings.clone(),
                Vec::new(),
            ));
        }
        let mut sub_steps = Vec::new();
        let args = application
            .args()
            .iter()
            .zip(arity.iter())
            .map(|(arg, arg_type)| match arg_type {
                ArgType::Strict => {
                    let evaluation = self.evaluate(arg, bindings)?;
                    let result = evaluation.result().clone();
                    sub_steps.push(evaluation);
                    Ok(result)
                }
                ArgType::Lazy => Ok(arg.clone()),
            })
            .collect::<Result<Vec<_>, SyntaxError>>()?;
        let reduced = application.with_args(args);
        let function_evaluation = match function.apply(&reduced, bindings, self) {
            Ok(evaluation) => evaluation,
            Err(FunctionError::Syntax(err)) => return Err(err),
            Err(FunctionError::Failed(error)) => {
                debug!(symbol = %application.symbol(), error = %error, "Function application failed");
                return Ok(Evaluation::apply_function(
                    input,
                    Term::Error(error),
                    Bindings::new(),
                    bindings.clone(),
                    sub_steps,
                ));
            }
        };
        if sub_steps.is_empty() {
            Ok(function_evaluation)
        } else {
            let result = function_evaluation.result().clone();
            sub_steps.push(function_evaluation);
            Ok(Evaluation::apply_function(
                input,
                result,
                Bindings::new(),
                bindings.clone(),
                sub_steps,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        cache::{DependencyCache, NoopCache},
        evaluation::Operation,
        function::{uuid, FunctionArity, Uuid},
    };

    struct Pair;
    impl Pair {
        const UUID: Uuid = uuid!("c6b3a3ae-7c8e-4cd3-9a9c-0c5d1f1c2b6a");
        const ARITY: FunctionArity<2, 0> = FunctionArity {
            required: [ArgType::Strict, ArgType::Strict],
            optional: [],
            variadic: None,
        };
    }
    impl Function for Pair {
        fn uid(&self) -> Uuid {
            Self::UUID
        }
        fn symbol(&self) -> Symbol {
            Symbol::parse("test/pair")
        }
        fn arity(&self) -> crate::function::Arity {
            crate::function::Arity::from(&Self::ARITY)
        }
        fn apply(
            &self,
            application: &ApplicationTerm,
            bindings: &Bindings,
            _computer: &Computer,
        ) -> Result<Evaluation, FunctionError> {
            Ok(Evaluation::apply_function(
                Term::Application(application.clone()),
                Term::list(application.args().iter().cloned()),
                Bindings::new(),
                bindings.clone(),
                Vec::new(),
            ))
        }
    }

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }
    impl Function for Arc<Counter> {
        fn uid(&self) -> Uuid {
            uuid!("58a0b6c1-2b5b-4a9d-8a51-6fb1b0d3f6f4")
        }
        fn symbol(&self) -> Symbol {
            Symbol::parse("test/count")
        }
        fn apply(
            &self,
            application: &ApplicationTerm,
            bindings: &Bindings,
            _computer: &Computer,
        ) -> Result<Evaluation, FunctionError> {
            let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Evaluation::apply_function(
                Term::Application(application.clone()),
                Term::integer(count),
                Bindings::new(),
                bindings.clone(),
                Vec::new(),
            ))
        }
    }

    struct Fail;
    impl Function for Fail {
        fn uid(&self) -> Uuid {
            uuid!("0e0c4f6b-8d7f-4b5e-bb1c-3a3b0c1a9e57")
        }
        fn symbol(&self) -> Symbol {
            Symbol::parse("test/fail")
        }
        fn apply(
            &self,
            _application: &ApplicationTerm,
            _bindings: &Bindings,
            _computer: &Computer,
        ) -> Result<Evaluation, FunctionError> {
            Err(FunctionError::Failed(ErrorInfo::new("Custom", "Failed")))
        }
    }

    fn application(symbol: &str, args: impl IntoIterator<Item = Term>) -> Term {
        Term::application(Symbol::parse(symbol), args)
    }

    fn create_computer(cache: Arc<dyn EvaluationCache>) -> (Computer, Arc<Counter>) {
        let counter = Arc::new(Counter::default());
        let computer = Computer::new(
            [
                Arc::new(Pair) as Arc<dyn Function>,
                Arc::new(Arc::clone(&counter)) as Arc<dyn Function>,
                Arc::new(Fail) as Arc<dyn Function>,
            ],
            cache,
            ComputerOptions::default(),
        );
        (computer, counter)
    }

    #[test]
    fn constant_fixed_points() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let bindings = Bindings::from_iter([("a", Term::integer(1))]);
        for term in [
            Term::nil(),
            Term::boolean(true),
            Term::integer(3),
            Term::string("foo"),
            Term::keyword("a"),
            Term::error("Foo", "Bar"),
            Term::list([Term::integer(1), Term::string("b")]),
        ] {
            assert_eq!(
                computer.evaluate(&term, &bindings),
                Ok(Evaluation::constant(term.clone(), bindings.clone()))
            );
        }
    }

    #[test]
    fn compound_congruence() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let bindings = Bindings::from_iter([("a", Term::integer(1))]);
        let term = Term::list([Term::integer(3), Term::symbol("a")]);
        let evaluation = computer.evaluate(&term, &bindings).unwrap();
        assert_eq!(
            evaluation,
            Evaluation::compound(
                term,
                Term::list([Term::integer(3), Term::integer(1)]),
                bindings.clone(),
                vec![
                    Evaluation::constant(Term::integer(3), bindings.clone()),
                    Evaluation::bind_symbol(
                        Symbol::parse("a"),
                        Term::integer(1),
                        None,
                        bindings.clone(),
                    ),
                ],
            )
        );
        assert_eq!(evaluation.dependencies(), &bindings);
        let term = Term::keyword_map([("x", Term::symbol("a")), ("y", Term::integer(2))]);
        let evaluation = computer.evaluate(&term, &bindings).unwrap();
        assert_eq!(evaluation.operation(), Operation::Compound);
        assert_eq!(
            evaluation.result(),
            &Term::keyword_map([("x", Term::integer(1)), ("y", Term::integer(2))])
        );
    }

    #[test]
    fn non_constant_map_keys() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let term = Term::Map(
            [(Term::symbol("a"), Term::symbol("b"))]
                .into_iter()
                .collect(),
        );
        assert_eq!(
            computer.evaluate(&term, &Bindings::new()),
            Err(SyntaxError::InvalidMapKey(Term::symbol("a")))
        );
    }

    #[test]
    fn unknown_symbols() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let evaluation = computer.evaluate(&Term::symbol("x"), &Bindings::new()).unwrap();
        assert_eq!(evaluation.operation(), Operation::BindSymbol);
        assert_eq!(evaluation.result(), &Term::error("UnknownSymbol", "x"));
        let term = application("test/missing", [Term::integer(1)]);
        let evaluation = computer.evaluate(&term, &Bindings::new()).unwrap();
        assert_eq!(evaluation.operation(), Operation::ApplyFunction);
        assert_eq!(
            evaluation.result(),
            &Term::error("UnknownSymbol", "test/missing")
        );
        assert_eq!(evaluation.sub_steps().len(), 1);
    }

    #[test]
    fn cached_unknown_symbols() {
        let (computer, counter) = create_computer(Arc::new(DependencyCache::default()));
        let term = application("test/count", [Term::symbol("x")]);
        let unbound = computer.evaluate(&term, &Bindings::new()).unwrap();
        assert_eq!(unbound.operation(), Operation::ApplyFunction);
        assert_eq!(unbound.result(), &Term::integer(1));
        assert_eq!(
            unbound.unbound_symbols().iter().collect::<Vec<_>>(),
            vec![&Symbol::parse("x")]
        );
        let unrelated = computer
            .evaluate(&term, &Bindings::from_iter([("y", Term::integer(1))]))
            .unwrap();
        assert_eq!(unrelated.operation(), Operation::CacheHit);
        assert_eq!(unrelated.result(), &Term::integer(1));
        let bound = computer
            .evaluate(&term, &Bindings::from_iter([("x", Term::integer(1))]))
            .unwrap();
        assert_eq!(bound.operation(), Operation::ApplyFunction);
        assert_eq!(bound.result(), &Term::integer(2));
        assert!(bound.unbound_symbols().is_empty());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn recursive_symbol_resolution() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let bindings = Bindings::from_iter([("a", Term::symbol("b"))]);
        let evaluation = computer.evaluate(&Term::symbol("a"), &bindings).unwrap();
        assert_eq!(
            evaluation,
            Evaluation::bind_symbol(
                Symbol::parse("a"),
                Term::symbol("b"),
                Some(Evaluation::unknown_symbol(
                    Symbol::parse("b"),
                    bindings.clone()
                )),
                bindings.clone(),
            )
        );
        assert_eq!(evaluation.result(), &Term::error("UnknownSymbol", "b"));
    }

    #[test]
    fn constant_arguments() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let term = application("test/pair", [Term::integer(1), Term::integer(2)]);
        let evaluation = computer.evaluate(&term, &Bindings::new()).unwrap();
        assert_eq!(
            evaluation,
            Evaluation::apply_function(
                term.clone(),
                Term::list([Term::integer(1), Term::integer(2)]),
                Bindings::new(),
                Bindings::new(),
                vec![
                    Evaluation::constant(Term::integer(1), Bindings::new()),
                    Evaluation::constant(Term::integer(2), Bindings::new()),
                    Evaluation::apply_function(
                        term,
                        Term::list([Term::integer(1), Term::integer(2)]),
                        Bindings::new(),
                        Bindings::new(),
                        Vec::new(),
                    ),
                ],
            )
        );
        assert!(evaluation.dependencies().is_empty());
    }

    #[test]
    fn reduced_arguments() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let bindings = Bindings::from_iter([("a", Term::integer(1))]);
        let term = application("test/pair", [Term::symbol("a"), Term::integer(2)]);
        let evaluation = computer.evaluate(&term, &bindings).unwrap();
        assert_eq!(evaluation.operation(), Operation::ApplyFunction);
        assert_eq!(
            evaluation.result(),
            &Term::list([Term::integer(1), Term::integer(2)])
        );
        assert_eq!(evaluation.dependencies(), &bindings);
        let operations = evaluation
            .sub_steps()
            .iter()
            .map(Evaluation::operation)
            .collect::<Vec<_>>();
        assert_eq!(
            operations,
            vec![
                Operation::BindSymbol,
                Operation::Constant,
                Operation::ApplyFunction
            ]
        );
    }

    #[test]
    fn invalid_arity() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let term = application("test/pair", [Term::integer(1)]);
        let evaluation = computer.evaluate(&term, &Bindings::new()).unwrap();
        assert_eq!(
            evaluation.result(),
            &Term::error("InvalidArguments", "Expected 2 arguments, received 1")
        );
    }

    #[test]
    fn failed_functions() {
        let (computer, _) = create_computer(Arc::new(DependencyCache::default()));
        let bindings = Bindings::from_iter([("a", Term::integer(1))]);
        let term = application("test/fail", [Term::symbol("a")]);
        let evaluation = computer.evaluate(&term, &bindings).unwrap();
        assert_eq!(evaluation.operation(), Operation::ApplyFunction);
        assert_eq!(evaluation.result(), &Term::error("Custom", "Failed"));
        assert_eq!(evaluation.dependencies(), &bindings);
        let evaluation = computer.evaluate(&term, &bindings).unwrap();
        assert_eq!(evaluation.operation(), Operation::CacheHit);
        assert_eq!(evaluation.result(), &Term::error("Custom", "Failed"));
    }

    #[test]
    fn cached_applications() {
        let (computer, counter) = create_computer(Arc::new(DependencyCache::default()));
        let term = application("test/count", []);
        let bindings = Bindings::from_iter([("a", Term::integer(1))]);
        let first = computer.evaluate(&term, &bindings).unwrap();
        let second = computer.evaluate(&term, &Bindings::new()).unwrap();
        assert_eq!(first.operation(), Operation::ApplyFunction);
        assert_eq!(second.operation(), Operation::CacheHit);
        assert_eq!(first.result(), second.result());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dependency_scoped_cache() {
        let (computer, _) = create_computer(Arc::new(DependencyCache::default()));
        let term = application("test/pair", [Term::symbol("a"), Term::integer(0)]);
        let first = computer
            .evaluate(&term, &Bindings::from_iter([("a", Term::integer(1))]))
            .unwrap();
        let second = computer
            .evaluate(&term, &Bindings::from_iter([("a", Term::integer(2))]))
            .unwrap();
        assert_eq!(second.operation(), Operation::ApplyFunction);
        assert_eq!(first.result(), &Term::list([Term::integer(1), Term::integer(0)]));
        assert_eq!(second.result(), &Term::list([Term::integer(2), Term::integer(0)]));
    }

    #[test]
    fn macro_expansion() {
        let (computer, _) = create_computer(Arc::new(DependencyCache::default()));
        let body = ApplicationTerm::new(
            Symbol::parse("test/pair"),
            [Term::symbol("%0"), Term::symbol("%0")],
        );
        let bindings = Bindings::from_iter([("twice", Term::Application(body.clone()))]);
        let term = application("twice", [Term::integer(3)]);
        let evaluation = computer.evaluate(&term, &bindings).unwrap();
        let expansion = ApplicationTerm::new(
            Symbol::parse("test/pair"),
            [Term::integer(3), Term::integer(3)],
        );
        let dependencies = Bindings::from_iter([("twice", Term::Application(body))]);
        assert_eq!(
            evaluation,
            Evaluation::apply_function(
                term.clone(),
                Term::list([Term::integer(3), Term::integer(3)]),
                dependencies.clone(),
                bindings.clone(),
                vec![
                    Evaluation::expand_macro(
                        ApplicationTerm::new(Symbol::parse("twice"), [Term::integer(3)]),
                        expansion.clone(),
                        dependencies.clone(),
                        bindings.clone(),
                    ),
                    Evaluation::apply_function(
                        Term::Application(expansion.clone()),
                        Term::list([Term::integer(3), Term::integer(3)]),
                        Bindings::new(),
                        bindings.clone(),
                        vec![
                            Evaluation::constant(Term::integer(3), bindings.clone()),
                            Evaluation::constant(Term::integer(3), bindings.clone()),
                            Evaluation::apply_function(
                                Term::Application(expansion),
                                Term::list([Term::integer(3), Term::integer(3)]),
                                Bindings::new(),
                                bindings.clone(),
                                Vec::new(),
                            ),
                        ],
                    ),
                ],
            )
        );
        assert_eq!(evaluation.dependencies(), &dependencies);
    }

    #[test]
    fn cached_macro_dependencies() {
        let (computer, _) = create_computer(Arc::new(DependencyCache::default()));
        let inner = application("test/pair", [Term::symbol("a"), Term::integer(0)]);
        let body = ApplicationTerm::new(
            Symbol::parse("test/pair"),
            [inner.clone(), Term::integer(0)],
        );
        let macro_binding = ("m", Term::Application(body));
        let _ = computer.evaluate(
            &Term::list([inner.clone()]),
            &Bindings::from_iter([("a", Term::integer(1))]),
        );
        let first = computer
            .evaluate(
                &application("m", []),
                &Bindings::from_iter([macro_binding.clone(), ("a", Term::integer(1))]),
            )
            .unwrap();
        let second = computer
            .evaluate(
                &application("m", []),
                &Bindings::from_iter([macro_binding, ("a", Term::integer(2))]),
            )
            .unwrap();
        assert!(first.dependencies().contains(&Symbol::parse("a")));
        assert_eq!(
            second.result(),
            &Term::list([
                Term::list([Term::integer(2), Term::integer(0)]),
                Term::integer(0)
            ])
        );
    }

    #[test]
    fn invalid_macro_symbols() {
        let (computer, _) = create_computer(Arc::new(NoopCache::default()));
        let body = ApplicationTerm::new(Symbol::parse("%0"), []);
        let bindings = Bindings::from_iter([("m", Term::Application(body))]);
        let result = computer.evaluate(&application("m", [Term::integer(1)]), &bindings);
        assert!(matches!(
            result,
            Err(SyntaxError::InvalidMacroSymbol { .. })
        ));
    }
}
