// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use webscript::{
    function::{uuid, Uuid},
    ApplicationTerm, ArgType, Arity, Bindings, Computer, ErrorInfo, Evaluation, Function,
    FunctionArity, FunctionError, Operation, Symbol, Term,
};

/// Evaluates its body with additional symbol bindings, e.g. `(sys/let [[x 1] [y (f x)]] (g x y))`.
///
/// Both arguments are passed through unevaluated: the bound terms are resolved lazily whenever the
/// body references them, under the extended bindings.
pub struct Let;
impl Let {
    pub const UUID: Uuid = uuid!("5c4d8f6e-2f0b-4d53-8c1b-0e8c3a6d7b12");
    const ARITY: FunctionArity<2, 0> = FunctionArity {
        required: [ArgType::Lazy, ArgType::Lazy],
        optional: [],
        variadic: None,
    };
}
impl Function for Let {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys/let")
    }
    fn arity(&self) -> Arity {
        Arity::from(&Self::ARITY)
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        let (declarations, body) = match (application.arg(0), application.arg(1)) {
            (Some(declarations), Some(body)) => Ok((declarations, body)),
            _ => Err(ErrorInfo::invalid_arguments(format!(
                "Expected 2 arguments, received {}",
                application.args().len()
            ))),
        }?;
        let declarations = parse_declarations(declarations)?;
        let scope = bindings.extend(declarations.iter().cloned());
        let body_evaluation = computer.evaluate(body, &scope)?;
        let result = body_evaluation.result().clone();
        // Bound symbols are local to the body; only the outer symbols they resolved to escape
        let dependencies = body_evaluation
            .effective_dependencies()
            .without(declarations.iter().map(|(symbol, _)| symbol));
        Ok(Evaluation::new(
            Term::Application(application.clone()),
            result,
            Operation::ApplyFunction,
            dependencies,
            bindings.clone(),
            vec![body_evaluation],
        ))
    }
}

fn parse_declarations(declarations: &Term) -> Result<Vec<(Symbol, Term)>, ErrorInfo> {
    let items = match declarations {
        Term::List(items) => Ok(items),
        _ => Err(ErrorInfo::invalid_arguments(format!(
            "Expected list of [Symbol Term] pairs, received {}",
            declarations
        ))),
    }?;
    items
        .iter()
        .map(|item| match item.as_list() {
            Some(pair) if pair.len() == 2 => match (&pair[0], &pair[1]) {
                (Term::Symbol(symbol), value) => Ok((symbol.clone(), value.clone())),
                (target, _) => Err(ErrorInfo::invalid_arguments(format!(
                    "Expected Symbol, received {}",
                    target
                ))),
            },
            _ => Err(ErrorInfo::invalid_arguments(format!(
                "Expected [Symbol Term] pair, received {}",
                item
            ))),
        })
        .collect()
}
