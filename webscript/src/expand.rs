// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use crate::{
    bindings::Bindings,
    error::SyntaxError,
    term::{ApplicationTerm, Symbol, Term},
};

pub const MACRO_NAME_PARAMETER: &'static str = "%name";

/// Parameter environment for a macro invocation: `%name` is bound to the applied symbol and
/// `%0`, `%1`, ... to the unevaluated arguments.
pub fn macro_parameters(source: &ApplicationTerm) -> Bindings {
    source
        .args()
        .iter()
        .enumerate()
        .map(|(index, arg)| (Symbol::new(None, &format!("%{}", index)), arg.clone()))
        .chain(std::iter::once((
            Symbol::new(None, MACRO_NAME_PARAMETER),
            Term::Symbol(source.symbol().clone()),
        )))
        .collect()
}

pub fn expand_macro(
    source: &ApplicationTerm,
    body: &ApplicationTerm,
) -> Result<ApplicationTerm, SyntaxError> {
    substitute_application(body, &macro_parameters(source))
}

/// Replace every parameter symbol in `term`, descending through collections and applications.
pub fn substitute(term: &Term, parameters: &Bindings) -> Result<Term, SyntaxError> {
    match term {
        Term::Symbol(symbol) => Ok(parameters
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| term.clone())),
        Term::Application(application) => {
            substitute_application(application, parameters).map(Term::Application)
        }
        Term::List(_) | Term::Set(_) | Term::Map(_) => {
            term.map_children(|child| substitute(child, parameters))
        }
        _ => Ok(term.clone()),
    }
}

fn substitute_application(
    term: &ApplicationTerm,
    parameters: &Bindings,
) -> Result<ApplicationTerm, SyntaxError> {
    let symbol = match parameters.get(term.symbol()) {
        None => term.symbol().clone(),
        Some(Term::Symbol(symbol)) => symbol.clone(),
        Some(expansion) => {
            return Err(SyntaxError::InvalidMacroSymbol {
                symbol: term.symbol().clone(),
                expansion: expansion.clone(),
            })
        }
    };
    let args = term
        .args()
        .iter()
        .map(|arg| substitute(arg, parameters))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApplicationTerm::new(symbol, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application(symbol: &str, args: impl IntoIterator<Item = Term>) -> ApplicationTerm {
        ApplicationTerm::new(Symbol::parse(symbol), args)
    }

    #[test]
    fn positional_parameters() {
        let source = application("test/double", [Term::integer(3)]);
        let body = application(
            "sys.scripting.groovy/eval",
            [
                Term::string("value*2"),
                Term::keyword_map([("value", Term::symbol("%0"))]),
            ],
        );
        assert_eq!(
            expand_macro(&source, &body),
            Ok(application(
                "sys.scripting.groovy/eval",
                [
                    Term::string("value*2"),
                    Term::keyword_map([("value", Term::integer(3))]),
                ],
            ))
        );
    }

    #[test]
    fn nested_parameters() {
        let source = application("foo", [Term::symbol("x"), Term::integer(2)]);
        let body = application(
            "sys/list",
            [
                Term::list([Term::symbol("%1"), Term::symbol("%name")]),
                Term::application(Symbol::parse("sys/list"), [Term::symbol("%0")]),
                Term::symbol("%2"),
            ],
        );
        assert_eq!(
            expand_macro(&source, &body),
            Ok(application(
                "sys/list",
                [
                    Term::list([Term::integer(2), Term::symbol("foo")]),
                    Term::application(Symbol::parse("sys/list"), [Term::symbol("x")]),
                    Term::symbol("%2"),
                ],
            ))
        );
    }

    #[test]
    fn function_position_parameters() {
        let body = application("%0", [Term::integer(1)]);
        assert_eq!(
            expand_macro(&application("foo", [Term::symbol("sys/list")]), &body),
            Ok(application("sys/list", [Term::integer(1)]))
        );
        assert_eq!(
            expand_macro(&application("foo", [Term::integer(3)]), &body),
            Err(SyntaxError::InvalidMacroSymbol {
                symbol: Symbol::parse("%0"),
                expansion: Term::integer(3),
            })
        );
    }
}
