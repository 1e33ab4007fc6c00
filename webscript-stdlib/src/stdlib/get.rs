// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::convert::TryFrom;

use webscript::{
    function::{uuid, Uuid},
    ApplicationTerm, ArgType, Arity, Bindings, Computer, ErrorInfo, Evaluation, Function,
    FunctionArity, FunctionError, Symbol, Term,
};

pub struct Get;
impl Get {
    pub const UUID: Uuid = uuid!("391eba98-8955-4158-bc3f-2c07dee394dc");
    const ARITY: FunctionArity<2, 0> = FunctionArity {
        required: [ArgType::Strict, ArgType::Strict],
        optional: [],
        variadic: None,
    };
}
impl Function for Get {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys/get")
    }
    fn arity(&self) -> Arity {
        Arity::from(&Self::ARITY)
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        _computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        let (target, key) = match (application.arg(0), application.arg(1)) {
            (Some(target), Some(key)) => Ok((target, key)),
            _ => Err(ErrorInfo::invalid_arguments(format!(
                "Expected 2 arguments, received {}",
                application.args().len()
            ))),
        }?;
        let result = match target {
            Term::List(items) => match key {
                Term::Integer(index) => Ok(usize::try_from(index)
                    .ok()
                    .and_then(|index| items.get(index))
                    .cloned()
                    .unwrap_or(Term::Nil)),
                _ => Err(ErrorInfo::invalid_arguments(format!(
                    "Invalid list index: Expected Integer, received {}",
                    key
                ))),
            },
            Term::Map(entries) => Ok(entries.get(key).cloned().unwrap_or(Term::Nil)),
            _ => Err(ErrorInfo::invalid_arguments(format!(
                "Unable to access field {} on {}",
                key, target
            ))),
        }?;
        Ok(Evaluation::function_result(application, result, bindings))
    }
}
