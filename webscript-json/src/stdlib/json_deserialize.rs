// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use webscript::{
    function::{uuid, Uuid},
    ApplicationTerm, ArgType, Arity, Bindings, Computer, ErrorInfo, Evaluation, Function,
    FunctionArity, FunctionError, Symbol, Term,
};

use super::ERROR_CODE_JSON;

pub struct JsonDeserialize;
impl JsonDeserialize {
    pub const UUID: Uuid = uuid!("2ab8b2b4-aa1e-4d8e-9b4e-7d0f3d51e1a6");
    const ARITY: FunctionArity<1, 0> = FunctionArity {
        required: [ArgType::Strict],
        optional: [],
        variadic: None,
    };
}
impl Function for JsonDeserialize {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys.json/parse")
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
        let source = match application.arg(0) {
            Some(Term::String(source)) => Ok(source),
            Some(arg) => Err(ErrorInfo::invalid_arguments(format!(
                "Expected String, received {}",
                arg
            ))),
            None => Err(ErrorInfo::invalid_arguments("Missing JSON source")),
        }?;
        match crate::parse(source) {
            Ok(result) => Ok(Evaluation::function_result(application, result, bindings)),
            Err(error) => Err(FunctionError::Failed(ErrorInfo::new(ERROR_CODE_JSON, error))),
        }
    }
}
