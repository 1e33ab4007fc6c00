// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use webscript::{
    function::{uuid, Uuid},
    ApplicationTerm, ArgType, Arity, Bindings, Computer, ErrorInfo, Evaluation, Function,
    FunctionArity, FunctionError, Symbol, Term,
};

pub const ERROR_CODE_JSON: &'static str = "JsonError";

pub struct JsonSerialize;
impl JsonSerialize {
    pub const UUID: Uuid = uuid!("b0a2caca-1101-402c-a21e-bccdf276e44c");
    const ARITY: FunctionArity<1, 0> = FunctionArity {
        required: [ArgType::Strict],
        optional: [],
        variadic: None,
    };
}
impl Function for JsonSerialize {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys.json/stringify")
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
        let source = application.arg(0).cloned().unwrap_or(Term::Nil);
        match crate::stringify(&source) {
            Ok(result) => Ok(Evaluation::function_result(
                application,
                Term::String(result),
                bindings,
            )),
            Err(error) => Err(FunctionError::Failed(ErrorInfo::new(ERROR_CODE_JSON, error))),
        }
    }
}
