// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use webscript::{
    function::{uuid, Uuid},
    ApplicationTerm, Bindings, Computer, ErrorInfo, Evaluation, Function, FunctionError, Symbol,
    Term,
};

pub struct Concat;
impl Concat {
    pub const UUID: Uuid = uuid!("f1b8e6a2-3c7d-4e59-a0b4-6d2e9c1f8a37");
}
impl Function for Concat {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys.string/concat")
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        _computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        if let Some(error) = application.args().iter().find(|arg| arg.is_error()) {
            return Ok(Evaluation::function_result(
                application,
                error.clone(),
                bindings,
            ));
        }
        let result = application
            .args()
            .iter()
            .map(stringify)
            .collect::<Result<String, _>>()?;
        Ok(Evaluation::function_result(
            application,
            Term::String(result),
            bindings,
        ))
    }
}

fn stringify(value: &Term) -> Result<String, ErrorInfo> {
    match value {
        Term::String(value) => Ok(value.clone()),
        Term::Character(value) => Ok(value.to_string()),
        Term::Nil => Ok(String::new()),
        value if value.is_constant() => Ok(value.to_text()),
        _ => Err(ErrorInfo::invalid_arguments(format!(
            "Expected constant value, received {}",
            value
        ))),
    }
}
