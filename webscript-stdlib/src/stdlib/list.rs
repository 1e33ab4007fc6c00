// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use webscript::{
    function::{uuid, Uuid},
    ApplicationTerm, Bindings, Computer, Evaluation, Function, FunctionError, Symbol, Term,
};

pub struct List;
impl List {
    pub const UUID: Uuid = uuid!("9a1f4ce4-0b9e-4b0b-9a64-3c5a0f0a4f43");
}
impl Function for List {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys/list")
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        _computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        Ok(Evaluation::function_result(
            application,
            Term::List(application.args().clone()),
            bindings,
        ))
    }
}
