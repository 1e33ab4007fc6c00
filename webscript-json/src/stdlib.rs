// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::{convert::TryFrom, sync::Arc};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use webscript::{
    function::Uuid, ApplicationTerm, Arity, Bindings, Computer, Evaluation, Function,
    FunctionError, Symbol,
};

pub use json_deserialize::*;
pub use json_serialize::*;

mod json_deserialize;
mod json_serialize;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug, Serialize, Deserialize, EnumIter)]
#[serde(tag = "type")]
pub enum Stdlib {
    JsonDeserialize,
    JsonSerialize,
}
impl Stdlib {
    pub fn entries() -> impl Iterator<Item = Self> {
        Self::iter()
    }
    fn function(&self) -> &'static dyn Function {
        match self {
            Self::JsonDeserialize => &JsonDeserialize,
            Self::JsonSerialize => &JsonSerialize,
        }
    }
}
impl TryFrom<Uuid> for Stdlib {
    type Error = ();
    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        match uuid {
            JsonDeserialize::UUID => Ok(Self::JsonDeserialize),
            JsonSerialize::UUID => Ok(Self::JsonSerialize),
            _ => Err(()),
        }
    }
}
impl Function for Stdlib {
    fn uid(&self) -> Uuid {
        self.function().uid()
    }
    fn symbol(&self) -> Symbol {
        self.function().symbol()
    }
    fn arity(&self) -> Arity {
        self.function().arity()
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        self.function().apply(application, bindings, computer)
    }
}

/// JSON built-ins, ready to register with a [`Computer`]
pub fn json_stdlib() -> impl Iterator<Item = Arc<dyn Function>> {
    Stdlib::entries().map(|builtin| Arc::new(builtin) as Arc<dyn Function>)
}
