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

pub use concat::*;
pub use get::*;
pub use list::*;
pub use r#let::*;

mod concat;
mod get;
mod r#let;
mod list;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug, Serialize, Deserialize, EnumIter)]
#[serde(tag = "uid")]
pub enum Stdlib {
    Concat,
    Get,
    Let,
    List,
}
impl Stdlib {
    pub fn entries() -> impl Iterator<Item = Self> {
        Self::iter()
    }
    fn function(&self) -> &'static dyn Function {
        match self {
            Self::Concat => &Concat,
            Self::Get => &Get,
            Self::Let => &Let,
            Self::List => &List,
        }
    }
}
impl TryFrom<Uuid> for Stdlib {
    type Error = ();
    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        match uuid {
            Concat::UUID => Ok(Self::Concat),
            Get::UUID => Ok(Self::Get),
            Let::UUID => Ok(Self::Let),
            List::UUID => Ok(Self::List),
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

/// Standard built-ins, ready to register with a [`Computer`]
pub fn standard_library() -> impl Iterator<Item = Arc<dyn Function>> {
    Stdlib::entries().map(|builtin| Arc::new(builtin) as Arc<dyn Function>)
}
