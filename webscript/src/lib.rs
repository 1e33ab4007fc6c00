// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
pub mod bindings;
pub mod cache;
pub mod computer;
pub mod error;
pub mod evaluation;
pub mod expand;
pub mod function;
pub mod hash;
pub mod term;

pub use bigdecimal::BigDecimal;
pub use num_bigint::BigInt;

pub use bindings::Bindings;
pub use cache::{DependencyCache, EvaluationCache, NoopCache};
pub use computer::{Computer, ComputerOptions};
pub use error::{ErrorInfo, FunctionError, SyntaxError};
pub use evaluation::{Evaluation, Operation};
pub use function::{ArgType, Arity, Function, FunctionArity};
pub use term::{ApplicationTerm, Keyword, Symbol, Term};
