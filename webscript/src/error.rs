// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::term::{Symbol, Term};

pub const ERROR_CODE_UNKNOWN_SYMBOL: &'static str = "UnknownSymbol";
pub const ERROR_CODE_INVALID_ARGUMENTS: &'static str = "InvalidArguments";
pub const ERROR_CODE_HTTP: &'static str = "HttpError";
pub const ERROR_CODE_SCRIPT: &'static str = "ScriptError";

/// Payload of an error value: failures that occur during evaluation are captured as terms rather
/// than aborting the evaluation, so that they can be traced and cached like any other result.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    code: String,
    message: String,
}
impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
    pub fn unknown_symbol(symbol: &Symbol) -> Self {
        Self::new(ERROR_CODE_UNKNOWN_SYMBOL, format!("{}", symbol))
    }
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ERROR_CODE_INVALID_ARGUMENTS, message)
    }
    pub fn code(&self) -> &str {
        &self.code
    }
    pub fn message(&self) -> &str {
        &self.message
    }
}
impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Structural failure that aborts evaluation.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum SyntaxError {
    #[error("Error expanding function symbol '{symbol}' to '{expansion}': macro expansion of a function symbol must also be a function symbol")]
    InvalidMacroSymbol { symbol: Symbol, expansion: Term },
    #[error("Invalid map key: expected constant, received {0}")]
    InvalidMapKey(Term),
    #[error("{0}")]
    Message(String),
}

/// Failure returned by a built-in function.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum FunctionError {
    /// Expected runtime failure, surfaced to the caller as an error value.
    #[error("{0}")]
    Failed(ErrorInfo),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}
impl From<ErrorInfo> for FunctionError {
    fn from(value: ErrorInfo) -> Self {
        Self::Failed(value)
    }
}
