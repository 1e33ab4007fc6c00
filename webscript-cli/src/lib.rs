// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::{str::FromStr, sync::Arc};

use anyhow::{anyhow, Result};
use webscript::{Computer, ComputerOptions, DependencyCache, Evaluation, Function};
use webscript_handlers::{default_handlers, utils::fetch::HttpClient, DefaultHandlersMetricNames};

pub mod repl;
pub mod script;

pub use script::EdnScriptHost;

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum OutputFormat {
    Text,
    Json,
    Trace,
}
impl FromStr for OutputFormat {
    type Err = anyhow::Error;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "text" | "edn" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Unknown output format: {}", input)),
        }
    }
}

/// All built-ins available to the command-line evaluator
pub fn cli_builtins(
    http_client: impl HttpClient + 'static,
) -> impl Iterator<Item = Arc<dyn Function>> {
    webscript_stdlib::standard_library()
        .chain(webscript_json::stdlib::json_stdlib())
        .chain(default_handlers(
            http_client,
            EdnScriptHost,
            DefaultHandlersMetricNames::default(),
        ))
}

pub fn create_computer(
    builtins: impl IntoIterator<Item = Arc<dyn Function>>,
    options: ComputerOptions,
) -> Computer {
    Computer::new(builtins, Arc::new(DependencyCache::default()), options)
}

pub fn format_output(evaluation: &Evaluation, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("{}", evaluation.result())),
        OutputFormat::Json => webscript_json::stringify(evaluation.result())
            .map_err(|err| anyhow!("{}", err)),
        OutputFormat::Trace => Ok(format!("{}", evaluation).trim_end().to_string()),
    }
}
