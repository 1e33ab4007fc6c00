// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{debug, Level};
use webscript::{Bindings, ComputerOptions};
use webscript_cli::{cli_builtins, create_computer, format_output, repl, OutputFormat};
use webscript_handlers::HyperHttpClient;

/// Webscript term evaluator
#[derive(Parser)]
struct Args {
    /// Optional entry point file to evaluate (defaults to REPL)
    entry_point: Option<PathBuf>,
    /// Evaluate the given expression instead of an entry point file
    #[clap(long, short)]
    expression: Option<String>,
    /// Path to an EDN map of symbol bindings
    #[clap(long)]
    bindings: Option<PathBuf>,
    /// Output format (text, json or trace)
    #[clap(long, default_value = "text")]
    output: OutputFormat,
    /// Log evaluation activity to stderr
    #[clap(long)]
    log: bool,
    /// Log every completed reduction step
    #[clap(long)]
    debug_evaluations: bool,
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.log || args.debug_evaluations {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .init();
    let bindings = match &args.bindings {
        Some(path) => load_bindings(path)?,
        None => Bindings::new(),
    };
    let source = match (args.expression, args.entry_point) {
        (Some(_), Some(_)) => Err(anyhow!(
            "Specify either an entry point or an expression, not both"
        )),
        (Some(expression), None) => Ok(Some(expression)),
        (None, Some(path)) => read_file(&path).map(Some),
        (None, None) => Ok(None),
    }?;
    let http_client = HyperHttpClient::new().context("Failed to initialize HTTP client")?;
    let computer = create_computer(
        cli_builtins(http_client),
        ComputerOptions {
            debug_evaluations: args.debug_evaluations,
        },
    );
    match source {
        None => repl::run(&computer, &bindings, args.output)?,
        Some(source) => {
            let term = webscript_edn::parse(&source)
                .map_err(|err| anyhow!("Failed to parse input: {}", err))?;
            let evaluation = computer.evaluate(&term, &bindings)?;
            println!("{}", format_output(&evaluation, args.output)?);
            let metrics = computer.cache().metrics();
            debug!(
                hits = metrics.hits,
                misses = metrics.misses,
                entries = metrics.entries,
                "Evaluation complete"
            );
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read path {}", path.display()))
}

fn load_bindings(path: &Path) -> Result<Bindings> {
    let source = read_file(path)?;
    webscript_edn::parse_bindings(&source)
        .map_err(|err| anyhow!("Failed to parse bindings at {}: {}", path.display(), err))
}
