// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use std::io::{self, BufRead, Write};

use webscript::{Bindings, Computer};

use crate::{format_output, OutputFormat};

pub fn run(computer: &Computer, bindings: &Bindings, format: OutputFormat) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut lines = stdin.lock().lines();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let input = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let input = input.trim();
        if input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match eval(computer, bindings, input, format) {
            Ok(output) => writeln!(stdout, "{}", output),
            Err(error) => writeln!(stderr, "{}", error),
        }?;
    }
    Ok(())
}

pub fn eval(
    computer: &Computer,
    bindings: &Bindings,
    input: &str,
    format: OutputFormat,
) -> Result<String, String> {
    let term = webscript_edn::parse(input).map_err(|err| format!("Syntax error: {}", err))?;
    let evaluation = computer
        .evaluate(&term, bindings)
        .map_err(|err| format!("Evaluation error: {}", err))?;
    format_output(&evaluation, format).map_err(|err| format!("{}", err))
}
