// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
use webscript::Term;
use webscript_handlers::{ScriptContext, ScriptError, ScriptHost};

/// Script host for sources written in term syntax: script arguments are bound as symbols.
#[derive(Default, Clone, Copy, Debug)]
pub struct EdnScriptHost;
impl ScriptHost for EdnScriptHost {
    fn evaluate(&self, source: &str, context: &mut ScriptContext) -> Result<Term, ScriptError> {
        let term = webscript_edn::parse(source)
            .map_err(|err| ScriptError::Failed(format!("Failed to parse script: {}", err)))?;
        Ok(context.evaluate(&term)?)
    }
}

#[cfg(test)]
mod tests {
    use webscript::{Bindings, ComputerOptions, Term};
    use webscript_handlers::HyperHttpClient;

    use crate::{cli_builtins, create_computer};

    #[test]
    fn term_scripts() {
        let computer = create_computer(
            cli_builtins(HyperHttpClient::new().unwrap()),
            ComputerOptions::default(),
        );
        let evaluate = |source: &str| {
            computer
                .evaluate(&webscript_edn::parse(source).unwrap(), &Bindings::new())
                .unwrap()
                .into_result()
        };
        assert_eq!(
            evaluate("(sys.scripting.groovy/eval \"(sys/list value local/b)\" {:value 3 :local/b 4})"),
            Term::list([Term::integer(3), Term::integer(4)])
        );
        assert_eq!(
            evaluate("(sys.scripting.groovy/eval \"(sys/get arg \\\"value\\\")\" {:value 3})"),
            Term::integer(3)
        );
        assert_eq!(
            evaluate("(sys.scripting.groovy/eval \"(sys/list\")"),
            Term::error(
                "ScriptError",
                format!(
                    "Failed to parse script: {}",
                    webscript_edn::parse("(sys/list").unwrap_err()
                )
            )
        );
    }
}
