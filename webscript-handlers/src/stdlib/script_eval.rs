// SPDX-FileCopyrightText: 2023 Marshall Wace <opensource@mwam.com>
// SPDX-License-Identifier: Apache-2.0
// SPDX-FileContributor: Tim Kendrick <t.kendrick@mwam.com> https://github.com/timkendrickmw
// SPDX-FileContributor: Chris Campbell <c.campbell@mwam.com> https://github.com/c-campbell-mwam
use std::fmt;

use tracing::{debug, warn};
use webscript::{
    error::ERROR_CODE_SCRIPT,
    function::{uuid, Uuid},
    hash::FnvHashMap,
    ApplicationTerm, ArgType, Arity, Bindings, Computer, ErrorInfo, Evaluation, Function,
    FunctionArity, FunctionError, Operation, Symbol, SyntaxError, Term,
};

pub const SCRIPT_ARGS_VARIABLE: &'static str = "arg";

#[derive(Debug)]
pub enum ScriptError {
    /// The script itself failed; reported as a `ScriptError` value
    Failed(String),
    /// A term evaluated on behalf of the script was structurally invalid
    Syntax(SyntaxError),
}
impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(message) => write!(f, "{}", message),
            Self::Syntax(err) => write!(f, "{}", err),
        }
    }
}
impl From<SyntaxError> for ScriptError {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(err)
    }
}
impl From<String> for ScriptError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

/// Runtime that executes script sources on behalf of [`ScriptEval`].
pub trait ScriptHost: Send + Sync {
    fn evaluate(&self, source: &str, context: &mut ScriptContext) -> Result<Term, ScriptError>;
}
impl<T> ScriptHost for T
where
    T: Fn(&str, &mut ScriptContext) -> Result<Term, ScriptError> + Send + Sync,
{
    fn evaluate(&self, source: &str, context: &mut ScriptContext) -> Result<Term, ScriptError> {
        self(source, context)
    }
}

/// Variables visible to a script, together with a handle for evaluating further terms.
///
/// Each entry of the script arguments map becomes a variable named after its key (`:ns/name`
/// becomes `ns/name`); the whole map is also available as `arg`. Terms evaluated through the
/// context see the caller's bindings extended with these variables, and are recorded as sub-steps
/// of the script evaluation.
pub struct ScriptContext<'a> {
    variables: FnvHashMap<String, Term>,
    scope: Bindings,
    computer: &'a Computer,
    sub_steps: Vec<Evaluation>,
}
impl<'a> ScriptContext<'a> {
    fn new(args: &Term, bindings: &Bindings, computer: &'a Computer) -> Self {
        let entries = args
            .as_map()
            .into_iter()
            .flat_map(|entries| entries.iter())
            .map(|(key, value)| (variable_name(key), value.clone()))
            .collect::<Vec<_>>();
        let arg = Term::hashmap(
            entries
                .iter()
                .map(|(name, value)| (Term::String(name.clone()), value.clone())),
        )
        .unwrap_or(Term::Nil);
        let variables = entries
            .into_iter()
            .chain([(String::from(SCRIPT_ARGS_VARIABLE), arg)])
            .collect::<FnvHashMap<_, _>>();
        let scope = bindings.extend(
            variables
                .iter()
                .map(|(name, value)| (Symbol::parse(name), value.clone())),
        );
        Self {
            variables,
            scope,
            computer,
            sub_steps: Vec::new(),
        }
    }
    pub fn variable(&self, name: &str) -> Option<&Term> {
        self.variables.get(name)
    }
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
    /// Evaluate a term under the caller's bindings extended with the script variables
    pub fn evaluate(&mut self, term: &Term) -> Result<Term, SyntaxError> {
        let evaluation = self.computer.evaluate(term, &self.scope)?;
        let result = evaluation.result().clone();
        self.sub_steps.push(evaluation);
        Ok(result)
    }
    /// Apply a function (or macro) to already-constructed argument terms
    pub fn invoke(
        &mut self,
        symbol: Symbol,
        args: impl IntoIterator<Item = Term>,
    ) -> Result<Term, SyntaxError> {
        self.evaluate(&Term::application(symbol, args))
    }
    fn into_sub_steps(self) -> (Vec<Evaluation>, Vec<Symbol>) {
        let symbols = self
            .variables
            .into_keys()
            .map(|name| Symbol::parse(&name))
            .collect();
        (self.sub_steps, symbols)
    }
}

fn variable_name(key: &Term) -> String {
    match key {
        Term::Keyword(keyword) => keyword.qualified_name(),
        Term::String(value) => value.clone(),
        key => key.to_text(),
    }
}

const SCRIPT_EVAL_ARITY: FunctionArity<1, 1> = FunctionArity {
    required: [ArgType::Strict],
    optional: [ArgType::Strict],
    variadic: None,
};

/// Evaluates a script source via a [`ScriptHost`], e.g. `(sys.scripting.groovy/eval "value*2" {:value 3})`
pub struct ScriptEval<THost: ScriptHost> {
    host: THost,
}
impl<THost: ScriptHost> ScriptEval<THost> {
    pub const UUID: Uuid = uuid!("b3e9a7c4-1d52-4f8e-8a06-2f4c7e9b5d18");
    pub fn new(host: THost) -> Self {
        Self { host }
    }
}
impl<THost: ScriptHost> Function for ScriptEval<THost> {
    fn uid(&self) -> Uuid {
        Self::UUID
    }
    fn symbol(&self) -> Symbol {
        Symbol::parse("sys.scripting.groovy/eval")
    }
    fn arity(&self) -> Arity {
        Arity::from(&SCRIPT_EVAL_ARITY)
    }
    fn apply(
        &self,
        application: &ApplicationTerm,
        bindings: &Bindings,
        computer: &Computer,
    ) -> Result<Evaluation, FunctionError> {
        let source = match application.arg(0) {
            Some(Term::String(source)) => Ok(source.as_str()),
            source => Err(ErrorInfo::invalid_arguments(format!(
                "Expected script source String, received {}",
                source.cloned().unwrap_or(Term::Nil)
            ))),
        }?;
        let args = match application.arg(1) {
            None | Some(Term::Nil) => Ok(Term::Nil),
            Some(args @ Term::Map(_)) => Ok(args.clone()),
            Some(args) => Err(ErrorInfo::invalid_arguments(format!(
                "Expected script arguments Map, received {}",
                args
            ))),
        }?;
        debug!(source = source, "Evaluating script");
        let mut context = ScriptContext::new(&args, bindings, computer);
        let result = match self.host.evaluate(source, &mut context) {
            Ok(result) => result,
            Err(ScriptError::Syntax(err)) => return Err(FunctionError::Syntax(err)),
            Err(ScriptError::Failed(message)) => {
                warn!(source = source, error = %message, "Script evaluation failed");
                Term::Error(ErrorInfo::new(ERROR_CODE_SCRIPT, message))
            }
        };
        let (sub_steps, variables) = context.into_sub_steps();
        if sub_steps.is_empty() {
            return Ok(Evaluation::function_result(application, result, bindings));
        }
        // Script variables are local to the script
        let dependencies = sub_steps
            .iter()
            .fold(Bindings::new(), |dependencies, sub_step| {
                dependencies.union(sub_step.effective_dependencies())
            })
            .without(variables.iter());
        Ok(Evaluation::new(
            Term::Application(application.clone()),
            result,
            Operation::ApplyFunction,
            dependencies,
            bindings.clone(),
            sub_steps,
        ))
    }
}
